use crate::utils::config::RadarConfig;
use crate::utils::constants::MM_TO_M;
use ndarray::{Array1, Array2};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// `points` coordinates spaced by `step`, symmetric about zero.
///
/// Even counts have no sample at zero, e.g. 4 points of step 1 give `[-1.5, -0.5, 0.5, 1.5]`.
pub fn centered_axis(points: usize, step: f64) -> Array1<f64> {
    let center = (points as f64 - 1.0) / 2.0;
    Array1::from_iter((0..points).map(|i| step * (i as f64 - center)))
}

/// Expected two-way phase of a point scatterer at depth `depth_mm` seen from every aperture
/// position of a `y_points x x_points` grid centered on the scatterer.
///
/// ```text
/// h(x, y) = exp(-j * 2 * k * sqrt(x^2 + y^2 + z0^2)),    k = 2 * pi * f0 / c
/// ```
pub fn matched_filter(
    x_points: usize,
    x_step_mm: f64,
    y_points: usize,
    y_step_mm: f64,
    depth_mm: f64,
    radar: &RadarConfig,
) -> Array2<Complex64> {
    let x = centered_axis(x_points, x_step_mm) * MM_TO_M;
    let y = centered_axis(y_points, y_step_mm) * MM_TO_M;
    let z0 = depth_mm * MM_TO_M;
    let k = 2.0 * PI * radar.carrier_frequency / radar.speed_of_light;

    Array2::from_shape_fn((y_points, x_points), |(i, j)| {
        let distance = (x[j] * x[j] + y[i] * y[i] + z0 * z0).sqrt();
        Complex64::from_polar(1.0, -2.0 * k * distance)
    })
}
