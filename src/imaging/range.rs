//! Range compression of the raw cube and range gating to a single depth.
//!
//! Under stretch processing the beat frequency of a return is proportional to its round-trip
//! delay, so after an FFT along fast time the bin
//!
//! ```text
//! k = round(K * Ts * (2 * z0 / c + t_I) * n_fft)
//! ```
//!
//! holds the returns from depth `z0`.
use crate::imaging::error::ImagingError;
use crate::utils::config::{RadarConfig, ReconstructionConfig};
use crate::utils::fft::fft_axis0;
use log::info;
use ndarray::{Array3, ArrayView2, Axis};
use rustfft::num_complex::Complex64;

type Result<T> = std::result::Result<T, ImagingError>;

/// Range bin of depth `depth_m` for an `n_fft` point range FFT, which may lie outside
/// `[0, n_fft)`.
///
/// Halfway cases round to the even bin.
pub fn range_bin(radar: &RadarConfig, depth_m: f64, n_fft: usize) -> i64 {
    let delay = 2.0 * depth_m / radar.speed_of_light + radar.instrument_delay;
    (radar.chirp_rate * radar.sample_period() * delay * n_fft as f64).round_ties_even() as i64
}

/// Range FFT of a raw cube, indexed `[range_bin, slow_axis, fast_axis]`.
///
/// Read-only once built, so one spectrum can be shared by every depth of a sweep.
#[derive(Debug, Clone)]
pub struct RangeSpectrum {
    spectrum: Array3<Complex64>,
}

impl RangeSpectrum {
    /// Transforms `cube` along its range axis, zero-padded or truncated to `n_fft` bins.
    pub fn new(cube: &Array3<Complex64>, n_fft: usize) -> Self {
        RangeSpectrum {
            spectrum: fft_axis0(cube, n_fft),
        }
    }

    /// Transforms a raw cube after checking it against the scan geometry in `config`.
    ///
    /// # Errors
    /// Will return `Err` if the cube shape is not `(samples, slow_axis_points, fast_axis_points)`.
    pub fn from_cube(cube: &Array3<Complex64>, config: &ReconstructionConfig) -> Result<Self> {
        let scan = &config.scan;
        let expected = (scan.samples, scan.slow_axis_points, scan.fast_axis_points);
        if cube.dim() != expected {
            Err(ImagingError::ShapeMismatch(format!(
                "raw cube has shape {:?}, scan geometry requires {expected:?}",
                cube.dim()
            )))?
        }
        info!(
            "Range FFT of {} chirps to {} bins",
            scan.slow_axis_points * scan.fast_axis_points,
            config.imaging.n_fft_time
        );
        Ok(Self::new(cube, config.imaging.n_fft_time))
    }

    pub fn n_fft(&self) -> usize {
        self.spectrum.len_of(Axis(0))
    }

    /// `(slow_axis, fast_axis)` shape of every range slice
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.spectrum.dim();
        (rows, cols)
    }

    /// Spatial slice at `bin`, or `None` if the bin is outside the spectrum.
    pub fn slice(&self, bin: i64) -> Option<ArrayView2<Complex64>> {
        usize::try_from(bin)
            .ok()
            .filter(|b| *b < self.n_fft())
            .map(|b| self.spectrum.index_axis(Axis(0), b))
    }

    /// Spatial slice holding the returns from depth `depth_m`, together with its bin.
    pub fn slice_at_depth(
        &self,
        radar: &RadarConfig,
        depth_m: f64,
    ) -> (i64, Option<ArrayView2<Complex64>>) {
        let bin = range_bin(radar, depth_m, self.n_fft());
        (bin, self.slice(bin))
    }
}
