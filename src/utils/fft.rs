//! FFT helpers over `ndarray` arrays, built on `rustfft` plans.
//!
//! Forward transforms are unnormalized and inverse transforms are scaled by 1/N, so that
//! `ifft(fft(x)) == x`.

use ndarray::{Array2, Array3, ArrayViewMut1, Axis, Zip};
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// FFT of every lane along axis 0, zero-padded or truncated to `n_fft` points.
///
/// Input shape `(n, rows, cols)` gives output shape `(n_fft, rows, cols)`.
pub fn fft_axis0(data: &Array3<Complex64>, n_fft: usize) -> Array3<Complex64> {
    let (_, rows, cols) = data.dim();
    let plan = FftPlanner::<f64>::new().plan_fft_forward(n_fft);
    let mut scratch = vec![Complex64::new(0.0, 0.0); plan.get_inplace_scratch_len()];
    let mut buffer = Vec::with_capacity(n_fft);
    let mut spectrum = Array3::zeros((n_fft, rows, cols));

    Zip::from(data.lanes(Axis(0)))
        .and(spectrum.lanes_mut(Axis(0)))
        .for_each(|lane, out| {
            buffer.clear();
            buffer.extend(lane.iter().take(n_fft).copied());
            buffer.resize(n_fft, Complex64::new(0.0, 0.0));
            plan.process_with_scratch(&mut buffer, &mut scratch);
            copy_into(&buffer, out);
        });
    spectrum
}

/// Swaps half-spaces so the zero-frequency term sits at index `(rows / 2, cols / 2)`.
pub fn fftshift2<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (rows, cols) = data.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        data[((i + rows - rows / 2) % rows, (j + cols - cols / 2) % cols)].clone()
    })
}

fn copy_into(buffer: &[Complex64], mut out: ArrayViewMut1<Complex64>) {
    for (dst, src) in out.iter_mut().zip(buffer) {
        *dst = *src;
    }
}

/// Separable 2-D FFT for arrays of one fixed shape.
pub struct Fft2d {
    rows: usize,
    cols: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft2d")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl Fft2d {
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            rows,
            cols,
            row_forward: planner.plan_fft_forward(cols),
            row_inverse: planner.plan_fft_inverse(cols),
            col_forward: planner.plan_fft_forward(rows),
            col_inverse: planner.plan_fft_inverse(rows),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Forward transform in place.
    ///
    /// # Panics
    /// Will panic if `data` does not have the shape this transform was planned for.
    pub fn fft(&self, data: &mut Array2<Complex64>) {
        assert_eq!(data.dim(), self.shape());
        transform_lanes(data, Axis(1), self.row_forward.as_ref());
        transform_lanes(data, Axis(0), self.col_forward.as_ref());
    }

    /// Inverse transform in place, scaled by 1/(rows * cols).
    ///
    /// # Panics
    /// Will panic if `data` does not have the shape this transform was planned for.
    pub fn ifft(&self, data: &mut Array2<Complex64>) {
        assert_eq!(data.dim(), self.shape());
        transform_lanes(data, Axis(1), self.row_inverse.as_ref());
        transform_lanes(data, Axis(0), self.col_inverse.as_ref());
        let scale = 1.0 / (self.rows * self.cols) as f64;
        data.mapv_inplace(|v| v * scale);
    }
}

fn transform_lanes(data: &mut Array2<Complex64>, axis: Axis, plan: &dyn Fft<f64>) {
    let mut scratch = vec![Complex64::new(0.0, 0.0); plan.get_inplace_scratch_len()];
    let mut buffer = Vec::new();
    for lane in data.lanes_mut(axis) {
        buffer.clear();
        buffer.extend(lane.iter().copied());
        plan.process_with_scratch(&mut buffer, &mut scratch);
        copy_into(&buffer, lane);
    }
}
