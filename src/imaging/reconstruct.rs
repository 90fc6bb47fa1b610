use crate::imaging::error::ImagingError;
use crate::imaging::matched_filter::centered_axis;
use crate::utils::fft::{fftshift2, Fft2d};
use ndarray::{s, Array1, Array2, ArrayView2};
use rustfft::num_complex::Complex64;

type Result<T> = std::result::Result<T, ImagingError>;

/// Focused complex image and its physical axes in mm.
#[derive(Debug, Clone)]
pub struct FocusedImage {
    /// Indexed `[y, x]`
    pub image: Array2<Complex64>,
    pub x_axis: Array1<f64>,
    pub y_axis: Array1<f64>,
}

/// Copies `data` into the middle of a zero array of shape `(rows, cols)`, with
/// `floor(diff / 2)` zeros before and `ceil(diff / 2)` after along each axis.
fn pad_centered(data: ArrayView2<Complex64>, rows: usize, cols: usize) -> Array2<Complex64> {
    let (r, c) = data.dim();
    let top = (rows - r) / 2;
    let left = (cols - c) / 2;
    let mut padded = Array2::zeros((rows, cols));
    padded
        .slice_mut(s![top..top + r, left..left + c])
        .assign(&data);
    padded
}

/// Zero-pads whichever array is smaller, axis by axis, so both share one shape.
pub fn pad_to_common_shape(
    a: ArrayView2<Complex64>,
    b: ArrayView2<Complex64>,
) -> (Array2<Complex64>, Array2<Complex64>) {
    let rows = a.nrows().max(b.nrows());
    let cols = a.ncols().max(b.ncols());
    (pad_centered(a, rows, cols), pad_centered(b, rows, cols))
}

/// Indices of `axis` strictly inside `(-size / 2, size / 2)`.
fn crop_range(axis: &Array1<f64>, size: f64) -> std::ops::Range<usize> {
    let inside = |v: &f64| *v > -size / 2.0 && *v < size / 2.0;
    let start = axis.iter().position(inside).unwrap_or(axis.len());
    let end = start + axis.iter().skip(start).take_while(|v| inside(*v)).count();
    start..end
}

/// Focuses a range slice by convolving it with a matched filter in the frequency domain and
/// crops the result to a `fov_x_mm x fov_y_mm` window centered on the filter axis.
///
/// # Errors
/// Will return `Err` if no image sample falls inside the field of view, which happens when
/// a side of the field of view is not larger than the step along that axis.
pub fn reconstruct_image(
    sar_data: ArrayView2<Complex64>,
    matched_filter: ArrayView2<Complex64>,
    x_step_mm: f64,
    y_step_mm: f64,
    fov_x_mm: f64,
    fov_y_mm: f64,
) -> Result<FocusedImage> {
    let (mut data, mut filter) = pad_to_common_shape(sar_data, matched_filter);
    let (rows, cols) = data.dim();

    let fft = Fft2d::new(rows, cols);
    fft.fft(&mut data);
    fft.fft(&mut filter);
    data *= &filter;
    fft.ifft(&mut data);
    let image = fftshift2(&data);

    let x_axis = centered_axis(cols, x_step_mm);
    let y_axis = centered_axis(rows, y_step_mm);
    let x_range = crop_range(&x_axis, fov_x_mm);
    let y_range = crop_range(&y_axis, fov_y_mm);
    if x_range.is_empty() || y_range.is_empty() {
        Err(ImagingError::EmptyFieldOfView { fov_x_mm, fov_y_mm })?
    }

    Ok(FocusedImage {
        image: image
            .slice(s![y_range.clone(), x_range.clone()])
            .to_owned(),
        x_axis: x_axis.slice(s![x_range]).to_owned(),
        y_axis: y_axis.slice(s![y_range]).to_owned(),
    })
}
