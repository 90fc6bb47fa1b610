use crate::error::SarError;
use thiserror::Error;

/// Enum of the errors that may be encountered while focusing an image
#[derive(Error, Debug)]
pub enum ImagingError {
    /// Arrays handed between stages do not have the expected shape
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The field of view does not contain a single image sample
    #[error("Field of view {fov_x_mm}mm x {fov_y_mm}mm contains no image samples")]
    EmptyFieldOfView { fov_x_mm: f64, fov_y_mm: f64 },

    /// Invalid configuration or unreadable scan
    #[error("{0}")]
    Sar(#[from] SarError),
}
