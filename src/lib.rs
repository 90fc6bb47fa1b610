//! Millimeter-wave SAR reconstruction for a two-axis scanning gantry.
//!
//! One capture file per scan line is decoded, reassembled into a raw
//! `[range_sample, slow_axis, fast_axis]` cube, range-compressed, and focused at a series of
//! depths with a spherical-wavefront matched filter. The result is a [`DepthStack`] of
//! magnitude images with maximum-intensity projections along each axis.
//!
//! ```no_run
//! use mmsar::{reconstruct_folder, ReconstructionConfig};
//!
//! let config = ReconstructionConfig::default();
//! let reconstruction = reconstruct_folder("dumps", &config).unwrap();
//! let best_focus = reconstruction.stack.max_over_depth();
//! ```
use crate::imaging::error::ImagingError;
use crate::imaging::range::RangeSpectrum;
use crate::imaging::sweep::{par_sweep, SkippedDepth};
use crate::loading::stacker::load_scan;
use log::info;
use std::path::Path;

pub mod error;
pub mod imaging;
pub mod loading;
pub mod utils;

#[cfg(feature = "python")]
mod python;

pub use crate::imaging::sweep::{DepthStack, VoxelPoint};
pub use crate::utils::config::ReconstructionConfig;

/// Depth stack of a scan and the data-quality notes gathered while building it.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub stack: DepthStack,
    /// Depths whose range bin fell outside the range FFT
    pub skipped: Vec<SkippedDepth>,
    /// 1-based scan lines that were zero-filled
    pub missing_rows: Vec<usize>,
}

/// Reconstructs the scan stored in `folder` over the depth sweep in `config`.
///
/// # Errors
/// Will return `Err` if `config` is invalid, a capture file is truncated, or the field of
/// view contains no image sample. Missing capture files and out-of-range depths are not
/// errors; they are reported in the returned [`Reconstruction`].
pub fn reconstruct_folder<P: AsRef<Path>>(
    folder: P,
    config: &ReconstructionConfig,
) -> Result<Reconstruction, ImagingError> {
    config.validate()?;
    let scan = load_scan(folder, config)?;
    let spectrum = RangeSpectrum::from_cube(&scan.cube, config)?;
    let result = par_sweep(&spectrum, config)?;
    info!(
        "Reconstructed {} depths ({} skipped, {} lines zero-filled)",
        result.stack.len(),
        result.skipped.len(),
        scan.missing_rows.len()
    );
    Ok(Reconstruction {
        stack: result.stack,
        skipped: result.skipped,
        missing_rows: scan.missing_rows,
    })
}
