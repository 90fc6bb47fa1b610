//! Focusing across depths and the projections of the resulting stack.
use crate::error::SarError;
use crate::imaging::error::ImagingError;
use crate::imaging::matched_filter::matched_filter;
use crate::imaging::range::RangeSpectrum;
use crate::imaging::reconstruct::reconstruct_image;
use crate::utils::config::ReconstructionConfig;
use crate::utils::constants::MM_TO_M;
use itertools::{Either, Itertools};
use log::{debug, info, warn};
use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

type Result<T> = std::result::Result<T, ImagingError>;

/// Magnitude image at one depth, with axes in mm from the scan's bottom-left corner.
#[derive(Debug, Clone)]
pub struct DepthImage {
    pub depth_mm: f64,
    /// Indexed `[y, x]`
    pub magnitude: Array2<f64>,
    pub x_axis: Array1<f64>,
    pub y_axis: Array1<f64>,
}

/// A depth whose range bin fell outside the range spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkippedDepth {
    pub depth_mm: f64,
    pub bin: i64,
}

#[derive(Debug, Clone)]
pub enum DepthOutcome {
    Focused(DepthImage),
    Skipped(SkippedDepth),
}

/// Focuses the scan at a single depth.
///
/// Reads `spectrum` only, so calls for different depths are independent.
///
/// # Errors
/// Will return `Err` if the field of view in `config` contains no image sample.
pub fn focus_depth(
    spectrum: &RangeSpectrum,
    config: &ReconstructionConfig,
    depth_mm: f64,
) -> Result<DepthOutcome> {
    let imaging = &config.imaging;
    let (bin, slice) = spectrum.slice_at_depth(&config.radar, depth_mm * MM_TO_M);
    let sar_data = match slice {
        Some(x) => x,
        None => {
            warn!(
                "Range bin {bin} for depth {depth_mm}mm is outside 0..{}, skipping",
                spectrum.n_fft()
            );
            return Ok(DepthOutcome::Skipped(SkippedDepth { depth_mm, bin }));
        }
    };
    debug!("Focusing depth {depth_mm}mm at range bin {bin}");

    let filter = matched_filter(
        imaging.n_fft_space,
        imaging.step_x_mm,
        imaging.n_fft_space,
        imaging.step_y_mm,
        depth_mm,
        &config.radar,
    );
    let focused = reconstruct_image(
        sar_data,
        filter.view(),
        imaging.step_x_mm,
        imaging.step_y_mm,
        imaging.fov_x_mm,
        imaging.fov_y_mm,
    )?;

    // Mirror left-right for the azimuth sign convention
    let magnitude = focused.image.slice(s![.., ..;-1]).mapv(|v| v.norm());
    Ok(DepthOutcome::Focused(DepthImage {
        depth_mm,
        magnitude,
        x_axis: focused.x_axis + imaging.scan_width_mm / 2.0,
        y_axis: focused.y_axis + imaging.scan_height_mm / 2.0,
    }))
}

/// Focused magnitude images ordered by depth, stored as a `[depth, y, x]` volume.
#[derive(Debug, Clone)]
pub struct DepthStack {
    depths_mm: Vec<f64>,
    x_axis: Array1<f64>,
    y_axis: Array1<f64>,
    volume: Array3<f64>,
}

/// A voxel of the stack in physical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelPoint {
    pub x_mm: f64,
    pub y_mm: f64,
    pub z_mm: f64,
    pub intensity: f64,
}

impl DepthStack {
    /// # Errors
    /// Will return `Err` if `volume` is not `(depths, y_axis, x_axis)` shaped.
    pub fn new(
        depths_mm: Vec<f64>,
        x_axis: Array1<f64>,
        y_axis: Array1<f64>,
        volume: Array3<f64>,
    ) -> Result<Self> {
        let expected = (depths_mm.len(), y_axis.len(), x_axis.len());
        if volume.dim() != expected {
            Err(ImagingError::ShapeMismatch(format!(
                "volume has shape {:?}, axes require {expected:?}",
                volume.dim()
            )))?
        }
        Ok(DepthStack {
            depths_mm,
            x_axis,
            y_axis,
            volume,
        })
    }

    /// Stacks per-depth images, which must share their axes.
    ///
    /// # Errors
    /// Will return `Err` if the images differ in shape or axes.
    pub fn from_images(images: Vec<DepthImage>) -> Result<Self> {
        let first = match images.first() {
            Some(x) => x,
            None => {
                return Ok(DepthStack {
                    depths_mm: vec![],
                    x_axis: Array1::zeros(0),
                    y_axis: Array1::zeros(0),
                    volume: Array3::zeros((0, 0, 0)),
                })
            }
        };
        if let Some(img) = images
            .iter()
            .find(|img| img.x_axis != first.x_axis || img.y_axis != first.y_axis)
        {
            Err(ImagingError::ShapeMismatch(format!(
                "image at {}mm does not share the axes of the image at {}mm",
                img.depth_mm, first.depth_mm
            )))?
        }
        let planes: Vec<ArrayView2<f64>> = images.iter().map(|img| img.magnitude.view()).collect();
        let volume = ndarray::stack(Axis(0), &planes)
            .map_err(|e| ImagingError::ShapeMismatch(e.to_string()))?;
        Self::new(
            images.iter().map(|img| img.depth_mm).collect(),
            first.x_axis.clone(),
            first.y_axis.clone(),
            volume,
        )
    }

    pub fn len(&self) -> usize {
        self.depths_mm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths_mm.is_empty()
    }

    pub fn depths_mm(&self) -> &[f64] {
        &self.depths_mm
    }

    pub fn x_axis(&self) -> &Array1<f64> {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &Array1<f64> {
        &self.y_axis
    }

    /// `[depth, y, x]` magnitudes
    pub fn volume(&self) -> &Array3<f64> {
        &self.volume
    }

    /// Magnitude image at the `index`-th depth.
    pub fn plane(&self, index: usize) -> ArrayView2<f64> {
        self.volume.index_axis(Axis(0), index)
    }

    fn max_along(&self, axis: Axis) -> Array2<f64> {
        self.volume.fold_axis(axis, f64::NEG_INFINITY, |acc, v| acc.max(*v))
    }

    /// Maximum over the slow axis, a `[depth, x]` plane.
    pub fn max_over_slow_axis(&self) -> Array2<f64> {
        self.max_along(Axis(1))
    }

    /// Maximum over the fast axis, a `[depth, y]` plane.
    pub fn max_over_fast_axis(&self) -> Array2<f64> {
        self.max_along(Axis(2))
    }

    /// Maximum over depth, the best-focus `[y, x]` plane.
    pub fn max_over_depth(&self) -> Array2<f64> {
        self.max_along(Axis(0))
    }

    /// Every voxel brighter than the `percentile`-th percentile of the stack.
    ///
    /// # Errors
    /// Will return `Err` if `percentile` is outside `0..=100`.
    pub fn point_cloud(&self, percentile: f64) -> std::result::Result<Vec<VoxelPoint>, SarError> {
        if !(0.0..=100.0).contains(&percentile) {
            Err(SarError::InvalidConfig(format!(
                "Percentile {percentile} is outside 0-100"
            )))?
        }
        if self.volume.is_empty() {
            return Ok(vec![]);
        }
        let threshold = percentile_of(self.volume.iter().copied().collect(), percentile);
        Ok(self
            .volume
            .indexed_iter()
            .filter(|(_, v)| **v > threshold)
            .map(|((z, y, x), v)| VoxelPoint {
                x_mm: self.x_axis[x],
                y_mm: self.y_axis[y],
                z_mm: self.depths_mm[z],
                intensity: *v,
            })
            .collect())
    }
}

/// Percentile with linear interpolation between the closest ranks.
fn percentile_of(mut values: Vec<f64>, percentile: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = percentile / 100.0 * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    values[lower] + (values[upper] - values[lower]) * (rank - lower as f64)
}

/// Stack of focused depths plus the depths that could not be range-gated.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub stack: DepthStack,
    pub skipped: Vec<SkippedDepth>,
}

fn collect_outcomes(outcomes: Vec<DepthOutcome>) -> Result<SweepResult> {
    let (images, skipped): (Vec<_>, Vec<_>) =
        outcomes.into_iter().partition_map(|outcome| match outcome {
            DepthOutcome::Focused(img) => Either::Left(img),
            DepthOutcome::Skipped(s) => Either::Right(s),
        });
    let stack = DepthStack::from_images(images)?;
    info!("Focused {} depths, skipped {}", stack.len(), skipped.len());
    Ok(SweepResult { stack, skipped })
}

/// Focuses every depth of the sweep in `config`, one after another.
///
/// # Errors
/// Will return `Err` if any depth fails to focus.
pub fn sweep(spectrum: &RangeSpectrum, config: &ReconstructionConfig) -> Result<SweepResult> {
    let mut outcomes = vec![];
    for depth_mm in config.sweep.depths_mm() {
        outcomes.push(focus_depth(spectrum, config, depth_mm)?);
    }
    collect_outcomes(outcomes)
}

/// Focuses every depth of the sweep in `config` in parallel.
///
/// # Errors
/// Will return `Err` if any depth fails to focus.
pub fn par_sweep(spectrum: &RangeSpectrum, config: &ReconstructionConfig) -> Result<SweepResult> {
    let depths = config.sweep.depths_mm();
    info!("Focusing {} depths in parallel", depths.len());

    let results: Vec<Result<DepthOutcome>> = depths
        .par_iter()
        .map(|depth_mm| focus_depth(spectrum, config, *depth_mm))
        .collect();

    let mut outcomes = vec![];
    for res in results {
        match res {
            Ok(x) => outcomes.push(x),
            Err(e) => Err(e)?,
        }
    }
    collect_outcomes(outcomes)
}
