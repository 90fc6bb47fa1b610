use crate::error::SarError;
use crate::loading::assembler::assemble_line;
use crate::loading::decoder::{decode_frame, ChannelSelect};
use crate::utils::config::ReconstructionConfig;
use log::{info, warn};
use ndarray::{s, Array3};
use rustfft::num_complex::Complex64;
use std::path::Path;

type Result<T> = std::result::Result<T, SarError>;

/// Raw scan cube indexed `[range_sample, slow_axis, fast_axis]`.
#[derive(Debug, Clone)]
pub struct StackedScan {
    pub cube: Array3<Complex64>,
    /// 1-based indices of the lines whose capture file was zero-filled
    pub missing_rows: Vec<usize>,
}

impl StackedScan {
    pub fn is_complete(&self) -> bool {
        self.missing_rows.is_empty()
    }
}

/// Decodes and assembles one capture file per scan line into a `(samples, rows, chirps)` cube.
///
/// `filename` maps the 1-based line index to the capture file name within `folder`.
///
/// # Errors
/// Will return `Err` if a capture file that exists holds fewer than `samples * chirps`
/// samples. Missing files are zero-filled and reported in `missing_rows`.
pub fn stack_scan<F>(
    folder: &Path,
    samples: usize,
    chirps: usize,
    rows: usize,
    channel: ChannelSelect,
    filename: F,
) -> Result<StackedScan>
where
    F: Fn(usize) -> String,
{
    let mut cube = Array3::zeros((samples, rows, chirps));
    let mut missing_rows = vec![];

    for row in 0..rows {
        let path = folder.join(filename(row + 1));
        let frame = decode_frame(&path, samples, chirps, channel);
        if frame.is_substituted() {
            missing_rows.push(row + 1);
        }
        let line = assemble_line(&frame.stream, samples, chirps, row, &path)?;
        cube.slice_mut(s![.., row, ..])
            .assign(&line.slice(s![.., 0, ..]));
    }

    if !missing_rows.is_empty() {
        warn!(
            "{} of {rows} scan lines were zero-filled: {missing_rows:?}",
            missing_rows.len()
        );
    }
    Ok(StackedScan { cube, missing_rows })
}

/// Loads the scan described by `config` from `folder`.
///
/// # Errors
/// Will return `Err` if the channel option is invalid or a capture file is truncated.
pub fn load_scan<P: AsRef<Path>>(folder: P, config: &ReconstructionConfig) -> Result<StackedScan> {
    let scan = &config.scan;
    let channel = scan.channel()?;
    info!(
        "Stacking {} lines of {} chirps x {} samples from {:?} using {channel}",
        scan.slow_axis_points,
        scan.fast_axis_points,
        scan.samples,
        folder.as_ref()
    );
    stack_scan(
        folder.as_ref(),
        scan.samples,
        scan.fast_axis_points,
        scan.slow_axis_points,
        channel,
        |index| scan.filename(index),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// Writes a capture holding `values` on every channel, I = value and Q = -value.
    fn write_line(dir: &Path, index: usize, values: &[i16]) {
        let mut file = std::fs::File::create(dir.join(format!("scan{index}_Raw_0.bin"))).unwrap();
        for v in values {
            for word in [*v, *v, *v, *v, -v, -v, -v, -v] {
                file.write_all(&word.to_le_bytes()).unwrap();
            }
        }
    }

    fn name(index: usize) -> String {
        format!("scan{index}_Raw_0.bin")
    }

    #[test]
    fn serpentine_rows_are_mirrored() {
        let dir = TempDir::new().unwrap();
        write_line(dir.path(), 1, &[1, 2]);
        write_line(dir.path(), 2, &[3, 4]);

        let scan = stack_scan(dir.path(), 1, 2, 2, ChannelSelect::Single(0), name).unwrap();
        assert!(scan.is_complete());
        assert_eq!(scan.cube.dim(), (1, 2, 2));
        assert_eq!(scan.cube[[0, 0, 0]], Complex64::new(1.0, -1.0));
        assert_eq!(scan.cube[[0, 0, 1]], Complex64::new(2.0, -2.0));
        // First chirp of the second line lands on the far edge
        assert_eq!(scan.cube[[0, 1, 1]], Complex64::new(3.0, -3.0));
        assert_eq!(scan.cube[[0, 1, 0]], Complex64::new(4.0, -4.0));
    }

    #[test]
    fn missing_lines_are_reported() {
        let dir = TempDir::new().unwrap();
        write_line(dir.path(), 1, &[1, 2, 3, 4]);
        write_line(dir.path(), 3, &[5, 6, 7, 8]);

        let scan = stack_scan(dir.path(), 2, 2, 3, ChannelSelect::Combined, name).unwrap();
        assert_eq!(scan.missing_rows, vec![2]);
        assert!(scan
            .cube
            .slice(s![.., 1, ..])
            .iter()
            .all(|v| *v == Complex64::new(0.0, 0.0)));
        assert_eq!(scan.cube[[1, 2, 0]], Complex64::new(6.0, -6.0));
    }

    #[test]
    fn truncated_line_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_line(dir.path(), 1, &[1, 2, 3]);
        let result = stack_scan(dir.path(), 2, 2, 1, ChannelSelect::Single(0), name);
        assert!(matches!(result, Err(SarError::TruncatedCapture { .. })));
    }

    #[test]
    fn load_scan_rejects_bad_channel() {
        let dir = TempDir::new().unwrap();
        let mut config = ReconstructionConfig::default();
        config.scan.channel_option = 9;
        assert!(matches!(
            load_scan(dir.path(), &config),
            Err(SarError::InvalidChannel(9))
        ));
    }
}
