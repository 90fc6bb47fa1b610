use crate::error::SarError;
use ndarray::{s, Array3, ArrayView1};
use rustfft::num_complex::Complex64;
use std::path::Path;

/// Fast-axis position of the `chirp`-th chirp of a line on the 0-indexed scan `row`.
///
/// The gantry sweeps back and forth, so every second line (even 1-based row number) is
/// recorded right-to-left and is mirrored here.
pub fn serpentine_position(row: usize, chirp: usize, chirps: usize) -> usize {
    if (row + 1) % 2 == 1 {
        chirp
    } else {
        chirps - 1 - chirp
    }
}

/// Cuts one line's channel stream into `chirps` chirps of `samples` samples and places them
/// into a `(samples, 1, chirps)` cube in physical left-to-right order.
///
/// # Errors
/// Will return `Err` if the stream holds fewer than `samples * chirps` values. Extra values
/// past the last chirp are ignored.
pub fn assemble_line(
    stream: &[Complex64],
    samples: usize,
    chirps: usize,
    row: usize,
    source: &Path,
) -> Result<Array3<Complex64>, SarError> {
    let expected = samples * chirps;
    if stream.len() < expected {
        Err(SarError::TruncatedCapture {
            path: source.to_path_buf(),
            expected,
            found: stream.len(),
        })?
    }

    let mut line = Array3::zeros((samples, 1, chirps));
    for (chirp, record) in stream[..expected].chunks_exact(samples).enumerate() {
        let x = serpentine_position(row, chirp, chirps);
        line.slice_mut(s![.., 0, x])
            .assign(&ArrayView1::from(record));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(values: &[f64]) -> Vec<Complex64> {
        values.iter().map(|v| Complex64::new(*v, -v)).collect()
    }

    #[test]
    fn odd_rows_keep_order() {
        assert_eq!(serpentine_position(0, 0, 4), 0);
        assert_eq!(serpentine_position(0, 3, 4), 3);
        assert_eq!(serpentine_position(2, 1, 4), 1);
    }

    #[test]
    fn even_rows_are_mirrored() {
        assert_eq!(serpentine_position(1, 0, 4), 3);
        assert_eq!(serpentine_position(1, 3, 4), 0);
        assert_eq!(serpentine_position(3, 1, 4), 2);
    }

    #[test]
    fn chirps_are_contiguous_samples() {
        let data = stream(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let line = assemble_line(&data, 2, 3, 0, Path::new("scan1")).unwrap();
        assert_eq!(line.dim(), (2, 1, 3));
        assert_eq!(line[[0, 0, 1]], data[2]);
        assert_eq!(line[[1, 0, 1]], data[3]);

        let mirrored = assemble_line(&data, 2, 3, 1, Path::new("scan2")).unwrap();
        assert_eq!(mirrored[[0, 0, 2]], data[0]);
        assert_eq!(mirrored[[1, 0, 0]], data[5]);
    }

    #[test]
    fn trailing_samples_are_ignored() {
        let data = stream(&[1.0, 2.0, 3.0]);
        let line = assemble_line(&data, 1, 2, 0, Path::new("scan1")).unwrap();
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn short_stream_is_an_error() {
        let data = stream(&[1.0, 2.0, 3.0]);
        let err = assemble_line(&data, 2, 2, 0, Path::new("scan1")).unwrap_err();
        assert!(matches!(
            err,
            SarError::TruncatedCapture {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }
}
