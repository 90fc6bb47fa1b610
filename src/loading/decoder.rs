//! Demultiplexing of raw capture files into complex channel streams.
//!
//! A capture file is a flat sequence of little-endian `i16` ADC words. Every group of eight
//! words holds one sample of each receive channel, in-phase words first:
//!
//! ```text
//!  I1 I2 I3 I4 Q1 Q2 Q3 Q4 | I1 I2 I3 I4 Q1 Q2 Q3 Q4 | ...
//! ```
use crate::error::SarError;
use log::warn;
use rustfft::num_complex::Complex64;
use std::fmt;
use std::path::Path;

pub const NUM_CHANNELS: usize = 4;
pub const FRAME_STRIDE: usize = 2 * NUM_CHANNELS;

/// Which receive channel to image with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelect {
    /// A single receive channel, 0-indexed
    Single(usize),
    /// Coherent mean of all four channels
    Combined,
}

impl TryFrom<u8> for ChannelSelect {
    type Error = SarError;

    /// Options 1-4 select a channel, 5 selects the mean of all channels.
    fn try_from(option: u8) -> Result<Self, Self::Error> {
        match option {
            1..=4 => Ok(ChannelSelect::Single(option as usize - 1)),
            5 => Ok(ChannelSelect::Combined),
            _ => Err(SarError::InvalidChannel(option)),
        }
    }
}

impl fmt::Display for ChannelSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelSelect::Single(c) => write!(f, "channel {}", c + 1),
            ChannelSelect::Combined => write!(f, "mean of all channels"),
        }
    }
}

/// Whether a stream came from the capture file or was zero-filled in its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Decoded,
    SubstitutedMissing,
}

/// One channel stream of a capture file.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub stream: Vec<Complex64>,
    pub status: FrameStatus,
}

impl DecodedFrame {
    pub fn is_substituted(&self) -> bool {
        self.status == FrameStatus::SubstitutedMissing
    }
}

/// Reads a capture file as little-endian `i16` words. A trailing odd byte is ignored.
pub fn read_raw_frame<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<i16>> {
    let bytes = std::fs::read(path)?;
    Ok(bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

/// Splits raw words into the four complex channel streams, each `raw.len() / 8` long.
pub fn demultiplex(raw: &[i16]) -> [Vec<Complex64>; NUM_CHANNELS] {
    let mut channels: [Vec<Complex64>; NUM_CHANNELS] = Default::default();
    for channel in channels.iter_mut() {
        channel.reserve(raw.len() / FRAME_STRIDE);
    }
    for group in raw.chunks_exact(FRAME_STRIDE) {
        for (c, channel) in channels.iter_mut().enumerate() {
            channel.push(Complex64::new(
                group[c] as f64,
                group[c + NUM_CHANNELS] as f64,
            ));
        }
    }
    channels
}

/// Extracts the selected channel stream from raw words.
pub fn select_channel(raw: &[i16], channel: ChannelSelect) -> Vec<Complex64> {
    let [ch1, ch2, ch3, ch4] = demultiplex(raw);
    match channel {
        ChannelSelect::Single(0) => ch1,
        ChannelSelect::Single(1) => ch2,
        ChannelSelect::Single(2) => ch3,
        ChannelSelect::Single(_) => ch4,
        ChannelSelect::Combined => ch1
            .iter()
            .zip(&ch2)
            .zip(&ch3)
            .zip(&ch4)
            .map(|(((a, b), c), d)| (a + b + c + d) / 4.0)
            .collect(),
    }
}

/// Decodes the selected channel of one capture file.
///
/// A file that cannot be read, or holds no complete sample group, is replaced by
/// `samples * chirps` zeros and flagged [`FrameStatus::SubstitutedMissing`].
pub fn decode_frame<P: AsRef<Path>>(
    path: P,
    samples: usize,
    chirps: usize,
    channel: ChannelSelect,
) -> DecodedFrame {
    let path = path.as_ref();
    let substitute = || DecodedFrame {
        stream: vec![Complex64::new(0.0, 0.0); samples * chirps],
        status: FrameStatus::SubstitutedMissing,
    };
    match read_raw_frame(path) {
        Ok(raw) if raw.len() >= FRAME_STRIDE => DecodedFrame {
            stream: select_channel(&raw, channel),
            status: FrameStatus::Decoded,
        },
        Ok(_) => {
            warn!("Capture file {path:?} is empty, substituting zeros");
            substitute()
        }
        Err(e) => {
            warn!("Capture file {path:?} could not be read ({e}), substituting zeros");
            substitute()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use std::io::Write;
    use tempfile::TempDir;

    /// One chirp of two samples for four channels
    fn interleaved() -> Vec<i16> {
        vec![
            1, 2, 3, 4, -1, -2, -3, -4, // sample 0: I1..I4, Q1..Q4
            10, 20, 30, 40, -10, -20, -30, -40, // sample 1
        ]
    }

    fn write_frame(dir: &TempDir, name: &str, raw: &[i16]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for word in raw {
            file.write_all(&word.to_le_bytes()).unwrap();
        }
        path
    }

    #[test]
    fn channel_options() {
        assert_eq!(ChannelSelect::try_from(1).unwrap(), ChannelSelect::Single(0));
        assert_eq!(ChannelSelect::try_from(4).unwrap(), ChannelSelect::Single(3));
        assert_eq!(ChannelSelect::try_from(5).unwrap(), ChannelSelect::Combined);
        assert!(matches!(
            ChannelSelect::try_from(0),
            Err(SarError::InvalidChannel(0))
        ));
        assert!(ChannelSelect::try_from(6).is_err());
    }

    #[test]
    fn demultiplex_single_channels() {
        let raw = interleaved();
        for option in 1..=4u8 {
            let c = option as usize - 1;
            let expected = vec![
                Complex64::new(raw[c] as f64, raw[c + 4] as f64),
                Complex64::new(raw[8 + c] as f64, raw[12 + c] as f64),
            ];
            let decoded = select_channel(&raw, ChannelSelect::try_from(option).unwrap());
            assert_eq!(decoded, expected, "option {option}");
        }
    }

    #[test]
    fn combined_channel_is_mean() {
        let raw = interleaved();
        let combined = select_channel(&raw, ChannelSelect::Combined);
        assert_eq!(combined.len(), 2);
        for i in 0..2 {
            let sum: Complex64 = (0..4)
                .map(|c| select_channel(&raw, ChannelSelect::Single(c))[i])
                .sum();
            let mean = sum / 4.0;
            assert!(is_close!(combined[i].re, mean.re));
            assert!(is_close!(combined[i].im, mean.im));
        }
        assert_eq!(combined[0], Complex64::new(2.5, -2.5));
    }

    #[test]
    fn incomplete_trailing_group_is_dropped() {
        let mut raw = interleaved();
        raw.extend([7, 7, 7]);
        let [ch1, ..] = demultiplex(&raw);
        assert_eq!(ch1.len(), 2);
    }

    #[test]
    fn decode_file_little_endian() {
        let dir = TempDir::new().unwrap();
        let mut raw = interleaved();
        raw[0] = -300; // spans both bytes
        let path = write_frame(&dir, "scan1_Raw_0.bin", &raw);

        let frame = decode_frame(&path, 2, 1, ChannelSelect::Single(0));
        assert_eq!(frame.status, FrameStatus::Decoded);
        assert_eq!(frame.stream[0], Complex64::new(-300.0, -1.0));
        assert_eq!(frame.stream[1], Complex64::new(10.0, -10.0));
    }

    #[test]
    fn missing_file_is_zero_filled() {
        let dir = TempDir::new().unwrap();
        let frame = decode_frame(
            dir.path().join("does_not_exist.bin"),
            512,
            400,
            ChannelSelect::Combined,
        );
        assert!(frame.is_substituted());
        assert_eq!(frame.stream.len(), 512 * 400);
        assert!(frame.stream.iter().all(|v| *v == Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn empty_file_is_zero_filled() {
        let dir = TempDir::new().unwrap();
        let path = write_frame(&dir, "empty.bin", &[]);
        let frame = decode_frame(&path, 4, 3, ChannelSelect::Single(1));
        assert_eq!(frame.status, FrameStatus::SubstitutedMissing);
        assert_eq!(frame.stream.len(), 12);
    }
}
