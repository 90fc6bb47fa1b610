use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring the reconstruction or reading the scan.
#[derive(Error, Debug)]
pub enum SarError {
    /// Channel selection outside of 1..=5
    #[error("Invalid channel option {0}, expected 1-4 for a single channel or 5 for the mean")]
    InvalidChannel(u8),

    /// A configuration value that cannot be used for processing
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Depth string that is not millimetres or metres
    #[error("Invalid depth value: {0}")]
    InvalidDepth(String),

    /// Capture file holds fewer chirps than the scan geometry requires
    #[error("Capture {path:?} holds {found} samples per channel, expected at least {expected}")]
    TruncatedCapture {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// Unable to read or write a configuration file
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Malformed YAML configuration
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
}
