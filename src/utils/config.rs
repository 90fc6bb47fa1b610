//! Configuration for a reconstruction run.
//!
//! Every physical constant and sweep parameter lives in a [`ReconstructionConfig`] which is
//! passed by reference into the pipeline entry points. Defaults reproduce the 400 x 40 scan
//! of the 77 GHz gantry.

use crate::error::SarError;
use crate::loading::decoder::ChannelSelect;
use crate::utils::constants::{
    CARRIER_FREQUENCY_HZ, CHIRP_RATE_HZ_PER_S, INSTRUMENT_DELAY_S, LIGHTSPEED, M_TO_MM,
    SAMPLE_RATE_HZ,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

type Result<T> = std::result::Result<T, SarError>;

/// Geometry of the raw scan and the layout of its capture files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Fast-time samples per chirp
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Chirps per scan line (X)
    #[serde(default = "default_fast_axis_points")]
    pub fast_axis_points: usize,

    /// Scan lines, one capture file each (Y)
    #[serde(default = "default_slow_axis_points")]
    pub slow_axis_points: usize,

    /// 1-4 selects a receive channel, 5 averages all four
    #[serde(default = "default_channel_option")]
    pub channel_option: u8,

    /// Capture file name, `{}` is replaced by the 1-based line index
    #[serde(default = "default_filename_template")]
    pub filename_template: String,
}

fn default_samples() -> usize {
    512
}

fn default_fast_axis_points() -> usize {
    400
}

fn default_slow_axis_points() -> usize {
    40
}

fn default_channel_option() -> u8 {
    1
}

fn default_filename_template() -> String {
    "scan{}_Raw_0.bin".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            fast_axis_points: default_fast_axis_points(),
            slow_axis_points: default_slow_axis_points(),
            channel_option: default_channel_option(),
            filename_template: default_filename_template(),
        }
    }
}

impl ScanConfig {
    /// Capture file name for the 1-based scan line `index`.
    pub fn filename(&self, index: usize) -> String {
        self.filename_template.replace("{}", &index.to_string())
    }

    pub fn channel(&self) -> Result<ChannelSelect> {
        ChannelSelect::try_from(self.channel_option)
    }
}

/// Physical parameters of the FMCW front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarConfig {
    /// Speed of light in m/s
    #[serde(default = "default_speed_of_light")]
    pub speed_of_light: f64,

    /// Chirp slope K in Hz/s
    #[serde(default = "default_chirp_rate")]
    pub chirp_rate: f64,

    /// ADC sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Internal delay of the RF chain in s
    #[serde(default = "default_instrument_delay")]
    pub instrument_delay: f64,

    /// Carrier used by the matched filter in Hz
    #[serde(default = "default_carrier_frequency")]
    pub carrier_frequency: f64,
}

fn default_speed_of_light() -> f64 {
    LIGHTSPEED
}

fn default_chirp_rate() -> f64 {
    CHIRP_RATE_HZ_PER_S
}

fn default_sample_rate() -> f64 {
    SAMPLE_RATE_HZ
}

fn default_instrument_delay() -> f64 {
    INSTRUMENT_DELAY_S
}

fn default_carrier_frequency() -> f64 {
    CARRIER_FREQUENCY_HZ
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            speed_of_light: default_speed_of_light(),
            chirp_rate: default_chirp_rate(),
            sample_rate: default_sample_rate(),
            instrument_delay: default_instrument_delay(),
            carrier_frequency: default_carrier_frequency(),
        }
    }
}

impl RadarConfig {
    /// ADC sample period Ts in s
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate
    }
}

/// FFT sizes, aperture sampling and field of view of the focused image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagingConfig {
    /// Length of the range FFT
    #[serde(default = "default_n_fft")]
    pub n_fft_time: usize,

    /// Points per axis of the matched filter
    #[serde(default = "default_n_fft")]
    pub n_fft_space: usize,

    /// Gantry step along the fast axis in mm
    #[serde(default = "default_step_x_mm")]
    pub step_x_mm: f64,

    /// Gantry step along the slow axis in mm
    #[serde(default = "default_step_y_mm")]
    pub step_y_mm: f64,

    /// Width of the cropped image in mm
    #[serde(default = "default_fov_x_mm")]
    pub fov_x_mm: f64,

    /// Height of the cropped image in mm
    #[serde(default = "default_fov_y_mm")]
    pub fov_y_mm: f64,

    /// Physical width of the scanned area in mm
    #[serde(default = "default_scan_width_mm")]
    pub scan_width_mm: f64,

    /// Physical height of the scanned area in mm
    #[serde(default = "default_scan_height_mm")]
    pub scan_height_mm: f64,
}

fn default_n_fft() -> usize {
    1024
}

fn default_step_x_mm() -> f64 {
    280.0 / 400.0
}

fn default_step_y_mm() -> f64 {
    1.0
}

fn default_fov_x_mm() -> f64 {
    400.0
}

fn default_fov_y_mm() -> f64 {
    300.0
}

fn default_scan_width_mm() -> f64 {
    280.0
}

fn default_scan_height_mm() -> f64 {
    40.0
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            n_fft_time: default_n_fft(),
            n_fft_space: default_n_fft(),
            step_x_mm: default_step_x_mm(),
            step_y_mm: default_step_y_mm(),
            fov_x_mm: default_fov_x_mm(),
            fov_y_mm: default_fov_y_mm(),
            scan_width_mm: default_scan_width_mm(),
            scan_height_mm: default_scan_height_mm(),
        }
    }
}

/// Depths to focus at, in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_start_mm")]
    pub start_mm: f64,

    #[serde(default = "default_end_mm")]
    pub end_mm: f64,

    #[serde(default = "default_step_mm")]
    pub step_mm: f64,

    /// Focus at this depth only, ignoring the range
    #[serde(default)]
    pub single_mm: Option<f64>,
}

fn default_start_mm() -> f64 {
    300.0
}

fn default_end_mm() -> f64 {
    800.0
}

fn default_step_mm() -> f64 {
    3.0
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start_mm: default_start_mm(),
            end_mm: default_end_mm(),
            step_mm: default_step_mm(),
            single_mm: None,
        }
    }
}

impl SweepConfig {
    /// Depths in mm, either the single depth or `start, start + step, ...` up to the first
    /// grid point at or beyond `end`, so the last depth may overshoot `end` by less than a step.
    pub fn depths_mm(&self) -> Vec<f64> {
        if let Some(depth) = self.single_mm {
            return vec![depth];
        }
        let span = self.end_mm - self.start_mm + self.step_mm;
        let count = (span / self.step_mm).ceil().max(0.0) as usize;
        (0..count)
            .map(|i| self.start_mm + i as f64 * self.step_mm)
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if let Some(depth) = self.single_mm {
            if !depth.is_finite() {
                Err(SarError::InvalidConfig(format!("Single depth {depth} is not finite")))?
            }
            return Ok(());
        }
        if !(self.step_mm > 0.0) {
            Err(SarError::InvalidConfig(format!(
                "Depth step {}mm must be > 0",
                self.step_mm
            )))?
        }
        if !(self.start_mm < self.end_mm) {
            Err(SarError::InvalidConfig(format!(
                "Depth start ({}mm) must be less than depth end ({}mm)",
                self.start_mm, self.end_mm
            )))?
        }
        Ok(())
    }
}

/// Complete configuration of a reconstruction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub radar: RadarConfig,

    #[serde(default)]
    pub imaging: ImagingConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

impl ReconstructionConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReconstructionConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Checks every parameter once, before any file is read.
    pub fn validate(&self) -> Result<()> {
        self.scan.channel()?;
        let counts = [
            ("samples", self.scan.samples),
            ("fast_axis_points", self.scan.fast_axis_points),
            ("slow_axis_points", self.scan.slow_axis_points),
            ("n_fft_time", self.imaging.n_fft_time),
            ("n_fft_space", self.imaging.n_fft_space),
        ];
        for (name, value) in counts {
            if value == 0 {
                Err(SarError::InvalidConfig(format!("{name} must be > 0")))?
            }
        }
        let positives = [
            ("speed_of_light", self.radar.speed_of_light),
            ("chirp_rate", self.radar.chirp_rate),
            ("sample_rate", self.radar.sample_rate),
            ("carrier_frequency", self.radar.carrier_frequency),
            ("step_x_mm", self.imaging.step_x_mm),
            ("step_y_mm", self.imaging.step_y_mm),
            ("fov_x_mm", self.imaging.fov_x_mm),
            ("fov_y_mm", self.imaging.fov_y_mm),
        ];
        for (name, value) in positives {
            if !(value.is_finite() && value > 0.0) {
                Err(SarError::InvalidConfig(format!("{name} must be > 0, got {value}")))?
            }
        }
        if !self.radar.instrument_delay.is_finite() {
            Err(SarError::InvalidConfig(
                "instrument_delay must be finite".to_string(),
            ))?
        }
        self.sweep.validate()
    }
}

/// Parses a depth given as `"300"` or `"300mm"` (millimetres) or `"0.3m"` (metres) into mm.
pub fn parse_depth_mm(value: &str) -> Result<f64> {
    let s = value.trim().to_lowercase();
    let parsed = if let Some(mm) = s.strip_suffix("mm") {
        mm.trim().parse::<f64>()
    } else if let Some(m) = s.strip_suffix('m') {
        m.trim().parse::<f64>().map(|m| m * M_TO_MM)
    } else {
        s.parse::<f64>()
    };
    match parsed {
        Ok(depth) if depth.is_finite() => Ok(depth),
        _ => Err(SarError::InvalidDepth(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = ReconstructionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan.samples, 512);
        assert_eq!(config.imaging.n_fft_time, 1024);
        assert_eq!(config.radar.carrier_frequency, 77e9);
    }

    #[test]
    fn filename_is_one_based() {
        let scan = ScanConfig::default();
        assert_eq!(scan.filename(1), "scan1_Raw_0.bin");
        assert_eq!(scan.filename(40), "scan40_Raw_0.bin");
    }

    #[test]
    fn invalid_channel_is_rejected() {
        let mut config = ReconstructionConfig::default();
        config.scan.channel_option = 6;
        assert!(matches!(config.validate(), Err(SarError::InvalidChannel(6))));
        config.scan.channel_option = 0;
        assert!(matches!(config.validate(), Err(SarError::InvalidChannel(0))));
    }

    #[test]
    fn invalid_sweep_is_rejected() {
        let mut config = ReconstructionConfig::default();
        config.sweep.start_mm = 900.0;
        assert!(matches!(config.validate(), Err(SarError::InvalidConfig(_))));

        let mut config = ReconstructionConfig::default();
        config.sweep.step_mm = 0.0;
        assert!(matches!(config.validate(), Err(SarError::InvalidConfig(_))));

        // A single depth ignores the range
        config.sweep.single_mm = Some(323.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sweep_depths_reach_end() {
        let sweep = SweepConfig {
            start_mm: 300.0,
            end_mm: 312.0,
            step_mm: 3.0,
            single_mm: None,
        };
        assert_eq!(sweep.depths_mm(), vec![300.0, 303.0, 306.0, 309.0, 312.0]);

        let sweep = SweepConfig::default();
        let depths = sweep.depths_mm();
        assert_eq!(depths.len(), 168);
        assert_eq!(depths[0], 300.0);
        assert_eq!(depths[167], 801.0);

        // Off-grid end overshoots by less than one step
        let sweep = SweepConfig {
            start_mm: 0.0,
            end_mm: 10.0,
            step_mm: 4.0,
            single_mm: None,
        };
        assert_eq!(sweep.depths_mm(), vec![0.0, 4.0, 8.0, 12.0]);
    }

    #[test]
    fn single_depth_overrides_range() {
        let sweep = SweepConfig {
            single_mm: Some(323.0),
            ..Default::default()
        };
        assert_eq!(sweep.depths_mm(), vec![323.0]);
    }

    #[test]
    fn depth_strings() {
        assert_eq!(parse_depth_mm("300").unwrap(), 300.0);
        assert_eq!(parse_depth_mm(" 300mm ").unwrap(), 300.0);
        assert_eq!(parse_depth_mm("0.3m").unwrap(), 300.0);
        assert_eq!(parse_depth_mm("0.25M").unwrap(), 250.0);
        assert!(matches!(parse_depth_mm("deep"), Err(SarError::InvalidDepth(_))));
        assert!(parse_depth_mm("3cm").is_err());
        assert!(parse_depth_mm("").is_err());
    }

    #[test]
    fn yaml_round_trip_with_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "scan:\n  samples: 256\nsweep:\n  single_mm: 410.0\n").unwrap();
        let config = ReconstructionConfig::from_yaml(&path).unwrap();
        assert_eq!(config.scan.samples, 256);
        assert_eq!(config.scan.fast_axis_points, 400);
        assert_eq!(config.sweep.single_mm, Some(410.0));

        let saved = dir.path().join("saved.yaml");
        config.to_yaml(&saved).unwrap();
        assert_eq!(ReconstructionConfig::from_yaml(&saved).unwrap(), config);
    }
}
