//! Configuration management for the head orientation tools

use crate::{
    calibration::CalibrationController,
    constants::{
        DEFAULT_CALIBRATION_READINGS, DEFAULT_CALIBRATION_SAMPLE_INTERVAL_MS, DEFAULT_CHANGE_THRESHOLD,
        DEFAULT_DEAD_ZONE, DEFAULT_DEAD_ZONE_GAIN, DEFAULT_EDGE_EXPONENT, DEFAULT_EXPONENTIAL_ALPHA,
        DEFAULT_HEARTBEAT_MS, DEFAULT_MEDIAN_WINDOW, DEFAULT_MIN_FACE_WIDTH, DEFAULT_MOVING_AVERAGE_WINDOW,
        DEFAULT_SERIAL_BAUD_RATE, DEFAULT_SERIAL_POLL_DELAY_MS, DEFAULT_SERIAL_SETTLE_MS,
        DEFAULT_SERIAL_STATS_INTERVAL_MS, DEFAULT_SERIAL_TIMEOUT_MS,
    },
    filters::OrientationFilter,
    gate::SampleGate,
    orientation::{OrientationEstimator, ResponseCurve},
    serial::PortSettings,
    session::Session,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Orientation estimator geometry and response curve
    pub orientation: OrientationConfig,

    /// Temporal smoothing of the calibrated signal
    pub smoothing: SmoothingConfig,

    /// Zero-reference calibration
    pub calibration: CalibrationConfig,

    /// Orientation log location and write policy
    pub logging: LoggingConfig,

    /// Serial sensor stream capture
    pub serial: SerialConfig,
}

/// Orientation estimator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Minimum distance between the face edge landmarks, in pixels
    pub min_face_width: f64,

    /// Half-width of the linear region around a frontal pose
    pub dead_zone: f64,

    /// Slope of the linear region
    pub dead_zone_gain: f64,

    /// Exponent of the power-law region
    pub edge_exponent: f64,
}

/// Smoothing filter selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type: `moving_average`, `median`, `exponential` or `none`
    pub filter: String,

    /// Moving average window size
    pub window: usize,

    /// Median filter window size
    pub median_window: usize,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,
}

/// Calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Valid readings averaged into the offset
    pub readings: usize,

    /// Pause between sampled frames
    pub sample_interval_ms: u64,

    /// Give up sampling after this long; unbounded when absent
    pub timeout_ms: Option<u64>,

    /// Clear the smoothing window when a calibration completes
    pub reset_smoothing: bool,
}

/// Orientation log parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for `face_orientation_*.csv`
    pub output_dir: PathBuf,

    /// Minimum change that forces a row
    pub change_threshold: f64,

    /// Maximum time between rows
    pub heartbeat_ms: u64,
}

/// Serial capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Directory for `ecg_data_*.csv` and `imu_data_*.csv`
    pub output_dir: PathBuf,

    /// Line speed for serial devices; captured stream files ignore it
    pub baud_rate: u32,

    /// Read timeout on serial devices
    pub timeout_ms: u64,

    /// Idle sleep while no input is available
    pub poll_delay_ms: u64,

    /// Interval between record count reports
    pub stats_interval_ms: u64,

    /// Wait after opening the port for the device to reset
    pub settle_ms: u64,

    /// Keep polling at end of input instead of stopping
    pub follow: bool,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            min_face_width: DEFAULT_MIN_FACE_WIDTH,
            dead_zone: DEFAULT_DEAD_ZONE,
            dead_zone_gain: DEFAULT_DEAD_ZONE_GAIN,
            edge_exponent: DEFAULT_EDGE_EXPONENT,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "moving_average".to_string(),
            window: DEFAULT_MOVING_AVERAGE_WINDOW,
            median_window: DEFAULT_MEDIAN_WINDOW,
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            readings: DEFAULT_CALIBRATION_READINGS,
            sample_interval_ms: DEFAULT_CALIBRATION_SAMPLE_INTERVAL_MS,
            timeout_ms: None,
            reset_smoothing: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
            heartbeat_ms: DEFAULT_HEARTBEAT_MS,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            baud_rate: DEFAULT_SERIAL_BAUD_RATE,
            timeout_ms: DEFAULT_SERIAL_TIMEOUT_MS,
            poll_delay_ms: DEFAULT_SERIAL_POLL_DELAY_MS,
            stats_interval_ms: DEFAULT_SERIAL_STATS_INTERVAL_MS,
            settle_ms: DEFAULT_SERIAL_SETTLE_MS,
            follow: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the configured smoothing filter
    ///
    /// # Errors
    ///
    /// Returns `FilterError` for unknown filter names or invalid parameters
    pub fn create_filter(&self) -> Result<Box<dyn OrientationFilter>> {
        use crate::filters::{
            create_filter, exponential::ExponentialFilter, median::MedianFilter,
            moving_average::MovingAverageFilter,
        };

        match self.smoothing.filter.as_str() {
            "moving_average" => Ok(Box::new(MovingAverageFilter::try_new(self.smoothing.window)?)),
            "median" => Ok(Box::new(MedianFilter::try_new(self.smoothing.median_window)?)),
            "exponential" => Ok(Box::new(ExponentialFilter::try_new(self.smoothing.exponential_alpha)?)),
            name => create_filter(name),
        }
    }

    #[must_use]
    pub fn orientation_estimator(&self) -> OrientationEstimator {
        let o = &self.orientation;
        OrientationEstimator::new(
            o.min_face_width,
            ResponseCurve::new(o.dead_zone, o.dead_zone_gain, o.edge_exponent),
        )
    }

    #[must_use]
    pub fn sample_gate(&self) -> SampleGate {
        SampleGate::new(
            self.logging.change_threshold,
            Duration::from_millis(self.logging.heartbeat_ms),
        )
    }

    #[must_use]
    pub fn calibration_controller(&self) -> CalibrationController {
        CalibrationController::new(self.calibration.readings)
            .with_sample_interval(Duration::from_millis(self.calibration.sample_interval_ms))
            .with_timeout(self.calibration.timeout_ms.map(Duration::from_millis))
    }

    #[must_use]
    pub fn port_settings(&self) -> PortSettings {
        PortSettings {
            baud_rate: self.serial.baud_rate,
            timeout: Duration::from_millis(self.serial.timeout_ms),
            settle: Duration::from_millis(self.serial.settle_ms),
        }
    }

    /// Fresh session wired from this configuration
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if the smoothing filter cannot be created
    pub fn build_session(&self) -> Result<Session> {
        Ok(
            Session::new(self.orientation_estimator(), self.create_filter()?, self.sample_gate())
                .with_reset_on_calibration(self.calibration.reset_smoothing),
        )
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first invalid value, or
    /// `FilterError` if the smoothing filter cannot be built
    pub fn validate(&self) -> Result<()> {
        // Validate estimator
        let o = &self.orientation;
        if o.min_face_width.is_nan() || o.min_face_width < 0.0 {
            return Err(Error::ConfigError(
                "Minimum face width must be non-negative".to_string(),
            ));
        }
        if !(0.0..0.5).contains(&o.dead_zone) {
            return Err(Error::ConfigError("Dead zone must be in [0, 0.5)".to_string()));
        }
        if o.edge_exponent.is_nan() || o.edge_exponent <= 0.0 {
            return Err(Error::ConfigError("Edge exponent must be greater than 0".to_string()));
        }
        if !o.dead_zone_gain.is_finite() {
            return Err(Error::ConfigError("Dead zone gain must be finite".to_string()));
        }

        // Validate filter parameters
        if self.smoothing.window == 0 {
            return Err(Error::ConfigError(
                "Moving average window size must be greater than 0".to_string(),
            ));
        }
        if self.smoothing.median_window == 0 || self.smoothing.median_window % 2 == 0 {
            return Err(Error::ConfigError(
                "Median window size must be odd and greater than 0".to_string(),
            ));
        }
        let alpha = self.smoothing.exponential_alpha;
        if alpha.is_nan() || alpha <= 0.0 || alpha > 1.0 {
            return Err(Error::ConfigError("Exponential alpha must be in (0, 1]".to_string()));
        }

        // Validate calibration
        if self.calibration.readings == 0 {
            return Err(Error::ConfigError(
                "Calibration readings must be greater than 0".to_string(),
            ));
        }

        // Validate log policy
        if self.logging.change_threshold.is_nan() || self.logging.change_threshold < 0.0 {
            return Err(Error::ConfigError("Change threshold must be non-negative".to_string()));
        }

        if self.serial.stats_interval_ms == 0 {
            return Err(Error::ConfigError(
                "Serial stats interval must be greater than 0".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::ConfigError(
                "Serial baud rate must be greater than 0".to_string(),
            ));
        }
        if self.serial.timeout_ms == 0 {
            return Err(Error::ConfigError(
                "Serial read timeout must be greater than 0".to_string(),
            ));
        }

        self.create_filter()?;

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head Orientation Configuration

# Orientation estimator
orientation:
  min_face_width: 10.0
  dead_zone: 0.05
  dead_zone_gain: 10.0
  edge_exponent: 0.8

# Smoothing filter (moving_average, median, exponential, none)
smoothing:
  filter: "moving_average"
  window: 5
  median_window: 5
  exponential_alpha: 0.5

# Calibration
calibration:
  readings: 10
  sample_interval_ms: 100
  timeout_ms: null
  reset_smoothing: false

# Orientation log
logging:
  output_dir: "."
  change_threshold: 0.03
  heartbeat_ms: 500

# Serial sensor capture
serial:
  output_dir: "."
  baud_rate: 115200
  timeout_ms: 1000
  poll_delay_ms: 1
  stats_interval_ms: 1000
  settle_ms: 2000
  follow: true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let parsed: Config = serde_yaml::from_str("smoothing:\n  window: 9\n").unwrap();
        assert_eq!(parsed.smoothing.window, 9);
        assert_eq!(parsed.smoothing.filter, "moving_average");
        assert_eq!(parsed.calibration.readings, 10);
    }

    #[test]
    fn test_file_round_trip() {
        let mut config = Config::default();
        config.calibration.timeout_ms = Some(5000);
        config.serial.follow = false;

        let file = NamedTempFile::new().unwrap();
        config.to_file(file.path()).unwrap();
        let loaded = Config::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.smoothing.median_window = 4;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.smoothing.exponential_alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.orientation.dead_zone = 0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.calibration.readings = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.change_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_filter() {
        let mut config = Config::default();
        config.smoothing.filter = "kalman".to_string();
        assert!(matches!(config.validate(), Err(Error::FilterError(_))));

        config.smoothing.filter = "median:4".to_string();
        assert!(matches!(config.validate(), Err(Error::FilterError(_))));
    }

    #[test]
    fn test_port_settings() {
        let mut config = Config::default();
        assert_eq!(config.port_settings().baud_rate, 115_200);
        assert_eq!(config.port_settings().timeout, Duration::from_secs(1));

        config.serial.baud_rate = 9600;
        config.serial.settle_ms = 0;
        let settings = config.port_settings();
        assert_eq!(settings.baud_rate, 9600);
        assert!(settings.settle.is_zero());

        config.serial.baud_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_create_filter_by_name() {
        let mut config = Config::default();
        assert_eq!(config.create_filter().unwrap().name(), "MovingAverageFilter");

        config.smoothing.filter = "median".to_string();
        assert_eq!(config.create_filter().unwrap().name(), "MedianFilter");

        config.smoothing.filter = "none".to_string();
        assert_eq!(config.create_filter().unwrap().name(), "NoFilter");

        config.smoothing.filter = "kalman".to_string();
        assert!(config.create_filter().is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Config::from_file("/nonexistent/config.yaml").is_err());
    }
}
