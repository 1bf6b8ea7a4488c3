//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; an empty file yields
//! [`Config::default`].

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{ImuScopeError, Result};
use crate::plot::PlotMeta;

/// Baud rates the sensor firmware can be built with
pub const SUPPORTED_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Period of the polling timer
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Process every buffered line per tick instead of one
    #[serde(default)]
    pub drain_all_lines: bool,
}

/// Plot window configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PlotConfig {
    #[serde(default = "default_accel_ceil")]
    pub accel_ceil: f64,

    #[serde(default = "default_gyro_ceil")]
    pub gyro_ceil: f64,

    #[serde(default = "default_mag_ceil")]
    pub mag_ceil: f64,

    #[serde(default = "default_max_points")]
    pub max_points: usize,

    #[serde(default = "default_evict_count")]
    pub evict_count: usize,

    #[serde(default = "default_visible_span")]
    pub visible_span: f64,
}

/// Sample recording configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RecorderConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Console / log output configuration
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ConsoleConfig {
    /// Also write log output to this file
    #[serde(default)]
    pub log_file: Option<String>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_accel_ceil() -> f64 { 10.0 }
fn default_gyro_ceil() -> f64 { 60.0 }
fn default_mag_ceil() -> f64 { 20.0 }
fn default_max_points() -> usize { 50 }
fn default_evict_count() -> usize { 2 }
fn default_visible_span() -> f64 { 3.0 }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            drain_all_lines: false,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            accel_ceil: default_accel_ceil(),
            gyro_ceil: default_gyro_ceil(),
            mag_ceil: default_mag_ceil(),
            max_points: default_max_points(),
            evict_count: default_evict_count(),
            visible_span: default_visible_span(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl SerialConfig {
    /// Plot clock advance per polling tick
    ///
    /// One time unit on the plot spans 100 ticks of one millisecond.
    pub fn time_step(&self) -> f64 {
        self.poll_interval_ms as f64 / 100.0
    }
}

impl PlotConfig {
    pub fn accel_meta(&self) -> PlotMeta {
        PlotMeta::new("Acceleration", "m/s^2", self.accel_ceil)
    }

    pub fn gyro_meta(&self) -> PlotMeta {
        PlotMeta::new("Gyroscope", "deg", self.gyro_ceil)
    }

    pub fn mag_meta(&self) -> PlotMeta {
        PlotMeta::new("Magnetic field", "T", self.mag_ceil)
    }
}

fn invalid(msg: impl std::fmt::Display) -> ImuScopeError {
    ImuScopeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imu_scope::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.serial.poll_interval_ms == 0 || self.serial.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        for (name, value) in [
            ("accel_ceil", self.plot.accel_ceil),
            ("gyro_ceil", self.plot.gyro_ceil),
            ("mag_ceil", self.plot.mag_ceil),
            ("visible_span", self.plot.visible_span),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{} must be a positive number", name)));
            }
        }

        if self.plot.evict_count == 0 {
            return Err(invalid("evict_count must be greater than 0"));
        }

        if self.plot.max_points <= self.plot.evict_count {
            return Err(invalid("max_points must be greater than evict_count"));
        }

        if self.recorder.enabled && self.recorder.log_dir.is_empty() {
            return Err(invalid("recorder log_dir cannot be empty when enabled"));
        }

        if self.recorder.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.recorder.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.console.log_file.as_deref() == Some("") {
            return Err(invalid("console log_file cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_equals_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyACM1"
baud_rate = 9600
drain_all_lines = true

[plot]
gyro_ceil = 90.0

[recorder]
enabled = true
log_dir = "/tmp/imu"

[console]
log_file = "imu.log"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM1");
        assert_eq!(config.serial.baud_rate, 9600);
        assert!(config.serial.drain_all_lines);
        assert_eq!(config.serial.poll_interval_ms, 10);
        assert_eq!(config.plot.gyro_ceil, 90.0);
        assert_eq!(config.plot.accel_ceil, 10.0);
        assert!(config.recorder.enabled);
        assert_eq!(config.console.log_file.as_deref(), Some("imu.log"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/imu-scope.toml"),
            Err(ImuScopeError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Config::from_toml("[serial\nport = 1"),
            Err(ImuScopeError::Config(_))
        ));
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in SUPPORTED_BAUD_RATES {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_poll_interval_bounds() {
        let mut config = Config::default();
        config.serial.poll_interval_ms = 0;
        assert!(config.validate().is_err());
        config.serial.poll_interval_ms = 1001;
        assert!(config.validate().is_err());
        config.serial.poll_interval_ms = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reconnect_interval_bounds() {
        let mut config = Config::default();
        config.serial.reconnect_interval_ms = 0;
        assert!(config.validate().is_err());
        config.serial.reconnect_interval_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_ceil() {
        let mut config = Config::default();
        config.plot.accel_ceil = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.plot.mag_ceil = -5.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.plot.gyro_ceil = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_visible_span_zero() {
        let mut config = Config::default();
        config.plot.visible_span = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_eviction_limits() {
        let mut config = Config::default();
        config.plot.evict_count = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.plot.max_points = 2;
        config.plot.evict_count = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = Config::default();
        config.recorder.enabled = true;
        config.recorder.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = Config::default();
        config.recorder.enabled = false;
        config.recorder.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recorder_limits_zero() {
        let mut config = Config::default();
        config.recorder.max_records_per_file = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.recorder.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_console_log_file() {
        let mut config = Config::default();
        config.console.log_file = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_time_step() {
        let mut serial = SerialConfig::default();
        assert_eq!(serial.time_step(), 0.1);
        serial.poll_interval_ms = 50;
        assert_eq!(serial.time_step(), 0.5);
    }

    #[test]
    fn test_plot_meta() {
        let plot = PlotConfig::default();
        assert_eq!(plot.accel_meta().ceil, 10.0);
        assert_eq!(plot.gyro_meta().ceil, 60.0);
        assert_eq!(plot.mag_meta().ceil, 20.0);
        assert_eq!(plot.mag_meta().title, "Magnetic field");
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_serial_port(), "/dev/ttyUSB0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_poll_interval_ms(), 10);
        assert_eq!(default_reconnect_interval_ms(), 1000);
        assert_eq!(default_accel_ceil(), 10.0);
        assert_eq!(default_gyro_ceil(), 60.0);
        assert_eq!(default_mag_ceil(), 20.0);
        assert_eq!(default_max_points(), 50);
        assert_eq!(default_evict_count(), 2);
        assert_eq!(default_visible_span(), 3.0);
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
    }
}
