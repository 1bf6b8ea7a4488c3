//! # IMU Scope
//!
//! Reads IMU telemetry from a serial port and keeps live plot windows for the
//! accelerometer, gyroscope and magnetometer.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first argument, default `config/default.toml`)
//!    - Set up logging with tracing subscriber (optionally also to a file)
//!    - Create the monitor and, if enabled, the sample recorder
//!
//! 2. **Main Loop** (every `poll_interval_ms`)
//!    - Open the serial port if it is closed and the reconnect delay passed
//!    - Read and decode buffered lines without blocking
//!    - Log a status line every few seconds
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=debug cargo run --release -- config/default.toml
//! ```

use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::time::{interval, Duration, Instant};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use imu_scope::config::Config;
use imu_scope::console::{ConsoleSink, TracingConsole};
use imu_scope::monitor::Monitor;
use imu_scope::serial::SerialLineSource;
use imu_scope::telemetry::SampleRecorder;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of polling ticks between status log messages
const STATUS_INTERVAL_TICKS: u64 = 500;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _log_guard = init_logging(config.console.log_file.as_deref());

    info!("IMU Scope v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut monitor = Monitor::new(&config, TracingConsole);
    if let Some(recorder) = SampleRecorder::from_config(&config.recorder)
        .context("Failed to set up sample recorder")?
    {
        monitor = monitor.with_recorder(recorder);
    }

    let reconnect_delay = Duration::from_millis(config.serial.reconnect_interval_ms);
    let mut poll_interval = interval(Duration::from_millis(config.serial.poll_interval_ms));
    let mut source: Option<SerialLineSource> = None;
    let mut next_attempt = Instant::now();
    let mut ticks: u64 = 0;

    info!(
        "Polling {} every {}ms",
        config.serial.port, config.serial.poll_interval_ms
    );
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                ticks += 1;

                if source.is_none() && Instant::now() >= next_attempt {
                    next_attempt = Instant::now() + reconnect_delay;
                    match SerialLineSource::open_with_paths(&[config.serial.port.as_str()], config.serial.baud_rate) {
                        Ok(port) => {
                            monitor.connected(port.device_path());
                            source = Some(port);
                        }
                        Err(e) => debug!("Sensor not available: {}", e),
                    }
                }

                if let Some(port) = source.as_mut() {
                    if monitor.poll(port).is_err() {
                        source = None;
                        next_attempt = Instant::now() + reconnect_delay;
                    }
                }

                if ticks % STATUS_INTERVAL_TICKS == 0 {
                    log_status(&monitor);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                log_status(&monitor);
                break;
            }
        }
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("Failed to load {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Initialize logging to stdout and, if configured, a log file
///
/// The returned guard flushes the file writer on drop and must live until
/// shutdown.
fn init_logging(log_file: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match log_file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| OsStr::new("imu-scope.log"));
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stdout.and(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

fn log_status<C: ConsoleSink>(monitor: &Monitor<C>) {
    let stats = monitor.stats();
    info!(
        "{} lines, {} records accepted, {} malformed, {} connection losses",
        stats.lines, stats.accepted, stats.malformed, stats.connection_losses
    );
    for (title, snapshot) in monitor.snapshots() {
        debug!(
            "{}: {} points, range {:?}, window {:?}",
            title,
            snapshot.x_points.len(),
            snapshot.y_range,
            snapshot.x_range
        );
    }
    if let Some(temperature) = monitor.temperature() {
        info!("Temperature: {:.1}", temperature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_interval_is_five_seconds_at_default_rate() {
        let config = Config::default();
        let seconds = STATUS_INTERVAL_TICKS * config.serial.poll_interval_ms / 1000;
        assert_eq!(seconds, 5);
    }

    #[test]
    fn test_default_config_file_parses() {
        let contents = include_str!("../config/default.toml");
        assert_eq!(Config::from_toml(contents).unwrap(), Config::default());
    }
}
