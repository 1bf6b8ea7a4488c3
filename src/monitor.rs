//! # Monitor
//!
//! Glue between the line source, the telemetry state machine and the plot
//! windows. Owns all mutable decoding state; nothing here is shared across
//! threads.
//!
//! ## Usage
//!
//! ```
//! use imu_scope::config::Config;
//! use imu_scope::monitor::Monitor;
//!
//! let mut monitor = Monitor::new(&Config::default(), Vec::<String>::new());
//! for line in ["Magnetometer True", "Start", "1 1 1 1 1 1 1 1 1"] {
//!     monitor.handle_line(line);
//! }
//!
//! assert_eq!(monitor.accel_plot().len(), 1);
//! assert_eq!(monitor.mag_plot().len(), 1);
//! ```

use tracing::{debug, warn};

use crate::config::Config;
use crate::console::ConsoleSink;
use crate::error::Result;
use crate::plot::{PlotSnapshot, WindowBuffer};
use crate::protocol::line::{classify, LineEvent};
use crate::protocol::state::{RecordOutcome, TelemetryState};
use crate::serial::LineSource;
use crate::telemetry::{SampleFrame, SampleRecorder};

/// Running counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub lines: u64,
    pub accepted: u64,
    pub malformed: u64,
    pub connection_losses: u64,
}

/// Decodes lines and keeps one plot window per signal group
#[derive(Debug)]
pub struct Monitor<C: ConsoleSink> {
    state: TelemetryState,
    accel: WindowBuffer,
    gyro: WindowBuffer,
    mag: WindowBuffer,
    last_temperature: Option<f64>,
    console: C,
    recorder: Option<SampleRecorder>,
    drain_all_lines: bool,
    stats: MonitorStats,
}

impl<C: ConsoleSink> Monitor<C> {
    /// Create a monitor with empty plot windows
    pub fn new(config: &Config, console: C) -> Self {
        let step = config.serial.time_step();
        let plot = &config.plot;
        let window = |meta| {
            WindowBuffer::with_limits(meta, step, plot.max_points, plot.evict_count, plot.visible_span)
        };

        Self {
            state: TelemetryState::new(),
            accel: window(plot.accel_meta()),
            gyro: window(plot.gyro_meta()),
            mag: window(plot.mag_meta()),
            last_temperature: None,
            console,
            recorder: None,
            drain_all_lines: config.serial.drain_all_lines,
            stats: MonitorStats::default(),
        }
    }

    /// Record every accepted sample through `recorder`
    pub fn with_recorder(mut self, recorder: SampleRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Start over with a fresh handshake
    ///
    /// Plot windows keep their history.
    pub fn reset(&mut self) {
        self.state.reset();
        self.last_temperature = None;
    }

    /// A new source has been connected
    pub fn connected(&mut self, device: &str) {
        self.reset();
        self.console.append(&format!("Port connected: {}", device));
    }

    /// Process one received line
    ///
    /// Blank lines are dropped without output. Every other line is echoed to
    /// the console before it is decoded.
    pub fn handle_line(&mut self, line: &str) -> RecordOutcome {
        let event = classify(line);
        if matches!(event, LineEvent::Empty) {
            return RecordOutcome::Ignored;
        }

        self.stats.lines += 1;
        self.console.append(line.trim());

        let outcome = self.state.apply(event);
        match &outcome {
            RecordOutcome::Accepted => {
                self.stats.accepted += 1;
                self.route_samples();
            }
            RecordOutcome::Malformed { expected, found } => {
                self.stats.malformed += 1;
                warn!("Malformed record: expected {} fields, got {}", expected, found);
                self.console.append(&format!(
                    "Malformed record: expected {} fields, got {}",
                    expected, found
                ));
            }
            RecordOutcome::Started => {
                debug!("Streaming with {:?}", self.state.schema());
            }
            RecordOutcome::CapabilityEnabled(_) | RecordOutcome::Ignored => {}
        }
        outcome
    }

    /// Read from `source` for one timer tick
    ///
    /// Handles at most one line unless `drain_all_lines` is configured.
    /// Returns the number of lines read.
    ///
    /// # Errors
    ///
    /// Returns the source's error after reporting it to the console and
    /// resetting the telemetry state. The caller must drop the source.
    pub fn poll(&mut self, source: &mut dyn LineSource) -> Result<usize> {
        let mut count = 0;
        loop {
            match source.read_line() {
                Ok(Some(line)) => {
                    self.handle_line(&line);
                    count += 1;
                    if !self.drain_all_lines {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    self.stats.connection_losses += 1;
                    warn!("Serial read failed: {}", e);
                    self.console.append(&format!("Serial read error: {}", e));
                    self.reset();
                    return Err(e);
                }
            }
        }
        Ok(count)
    }

    fn route_samples(&mut self) {
        let accel = self.state.accel();
        let gyro = self.state.gyro();
        let magnetometer = self.state.magnetometer();
        let temperature = self.state.temperature();

        if let Some(sample) = accel {
            self.accel.update(sample);
        }
        if let Some(sample) = gyro {
            self.gyro.update(sample);
        }
        if let Some(sample) = magnetometer {
            self.mag.update(sample);
        }
        if temperature.is_some() {
            self.last_temperature = temperature;
        }

        if let Some(recorder) = self.recorder.as_mut() {
            let frame = SampleFrame {
                timestamp: chrono::Utc::now(),
                accel,
                gyro,
                magnetometer,
                temperature,
            };
            if let Err(e) = recorder.record(&frame) {
                warn!("Failed to record sample: {}", e);
            }
        }
    }

    pub fn state(&self) -> &TelemetryState {
        &self.state
    }

    pub fn accel_plot(&self) -> &WindowBuffer {
        &self.accel
    }

    pub fn gyro_plot(&self) -> &WindowBuffer {
        &self.gyro
    }

    pub fn mag_plot(&self) -> &WindowBuffer {
        &self.mag
    }

    /// Snapshots of every group, magnetometer only if the sensor has one
    pub fn snapshots(&self) -> Vec<(&str, PlotSnapshot)> {
        let mut plots = vec![&self.accel, &self.gyro];
        if self.state.schema().has_magnetometer {
            plots.push(&self.mag);
        }
        plots
            .into_iter()
            .map(|plot| (plot.meta().title.as_str(), plot.snapshot()))
            .collect()
    }

    /// Last temperature read on this connection
    pub fn temperature(&self) -> Option<f64> {
        self.last_temperature
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }
}
