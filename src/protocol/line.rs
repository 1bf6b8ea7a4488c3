//! # Line Classifier
//!
//! Turns one received text line into a protocol event. Pure: no state, no
//! logging, no error case. Anything that is not a recognized handshake flag
//! or the start marker is a candidate data record; its token count is checked
//! by [`super::state::TelemetryState`].

use super::wire::*;

/// Optional sensor capability announced during the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Magnetometer,
    Temperature,
}

impl Capability {
    /// Look up a capability by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            MAGNETOMETER_FLAG => Some(Self::Magnetometer),
            TEMPERATURE_FLAG => Some(Self::Temperature),
            _ => None,
        }
    }

    /// Wire name of the capability
    pub fn name(self) -> &'static str {
        match self {
            Self::Magnetometer => MAGNETOMETER_FLAG,
            Self::Temperature => TEMPERATURE_FLAG,
        }
    }
}

/// Protocol event produced from a single line
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// `"<Name> True"` / `"<Name> False"` for a recognized capability
    HandshakeFlag { capability: Capability, value: bool },
    /// The literal `"Start"`
    StartMarker,
    /// Any other non-empty line, split on whitespace
    DataRecord { tokens: Vec<String> },
    /// Blank line; callers must ignore it
    Empty,
}

/// Classify one line
///
/// # Arguments
///
/// * `line` - Received line; surrounding whitespace is ignored
///
/// # Examples
///
/// ```
/// use imu_scope::protocol::line::{classify, Capability, LineEvent};
///
/// assert_eq!(classify("Start"), LineEvent::StartMarker);
/// assert_eq!(
///     classify("Magnetometer True"),
///     LineEvent::HandshakeFlag { capability: Capability::Magnetometer, value: true }
/// );
/// assert_eq!(classify("   "), LineEvent::Empty);
/// ```
pub fn classify(line: &str) -> LineEvent {
    let line = line.trim();
    if line.is_empty() {
        return LineEvent::Empty;
    }

    if line == START_MARKER {
        return LineEvent::StartMarker;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();

    if let [name, value] = tokens.as_slice() {
        if let (Some(capability), Some(value)) = (Capability::from_name(name), parse_flag(value)) {
            return LineEvent::HandshakeFlag { capability, value };
        }
    }

    LineEvent::DataRecord {
        tokens: tokens.into_iter().map(str::to_owned).collect(),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        FLAG_TRUE => Some(true),
        FLAG_FALSE => Some(false),
        _ => None,
    }
}
