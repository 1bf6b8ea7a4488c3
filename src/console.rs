//! # Console Sink
//!
//! Append-only text output shown to the operator: every received line plus
//! connection and decoding notices.

use tracing::info;

/// Append-only console
///
/// Implementations must never fail and must preserve ordering.
#[cfg_attr(test, mockall::automock)]
pub trait ConsoleSink {
    fn append(&mut self, text: &str);
}

/// Console that forwards every line to `tracing` under the `console` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn append(&mut self, text: &str) {
        info!(target: "console", "{}", text);
    }
}

/// In-memory console, oldest line first
impl ConsoleSink for Vec<String> {
    fn append(&mut self, text: &str) {
        self.push(text.to_string());
    }
}
