//! # Telemetry Module
//!
//! Records decoded samples to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting accepted records as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod recorder;

pub use recorder::{SampleFrame, SampleRecorder};
