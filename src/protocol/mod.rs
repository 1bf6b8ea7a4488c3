//! # Sensor Line Protocol Module
//!
//! Implementation of the line-oriented IMU telemetry protocol.
//!
//! This module handles:
//! - Classifying raw text lines into protocol events
//! - Capability handshake (magnetometer, temperature)
//! - Fixed-width numeric record validation
//! - Typed sample extraction with unit conversion

pub mod wire;
pub mod line;
pub mod state;
