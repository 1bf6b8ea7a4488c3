//! # IMU Scope Library
//!
//! Decode inertial sensor telemetry received over a serial link and keep
//! bounded, auto-ranged plot windows for each signal group.
//!
//! The sensor first announces its optional capabilities (magnetometer,
//! temperature), sends `Start`, then streams whitespace-separated numeric
//! records. [`protocol`] turns those lines into typed samples, [`plot`] keeps
//! the recent history per group, and [`monitor`] glues the two together.

pub mod config;
pub mod console;
pub mod error;
pub mod monitor;
pub mod plot;
pub mod protocol;
pub mod serial;
pub mod telemetry;
