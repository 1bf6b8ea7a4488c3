//! # Wire Format Constants and Types
//!
//! Core definitions for the sensor's text protocol.

use serde::Serialize;

/// Handshake line that ends capability negotiation
pub const START_MARKER: &str = "Start";

/// Handshake flag name announcing a magnetometer
pub const MAGNETOMETER_FLAG: &str = "Magnetometer";

/// Handshake flag name announcing a temperature sensor
pub const TEMPERATURE_FLAG: &str = "Temperature";

/// Literal for an enabled handshake flag
pub const FLAG_TRUE: &str = "True";

/// Literal for a disabled handshake flag
pub const FLAG_FALSE: &str = "False";

/// Fields always present in a record (3 accel + 3 gyro)
pub const BASE_FIELD_COUNT: usize = 6;

/// Fields added by a magnetometer
pub const MAGNETOMETER_FIELD_COUNT: usize = 3;

/// First accelerometer field
pub const ACCEL_OFFSET: usize = 0;

/// First gyroscope field
pub const GYRO_OFFSET: usize = 3;

/// First magnetometer field
pub const MAG_OFFSET: usize = 6;

/// Accelerometer values arrive in g and are converted to m/s²
pub const STANDARD_GRAVITY: f64 = 9.8;

/// One three-axis reading (acceleration, angular rate or field strength)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sample3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample3 {
    /// Create a new sample
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Multiply every axis by `factor`
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Axes in X, Y, Z order
    #[must_use]
    pub fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}
