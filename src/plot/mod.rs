//! # Plot Window Module
//!
//! Bounded, auto-ranged time series for live charts.
//!
//! This module handles:
//! - Per-axis (X/Y/Z) point history for one signal group
//! - Quantized value-axis ranges with one unit of headroom
//! - Eviction of the oldest points to bound memory and render cost
//! - Scrolling visible time window
//!
//! Rendering is left to the caller: [`window::PlotSnapshot`] carries
//! everything a chart needs.

pub mod window;

pub use window::{PlotMeta, PlotSnapshot, TimedPoint, WindowBuffer};
