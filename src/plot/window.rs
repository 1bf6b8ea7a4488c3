//! # Window Buffer
//!
//! Sliding X/Y/Z history for one signal group.
//!
//! Every [`WindowBuffer::update`] advances the clock by a fixed step, appends
//! one point per axis, recomputes the value range from the whole history and
//! evicts the oldest points once the history grows past its capacity. The
//! three series are always appended and evicted together, so they keep equal
//! lengths.
//!
//! ## Value range
//!
//! With `u` the group's ceil unit:
//!
//! ```text
//! low  = ceil(min / u) * u - u
//! high = ceil(max / u) * u + u
//! ```
//!
//! ## Usage
//!
//! ```
//! use imu_scope::plot::{PlotMeta, WindowBuffer};
//! use imu_scope::protocol::wire::Sample3;
//!
//! let mut plot = WindowBuffer::new(PlotMeta::new("Acceleration", "m/s^2", 10.0), 0.1);
//! let snapshot = plot.update(Sample3::new(9.8, 0.0, -3.0));
//!
//! assert_eq!(snapshot.y_range, (-10.0, 20.0));
//! assert_eq!(snapshot.x_points.len(), 1);
//! ```

use std::collections::VecDeque;

use crate::protocol::wire::Sample3;

/// Points kept per axis before eviction kicks in
pub const DEFAULT_MAX_POINTS: usize = 50;

/// Points removed from the front of each axis per eviction
pub const DEFAULT_EVICT_COUNT: usize = 2;

/// Width of the visible time window
pub const DEFAULT_VISIBLE_SPAN: f64 = 3.0;

/// One scalar observation of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPoint {
    pub t: f64,
    pub v: f64,
}

/// Chart labels and scale unit for a signal group
#[derive(Debug, Clone, PartialEq)]
pub struct PlotMeta {
    pub title: String,
    pub unit: String,
    /// Quantization unit for the value axis
    pub ceil: f64,
}

impl PlotMeta {
    pub fn new(title: impl Into<String>, unit: impl Into<String>, ceil: f64) -> Self {
        Self {
            title: title.into(),
            unit: unit.into(),
            ceil,
        }
    }
}

/// Everything a renderer needs to draw the current window
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSnapshot {
    pub x_points: Vec<TimedPoint>,
    pub y_points: Vec<TimedPoint>,
    pub z_points: Vec<TimedPoint>,
    /// Value axis (low, high)
    pub y_range: (f64, f64),
    /// Time axis (start, end)
    pub x_range: (f64, f64),
}

/// Bounded auto-ranging history for one signal group
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    meta: PlotMeta,
    series: [VecDeque<TimedPoint>; 3],
    clock: f64,
    step: f64,
    capacity_hint: usize,
    evict_count: usize,
    visible_span: f64,
    y_range: (f64, f64),
}

impl WindowBuffer {
    /// Create an empty buffer with the default capacity and visible span
    ///
    /// # Arguments
    ///
    /// * `meta` - Labels and ceil unit of the group
    /// * `step` - Clock advance per update
    pub fn new(meta: PlotMeta, step: f64) -> Self {
        Self::with_limits(meta, step, DEFAULT_MAX_POINTS, DEFAULT_EVICT_COUNT, DEFAULT_VISIBLE_SPAN)
    }

    /// Create an empty buffer with explicit limits
    ///
    /// `evict_count` is clamped to `1..=capacity_hint + 1` so every eviction
    /// makes progress without emptying the window.
    pub fn with_limits(
        meta: PlotMeta,
        step: f64,
        capacity_hint: usize,
        evict_count: usize,
        visible_span: f64,
    ) -> Self {
        let initial = (-meta.ceil, meta.ceil);
        Self {
            meta,
            series: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            clock: 0.0,
            step,
            capacity_hint,
            evict_count: evict_count.clamp(1, capacity_hint.saturating_add(1)),
            visible_span,
            y_range: initial,
        }
    }

    pub fn meta(&self) -> &PlotMeta {
        &self.meta
    }

    /// Current time of the newest point
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Points per axis
    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one sample and return the updated window
    pub fn update(&mut self, sample: Sample3) -> PlotSnapshot {
        self.clock += self.step;

        for (series, value) in self.series.iter_mut().zip(sample.axes()) {
            series.push_back(TimedPoint { t: self.clock, v: value });
        }

        if let Some((min, max)) = self.extrema() {
            self.y_range = quantized_range(min, max, self.meta.ceil);
        }

        if self.len() > self.capacity_hint {
            for series in &mut self.series {
                series.drain(..self.evict_count.min(series.len()));
            }
        }

        self.snapshot()
    }

    /// Current window without modifying it
    pub fn snapshot(&self) -> PlotSnapshot {
        let [x, y, z] = &self.series;
        PlotSnapshot {
            x_points: x.iter().copied().collect(),
            y_points: y.iter().copied().collect(),
            z_points: z.iter().copied().collect(),
            y_range: self.y_range,
            x_range: self.time_range(),
        }
    }

    /// Drop every point and rewind the clock
    pub fn clear(&mut self) {
        for series in &mut self.series {
            series.clear();
        }
        self.clock = 0.0;
        self.y_range = (-self.meta.ceil, self.meta.ceil);
    }

    fn time_range(&self) -> (f64, f64) {
        if self.clock < self.visible_span {
            (0.0, self.clock)
        } else {
            (self.clock - self.visible_span, self.clock)
        }
    }

    fn extrema(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flatten()
            .map(|point| point.v)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }
}

/// Value-axis range around `[min, max]` quantized to `unit`
///
/// Both ends are rounded up to a multiple of `unit`, then widened by one
/// `unit` in their own direction.
pub fn quantized_range(min: f64, max: f64, unit: f64) -> (f64, f64) {
    let low = (min / unit).ceil() * unit - unit;
    let high = (max / unit).ceil() * unit + unit;
    (low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f64 = 0.1;

    fn accel_plot() -> WindowBuffer {
        WindowBuffer::new(PlotMeta::new("Acceleration", "m/s^2", 10.0), STEP)
    }

    fn assert_equal_lengths(snapshot: &PlotSnapshot) {
        assert_eq!(snapshot.x_points.len(), snapshot.y_points.len());
        assert_eq!(snapshot.y_points.len(), snapshot.z_points.len());
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let plot = accel_plot();
        assert!(plot.is_empty());
        assert_eq!(plot.clock(), 0.0);

        let snapshot = plot.snapshot();
        assert!(snapshot.x_points.is_empty());
        assert_eq!(snapshot.y_range, (-10.0, 10.0));
        assert_eq!(snapshot.x_range, (0.0, 0.0));
    }

    #[test]
    fn test_first_update() {
        let mut plot = accel_plot();
        let snapshot = plot.update(Sample3::new(1.0, 2.0, 3.0));

        assert_eq!(snapshot.x_points, vec![TimedPoint { t: STEP, v: 1.0 }]);
        assert_eq!(snapshot.y_points, vec![TimedPoint { t: STEP, v: 2.0 }]);
        assert_eq!(snapshot.z_points, vec![TimedPoint { t: STEP, v: 3.0 }]);
        assert_eq!(snapshot.y_range, (0.0, 20.0));
        assert_eq!(snapshot.x_range, (0.0, STEP));
    }

    #[test]
    fn test_quantized_range() {
        assert_eq!(quantized_range(-3.0, 9.8, 10.0), (-10.0, 20.0));
        assert_eq!(quantized_range(-13.0, 10.0, 10.0), (-20.0, 20.0));
        assert_eq!(quantized_range(0.0, 0.0, 60.0), (-60.0, 60.0));
        assert_eq!(quantized_range(-120.0, 125.0, 60.0), (-180.0, 240.0));
    }

    #[test]
    fn test_eviction_after_51_samples() {
        let mut plot = accel_plot();
        for i in 0..50 {
            plot.update(Sample3::new(i as f64, 0.0, 0.0));
        }
        assert_eq!(plot.len(), 50);

        let snapshot = plot.update(Sample3::new(50.0, 0.0, 0.0));
        assert_equal_lengths(&snapshot);
        assert_eq!(snapshot.x_points.len(), 49);
        // The two oldest points are gone
        assert_eq!(snapshot.x_points[0].v, 2.0);
    }

    #[test]
    fn test_steady_state_length_oscillates() {
        let mut plot = accel_plot();
        for _ in 0..51 {
            plot.update(Sample3::default());
        }
        for _ in 0..200 {
            let snapshot = plot.update(Sample3::default());
            assert_equal_lengths(&snapshot);
            let len = snapshot.x_points.len();
            assert!(len == 49 || len == 50, "unexpected length {}", len);
        }
    }

    #[test]
    fn test_range_covers_visible_values() {
        let mut plot = WindowBuffer::new(PlotMeta::new("Gyroscope", "deg", 60.0), STEP);
        for i in 0..300 {
            let v = (i as f64 * 0.37).sin() * 170.0 + (i % 7) as f64 * 11.0;
            let snapshot = plot.update(Sample3::new(v, -v / 2.0, v * 0.8 - 40.0));
            let (low, high) = snapshot.y_range;

            let visible = snapshot
                .x_points
                .iter()
                .chain(&snapshot.y_points)
                .chain(&snapshot.z_points)
                .map(|p| p.v);
            for value in visible {
                assert!(low <= value && value <= high, "{} outside ({}, {})", value, low, high);
            }
            assert_eq!((low / 60.0).fract(), 0.0);
            assert_eq!((high / 60.0).fract(), 0.0);
        }
    }

    #[test]
    fn test_range_uses_full_history_not_latest() {
        let mut plot = accel_plot();
        plot.update(Sample3::new(35.0, 0.0, 0.0));
        let snapshot = plot.update(Sample3::new(1.0, 1.0, 1.0));
        assert_eq!(snapshot.y_range, (-10.0, 50.0));
    }

    #[test]
    fn test_time_window_scrolls() {
        let mut plot = WindowBuffer::new(PlotMeta::new("Acceleration", "m/s^2", 10.0), 0.5);
        let snapshot = plot.update(Sample3::default());
        assert_eq!(snapshot.x_range, (0.0, 0.5));

        for _ in 0..9 {
            plot.update(Sample3::default());
        }
        assert_eq!(plot.clock(), 5.0);
        assert_eq!(plot.snapshot().x_range, (2.0, 5.0));
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut plot = accel_plot();
        let mut previous = plot.clock();
        for _ in 0..120 {
            plot.update(Sample3::new(1.0, 1.0, 1.0));
            assert!(plot.clock() >= previous);
            previous = plot.clock();
        }
    }

    #[test]
    fn test_clear() {
        let mut plot = accel_plot();
        for _ in 0..10 {
            plot.update(Sample3::new(55.0, 0.0, 0.0));
        }
        plot.clear();

        assert!(plot.is_empty());
        assert_eq!(plot.clock(), 0.0);
        assert_eq!(plot.snapshot().y_range, (-10.0, 10.0));
    }

    #[test]
    fn test_custom_limits() {
        let meta = PlotMeta::new("Magnetic field", "T", 20.0);
        let mut plot = WindowBuffer::with_limits(meta, 1.0, 5, 3, 2.0);
        for _ in 0..6 {
            plot.update(Sample3::default());
        }
        assert_eq!(plot.len(), 3);
        assert_eq!(plot.snapshot().x_range, (4.0, 6.0));
    }

    #[test]
    fn test_unbounded_capacity_hint() {
        let meta = PlotMeta::new("Acceleration", "m/s^2", 10.0);
        let mut plot = WindowBuffer::with_limits(meta, 1.0, usize::MAX, 2, 3.0);
        for _ in 0..60 {
            plot.update(Sample3::new(1.0, 2.0, 3.0));
        }
        assert_eq!(plot.len(), 60);
        assert_eq!(plot.snapshot().x_range, (57.0, 60.0));
    }
}
