//! Rolling average of frame delta-times.
//!
//! Predictions are sampled at horizons proportional to the frame time, so a
//! single long frame would make the whole predicted trajectory jump. The
//! controller smooths the raw frame time over a short window instead.

use std::collections::VecDeque;

use crate::spring::sanitize_dt;

/// Default number of frames averaged by [`DeltaTimeWindow`].
pub const DELTA_TIME_WINDOW_SIZE: usize = 20;

/// Bounded FIFO of the most recent frame delta-times with a running sum.
#[derive(Debug, Clone)]
pub struct DeltaTimeWindow {
    samples: VecDeque<f32>,
    capacity: usize,
    sum: f64,
    /// Evictions since the sum was last rebuilt from the queue.
    evictions: usize,
}

impl Default for DeltaTimeWindow {
    fn default() -> Self {
        Self::new(DELTA_TIME_WINDOW_SIZE)
    }
}

impl DeltaTimeWindow {
    /// Create an empty window holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
            evictions: 0,
        }
    }

    /// Record a frame delta, evicting the oldest sample when full.
    ///
    /// Negative and NaN deltas are stored as zero.
    pub fn push(&mut self, dt: f32) {
        let dt = sanitize_dt(dt);

        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= f64::from(oldest);
                self.evictions += 1;
            }
        }
        self.samples.push_back(dt);
        self.sum += f64::from(dt);

        // Rebuild once per full turnover so subtraction error cannot build up.
        if self.evictions >= self.capacity {
            self.sum = self.samples.iter().copied().map(f64::from).sum();
            self.evictions = 0;
        }
    }

    /// Average of the queued samples, or zero when empty.
    pub fn average(&self) -> f32 {
        if self.samples.is_empty() {
            0.0
        } else {
            (self.sum / self.samples.len() as f64) as f32
        }
    }

    /// Running sum of the queued samples.
    pub fn sum(&self) -> f32 {
        self.sum as f32
    }

    /// Number of queued samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
        self.evictions = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_averages_to_zero() {
        let window = DeltaTimeWindow::default();
        assert!(window.is_empty());
        assert_eq!(window.average(), 0.0);
        assert_eq!(window.capacity(), DELTA_TIME_WINDOW_SIZE);
    }

    #[test]
    fn keeps_only_most_recent_samples() {
        let mut window = DeltaTimeWindow::new(20);
        for i in 0..25 {
            window.push(i as f32 * 0.001);
        }

        assert_eq!(window.len(), 20);
        let kept: Vec<f32> = window.samples().collect();
        assert!((kept[0] - 5.0 * 0.001).abs() < 1e-9);
        assert!((kept[19] - 24.0 * 0.001).abs() < 1e-9);

        let expected: f32 = (5..25).map(|i| i as f32 * 0.001).sum();
        assert!((window.sum() - expected).abs() < 1e-6);
        assert!((window.average() - expected / 20.0).abs() < 1e-7);
    }

    #[test]
    fn sum_does_not_drift() {
        let mut window = DeltaTimeWindow::new(20);
        let deltas = [1.0 / 144.0, 1.0 / 30.0, 0.1, 1.0 / 60.0, 0.0003];
        for i in 0..100_000 {
            window.push(deltas[i % deltas.len()]);
        }

        let exact: f32 = window.samples().sum();
        assert!((window.sum() - exact).abs() < 1e-6);
    }

    #[test]
    fn invalid_deltas_count_as_zero() {
        let mut window = DeltaTimeWindow::new(4);
        window.push(-1.0);
        window.push(f32::NAN);
        window.push(0.02);
        assert_eq!(window.len(), 3);
        assert!((window.sum() - 0.02).abs() < 1e-7);
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let mut window = DeltaTimeWindow::new(0);
        window.push(0.1);
        window.push(0.2);
        assert_eq!(window.len(), 1);
        assert!((window.average() - 0.2).abs() < 1e-7);
    }

    #[test]
    fn clear_resets() {
        let mut window = DeltaTimeWindow::default();
        window.push(0.016);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.sum(), 0.0);
    }
}
