// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Metering loop statistics
//!
//! Counters describing how the auto-ranging loop behaved: how many polls
//! it took to converge, how often the gain had to move, and so on.

use crate::controller::RangeCheck;

/// Poll outcome counters for one meter session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeterMetrics {
    /// Total polls handled
    pub polls: u64,
    /// Polls with no complete conversion (or no reading at all)
    pub not_ready: u64,
    /// Readings rejected as saturated
    pub saturated: u64,
    /// Readings rejected as under range
    pub under_range: u64,
    /// Readings converted to an EV
    pub accepted: u64,
    /// Accepted readings that hit the dark floor (EV 0)
    pub dark_floor: u64,
    /// Measurements started
    pub measurements: u64,
}

impl MeterMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the controller's verdict on a poll
    pub fn record_check(&mut self, check: RangeCheck) {
        self.polls += 1;
        match check {
            RangeCheck::NotReady => self.not_ready += 1,
            RangeCheck::Saturated { .. } => self.saturated += 1,
            RangeCheck::UnderRange { .. } => self.under_range += 1,
            RangeCheck::Accepted => self.accepted += 1,
        }
    }

    /// Gain adjustments made
    pub fn gain_changes(&self) -> u64 {
        self.saturated + self.under_range
    }

    /// Fraction of valid readings that were accepted (0.0 - 1.0)
    pub fn acceptance_rate(&self) -> f64 {
        let valid = self.accepted + self.gain_changes();
        if valid == 0 {
            return 0.0;
        }
        self.accepted as f64 / valid as f64
    }

    /// Average polls per accepted reading
    pub fn polls_per_accept(&self) -> Option<f64> {
        if self.accepted == 0 {
            return None;
        }
        Some(self.polls as f64 / self.accepted as f64)
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::Gain;

    #[test]
    fn test_record_checks() {
        let mut metrics = MeterMetrics::new();
        metrics.record_check(RangeCheck::NotReady);
        metrics.record_check(RangeCheck::Saturated { gain: Gain::X4 });
        metrics.record_check(RangeCheck::UnderRange { gain: Gain::X16 });
        metrics.record_check(RangeCheck::Accepted);

        assert_eq!(metrics.polls, 4);
        assert_eq!(metrics.gain_changes(), 2);
        assert!((metrics.acceptance_rate() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.polls_per_accept(), Some(4.0));
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = MeterMetrics::new();
        assert_eq!(metrics.acceptance_rate(), 0.0);
        assert_eq!(metrics.polls_per_accept(), None);
    }

    #[test]
    fn test_reset() {
        let mut metrics = MeterMetrics::new();
        metrics.record_check(RangeCheck::Accepted);
        metrics.reset();
        assert_eq!(metrics, MeterMetrics::default());
    }
}
