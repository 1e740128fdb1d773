// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Gain / range controller
//!
//! Decides from each raw reading whether the sensor is saturated or
//! starved for signal, steps the analog gain accordingly, and tells the
//! caller whether the reading can be converted. It also runs the
//! integration-time retry protocol: the first reading of a measurement is
//! taken with a short integration for quick feedback, and once a reading
//! is accepted the sensor switches to the long, more accurate integration.

use crate::error::Result;
use crate::reading::SensorReading;
use crate::registers::{Gain, IntegrationTime, WaitTime};
use crate::transport::SensorTransport;
use log::debug;

/// Clear counts below this mean the gain is too low for a useful signal
pub const DEFAULT_UNDER_RANGE_COUNT: u16 = 100;

/// Verdict on one reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCheck {
    /// The conversion was not complete; nothing changed
    NotReady,
    /// Clear channel above the saturation threshold; gain was lowered
    Saturated {
        /// Gain now programmed
        gain: Gain,
    },
    /// Clear channel below the under-range count; gain was raised
    UnderRange {
        /// Gain now programmed
        gain: Gain,
    },
    /// Usable reading
    Accepted,
}

impl RangeCheck {
    /// A new reading is needed before a value can be shown
    pub fn needs_retry(&self) -> bool {
        matches!(self, Self::Saturated { .. } | Self::UnderRange { .. })
    }
}

/// Owner of the gain and integration-time settings
#[derive(Debug, Clone)]
pub struct RangeController {
    gain: Gain,
    integration_time: IntegrationTime,
    fast_integration: IntegrationTime,
    slow_integration: IntegrationTime,
    under_range_count: u16,
    retry_pending: bool,
}

impl RangeController {
    /// Create a controller with the given starting gain and the fast / slow
    /// integration pair. The fast integration is active initially.
    pub fn new(gain: Gain, fast: IntegrationTime, slow: IntegrationTime) -> Self {
        Self {
            gain,
            integration_time: fast,
            fast_integration: fast,
            slow_integration: slow,
            under_range_count: DEFAULT_UNDER_RANGE_COUNT,
            retry_pending: false,
        }
    }

    /// Override the under-range count
    pub fn with_under_range_count(mut self, count: u16) -> Self {
        self.under_range_count = count;
        self
    }

    /// Current gain
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Current integration time
    pub fn integration_time(&self) -> IntegrationTime {
        self.integration_time
    }

    /// A follow-up reading is outstanding
    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Clear count above which the current integration saturates
    pub fn saturation_threshold(&self) -> u32 {
        self.integration_time.saturation_count()
    }

    /// Program gain and the fast integration time, and mark the first
    /// reading as pending.
    pub fn arm<T: SensorTransport>(&mut self, transport: &mut T) -> Result<()> {
        self.set_gain(transport, self.gain)?;
        self.set_integration(transport, self.fast_integration)?;
        self.retry_pending = true;
        Ok(())
    }

    /// Forget any outstanding retry
    pub fn disarm(&mut self) {
        self.retry_pending = false;
    }

    /// Judge a reading, adjusting gain on the device when out of range
    pub fn check<T: SensorTransport>(
        &mut self,
        reading: &SensorReading,
        transport: &mut T,
    ) -> Result<RangeCheck> {
        if !reading.status_valid {
            return Ok(RangeCheck::NotReady);
        }

        let clear = u32::from(reading.clear);
        // The ASAT flag counts as saturation whatever the clear count says
        let check = if reading.saturated || clear > self.saturation_threshold() {
            self.set_gain(transport, self.gain.step_down())?;
            debug!(
                "clear {} saturates at {}, gain -> {}",
                clear, self.integration_time, self.gain
            );
            RangeCheck::Saturated { gain: self.gain }
        } else if clear < u32::from(self.under_range_count) {
            self.set_gain(transport, self.gain.step_up())?;
            debug!("clear {} under range, gain -> {}", clear, self.gain);
            RangeCheck::UnderRange { gain: self.gain }
        } else {
            RangeCheck::Accepted
        };

        self.advance_retry(check, transport)?;
        Ok(check)
    }

    /// Retry protocol: an accepted reading promotes to the slow integration,
    /// a rejected one falls back to the fast integration until accepted.
    fn advance_retry<T: SensorTransport>(
        &mut self,
        check: RangeCheck,
        transport: &mut T,
    ) -> Result<()> {
        match check {
            RangeCheck::Accepted if self.retry_pending => {
                self.set_integration(transport, self.slow_integration)?;
                self.retry_pending = false;
            }
            c if c.needs_retry() && !self.retry_pending => {
                self.set_integration(transport, self.fast_integration)?;
                self.retry_pending = true;
            }
            _ => {}
        }
        Ok(())
    }

    /// The device is written first; a failed write leaves the
    /// controller on the gain the device still runs at.
    fn set_gain<T: SensorTransport>(&mut self, transport: &mut T, gain: Gain) -> Result<()> {
        transport.write_gain(gain)?;
        self.gain = gain;
        Ok(())
    }

    /// Wait time follows the integration time so the conversion cadence
    /// tracks it.
    fn set_integration<T: SensorTransport>(
        &mut self,
        transport: &mut T,
        time: IntegrationTime,
    ) -> Result<()> {
        if self.integration_time != time {
            debug!("integration {} -> {}", self.integration_time, time);
        }
        transport.write_integration_time(time)?;
        self.integration_time = time;
        transport.write_wait_time(WaitTime(time))
    }
}

impl Default for RangeController {
    fn default() -> Self {
        Self::new(Gain::X16, IntegrationTime::Ms27_8, IntegrationTime::Ms103)
    }
}
