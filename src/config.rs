// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for the meter session

use crate::controller::DEFAULT_UNDER_RANGE_COUNT;
use crate::error::ConfigError;
use crate::photometry::DEFAULT_DEVICE_FACTOR;
use crate::registers::{Gain, IntegrationTime, Persistence};
use crate::settings::{IsoTable, DEFAULT_ISO};

/// Session-level configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MeterConfig {
    /// Gain programmed when the session is created (default: 16x)
    pub initial_gain: Gain,

    /// Integration time of the first, quick reading (default: 27.8ms)
    pub fast_integration: IntegrationTime,

    /// Integration time once a reading has been accepted (default: 103ms)
    pub slow_integration: IntegrationTime,

    /// Clear counts below this raise the gain (default: 100)
    pub under_range_count: u16,

    /// Device factor for counts-per-lux (default: 100)
    pub device_factor: u16,

    /// ISO values offered
    pub iso_table: IsoTable,

    /// ISO selected at start (default: 100)
    pub initial_iso: u32,

    /// Data-ready interrupt persistence
    pub persistence: Persistence,

    /// Tick rate while idle, Hz (default: 1)
    pub idle_tick_hz: u8,

    /// Tick rate while metering, Hz (default: 4)
    pub active_tick_hz: u8,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            initial_gain: Gain::X16,
            fast_integration: IntegrationTime::Ms27_8,
            slow_integration: IntegrationTime::Ms103,
            under_range_count: DEFAULT_UNDER_RANGE_COUNT,
            device_factor: DEFAULT_DEVICE_FACTOR,
            iso_table: IsoTable::Standard,
            initial_iso: DEFAULT_ISO,
            persistence: Persistence::Every,
            idle_tick_hz: 1,
            active_tick_hz: 4,
        }
    }
}

impl MeterConfig {
    /// Default configuration with a custom device factor
    pub fn with_device_factor(device_factor: u16) -> Self {
        Self {
            device_factor,
            ..Default::default()
        }
    }

    /// Configuration with the extended ISO table
    pub fn extended_iso() -> Self {
        Self {
            iso_table: IsoTable::Extended,
            ..Default::default()
        }
    }

    /// Override the fast / slow integration pair
    pub fn with_integration(mut self, fast: IntegrationTime, slow: IntegrationTime) -> Self {
        self.fast_integration = fast;
        self.slow_integration = slow;
        self
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_integration >= self.slow_integration {
            return Err(ConfigError::IntegrationOrder {
                fast_us: self.fast_integration.micros(),
                slow_us: self.slow_integration.micros(),
            });
        }
        if self.idle_tick_hz == 0 || self.active_tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        // Must be reachable from below at the shortest integration in use
        let saturation = self.fast_integration.saturation_count();
        if u32::from(self.under_range_count) >= saturation {
            return Err(ConfigError::UnderRangeTooHigh {
                count: self.under_range_count,
                saturation,
            });
        }
        if !self.iso_table.contains(self.initial_iso) {
            return Err(ConfigError::IsoNotInTable {
                iso: self.initial_iso,
            });
        }
        Ok(())
    }
}
