// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Raw RGBC sensor readings

use crate::registers::Status;

/// Size of the STATUS..BDATAH burst read in bytes
pub const BURST_LEN: usize = 9;

/// One capture of the four light channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorReading {
    /// A complete conversion was available when the data was read
    pub status_valid: bool,
    /// The sensor flagged analog saturation
    pub saturated: bool,
    /// Clear (unfiltered) channel count
    pub clear: u16,
    /// Red channel count
    pub red: u16,
    /// Green channel count
    pub green: u16,
    /// Blue channel count
    pub blue: u16,
}

impl SensorReading {
    /// Create a valid reading from channel counts
    pub fn new(clear: u16, red: u16, green: u16, blue: u16) -> Self {
        Self {
            status_valid: true,
            saturated: false,
            clear,
            red,
            green,
            blue,
        }
    }

    /// A reading whose conversion was not complete yet
    pub fn not_ready() -> Self {
        Self::default()
    }

    /// Decode the burst starting at the STATUS register.
    ///
    /// Layout: status, then clear, red, green and blue as little-endian
    /// 16-bit pairs.
    pub fn from_burst(data: &[u8; BURST_LEN]) -> Self {
        let status = Status::from_bits(data[0]);
        let channel = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);
        Self {
            status_valid: status.is_valid(),
            saturated: status.saturated(),
            clear: channel(1),
            red: channel(3),
            green: channel(5),
            blue: channel(7),
        }
    }

    /// Sum of the three color channels
    pub fn rgb_sum(&self) -> u32 {
        u32::from(self.red) + u32::from(self.green) + u32::from(self.blue)
    }
}
