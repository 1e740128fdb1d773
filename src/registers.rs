// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Register map and field encodings of the TCS3400 RGBC light sensor
//!
//! The enums here are the typed form of the raw register fields: analog
//! gain (AGAIN), integration time (ATIME), wait time (WTIME), interrupt
//! persistence (APERS), and the ENABLE / STATUS bit sets.

use std::fmt;

/// 7-bit I2C address of the sensor
pub const DEVICE_ADDRESS: u8 = 0x39;

/// Register addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    /// Power, ADC, wait and interrupt enables
    Enable = 0x80,
    /// Integration time
    Atime = 0x81,
    /// Wait time
    Wtime = 0x83,
    /// Clear interrupt low threshold, low byte
    Ailtl = 0x84,
    /// Clear interrupt low threshold, high byte
    Ailth = 0x85,
    /// Clear interrupt high threshold, low byte
    Aihtl = 0x86,
    /// Clear interrupt high threshold, high byte
    Aihth = 0x87,
    /// Interrupt persistence filter
    Pers = 0x8C,
    /// Configuration (WLONG)
    Config = 0x8D,
    /// Gain control
    Control = 0x8F,
    /// Auxiliary (saturation interrupt enable)
    Aux = 0x90,
    /// Revision id
    RevId = 0x91,
    /// Device id
    Id = 0x92,
    /// Device status
    Status = 0x93,
    /// Clear channel data, low byte
    CdataL = 0x94,
    /// Clear channel data, high byte
    CdataH = 0x95,
    /// Red channel data, low byte
    RdataL = 0x96,
    /// Red channel data, high byte
    RdataH = 0x97,
    /// Green channel data, low byte
    GdataL = 0x98,
    /// Green channel data, high byte
    GdataH = 0x99,
    /// Blue channel data, low byte
    BdataL = 0x9A,
    /// Blue channel data, high byte
    BdataH = 0x9B,
    /// IR sensor access
    Ir = 0xC0,
    /// Force interrupt
    IForce = 0xE4,
    /// Clear channel interrupt clear
    CiClear = 0xE6,
    /// Clear all interrupts
    AiClear = 0xE7,
}

impl Register {
    /// Register address byte
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Analog gain (AGAIN field of the CONTROL register)
///
/// Ordered from least to most sensitive. Stepping is clamped at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Gain {
    /// 1x
    X1 = 0,
    /// 4x
    X4 = 1,
    /// 16x
    #[default]
    X16 = 2,
    /// 64x
    X64 = 3,
}

impl Gain {
    /// All gain levels, lowest first
    pub const ALL: [Gain; 4] = [Gain::X1, Gain::X4, Gain::X16, Gain::X64];

    /// AGAIN field code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode the AGAIN field (only the two low bits are significant)
    pub fn from_code(code: u8) -> Self {
        match code & 0x3 {
            0 => Gain::X1,
            1 => Gain::X4,
            2 => Gain::X16,
            _ => Gain::X64,
        }
    }

    /// Amplification factor
    pub fn multiplier(self) -> u32 {
        match self {
            Gain::X1 => 1,
            Gain::X4 => 4,
            Gain::X16 => 16,
            Gain::X64 => 64,
        }
    }

    /// Next more sensitive level, saturating at 64x
    pub fn step_up(self) -> Self {
        match self {
            Gain::X1 => Gain::X4,
            Gain::X4 => Gain::X16,
            Gain::X16 | Gain::X64 => Gain::X64,
        }
    }

    /// Next less sensitive level, saturating at 1x
    pub fn step_down(self) -> Self {
        match self {
            Gain::X1 | Gain::X4 => Gain::X1,
            Gain::X16 => Gain::X4,
            Gain::X64 => Gain::X16,
        }
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

/// Above this many milliseconds of integration the 16-bit counter
/// saturates before the analog front end does.
pub const DIGITAL_SATURATION_CUTOFF_MS: u32 = 154;

/// Full-scale count of a 16-bit channel
pub const DIGITAL_SATURATION_COUNT: u32 = 65_535;

/// Clear-channel count above which a reading is saturated for an
/// integration time of `integration_ms` whole milliseconds.
pub fn saturation_count_ms(integration_ms: u32) -> u32 {
    if integration_ms > DIGITAL_SATURATION_CUTOFF_MS {
        DIGITAL_SATURATION_COUNT
    } else {
        1024 * (integration_ms / 3)
    }
}

/// Integration time (ATIME register)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegrationTime {
    /// 2.78 ms, 1 cycle
    Ms2_78,
    /// 27.8 ms, 10 cycles
    Ms27_8,
    /// 103 ms, 37 cycles
    Ms103,
    /// 178 ms, 64 cycles
    Ms178,
    /// 712 ms, 256 cycles
    Ms712,
}

impl IntegrationTime {
    /// All integration times, shortest first
    pub const ALL: [IntegrationTime; 5] = [
        IntegrationTime::Ms2_78,
        IntegrationTime::Ms27_8,
        IntegrationTime::Ms103,
        IntegrationTime::Ms178,
        IntegrationTime::Ms712,
    ];

    /// ATIME register value
    pub fn code(self) -> u8 {
        match self {
            IntegrationTime::Ms2_78 => 0xFF,
            IntegrationTime::Ms27_8 => 0xF6,
            IntegrationTime::Ms103 => 0xDB,
            IntegrationTime::Ms178 => 0xC0,
            IntegrationTime::Ms712 => 0x00,
        }
    }

    /// Decode an ATIME register value; only the tabulated codes are accepted
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Duration in microseconds
    pub fn micros(self) -> u32 {
        match self {
            IntegrationTime::Ms2_78 => 2_780,
            IntegrationTime::Ms27_8 => 27_800,
            IntegrationTime::Ms103 => 103_000,
            IntegrationTime::Ms178 => 178_000,
            IntegrationTime::Ms712 => 712_000,
        }
    }

    /// Duration in whole milliseconds (truncated)
    pub fn millis(self) -> u32 {
        self.micros() / 1000
    }

    /// Clear-channel count above which a reading is saturated
    pub fn saturation_count(self) -> u32 {
        saturation_count_ms(self.millis())
    }
}

impl fmt::Display for IntegrationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let us = self.micros();
        write!(f, "{}.{:02}ms", us / 1000, (us % 1000) / 10)
    }
}

/// Wait time between conversions (WTIME register), same code table as ATIME
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaitTime(pub IntegrationTime);

impl WaitTime {
    /// WTIME register value
    pub fn code(self) -> u8 {
        self.0.code()
    }
}

/// Interrupt persistence filter (APERS field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Persistence {
    /// Interrupt on every conversion cycle
    #[default]
    Every,
    /// Any value outside the threshold range
    Any,
    /// N consecutive values out of range; N is one of 2, 3, 5, 10, ..., 60
    Consecutive(u8),
}

impl Persistence {
    /// APERS field code (low nibble of PERS)
    pub fn code(self) -> u8 {
        match self {
            Persistence::Every => 0,
            Persistence::Any => 1,
            Persistence::Consecutive(n) => match n {
                0..=2 => 2,
                3 => 3,
                4..=5 => 4,
                // 10, 15, ..., 60 map to codes 5..15
                _ => 3 + n.min(60) / 5,
            },
        }
    }
}

/// ENABLE register bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Enable(u8);

impl Enable {
    /// Power on
    pub const PON: u8 = 1 << 0;
    /// RGBC ADC enable
    pub const AEN: u8 = 1 << 1;
    /// Wait enable
    pub const WEN: u8 = 1 << 3;
    /// ALS interrupt enable
    pub const AIEN: u8 = 1 << 4;
    /// Sleep after interrupt
    pub const SAI: u8 = 1 << 6;

    /// Build from raw bits
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw register value
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether the given bit(s) are set
    pub fn contains(self, bits: u8) -> bool {
        self.0 & bits == bits
    }
}

/// Power states the metering loop drives the sensor through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Powered, converting, raising data-ready interrupts
    Active,
    /// Powered but not converting (low-power, fast restart)
    Idle,
    /// Fully powered down
    Off,
}

impl PowerState {
    /// ENABLE register contents for this state
    pub fn enable(self) -> Enable {
        match self {
            PowerState::Active => Enable(Enable::PON | Enable::AEN | Enable::AIEN),
            PowerState::Idle => Enable(Enable::PON),
            PowerState::Off => Enable(0),
        }
    }
}

/// STATUS register bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status(u8);

impl Status {
    /// RGBC conversion complete
    pub const AVALID: u8 = 1 << 0;
    /// ALS interrupt pending
    pub const AINT: u8 = 1 << 4;
    /// ALS saturation
    pub const ASAT: u8 = 1 << 7;

    /// Build from raw bits
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw register value
    pub fn bits(self) -> u8 {
        self.0
    }

    /// A complete conversion is available
    pub fn is_valid(self) -> bool {
        self.0 & Self::AVALID != 0
    }

    /// An interrupt is pending
    pub fn interrupt(self) -> bool {
        self.0 & Self::AINT != 0
    }

    /// The analog front end reported saturation
    pub fn saturated(self) -> bool {
        self.0 & Self::ASAT != 0
    }
}
