// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Shutter speed selection
//!
//! EV, aperture and shutter speed are additive in stops, so the bucket is
//! the EV minus the aperture index, offset so that EV 1 at f/1.4 gives
//! one second (f/1.4 squared is 2, and log2(2 / 1s) = 1).

use crate::settings::Aperture;
use std::fmt;

/// Shutter speed denominators, 1s first, one stop apart
pub const SHUTTER_SPEEDS: [u16; 14] = [
    1, 2, 4, 8, 15, 30, 60, 125, 250, 500, 1000, 2000, 4000, 8000,
];

/// EV at which the widest aperture needs a one second exposure
pub const ONE_SECOND_EV: i32 = 1;

/// One entry of [`SHUTTER_SPEEDS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShutterSpeed(usize);

impl ShutterSpeed {
    /// Table index
    pub fn index(self) -> usize {
        self.0
    }

    /// Denominator of the exposure time (1 = 1s, 125 = 1/125s)
    pub fn denominator(self) -> u16 {
        SHUTTER_SPEEDS[self.0]
    }
}

impl fmt::Display for ShutterSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.denominator() {
            1 => write!(f, "1s"),
            d => write!(f, "1/{}", d),
        }
    }
}

/// Outcome of shutter speed selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterSpeedResult {
    /// A tabulated speed
    Value(ShutterSpeed),
    /// Too dark for the slowest speed at this aperture
    TooSlow,
    /// Too bright for the fastest speed at this aperture
    TooFast,
}

impl ShutterSpeedResult {
    /// Short display text: the denominator, or "LO" / "HI"
    pub fn display_text(&self) -> String {
        match self {
            ShutterSpeedResult::Value(speed) => speed.denominator().to_string(),
            ShutterSpeedResult::TooSlow => "LO".to_string(),
            ShutterSpeedResult::TooFast => "HI".to_string(),
        }
    }

    /// The selected speed, if in range
    pub fn speed(&self) -> Option<ShutterSpeed> {
        match self {
            ShutterSpeedResult::Value(speed) => Some(*speed),
            _ => None,
        }
    }
}

impl fmt::Display for ShutterSpeedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutterSpeedResult::Value(speed) => write!(f, "{}", speed),
            ShutterSpeedResult::TooSlow => write!(f, "LO"),
            ShutterSpeedResult::TooFast => write!(f, "HI"),
        }
    }
}

/// Pick the shutter speed for an integer EV at the given aperture
pub fn pick_shutter_speed(ev: i32, aperture: Aperture) -> ShutterSpeedResult {
    let bucket = i64::from(ev) - i64::from(ONE_SECOND_EV) - aperture.index() as i64;
    if bucket < 0 {
        ShutterSpeedResult::TooSlow
    } else if bucket >= SHUTTER_SPEEDS.len() as i64 {
        ShutterSpeedResult::TooFast
    } else {
        ShutterSpeedResult::Value(ShutterSpeed(bucket as usize))
    }
}
