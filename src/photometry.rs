// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Raw counts to lux to exposure value
//!
//! The conversion is pure integer arithmetic so that the same reading
//! always yields the same EV, bit for bit:
//!
//! 1. estimate the infrared share as `(R + G + B - C) / 2`
//! 2. subtract it from each color channel
//! 3. weight the channels with the part's correction coefficients and sum
//! 4. divide by counts-per-lux, `atime_us * gain / (GA * DF)`
//! 5. scale by `iso / 250` and take the Q14 log2, offset onto the EV scale

use crate::fixed::{self, EV_OFFSET_FIXED};
use crate::reading::SensorReading;
use crate::registers::{Gain, IntegrationTime};
use std::fmt;

/// Red channel correction coefficient
pub const RED_COEFFICIENT: i64 = -20;

/// Green channel correction coefficient
pub const GREEN_COEFFICIENT: i64 = 1000;

/// Blue channel correction coefficient
pub const BLUE_COEFFICIENT: i64 = -482;

/// Glass attenuation factor (bare sensor)
pub const GLASS_ATTENUATION: u32 = 1;

/// Default device factor
pub const DEFAULT_DEVICE_FACTOR: u16 = 100;

/// Divisor of `lux * iso` giving the log2 argument
pub const ISO_LUX_DIVISOR: i64 = 250;

/// Scaled lux below this is metered as EV 0
pub const MIN_SCALED_LUX: i64 = 2;

/// Photographic exposure value in Q14 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ExposureValue(i32);

impl ExposureValue {
    /// EV 0, the floor for near-dark readings
    pub const ZERO: ExposureValue = ExposureValue(0);

    /// Wrap a raw Q14 value
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Whole EV as a Q14 value
    pub fn from_int(ev: i32) -> Self {
        Self(ev << fixed::FRACTIONAL_BITS)
    }

    /// Raw Q14 value
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Integer part (floor)
    pub fn whole(self) -> i32 {
        fixed::whole_part(self.0)
    }

    /// Nearest integer EV, halves rounding up
    pub fn rounded(self) -> i32 {
        fixed::round_to_int(self.0)
    }

    /// First decimal digit, rounded on the second
    pub fn frac_digit(self) -> u8 {
        fixed::frac_decimal_digit(self.0)
    }

    /// Value in tenths of a stop
    pub fn tenths(self) -> i32 {
        fixed::to_tenths(self.0)
    }

    /// Floating-point view, for diagnostics only
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(fixed::ONE)
    }
}

impl fmt::Display for ExposureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = self.tenths();
        let sign = if tenths < 0 { "-" } else { "" };
        let abs = tenths.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

/// Inputs that shape a conversion besides the reading itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionParams {
    /// Gain the reading was taken with
    pub gain: Gain,
    /// Integration time the reading was taken with
    pub integration_time: IntegrationTime,
    /// Device factor (calibration)
    pub device_factor: u16,
    /// Film / sensor sensitivity
    pub iso: u32,
}

/// Intermediate and final values of one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Photometry {
    /// Estimated infrared counts
    pub ir: i32,
    /// Counts per lux used for normalization
    pub counts_per_lux: u32,
    /// Illuminance, clamped at zero
    pub lux: u32,
    /// `lux * iso / 250`
    pub scaled_lux: u32,
    /// Resulting exposure value
    pub ev: ExposureValue,
}

/// Infrared estimate `(R + G + B - C) / 2`, truncated toward zero
pub fn ir_component(reading: &SensorReading) -> i32 {
    (reading.rgb_sum() as i32 - i32::from(reading.clear)) / 2
}

/// Weighted sum of the IR-corrected color channels
pub fn weighted_channel_sum(reading: &SensorReading) -> i64 {
    let ir = i64::from(ir_component(reading));
    let red = i64::from(reading.red) - ir;
    let green = i64::from(reading.green) - ir;
    let blue = i64::from(reading.blue) - ir;
    red * RED_COEFFICIENT + green * GREEN_COEFFICIENT + blue * BLUE_COEFFICIENT
}

/// Counts per lux for the given settings, never less than 1
pub fn counts_per_lux(gain: Gain, time: IntegrationTime, device_factor: u16) -> u32 {
    let denominator = GLASS_ATTENUATION * u32::from(device_factor.max(1));
    ((time.micros() * gain.multiplier()) / denominator).max(1)
}

/// Illuminance in lux, negative estimates clamped to 0
pub fn lux(reading: &SensorReading, gain: Gain, time: IntegrationTime, device_factor: u16) -> u32 {
    let cpl = i64::from(counts_per_lux(gain, time, device_factor));
    let lux = weighted_channel_sum(reading) / cpl;
    lux.clamp(0, i64::from(u32::MAX)) as u32
}

/// Exposure value of an illuminance at the given ISO
pub fn exposure_value(lux: u32, iso: u32) -> ExposureValue {
    let scaled = scaled_lux(lux, iso);
    if i64::from(scaled) < MIN_SCALED_LUX {
        return ExposureValue::ZERO;
    }
    ExposureValue(fixed::log2_fixed(scaled) + EV_OFFSET_FIXED)
}

fn scaled_lux(lux: u32, iso: u32) -> u32 {
    let scaled = i64::from(lux) * i64::from(iso) / ISO_LUX_DIVISOR;
    scaled.min(i64::from(u32::MAX)) as u32
}

/// Full conversion of an accepted reading
pub fn convert(reading: &SensorReading, params: &ConversionParams) -> Photometry {
    let lux = lux(
        reading,
        params.gain,
        params.integration_time,
        params.device_factor,
    );
    Photometry {
        ir: ir_component(reading),
        counts_per_lux: counts_per_lux(
            params.gain,
            params.integration_time,
            params.device_factor,
        ),
        lux,
        scaled_lux: scaled_lux(lux, params.iso),
        ev: exposure_value(lux, params.iso),
    }
}
