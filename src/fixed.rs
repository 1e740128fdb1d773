// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Q14 fixed-point helpers
//!
//! All photometric math runs on integers. Values are signed 32-bit with
//! [`FRACTIONAL_BITS`] bits of fraction, so `1 << 14` represents 1.0.
//!
//! The logarithm follows the classic binary digit-recurrence algorithm
//! (Dan Moulding's `log2fix`): normalise the argument into `[1, 2)`
//! counting the shifts, then square repeatedly and read off one fractional
//! bit per iteration.

/// Number of fractional bits in the Q14 representation
pub const FRACTIONAL_BITS: u32 = 14;

/// 1.0 in Q14
pub const ONE: i32 = 1 << FRACTIONAL_BITS;

/// 0.5 in Q14
pub const HALF: i32 = 1 << (FRACTIONAL_BITS - 1);

/// Mask selecting the fractional bits
pub const FRAC_MASK: i32 = (1 << FRACTIONAL_BITS) - 1;

/// Calibration offset bringing `log2(lux * iso / 250)` onto the EV scale,
/// 2.6711635357704604 pre-scaled to Q14 (truncated).
pub const EV_OFFSET_FIXED: i32 = 43_764;

/// Base-2 logarithm of `x` in Q14.
///
/// `log2_fixed(0)` is defined as 0. Every other input is exact to within
/// one least significant bit of the truncated recurrence.
pub fn log2_fixed(x: u32) -> i32 {
    if x == 0 {
        return 0;
    }

    // 64-bit so that inputs above 2^18 survive the shift into Q14
    let one = u64::from(ONE as u32);
    let two = one << 1;
    let mut z = u64::from(x) << FRACTIONAL_BITS;
    let mut result: i32 = 0;

    while z < one {
        z <<= 1;
        result -= ONE;
    }

    while z >= two {
        z >>= 1;
        result += ONE;
    }

    let mut b = HALF;
    for _ in 0..FRACTIONAL_BITS {
        z = (z * z) >> FRACTIONAL_BITS;
        if z >= two {
            z >>= 1;
            result += b;
        }
        b >>= 1;
    }

    result
}

/// Integer part of a Q14 value (floor, arithmetic shift)
pub fn whole_part(x: i32) -> i32 {
    x >> FRACTIONAL_BITS
}

/// Fractional bits of a Q14 value, always in `0..ONE`
pub fn frac_part(x: i32) -> i32 {
    x & FRAC_MASK
}

/// Round a Q14 value to the nearest integer, halves rounding up
pub fn round_to_int(x: i32) -> i32 {
    whole_part(x) + i32::from(frac_part(x) >= HALF)
}

/// Two-digit decimal expansion of the fraction, truncated (0..=99)
fn frac_hundredths(x: i32) -> i32 {
    (frac_part(x) * 100) >> FRACTIONAL_BITS
}

/// Round a Q14 value to tenths.
///
/// The fraction is expanded to two decimal digits and the first digit is
/// rounded half-up on the second, carrying into the whole part when the
/// tenth reaches ten (3.96 gives 40, i.e. 4.0).
pub fn to_tenths(x: i32) -> i32 {
    let hundredths = frac_hundredths(x);
    let mut tenths = hundredths / 10;
    if hundredths % 10 >= 5 {
        tenths += 1;
    }
    whole_part(x) * 10 + tenths
}

/// First fractional decimal digit of a Q14 value, rounded on the second digit
pub fn frac_decimal_digit(x: i32) -> u8 {
    to_tenths(x).rem_euclid(10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2_of_zero_is_zero() {
        assert_eq!(log2_fixed(0), 0);
    }

    #[test]
    fn test_log2_powers_of_two_are_exact() {
        for k in 0..32 {
            assert_eq!(log2_fixed(1u32 << k), (k as i32) << FRACTIONAL_BITS, "2^{}", k);
        }
    }

    #[test]
    fn test_log2_large_inputs_do_not_wrap() {
        assert_eq!(whole_part(log2_fixed(u32::MAX)), 31);
        assert_eq!(whole_part(log2_fixed(1 << 20)), 20);
    }

    #[test]
    fn test_log2_of_three() {
        // log2(3) = 1.58496..., 0.58496 * 16384 = 9583.9
        let l = log2_fixed(3);
        assert_eq!(whole_part(l), 1);
        assert!((frac_part(l) - 9583).abs() <= 2, "got {}", frac_part(l));
    }

    #[test]
    fn test_ev_offset_matches_real_value() {
        let real = EV_OFFSET_FIXED as f64 / ONE as f64;
        assert!((real - 2.6711635357704604).abs() < 1.0 / ONE as f64);
    }

    #[test]
    fn test_whole_part_floors_negative_values() {
        assert_eq!(whole_part(-1), -1);
        assert_eq!(whole_part(-ONE), -1);
        assert_eq!(whole_part(ONE * 5 + 1), 5);
    }

    #[test]
    fn test_round_to_int_half_boundary() {
        assert_eq!(round_to_int(2 * ONE + HALF - 1), 2);
        assert_eq!(round_to_int(2 * ONE + HALF), 3);
        assert_eq!(round_to_int(0), 0);
    }

    #[test]
    fn test_frac_decimal_digit_rounds_on_second_digit() {
        // 0.25 -> digits 2,5 -> 3
        assert_eq!(frac_decimal_digit(ONE / 4), 3);
        // 0.5 -> 5
        assert_eq!(frac_decimal_digit(HALF), 5);
        // 0.125 -> digits 1,2 -> 1
        assert_eq!(frac_decimal_digit(ONE / 8), 1);
    }

    #[test]
    fn test_to_tenths_carries() {
        // 3.97 in Q14
        let x = 3 * ONE + (97 * ONE) / 100 + 1;
        assert_eq!(to_tenths(x), 40);
        assert_eq!(frac_decimal_digit(x), 0);
    }
}
