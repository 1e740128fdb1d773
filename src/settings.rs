// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! User-selectable aperture and ISO
//!
//! Both are indices into fixed tables. Cycling wraps explicitly in both
//! directions: `next` past the last entry returns to the first, `prev`
//! before the first goes to the last.

use crate::error::{MeterError, Result};
use std::fmt;

/// f-stop labels, widest aperture first, one full stop apart
pub const FSTOP_LABELS: [&str; 8] = ["1.4", "2", "2.8", "4", "5.6", "8", "11", "16"];

/// Standard ISO table
pub const STANDARD_ISOS: [u32; 4] = [100, 200, 400, 800];

/// Extended ISO table
pub const EXTENDED_ISOS: [u32; 7] = [50, 100, 200, 400, 800, 1600, 3200];

/// Default ISO
pub const DEFAULT_ISO: u32 = 100;

fn wrap_next(index: usize, len: usize) -> usize {
    if index + 1 >= len {
        0
    } else {
        index + 1
    }
}

fn wrap_prev(index: usize, len: usize) -> usize {
    if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

/// Lens aperture, an index into [`FSTOP_LABELS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Aperture(usize);

impl Aperture {
    /// Number of f-stops
    pub const COUNT: usize = FSTOP_LABELS.len();

    /// f/1.4, the widest aperture
    pub const WIDEST: Aperture = Aperture(0);

    /// f/16, the narrowest aperture
    pub const NARROWEST: Aperture = Aperture(Self::COUNT - 1);

    /// Aperture at a table index
    pub fn from_index(index: usize) -> Result<Self> {
        if index < Self::COUNT {
            Ok(Self(index))
        } else {
            Err(MeterError::InvalidAperture {
                index,
                len: Self::COUNT,
            })
        }
    }

    /// Table index (also the stop count from f/1.4)
    pub fn index(self) -> usize {
        self.0
    }

    /// f-number label, e.g. "5.6"
    pub fn label(self) -> &'static str {
        FSTOP_LABELS[self.0]
    }

    /// One stop narrower, wrapping to f/1.4 after f/16
    pub fn next(self) -> Self {
        Self(wrap_next(self.0, Self::COUNT))
    }

    /// One stop wider, wrapping to f/16 before f/1.4
    pub fn prev(self) -> Self {
        Self(wrap_prev(self.0, Self::COUNT))
    }
}

impl fmt::Display for Aperture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f/{}", self.label())
    }
}

/// Which ISO values are offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IsoTable {
    /// 100 to 800
    #[default]
    Standard,
    /// 50 to 3200
    Extended,
}

impl IsoTable {
    /// ISO values, lowest first
    pub fn values(self) -> &'static [u32] {
        match self {
            IsoTable::Standard => &STANDARD_ISOS,
            IsoTable::Extended => &EXTENDED_ISOS,
        }
    }

    /// Whether `iso` is offered
    pub fn contains(self, iso: u32) -> bool {
        self.values().contains(&iso)
    }
}

/// Selected ISO within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoSetting {
    table: IsoTable,
    index: usize,
}

impl IsoSetting {
    /// Select `iso` from `table`
    pub fn new(table: IsoTable, iso: u32) -> Result<Self> {
        table
            .values()
            .iter()
            .position(|&v| v == iso)
            .map(|index| Self { table, index })
            .ok_or(MeterError::UnsupportedIso { iso })
    }

    /// Selected ISO value
    pub fn value(self) -> u32 {
        self.table.values()[self.index]
    }

    /// Table in use
    pub fn table(self) -> IsoTable {
        self.table
    }

    /// Next higher ISO, wrapping to the lowest
    pub fn next(self) -> Self {
        Self {
            index: wrap_next(self.index, self.table.values().len()),
            ..self
        }
    }

    /// Next lower ISO, wrapping to the highest
    pub fn prev(self) -> Self {
        Self {
            index: wrap_prev(self.index, self.table.values().len()),
            ..self
        }
    }
}

impl Default for IsoSetting {
    fn default() -> Self {
        Self {
            table: IsoTable::Standard,
            index: 0,
        }
    }
}

impl fmt::Display for IsoSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ISO {}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aperture_bounds() {
        assert_eq!(Aperture::from_index(7).unwrap().label(), "16");
        assert_eq!(
            Aperture::from_index(8),
            Err(MeterError::InvalidAperture { index: 8, len: 8 })
        );
    }

    #[test]
    fn test_aperture_wraps_both_ways() {
        assert_eq!(Aperture::NARROWEST.next(), Aperture::WIDEST);
        assert_eq!(Aperture::WIDEST.prev(), Aperture::NARROWEST);
        assert_eq!(Aperture::WIDEST.next().label(), "2");
        assert_eq!(format!("{}", Aperture::WIDEST), "f/1.4");
    }

    #[test]
    fn test_full_cycle_returns_home() {
        let mut a = Aperture::from_index(3).unwrap();
        for _ in 0..Aperture::COUNT {
            a = a.next();
        }
        assert_eq!(a.index(), 3);
    }

    #[test]
    fn test_iso_cycle() {
        let iso = IsoSetting::new(IsoTable::Standard, 800).unwrap();
        assert_eq!(iso.next().value(), 100);
        assert_eq!(iso.prev().value(), 400);
        assert_eq!(IsoSetting::default().prev().value(), 800);
    }

    #[test]
    fn test_iso_table_membership() {
        assert!(IsoSetting::new(IsoTable::Standard, 1600).is_err());
        let iso = IsoSetting::new(IsoTable::Extended, 3200).unwrap();
        assert_eq!(iso.next().value(), 50);
        assert!(IsoTable::Extended.contains(50));
        assert!(!IsoTable::Standard.contains(50));
    }
}
