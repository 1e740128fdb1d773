// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for EVMeter
//!
//! Only genuine faults live here. Transient sensor states (data not ready,
//! gain out of range) and out-of-range exposures are ordinary results of the
//! metering loop, see [`crate::meter::MeasurementOutcome`] and
//! [`crate::shutter::ShutterSpeedResult`].

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// Result type alias for EVMeter operations
pub type Result<T> = std::result::Result<T, MeterError>;

/// Main error type for EVMeter operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeterError {
    /// The register transport failed
    #[error("Bus error: {0}")]
    Bus(ErrorKind),

    /// A device factor of zero would make counts-per-lux undefined
    #[error("Invalid device factor: {0}")]
    InvalidDeviceFactor(u16),

    /// Aperture index outside the f-stop table
    #[error("Invalid aperture index {index}: table has {len} stops")]
    InvalidAperture { index: usize, len: usize },

    /// ISO value not present in the active ISO table
    #[error("Unsupported ISO: {iso}")]
    UnsupportedIso { iso: u32 },

    /// The part on the bus did not identify as the expected sensor
    #[error("Unexpected device id: 0x{id:02x}")]
    UnexpectedDeviceId { id: u8 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while validating a [`crate::config::MeterConfig`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The fast integration time must be strictly shorter than the slow one
    #[error("Fast integration time {fast_us}us is not shorter than slow {slow_us}us")]
    IntegrationOrder { fast_us: u32, slow_us: u32 },

    /// Tick rates must be non-zero
    #[error("Tick rate must be non-zero")]
    ZeroTickRate,

    /// The under-range count must leave room below the saturation threshold
    #[error("Under-range count {count} is not below saturation threshold {saturation}")]
    UnderRangeTooHigh { count: u16, saturation: u32 },

    /// Initial ISO is not part of the configured table
    #[error("Initial ISO {iso} is not in the configured table")]
    IsoNotInTable { iso: u32 },
}

impl MeterError {
    /// Wrap any `embedded-hal` I2C error, keeping its portable kind
    pub fn bus<E: embedded_hal::i2c::Error>(err: E) -> Self {
        MeterError::Bus(err.kind())
    }
}
