//! # EVMeter - Fixed-point exposure metering
//!
//! Turns the raw counts of an RGBC ambient light sensor (TCS3400) into a
//! photographic exposure value and a shutter speed, without floating point.
//!
//! ## Key Features
//!
//! - **Auto-ranging**: analog gain steps down on saturation and up on weak
//!   signal, one step per reading, clamped to 1x..64x
//! - **Fast first reading**: short integration for the first value, long
//!   integration for refinement while the trigger is held
//! - **IR rejection**: infrared estimate removed before lux conversion
//! - **Q14 fixed point**: deterministic log2-based EV, bit for bit
//!
//! ## Quick Start
//!
//! ```rust
//! use evmeter::{Meter, MemorySensor, SensorReading, Aperture, ShutterSpeedResult};
//!
//! // An in-memory sensor with one queued reading
//! let sensor = MemorySensor::with_readings([SensorReading::new(150, 60, 70, 65)]);
//! let mut meter = Meter::new(sensor).unwrap();
//!
//! meter.start_measurement().unwrap();
//! let outcome = meter.poll_transport().unwrap();
//!
//! let ev = outcome.ev().unwrap();
//! assert_eq!(format!("{}", ev), "3.7");
//!
//! meter.set_aperture(Aperture::WIDEST);
//! assert!(matches!(meter.shutter_speed(), Some(ShutterSpeedResult::Value(_))));
//! ```
//!
//! ## Modules
//!
//! - [`fixed`]: Q14 log2 and rounding helpers
//! - [`registers`]: sensor register map, gain and integration time
//! - [`reading`]: raw channel readings
//! - [`transport`]: sensor transport trait and in-memory sensor
//! - [`tcs3400`]: `embedded-hal` I2C driver
//! - [`controller`]: gain / range control loop
//! - [`photometry`]: counts to lux to EV
//! - [`shutter`]: shutter speed selection
//! - [`settings`]: aperture and ISO tables
//! - [`meter`]: the metering session
//! - [`config`]: session configuration
//! - [`metrics`]: metering loop statistics

// Modules
pub mod config;
pub mod controller;
pub mod error;
pub mod fixed;
pub mod meter;
pub mod metrics;
pub mod photometry;
pub mod reading;
pub mod registers;
pub mod settings;
pub mod shutter;
pub mod tcs3400;
pub mod transport;

// Re-exports for convenient access
pub use config::MeterConfig;
pub use controller::{RangeCheck, RangeController};
pub use error::{ConfigError, MeterError, Result};
pub use fixed::{
    frac_decimal_digit, log2_fixed, round_to_int, whole_part, EV_OFFSET_FIXED, FRACTIONAL_BITS,
};
pub use meter::{MeasurementOutcome, Meter};
pub use metrics::MeterMetrics;
pub use photometry::{ConversionParams, ExposureValue, Photometry};
pub use reading::SensorReading;
pub use registers::{Gain, IntegrationTime, Persistence, PowerState, WaitTime};
pub use settings::{Aperture, IsoSetting, IsoTable};
pub use shutter::{pick_shutter_speed, ShutterSpeed, ShutterSpeedResult};
pub use tcs3400::Tcs3400;
pub use transport::{MemorySensor, SensorTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
