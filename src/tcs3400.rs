// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! TCS3400 driver over `embedded-hal` I2C
//!
//! A thin register layer: every call is one bus transaction. All
//! decisions about gain and timing belong to the metering loop.

use crate::error::{MeterError, Result};
use crate::reading::{SensorReading, BURST_LEN};
use crate::registers::{
    Gain, IntegrationTime, Persistence, PowerState, Register, WaitTime, DEVICE_ADDRESS,
};
use crate::transport::SensorTransport;
use embedded_hal::i2c::I2c;
use log::trace;

/// ID register value of the TCS34001 / TCS34005 parts
pub const ID_TCS34001: u8 = 0x90;

/// ID register value of the TCS34003 / TCS34007 parts
pub const ID_TCS34003: u8 = 0x93;

/// TCS3400 RGBC light sensor on an I2C bus
#[derive(Debug)]
pub struct Tcs3400<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Tcs3400<I2C> {
    /// Create a driver at the default address
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: DEVICE_ADDRESS,
        }
    }

    /// Create a driver at a custom address
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Read one 8-bit register
    pub fn read_register(&mut self, reg: Register) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg.addr()], &mut buf)
            .map_err(MeterError::bus)?;
        Ok(buf[0])
    }

    /// Write one 8-bit register
    pub fn write_register(&mut self, reg: Register, value: u8) -> Result<()> {
        trace!("tcs3400 write {:?} = 0x{:02x}", reg, value);
        self.i2c
            .write(self.address, &[reg.addr(), value])
            .map_err(MeterError::bus)
    }

    /// Read the ID register and check it against the known parts
    pub fn read_id(&mut self) -> Result<u8> {
        let id = self.read_register(Register::Id)?;
        match id {
            ID_TCS34001 | ID_TCS34003 => Ok(id),
            _ => Err(MeterError::UnexpectedDeviceId { id }),
        }
    }

    /// Program gain, integration time and persistence in one go
    pub fn configure(
        &mut self,
        gain: Gain,
        time: IntegrationTime,
        persistence: Persistence,
    ) -> Result<()> {
        self.write_gain(gain)?;
        self.write_integration_time(time)?;
        self.write_persistence(persistence)
    }
}

impl<I2C: I2c> SensorTransport for Tcs3400<I2C> {
    fn read_channels(&mut self) -> Result<SensorReading> {
        let mut data = [0u8; BURST_LEN];
        self.i2c
            .write_read(self.address, &[Register::Status.addr()], &mut data)
            .map_err(MeterError::bus)?;
        Ok(SensorReading::from_burst(&data))
    }

    fn write_gain(&mut self, gain: Gain) -> Result<()> {
        self.write_register(Register::Control, gain.code())
    }

    fn write_integration_time(&mut self, time: IntegrationTime) -> Result<()> {
        self.write_register(Register::Atime, time.code())
    }

    fn write_wait_time(&mut self, time: WaitTime) -> Result<()> {
        self.write_register(Register::Wtime, time.code())
    }

    fn write_persistence(&mut self, persistence: Persistence) -> Result<()> {
        self.write_register(Register::Pers, persistence.code())
    }

    fn set_power(&mut self, state: PowerState) -> Result<()> {
        self.write_register(Register::Enable, state.enable().bits())
    }

    fn clear_interrupts(&mut self) -> Result<()> {
        self.write_register(Register::AiClear, 0)
    }
}
