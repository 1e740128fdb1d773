// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor transport abstraction
//!
//! The metering loop never touches the bus directly; it talks to a
//! [`SensorTransport`]. [`crate::tcs3400::Tcs3400`] is the hardware
//! implementation, [`MemorySensor`] an in-memory one for tests and
//! simulations.

use crate::error::{MeterError, Result};
use crate::reading::SensorReading;
use crate::registers::{Gain, IntegrationTime, Persistence, PowerState, WaitTime};
use embedded_hal::i2c::ErrorKind;
use std::collections::VecDeque;

/// Operations the metering loop needs from the sensor
pub trait SensorTransport {
    /// Read status and the four channel counts
    fn read_channels(&mut self) -> Result<SensorReading>;

    /// Program the analog gain
    fn write_gain(&mut self, gain: Gain) -> Result<()>;

    /// Program the integration time
    fn write_integration_time(&mut self, time: IntegrationTime) -> Result<()>;

    /// Program the wait time between conversions
    fn write_wait_time(&mut self, time: WaitTime) -> Result<()>;

    /// Program the data-ready interrupt persistence filter
    fn write_persistence(&mut self, persistence: Persistence) -> Result<()>;

    /// Switch power / conversion state
    fn set_power(&mut self, state: PowerState) -> Result<()>;

    /// Acknowledge pending interrupts
    fn clear_interrupts(&mut self) -> Result<()>;
}

/// Statistics about transport usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportMetrics {
    /// Channel reads performed
    pub reads: u64,
    /// Register writes performed
    pub writes: u64,
    /// Interrupt acknowledgements
    pub interrupts_cleared: u64,
}

/// A simulated sensor holding a queue of readings and the last values
/// written to its registers
#[derive(Debug)]
pub struct MemorySensor {
    /// Readings returned by successive `read_channels` calls
    readings: VecDeque<SensorReading>,
    /// Returned when the queue is empty
    idle_reading: SensorReading,
    gain: Option<Gain>,
    integration_time: Option<IntegrationTime>,
    wait_time: Option<WaitTime>,
    persistence: Option<Persistence>,
    power: PowerState,
    /// Every gain value written, in order
    gain_writes: Vec<Gain>,
    /// Calls to let through, then the bus error to fail with
    fault: Option<(usize, ErrorKind)>,
    metrics: TransportMetrics,
}

impl MemorySensor {
    /// Create a powered-down sensor with no queued readings
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
            idle_reading: SensorReading::not_ready(),
            gain: None,
            integration_time: None,
            wait_time: None,
            persistence: None,
            power: PowerState::Off,
            gain_writes: Vec::new(),
            fault: None,
            metrics: TransportMetrics::default(),
        }
    }

    /// Create a sensor that returns the given readings in order
    pub fn with_readings(readings: impl IntoIterator<Item = SensorReading>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            ..Self::new()
        }
    }

    /// Queue a reading
    pub fn push_reading(&mut self, reading: SensorReading) {
        self.readings.push_back(reading);
    }

    /// Number of queued readings
    pub fn pending_readings(&self) -> usize {
        self.readings.len()
    }

    /// Make the next transport call fail
    pub fn fail_next(&mut self, kind: ErrorKind) {
        self.fail_after(0, kind);
    }

    /// Let `calls` transport calls succeed, then fail the one after
    pub fn fail_after(&mut self, calls: usize, kind: ErrorKind) {
        self.fault = Some((calls, kind));
    }

    /// Last gain written
    pub fn gain(&self) -> Option<Gain> {
        self.gain
    }

    /// All gains written, oldest first
    pub fn gain_writes(&self) -> &[Gain] {
        &self.gain_writes
    }

    /// Last integration time written
    pub fn integration_time(&self) -> Option<IntegrationTime> {
        self.integration_time
    }

    /// Last wait time written
    pub fn wait_time(&self) -> Option<WaitTime> {
        self.wait_time
    }

    /// Last persistence filter written
    pub fn persistence(&self) -> Option<Persistence> {
        self.persistence
    }

    /// Current power state
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Transport usage counters
    pub fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }

    fn check_fault(&mut self) -> Result<()> {
        match self.fault.take() {
            Some((0, kind)) => Err(MeterError::Bus(kind)),
            Some((calls, kind)) => {
                self.fault = Some((calls - 1, kind));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for MemorySensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorTransport for MemorySensor {
    fn read_channels(&mut self) -> Result<SensorReading> {
        self.check_fault()?;
        self.metrics.reads += 1;
        // A powered-down or idle sensor never completes a conversion
        if self.power != PowerState::Active {
            return Ok(SensorReading::not_ready());
        }
        Ok(self.readings.pop_front().unwrap_or(self.idle_reading))
    }

    fn write_gain(&mut self, gain: Gain) -> Result<()> {
        self.check_fault()?;
        self.metrics.writes += 1;
        self.gain = Some(gain);
        self.gain_writes.push(gain);
        Ok(())
    }

    fn write_integration_time(&mut self, time: IntegrationTime) -> Result<()> {
        self.check_fault()?;
        self.metrics.writes += 1;
        self.integration_time = Some(time);
        Ok(())
    }

    fn write_wait_time(&mut self, time: WaitTime) -> Result<()> {
        self.check_fault()?;
        self.metrics.writes += 1;
        self.wait_time = Some(time);
        Ok(())
    }

    fn write_persistence(&mut self, persistence: Persistence) -> Result<()> {
        self.check_fault()?;
        self.metrics.writes += 1;
        self.persistence = Some(persistence);
        Ok(())
    }

    fn set_power(&mut self, state: PowerState) -> Result<()> {
        self.check_fault()?;
        self.metrics.writes += 1;
        self.power = state;
        Ok(())
    }

    fn clear_interrupts(&mut self) -> Result<()> {
        self.check_fault()?;
        self.metrics.interrupts_cleared += 1;
        Ok(())
    }
}
