// EVMeter - Fixed-point exposure metering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Metering session
//!
//! [`Meter`] holds all mutable metering state (gain, integration time,
//! retry flag, device factor, ISO, aperture) behind `&mut self`, so the
//! tick handler and the data-ready handler of the caller share it without
//! any hidden globals.
//!
//! The caller drives it with two events:
//! - a data-ready edge or timer tick: [`Meter::poll_transport`] (or
//!   [`Meter::poll`] when the caller read the sensor itself)
//! - the user's trigger: [`Meter::start_measurement`], [`Meter::set_hold`],
//!   [`Meter::stop_measurement`]
//!
//! Without hold, a measurement ends by itself after the first accepted
//! reading and the sensor is put back to idle. With hold, readings keep
//! refining on the slow integration time until the hold is released.

use crate::config::MeterConfig;
use crate::controller::{RangeCheck, RangeController};
use crate::error::{MeterError, Result};
use crate::metrics::MeterMetrics;
use crate::photometry::{self, ConversionParams, ExposureValue, Photometry};
use crate::reading::SensorReading;
use crate::registers::PowerState;
use crate::settings::{Aperture, IsoSetting};
use crate::shutter::{pick_shutter_speed, ShutterSpeedResult};
use crate::transport::SensorTransport;
use log::{debug, info, trace};

/// Result of feeding one reading to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementOutcome {
    /// No usable conversion yet; try again on the next tick
    NotReady,
    /// Gain was adjusted; the reading was discarded
    Retry,
    /// A new exposure value
    Accepted(ExposureValue),
}

impl MeasurementOutcome {
    /// The exposure value, if accepted
    pub fn ev(&self) -> Option<ExposureValue> {
        match self {
            MeasurementOutcome::Accepted(ev) => Some(*ev),
            _ => None,
        }
    }
}

/// A metering session over a sensor transport
#[derive(Debug)]
pub struct Meter<T> {
    transport: T,
    controller: RangeController,
    config: MeterConfig,
    device_factor: u16,
    iso: IsoSetting,
    aperture: Aperture,
    active: bool,
    hold: bool,
    last: Option<Photometry>,
    metrics: MeterMetrics,
}

impl<T: SensorTransport> Meter<T> {
    /// Create a session with the default configuration
    pub fn new(transport: T) -> Result<Self> {
        Self::with_config(transport, MeterConfig::default())
    }

    /// Create a session with a custom configuration
    pub fn with_config(transport: T, config: MeterConfig) -> Result<Self> {
        config.validate()?;
        if config.device_factor == 0 {
            return Err(MeterError::InvalidDeviceFactor(0));
        }
        let controller = RangeController::new(
            config.initial_gain,
            config.fast_integration,
            config.slow_integration,
        )
        .with_under_range_count(config.under_range_count);
        let iso = IsoSetting::new(config.iso_table, config.initial_iso)?;

        Ok(Self {
            transport,
            controller,
            device_factor: config.device_factor,
            iso,
            aperture: Aperture::WIDEST,
            active: false,
            hold: false,
            last: None,
            metrics: MeterMetrics::new(),
            config,
        })
    }

    /// Arm the sensor for continuous conversion.
    ///
    /// Programs the interrupt persistence, the current gain and the fast
    /// integration time and enables conversions. Starting an already
    /// running measurement does nothing.
    pub fn start_measurement(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        self.transport.write_persistence(self.config.persistence)?;
        self.controller.arm(&mut self.transport)?;
        self.transport.clear_interrupts()?;
        self.transport.set_power(PowerState::Active)?;
        self.active = true;
        self.metrics.measurements += 1;
        info!(
            "measurement started: gain {}, integration {}, {}",
            self.controller.gain(),
            self.controller.integration_time(),
            self.iso
        );
        Ok(())
    }

    /// Stop converting and put the sensor in its low-power idle state.
    ///
    /// Idempotent. Any pending retry and the hold flag are discarded.
    pub fn stop_measurement(&mut self) -> Result<()> {
        if self.active {
            info!("measurement stopped");
        }
        self.active = false;
        self.hold = false;
        self.controller.disarm();
        self.transport.set_power(PowerState::Idle)
    }

    /// Stop and power the sensor fully down
    pub fn shutdown(&mut self) -> Result<()> {
        self.stop_measurement()?;
        self.transport.set_power(PowerState::Off)
    }

    /// Trigger held (continuous refinement) or released.
    ///
    /// Holding starts a measurement if none is running. Releasing lets the
    /// current measurement end after its next accepted reading.
    pub fn set_hold(&mut self, held: bool) -> Result<()> {
        self.hold = held;
        if held {
            self.start_measurement()?;
        }
        Ok(())
    }

    /// Feed one reading (`None` when the caller has no reading to offer).
    ///
    /// Readings arriving while no measurement is active are ignored.
    pub fn poll(&mut self, reading: Option<SensorReading>) -> Result<MeasurementOutcome> {
        let reading = match reading {
            Some(reading) if self.active => reading,
            _ => {
                self.metrics.record_check(RangeCheck::NotReady);
                return Ok(MeasurementOutcome::NotReady);
            }
        };

        // The reading was integrated with the settings in force before the
        // controller reacts to it
        let params = self.conversion_params();
        let check = self.controller.check(&reading, &mut self.transport)?;
        self.metrics.record_check(check);
        trace!("poll {:?} -> {:?}", reading, check);

        let outcome = match check {
            RangeCheck::NotReady => return Ok(MeasurementOutcome::NotReady),
            RangeCheck::Saturated { .. } | RangeCheck::UnderRange { .. } => {
                MeasurementOutcome::Retry
            }
            RangeCheck::Accepted => {
                let result = photometry::convert(&reading, &params);
                if result.ev == ExposureValue::ZERO {
                    self.metrics.dark_floor += 1;
                }
                debug!("accepted: {} lux, EV {}", result.lux, result.ev);
                self.last = Some(result);
                MeasurementOutcome::Accepted(result.ev)
            }
        };

        if !self.controller.retry_pending() && !self.hold {
            self.active = false;
            self.transport.set_power(PowerState::Idle)?;
            debug!("single-shot measurement complete");
        }

        Ok(outcome)
    }

    /// Data-ready handler: read the sensor, feed the reading, acknowledge
    /// the interrupt. Does not touch the bus while no measurement is active.
    ///
    /// The interrupt is acknowledged even when handling the reading failed,
    /// otherwise the latched data-ready line never raises another edge.
    pub fn poll_transport(&mut self) -> Result<MeasurementOutcome> {
        if !self.active {
            return self.poll(None);
        }
        let reading = self.transport.read_channels()?;
        let outcome = self.poll(Some(reading));
        self.transport.clear_interrupts()?;
        outcome
    }

    fn conversion_params(&self) -> ConversionParams {
        ConversionParams {
            gain: self.controller.gain(),
            integration_time: self.controller.integration_time(),
            device_factor: self.device_factor,
            iso: self.iso.value(),
        }
    }

    /// Set the device factor; zero is rejected
    pub fn set_device_factor(&mut self, device_factor: u16) -> Result<()> {
        if device_factor == 0 {
            return Err(MeterError::InvalidDeviceFactor(device_factor));
        }
        self.device_factor = device_factor;
        Ok(())
    }

    /// Current device factor
    pub fn device_factor(&self) -> u16 {
        self.device_factor
    }

    /// Select an ISO from the configured table.
    ///
    /// The last EV is re-derived from its lux value at the new ISO.
    pub fn set_iso(&mut self, iso: u32) -> Result<()> {
        self.set_iso_setting(IsoSetting::new(self.config.iso_table, iso)?);
        Ok(())
    }

    /// Select an ISO setting (e.g. from cycling)
    pub fn set_iso_setting(&mut self, iso: IsoSetting) {
        self.iso = iso;
        if let Some(last) = self.last.as_mut() {
            last.ev = photometry::exposure_value(last.lux, iso.value());
        }
    }

    /// Current ISO setting
    pub fn iso(&self) -> IsoSetting {
        self.iso
    }

    /// Select the aperture used for shutter speed selection
    pub fn set_aperture(&mut self, aperture: Aperture) {
        self.aperture = aperture;
    }

    /// Current aperture
    pub fn aperture(&self) -> Aperture {
        self.aperture
    }

    /// Most recent accepted exposure value
    pub fn last_ev(&self) -> Option<ExposureValue> {
        self.last.map(|p| p.ev)
    }

    /// Intermediate values of the most recent accepted conversion
    pub fn last_photometry(&self) -> Option<&Photometry> {
        self.last.as_ref()
    }

    /// Shutter speed for the last EV at the current aperture
    pub fn shutter_speed(&self) -> Option<ShutterSpeedResult> {
        self.last_ev()
            .map(|ev| pick_shutter_speed(ev.rounded(), self.aperture))
    }

    /// A measurement is running
    pub fn is_measuring(&self) -> bool {
        self.active
    }

    /// The trigger is held
    pub fn is_held(&self) -> bool {
        self.hold
    }

    /// Tick rate the caller should run at: faster while metering
    pub fn tick_hz(&self) -> u8 {
        if self.active {
            self.config.active_tick_hz
        } else {
            self.config.idle_tick_hz
        }
    }

    /// Gain / range controller state
    pub fn controller(&self) -> &RangeController {
        &self.controller
    }

    /// Session configuration
    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Loop statistics
    pub fn metrics(&self) -> &MeterMetrics {
        &self.metrics
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the transport mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tear down the session and give the transport back
    pub fn release(self) -> T {
        self.transport
    }
}
