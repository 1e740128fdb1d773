//! Simulated light meter
//!
//! Meters a scene that brightens from candle light to full sun, letting
//! the gain controller walk through its range, and prints the exposure
//! value and shutter speed at each step.
//!
//! Run with: `cargo run --example simulated_meter`

use evmeter::{
    Aperture, Gain, IntegrationTime, MeasurementOutcome, Meter, Persistence, PowerState,
    Result, SensorReading, SensorTransport, WaitTime,
};

/// Simulated sensor: channel counts proportional to illuminance, gain and
/// integration time, clipped at full scale
struct Scene {
    lux: u32,
    gain: Gain,
    integration: IntegrationTime,
    power: PowerState,
}

impl Scene {
    fn new() -> Self {
        Self {
            lux: 0,
            gain: Gain::X16,
            integration: IntegrationTime::Ms27_8,
            power: PowerState::Off,
        }
    }

    /// Counts for `per_mille` of the clear response
    fn counts(&self, per_mille: u64) -> u16 {
        // ~0.6 clear counts per lux at 1x and 1ms
        let counts = u64::from(self.lux)
            * u64::from(self.gain.multiplier())
            * u64::from(self.integration.micros())
            * 6
            / 10_000
            * per_mille
            / 1000;
        counts.min(u64::from(u16::MAX)) as u16
    }
}

impl SensorTransport for Scene {
    fn read_channels(&mut self) -> Result<SensorReading> {
        if self.power != PowerState::Active {
            return Ok(SensorReading::not_ready());
        }
        Ok(SensorReading::new(
            self.counts(1000),
            self.counts(400),
            self.counts(450),
            self.counts(300),
        ))
    }

    fn write_gain(&mut self, gain: Gain) -> Result<()> {
        self.gain = gain;
        Ok(())
    }

    fn write_integration_time(&mut self, time: IntegrationTime) -> Result<()> {
        self.integration = time;
        Ok(())
    }

    fn write_wait_time(&mut self, _time: WaitTime) -> Result<()> {
        Ok(())
    }

    fn write_persistence(&mut self, _persistence: Persistence) -> Result<()> {
        Ok(())
    }

    fn set_power(&mut self, state: PowerState) -> Result<()> {
        self.power = state;
        Ok(())
    }

    fn clear_interrupts(&mut self) -> Result<()> {
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== EVMeter Simulated Meter ===");
    println!();

    let mut meter = Meter::new(Scene::new())?;
    meter.set_aperture(Aperture::from_index(3)?);

    let scenes = [
        ("candle", 10u32),
        ("living room", 150),
        ("office", 500),
        ("overcast", 3_000),
        ("shade", 12_000),
        ("full sun", 100_000),
    ];

    println!(
        "{:<12} {:>8} {:>6} {:>6} {:>8} {:>8}",
        "scene", "lux", "gain", "polls", "EV", "shutter"
    );

    for (name, lux) in scenes {
        meter.transport_mut().lux = lux;
        meter.start_measurement()?;

        let mut polls = 0;
        let ev = loop {
            polls += 1;
            match meter.poll_transport()? {
                MeasurementOutcome::Accepted(ev) => break Some(ev),
                MeasurementOutcome::Retry | MeasurementOutcome::NotReady if polls < 10 => {}
                _ => break None,
            }
        };

        let measured_lux = meter.last_photometry().map(|p| p.lux).unwrap_or(0);
        let ev_text = ev.map(|ev| ev.to_string()).unwrap_or_else(|| "--".into());
        let shutter = meter
            .shutter_speed()
            .map(|s| s.display_text())
            .unwrap_or_else(|| "--".into());

        println!(
            "{:<12} {:>8} {:>6} {:>6} {:>8} {:>8}",
            name,
            measured_lux,
            meter.controller().gain().to_string(),
            polls,
            ev_text,
            shutter
        );
    }

    println!();
    println!("Shutter speeds for the last reading:");
    let mut aperture = Aperture::WIDEST;
    for _ in 0..Aperture::COUNT {
        meter.set_aperture(aperture);
        if let Some(speed) = meter.shutter_speed() {
            println!("  {:>6}  {}", aperture.to_string(), speed);
        }
        aperture = aperture.next();
    }

    let metrics = meter.metrics();
    println!();
    println!("=== Metrics ===");
    println!("Measurements:    {}", metrics.measurements);
    println!("Polls:           {}", metrics.polls);
    println!("Gain changes:    {}", metrics.gain_changes());
    println!("Acceptance rate: {:.1}%", metrics.acceptance_rate() * 100.0);

    meter.shutdown()?;
    Ok(())
}
