//! Benchmarks for the fixed-point metering pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use evmeter::photometry::{self, ConversionParams};
use evmeter::*;

fn generate_readings(count: usize) -> Vec<SensorReading> {
    (0..count)
        .map(|i| {
            let clear = 200 + (i % 9000) as u32;
            SensorReading::new(
                clear as u16,
                (clear * 2 / 5) as u16,
                (clear * 9 / 20) as u16,
                (clear * 3 / 10) as u16,
            )
        })
        .collect()
}

fn bench_log2(c: &mut Criterion) {
    let mut group = c.benchmark_group("log2");

    group.throughput(Throughput::Elements(1000));

    group.bench_function("log2_fixed_1000", |b| {
        b.iter(|| {
            for x in 1..=1000u32 {
                black_box(log2_fixed(black_box(x * 4099)));
            }
        })
    });

    for x in [2u32, 1_000, 1 << 20, u32::MAX] {
        group.bench_with_input(BenchmarkId::new("single", x), &x, |b, &x| {
            b.iter(|| log2_fixed(black_box(x)))
        });
    }

    group.finish();
}

fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");

    let readings = generate_readings(1000);
    let params = ConversionParams {
        gain: Gain::X16,
        integration_time: IntegrationTime::Ms103,
        device_factor: 100,
        iso: 100,
    };

    group.throughput(Throughput::Elements(1000));

    group.bench_function("convert_1000", |b| {
        b.iter(|| {
            for r in &readings {
                black_box(photometry::convert(r, &params));
            }
        })
    });

    group.bench_function("convert_and_pick_shutter_1000", |b| {
        b.iter(|| {
            for r in &readings {
                let ev = photometry::convert(r, &params).ev;
                black_box(pick_shutter_speed(ev.rounded(), Aperture::WIDEST));
            }
        })
    });

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    let readings = generate_readings(1000);

    group.throughput(Throughput::Elements(1000));

    group.bench_function("held_poll_1000", |b| {
        b.iter(|| {
            let mut meter = Meter::new(MemorySensor::with_readings(readings.iter().copied()))
                .expect("default config is valid");
            meter.set_hold(true).expect("memory sensor does not fail");
            for _ in 0..readings.len() {
                black_box(meter.poll_transport().expect("memory sensor does not fail"));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_log2, bench_conversion, bench_session);
criterion_main!(benches);
