//! Benchmarks for the per-sample control path
//!
//! Every joystick sample is mixed and encoded on the control task before the
//! send, so this path bounds how fast the link can react to stick input:
//! - Axis mixing alone
//! - Mixing plus Control frame encoding
//! - Telemetry decoding on the receive path
//!
//! Platform: Cross-platform, no network

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rovlink::codec::{self, TELEMETRY_FRAME_SIZE};
use rovlink::mixing::{self, CameraSelectEdgeState};
use rovlink::test_utils::sweep_samples;
use rovlink::{TelemetryFrame, ThrusterMask, ThrusterOverride};
use std::hint::black_box;

fn bench_mix_axes(c: &mut Criterion) {
    let samples = sweep_samples(256);

    let mut group = c.benchmark_group("mixing");
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("mix_axes", |b| {
        b.iter(|| {
            for sample in &samples {
                black_box(mixing::mix_axes(black_box(sample)));
            }
        })
    });

    group.finish();
}

fn bench_mix_and_encode(c: &mut Criterion) {
    let samples = sweep_samples(256);
    let overrides = ThrusterOverride {
        enabled: true,
        powers: [25, -25, 50, -50, 75, -75, 100, -100],
        invert: ThrusterMask::new(0b1010_1010),
    };

    let mut group = c.benchmark_group("control_path");
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("mixed", |b| {
        let mut edge = CameraSelectEdgeState::new();
        let disabled = ThrusterOverride::default();
        b.iter(|| {
            for sample in &samples {
                let frame = mixing::mix(black_box(sample), &disabled, &mut edge);
                black_box(codec::encode_control(&frame));
            }
        })
    });

    group.bench_function("overridden", |b| {
        let mut edge = CameraSelectEdgeState::new();
        b.iter(|| {
            for sample in &samples {
                let frame = mixing::mix(black_box(sample), &overrides, &mut edge);
                black_box(codec::encode_control(&frame));
            }
        })
    });

    group.finish();
}

fn bench_decode_telemetry(c: &mut Criterion) {
    let frame = TelemetryFrame { depth: 12.5, voltage: 48.0, ..TelemetryFrame::default() };
    let datagram = codec::encode_telemetry(&frame);

    let mut group = c.benchmark_group("telemetry");
    group.throughput(Throughput::Bytes(TELEMETRY_FRAME_SIZE as u64));

    group.bench_function("decode", |b| {
        b.iter(|| black_box(codec::decode_telemetry(black_box(&datagram))))
    });

    group.finish();
}

criterion_group!(benches, bench_mix_axes, bench_mix_and_encode, bench_decode_telemetry);
criterion_main!(benches);
