use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mfcc_core::dsp::{FftConfig, FftEngine};
use mfcc_core::{ComplexSample, MfccConfig, MfccPipeline, MultiplierKind, extract_batch};
use std::time::Duration;

// --- Common benchmark configuration ---
const SAMPLE_RATE: u32 = 16_000;
const RECORDING_SAMPLES: usize = 4_000;
const BATCH_SIZE: usize = 8;
const BENCH_MEASUREMENT_TIME: Duration = Duration::from_secs(10);
const FFT_SIZES: [usize; 3] = [64, 128, 512];

fn tone(length: usize, frequency: f64) -> Vec<i16> {
    (0..length)
        .map(|i| {
            let t = i as f64 / f64::from(SAMPLE_RATE);
            ((2.0 * std::f64::consts::PI * frequency * t).sin() * 12000.0) as i16
        })
        .collect()
}

fn bench_fft_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_engine");
    for size in FFT_SIZES {
        let input: Vec<ComplexSample> = (0..size)
            .map(|i| ComplexSample::new(((i * 7919) % 20000) as i32 - 10000, 0))
            .collect();
        let mut engine = FftEngine::new(FftConfig::new(size, 16)).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(engine.transform(black_box(input))))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let samples = tone(RECORDING_SAMPLES, 440.0);
    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(BENCH_MEASUREMENT_TIME);
    group.throughput(Throughput::Elements(RECORDING_SAMPLES as u64));

    for kind in [MultiplierKind::Pipelined, MultiplierKind::ShiftAdd] {
        let mut pipeline = MfccPipeline::new(MfccConfig::new().with_multiplier(kind)).unwrap();
        group.bench_function(BenchmarkId::new("process", kind), |b| {
            b.iter(|| black_box(pipeline.process(black_box(&samples))))
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let recordings: Vec<Vec<i16>> = (0..BATCH_SIZE)
        .map(|i| tone(RECORDING_SAMPLES, 200.0 + 150.0 * i as f64))
        .collect();
    let config = MfccConfig::new();

    let mut group = c.benchmark_group("batch");
    group.measurement_time(BENCH_MEASUREMENT_TIME);
    group.throughput(Throughput::Elements((BATCH_SIZE * RECORDING_SAMPLES) as u64));
    group.bench_function("extract_batch", |b| {
        b.iter(|| black_box(extract_batch(&config, black_box(&recordings)).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_fft_engine, bench_pipeline, bench_batch);
criterion_main!(benches);
