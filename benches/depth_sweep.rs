use criterion::{criterion_group, criterion_main, Criterion};
use mmsar::imaging::range::RangeSpectrum;
use mmsar::imaging::sweep::{par_sweep, sweep};
use mmsar::ReconstructionConfig;
use ndarray::Array3;
use rustfft::num_complex::Complex64;

fn bench_config() -> ReconstructionConfig {
    let mut config = ReconstructionConfig::default();
    config.scan.samples = 256;
    config.scan.fast_axis_points = 100;
    config.scan.slow_axis_points = 20;
    config.imaging.n_fft_time = 512;
    config.imaging.n_fft_space = 256;
    config.sweep.start_mm = 300.0;
    config.sweep.end_mm = 345.0;
    config.sweep.step_mm = 3.0;
    config
}

fn spectrum(config: &ReconstructionConfig) -> RangeSpectrum {
    let scan = &config.scan;
    let cube = Array3::from_shape_fn(
        (scan.samples, scan.slow_axis_points, scan.fast_axis_points),
        |(t, y, x)| Complex64::from_polar(1.0, 0.3 * t as f64 + 0.01 * (x * y) as f64),
    );
    RangeSpectrum::from_cube(&cube, config).expect("Bench cube does not match config")
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = bench_config();
    let spectrum = spectrum(&config);

    c.bench_function("Depth sweep", |b| {
        b.iter(|| sweep(&spectrum, &config).expect("Sweep failed"))
    });
    c.bench_function("Parallel depth sweep", |b| {
        b.iter(|| par_sweep(&spectrum, &config).expect("Sweep failed"))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
