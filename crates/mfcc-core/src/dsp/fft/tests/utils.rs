//! Shared helpers for the FFT tests

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use crate::types::ComplexSample;

/// Floating-point `DFT / N` of `input`
pub fn reference_dft(input: &[ComplexSample]) -> Vec<Complex<f64>> {
    let n = input.len();
    let mut buffer: Vec<Complex<f64>> = input
        .iter()
        .map(|x| Complex::new(f64::from(x.re), f64::from(x.im)))
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);
    buffer.into_iter().map(|x| x / n as f64).collect()
}

/// Largest component error between a fixed-point and a reference spectrum
pub fn max_error(got: &[ComplexSample], expected: &[Complex<f64>]) -> f64 {
    got.iter()
        .zip(expected)
        .map(|(g, e)| {
            (f64::from(g.re) - e.re)
                .abs()
                .max((f64::from(g.im) - e.im).abs())
        })
        .fold(0.0, f64::max)
}

/// Error bound for an `n`-point transform: one LSB of rounding per stage
/// plus the final truncation
pub fn tolerance(n: usize) -> f64 {
    2.0 * (n as f64).log2() + 1.0
}

/// Random complex vector with components in `-amplitude..amplitude`
pub fn random_input(n: usize, amplitude: i32, complex: bool, seed: u64) -> Vec<ComplexSample> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let re = rng.gen_range(-amplitude..amplitude);
            let im = if complex { rng.gen_range(-amplitude..amplitude) } else { 0 };
            ComplexSample::new(re, im)
        })
        .collect()
}
