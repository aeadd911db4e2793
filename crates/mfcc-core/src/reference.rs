//! Floating-point reference models
//!
//! Straightforward `f64` versions of every stage, used to check the
//! fixed-point pipeline and by `mfcc_dump --reference`. They follow the
//! same conventions (periodic window, Mel point layout, unnormalised
//! DCT-II) but none of the scaling, so compare shapes or rescale first.

use num_complex::Complex;
use rustfft::FftPlanner;

use crate::dsp::filterbank::mel_points;
use crate::types::MfccConfig;

/// `y[n] = x[n] - (1 - 2^-shift)·x[n-1]`
pub fn pre_emphasis(samples: &[f64], shift: u32) -> Vec<f64> {
    let alpha = 1.0 - 1.0 / f64::from(1u32 << shift);
    let mut prev = 0.0;
    samples
        .iter()
        .map(|&x| {
            let y = x - alpha * prev;
            prev = x;
            y
        })
        .collect()
}

/// Overlapping frames, zero padded to `nfft`, one per window start inside
/// the signal
pub fn frames(samples: &[f64], window_len: usize, step: usize, nfft: usize) -> Vec<Vec<f64>> {
    (0..samples.len())
        .step_by(step.max(1))
        .map(|start| {
            let mut frame: Vec<f64> = samples[start..]
                .iter()
                .take(window_len)
                .copied()
                .collect();
            frame.resize(nfft, 0.0);
            frame
        })
        .collect()
}

/// Periodic Hamming window of `len` points
pub fn hamming(len: usize) -> Vec<f64> {
    apodize::hamming_iter(len + 1).take(len).collect()
}

/// Complex DFT of a real frame
pub fn dft(frame: &[f64]) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = frame.iter().map(|&x| Complex::new(x, 0.0)).collect();
    FftPlanner::new()
        .plan_fft_forward(buffer.len())
        .process(&mut buffer);
    buffer
}

/// `|X[k]|²` for the lower half of the spectrum
pub fn power_spectrum(frame: &[f64]) -> Vec<f64> {
    let spectrum = dft(frame);
    spectrum[..frame.len() / 2]
        .iter()
        .map(Complex::norm_sqr)
        .collect()
}

/// Triangular Mel filter energies over a half spectrum
pub fn mel_energies(power: &[f64], nfft: usize, sample_rate: u32, ntap: usize) -> Vec<f64> {
    let points = mel_points(nfft, sample_rate, ntap);
    points
        .windows(3)
        .map(|p| {
            let (lo, mid, hi) = (p[0], p[1], p[2]);
            let mut energy = 0.0;
            for (k, &value) in power.iter().enumerate().take(hi + 1).skip(lo) {
                let weight = if k <= mid {
                    if mid == lo { 1.0 } else { (k - lo) as f64 / (mid - lo) as f64 }
                } else {
                    (hi - k) as f64 / (hi - mid) as f64
                };
                energy += weight * value;
            }
            energy
        })
        .collect()
}

/// Base-2 logarithm, clamped away from zero
pub fn log2(x: f64) -> f64 {
    x.max(f64::MIN_POSITIVE).log2()
}

/// Unnormalised DCT-II: `X[k] = 2·Σ x[n]·cos(πk(2n+1)/2N)`
pub fn dct_ii(x: &[f64]) -> Vec<f64> {
    let n = x.len() as f64;
    (0..x.len())
        .map(|k| {
            2.0 * x
                .iter()
                .enumerate()
                .map(|(i, &v)| v * (std::f64::consts::PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n)).cos())
                .sum::<f64>()
        })
        .collect()
}

/// Whole floating-point MFCC for one recording
pub fn mfcc(samples: &[i16], config: &MfccConfig) -> Vec<Vec<f64>> {
    let x: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    let emphasized = pre_emphasis(&x, config.preemph_shift);
    let window = hamming(config.nfft);

    frames(&emphasized, config.window_len, config.step, config.nfft)
        .into_iter()
        .map(|mut frame| {
            if config.window_enabled {
                for (sample, w) in frame.iter_mut().zip(&window) {
                    *sample *= w;
                }
            }
            let power = power_spectrum(&frame);
            let logs: Vec<f64> = mel_energies(&power, config.nfft, config.sample_rate, config.nfilters)
                .into_iter()
                .map(log2)
                .collect();
            dct_ii(&logs)
                .into_iter()
                .skip(config.cepstrum_offset)
                .take(config.nceptrums)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_emphasis() {
        let y = pre_emphasis(&[32.0, 32.0], 5);
        assert_eq!(y, vec![32.0, 1.0]);
    }

    #[test]
    fn test_frames() {
        let x: Vec<f64> = (1..=5).map(f64::from).collect();
        let f = frames(&x, 3, 2, 4);
        assert_eq!(f, vec![
            vec![1.0, 2.0, 3.0, 0.0],
            vec![3.0, 4.0, 5.0, 0.0],
            vec![5.0, 0.0, 0.0, 0.0],
        ]);
    }

    #[test]
    fn test_dct_ii_of_constant() {
        let y = dct_ii(&[1.0; 8]);
        assert!((y[0] - 16.0).abs() < 1e-9);
        assert!(y[1..].iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_hamming_is_periodic() {
        let w = hamming(16);
        assert!((w[0] - 0.08).abs() < 1e-9);
        assert!((w[8] - 1.0).abs() < 1e-9);
        assert!((w[4] - w[12]).abs() < 1e-9);
    }

    #[test]
    fn test_mfcc_shape() {
        let config = MfccConfig::new().with_nfft(64).with_nfilters(8).with_ceptrums(6, 1);
        let samples: Vec<i16> = (0..200).map(|i| ((i * 37) % 200 - 100) as i16 * 50).collect();
        let columns = mfcc(&samples, &config);
        assert_eq!(columns.len(), 200usize.div_ceil(21));
        assert!(columns.iter().all(|c| c.len() == 6));
    }
}
