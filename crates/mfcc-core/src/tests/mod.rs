//! Pipeline Test Modules
//!
//! End-to-end checks of the assembled MFCC chain and of partial chains
//! against the floating-point reference models.

pub mod chain_tests;

/// Common test utilities
pub mod utils {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::types::{MfccConfig, MultiplierKind};

    /// 16-sample vector used to check the DCT-based chain
    pub const REFERENCE_VECTOR: [u16; 16] = [
        0x4000, 0x3e29, 0x8fc2, 0x018c, 0xf3ff, 0x2cba, 0x5362, 0x9555, 0xf221, 0xfcdf, 0x19b0,
        0x635e, 0xa151, 0xe017, 0x0636, 0x0861,
    ];

    /// Sine tone as 16-bit PCM
    pub fn generate_tone(length: usize, sample_rate: u32, frequency: f64, amplitude: f64) -> Vec<i16> {
        (0..length)
            .map(|i| {
                let t = i as f64 / f64::from(sample_rate);
                let sample = (2.0 * std::f64::consts::PI * frequency * t).sin() * amplitude;
                sample.clamp(-32768.0, 32767.0) as i16
            })
            .collect()
    }

    /// Uniform noise as 16-bit PCM
    pub fn generate_noise(length: usize, amplitude: i16, seed: u64) -> Vec<i16> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..length).map(|_| rng.gen_range(-amplitude..=amplitude)).collect()
    }

    /// Small configuration that keeps simulations short
    pub fn small_config(multiplier: MultiplierKind) -> MfccConfig {
        MfccConfig::new()
            .with_nfft(64)
            .with_nfilters(8)
            .with_ceptrums(6, 1)
            .with_multiplier(multiplier)
    }
}
