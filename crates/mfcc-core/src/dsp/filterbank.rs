//! Mel filterbank
//!
//! Triangular filters laid out on the Mel scale, evaluated without a
//! division at runtime. Between two consecutive filter points a ramp
//! accumulator grows by a precomputed step per bin; its top half is the
//! weight of the rising edge of the next filter and, complemented, of the
//! falling edge of the current one. When the ramp saturates (or the
//! spectrum ends) the current filter is complete:
//!
//! - `rega` accumulates `power · weight` (the rising edge of filter `k+1`);
//! - `regb` accumulates `power · (1 - weight)` on top of what `rega` held
//!   when the segment began (the falling edge of filter `k`).
//!
//! Filter 0 has no rising edge, so the first saturation emits nothing and
//! exactly `ntap` values leave per spectrum.

use tracing::{debug, warn};

use crate::dsp::multiplier::{MulRequest, Multiplier};
use crate::error::{MfccError, Result};
use crate::stream::Stage;
use crate::types::{MultiplierKind, Packet};
use crate::utils::fixed_point::{mask, mask_wide};
use crate::utils::validation::{validate_power_of_two, validate_width};

/// Hz to Mel
pub fn freq_to_mel(freq: f64) -> f64 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

/// Mel to Hz
pub fn mel_to_freq(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// FFT bins of the `ntap + 2` filter points, evenly spaced in Mel from 0 Hz
/// to the Nyquist frequency
pub fn mel_points(nfft: usize, sample_rate: u32, ntap: usize) -> Vec<usize> {
    let sample_rate = f64::from(sample_rate);
    let top = freq_to_mel(sample_rate / 2.0);
    let count = ntap + 2;
    (0..count)
        .map(|i| {
            let mel = top * i as f64 / (count - 1) as f64;
            ((nfft as f64 + 1.0) / sample_rate * mel_to_freq(mel)).floor() as usize
        })
        .collect()
}

/// Ramp step of each segment between consecutive points
pub fn segment_steps(points: &[usize], width: u32) -> Vec<u64> {
    let full = 1u64 << (2 * width);
    points
        .windows(2)
        .map(|pair| match (pair[1] as i64 - pair[0] as i64 - 1) as u64 {
            0 => full - 1,
            diff if diff < full => full / diff - 1,
            // Coincident points
            _ => full - 1,
        })
        .collect()
}

/// Filterbank parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterBankConfig {
    /// Power spectrum input width
    pub width: u32,
    /// Output width
    pub width_output: u32,
    /// Bits dropped below the top of the accumulator
    pub gain: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// FFT size; `nfft / 2` bins per spectrum
    pub nfft: usize,
    /// Number of filters
    pub ntap: usize,
    /// Multiplier strategy
    pub multiplier: MultiplierKind,
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            width: 30,
            width_output: 16,
            gain: 18,
            sample_rate: 16_000,
            nfft: 512,
            ntap: 32,
            multiplier: MultiplierKind::Pipelined,
        }
    }
}

/// Sideband carried through the multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FilterTag {
    highest: bool,
    adr: usize,
    data: u64,
}

/// Streaming Mel filterbank
#[derive(Debug, Clone)]
pub struct FilterBank {
    config: FilterBankConfig,
    points: Vec<usize>,
    steps: Vec<u64>,
    acc_width: u32,
    // Ramp side
    acc: u64,
    adr: usize,
    mul: Multiplier<FilterTag>,
    // Accumulator side
    rega: u128,
    regb: u128,
    held: Option<Packet<u32>>,
    first: bool,
}

impl FilterBank {
    /// Build the filterbank
    ///
    /// # Errors
    ///
    /// Fails when the points cannot yield exactly `ntap` outputs for an
    /// `nfft / 2`-bin spectrum, or when gain and output width do not fit the
    /// accumulator.
    pub fn new(config: FilterBankConfig) -> Result<Self> {
        validate_width("filterbank input", config.width, 1, 31)?;
        validate_width("filterbank output", config.width_output, 1, 32)?;
        validate_power_of_two(config.nfft, 4)?;
        if config.ntap == 0 || config.sample_rate == 0 {
            return Err(MfccError::invalid_filterbank(
                "Filter count and sample rate must be positive",
            ));
        }

        let points = mel_points(config.nfft, config.sample_rate, config.ntap);
        let steps = segment_steps(&points, config.width);

        let coincident = points.windows(2).filter(|p| p[0] == p[1]).count();
        if coincident > 0 {
            warn!(
                "FilterBank: {} coincident Mel points for nfft {} and {} filters",
                coincident, config.nfft, config.ntap
            );
        }

        let n = points.len();
        let span = points[n - 1] - points[n - 3];
        if span == 0 {
            return Err(MfccError::invalid_filterbank(format!(
                "Top filters collapse onto bin {} for nfft {}",
                points[n - 1],
                config.nfft
            )));
        }
        let acc_width = span.ilog2() + 2 * config.width;
        if config.gain + config.width_output > acc_width || acc_width > 128 {
            return Err(MfccError::invalid_filterbank(format!(
                "Gain {} plus output width {} exceeds the {}-bit accumulator",
                config.gain, config.width_output, acc_width
            )));
        }

        let emitted = count_outputs(&steps, config.width, config.nfft / 2);
        if emitted != config.ntap {
            return Err(MfccError::invalid_filterbank(format!(
                "{} filters over {} bins yield {} outputs",
                config.ntap,
                config.nfft / 2,
                emitted
            )));
        }

        debug!(
            "Creating FilterBank: {} filters, nfft {}, accumulator {} bits, gain {}, output {} bits",
            config.ntap, config.nfft, acc_width, config.gain, config.width_output
        );

        Ok(Self {
            config,
            points,
            steps,
            acc_width,
            acc: 0,
            adr: 0,
            mul: Multiplier::new(config.multiplier, config.width),
            rega: 0,
            regb: 0,
            held: None,
            first: true,
        })
    }

    /// Filter points in FFT bins
    pub fn points(&self) -> &[usize] {
        &self.points
    }

    /// Per-segment ramp steps
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    /// Accumulator register width
    pub fn accumulator_width(&self) -> u32 {
        self.acc_width
    }

    /// Number of filters
    pub fn ntap(&self) -> usize {
        self.config.ntap
    }

    fn scaled(&self, value: u128) -> u32 {
        let shift = self.acc_width - self.config.gain - self.config.width_output;
        ((value >> shift) as u64 & mask(self.config.width_output)) as u32
    }

    fn drain(&self, out_ready: bool) -> bool {
        self.held.is_none() || out_ready
    }
}

/// Ramp weight and saturation flag for an accumulator value
fn weight(acc: u64, width: u32) -> (u64, bool) {
    let weight = acc >> width;
    (weight, weight == mask(width))
}

/// Next ramp state after a bin
fn advance(acc: u64, adr: usize, steps: &[u64], width: u32, end: bool) -> (u64, usize) {
    let (_, highest) = weight(acc, width);
    if highest || end {
        (0, if end { 0 } else { adr + 1 })
    } else {
        let step = steps.get(adr).copied().unwrap_or(0);
        (acc.wrapping_add(step) & mask(2 * width), adr)
    }
}

/// Outputs one spectrum of `bins` bins produces
fn count_outputs(steps: &[u64], width: u32, bins: usize) -> usize {
    let (mut acc, mut adr, mut outputs) = (0, 0, 0);
    for bin in 0..bins {
        let end = bin + 1 == bins;
        let (_, highest) = weight(acc, width);
        if (highest || end) && adr != 0 {
            outputs += 1;
        }
        (acc, adr) = advance(acc, adr, steps, width, end);
    }
    outputs
}

impl Stage for FilterBank {
    type Input = u64;
    type Output = u32;

    fn ready(&self, out_ready: bool) -> bool {
        self.mul.ready(self.drain(out_ready))
    }

    fn output(&self) -> Option<Packet<u32>> {
        self.held
    }

    fn clock(&mut self, offered: Option<Packet<u64>>, out_ready: bool) {
        let drain = self.drain(out_ready);
        let accepted = offered.filter(|_| self.mul.ready(drain));
        let product = self.mul.output().filter(|_| drain);

        let width = self.config.width;
        let request = accepted.map(|packet| {
            let (w, highest) = weight(self.acc, width);
            packet.map(|data| {
                let data = data & mask(width);
                MulRequest::new(
                    data as i64,
                    w as i64,
                    FilterTag {
                        highest,
                        adr: self.adr,
                        data,
                    },
                )
            })
        });
        self.mul.clock(request, drain);

        if drain {
            self.held = None;
        }

        if let Some(packet) = product {
            let tag = packet.data.tag;
            let c = packet.data.product as u128;
            let shifted = u128::from(tag.data) << width;
            let range = mask_wide(self.acc_width);

            if tag.highest || packet.last {
                if tag.adr != 0 {
                    self.held = Some(Packet::with_flags(
                        self.scaled(self.regb),
                        self.first,
                        packet.last,
                    ));
                    self.first = packet.last;
                }
                self.regb = self.rega.wrapping_add(shifted) & range;
                self.rega = 0;
            } else {
                self.rega = self.rega.wrapping_add(c) & range;
                self.regb = self.regb.wrapping_add(shifted).wrapping_sub(c) & range;
            }
        }

        if let Some(packet) = accepted {
            (self.acc, self.adr) = advance(self.acc, self.adr, &self.steps, width, packet.last);
        }
    }

    fn reset(&mut self) {
        debug!("FilterBank reset");
        self.acc = 0;
        self.adr = 0;
        self.mul.reset();
        self.rega = 0;
        self.regb = 0;
        self.held = None;
        self.first = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamDriver, packets};
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn run(bank: FilterBank, spectra: &[Vec<u64>]) -> Vec<Vec<u32>> {
        run_seeded(bank, spectra, 10)
    }

    fn run_seeded(bank: FilterBank, spectra: &[Vec<u64>], seed: u64) -> Vec<Vec<u32>> {
        let ntap = bank.ntap();
        let inputs: Vec<Packet<u64>> = spectra.iter().flat_map(|s| packets(s, true)).collect();
        let mut driver = StreamDriver::new(bank);
        let mut valid_rng = SmallRng::seed_from_u64(seed);
        let mut ready_rng = SmallRng::seed_from_u64(seed.wrapping_add(10));
        let report = driver.run(
            &inputs,
            ntap * spectra.len(),
            |_| valid_rng.gen_bool(0.8),
            |_| ready_rng.gen_bool(0.7),
        );
        for (i, packet) in report.outputs.iter().enumerate() {
            assert_eq!(packet.first, i % ntap == 0, "first at {}", i);
            assert_eq!(packet.last, i % ntap == ntap - 1, "last at {}", i);
        }
        report.frames()
    }

    #[test]
    fn test_default_points() {
        let points = mel_points(512, 16_000, 32);
        assert_eq!(points.len(), 34);
        assert_eq!(points[0], 0);
        assert_eq!(points[31..], [216, 235, 256]);
        assert!(points.windows(2).all(|p| p[0] <= p[1]));

        let bank = FilterBank::new(FilterBankConfig::default()).unwrap();
        assert_eq!(bank.points(), points.as_slice());
        let full = 1u64 << 60;
        assert_eq!(bank.steps().len(), 33);
        assert_eq!(bank.steps()[..4], [full - 1, full - 1, full - 1, full / 2 - 1]);
    }

    #[test]
    fn test_mel_round_trip() {
        for freq in [0.0, 300.0, 1000.0, 8000.0] {
            assert!((mel_to_freq(freq_to_mel(freq)) - freq).abs() < 1e-6);
        }
        assert!((freq_to_mel(700.0) - 2595.0 * 2f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_segment_steps() {
        let steps = segment_steps(&[0, 0, 1, 2, 6], 4);
        assert_eq!(steps, vec![255, 255, 255, 256 / 3 - 1]);
    }

    #[test]
    fn test_one_output_per_filter() {
        let bank = FilterBank::new(FilterBankConfig::default()).unwrap();
        assert_eq!(bank.accumulator_width(), 65);

        let mut rng = SmallRng::seed_from_u64(1);
        let spectra: Vec<Vec<u64>> = (0..2)
            .map(|_| (0..256).map(|_| rng.gen_range(0..1 << 30)).collect())
            .collect();
        let frames = run(bank, &spectra);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.len() == 32));
    }

    #[test]
    fn test_impulse_splits_between_neighbours() {
        let bank = FilterBank::new(FilterBankConfig::default()).unwrap();
        let mut spectrum = vec![0u64; 256];
        spectrum[100] = 1000;
        let frames = run(bank, &[spectrum]);

        let hits: Vec<(usize, u32)> = frames[0]
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, v)| v != 0)
            .collect();
        assert!(!hits.is_empty() && hits.len() <= 2, "{:?}", hits);
        if hits.len() == 2 {
            assert_eq!(hits[0].0 + 1, hits[1].0);
        }
        let total: u32 = hits.iter().map(|&(_, v)| v).sum();
        assert!((499..=500).contains(&total), "total {}", total);
    }

    #[test]
    fn test_strategies_agree() {
        let config = FilterBankConfig {
            nfft: 64,
            ntap: 8,
            ..FilterBankConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let spectra: Vec<Vec<u64>> = vec![(0..32).map(|_| rng.gen_range(0..1 << 24)).collect()];

        let pipelined = run(FilterBank::new(config).unwrap(), &spectra);
        let shift_add = run(
            FilterBank::new(FilterBankConfig {
                multiplier: MultiplierKind::ShiftAdd,
                ..config
            })
            .unwrap(),
            &spectra,
        );
        assert_eq!(pipelined, shift_add);
    }

    #[test]
    fn test_rejects_impossible_layouts() {
        let too_many = FilterBankConfig {
            ntap: 64,
            ..FilterBankConfig::default()
        };
        assert!(matches!(
            FilterBank::new(too_many),
            Err(MfccError::InvalidFilterBank { .. })
        ));

        let too_much_gain = FilterBankConfig {
            gain: 60,
            ..FilterBankConfig::default()
        };
        assert!(FilterBank::new(too_much_gain).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn prop_accepted_layouts_emit_ntap(
            log2_nfft in 6u32..=10,
            ntap_frac in 0.0f64..1.0,
            sample_rate in prop::sample::select(vec![8_000u32, 16_000, 22_050, 44_100]),
            seed in any::<u64>(),
        ) {
            let nfft = 1usize << log2_nfft;
            let ntap = 4 + ((nfft / 8 - 4) as f64 * ntap_frac) as usize;
            let config = FilterBankConfig {
                nfft,
                ntap,
                sample_rate,
                ..FilterBankConfig::default()
            };
            let bank = FilterBank::new(config);
            prop_assume!(bank.is_ok());

            let mut rng = SmallRng::seed_from_u64(seed);
            let spectra: Vec<Vec<u64>> = (0..2)
                .map(|_| (0..nfft / 2).map(|_| rng.gen_range(0..1 << 30)).collect())
                .collect();
            let frames = run_seeded(bank.unwrap(), &spectra, seed);
            prop_assert_eq!(frames.len(), 2);
            for frame in &frames {
                prop_assert_eq!(frame.len(), ntap);
                prop_assert!(frame.iter().all(|&v| v <= mask(16) as u32));
            }
        }
    }
}
