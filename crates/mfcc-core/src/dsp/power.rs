//! Power spectrum
//!
//! `|X|² = Re² + Im²`, one multiplier per component. The sum lives in a
//! `2·width`-bit register; the stage outputs its top `width_output` bits.

use tracing::debug;

use crate::dsp::multiplier::{MulRequest, Multiplier};
use crate::error::Result;
use crate::stream::Stage;
use crate::types::{ComplexSample, MultiplierKind, Packet};
use crate::utils::fixed_point::wrap_unsigned;
use crate::utils::validation::validate_width;

/// Squared magnitude of complex bins
#[derive(Debug, Clone)]
pub struct PowerSpectrum {
    width: u32,
    width_output: u32,
    mul_r: Multiplier<()>,
    mul_i: Multiplier<()>,
}

impl PowerSpectrum {
    /// Create a stage for `width`-bit components and `width_output`-bit power
    pub fn new(width: u32, width_output: u32, multiplier: MultiplierKind) -> Result<Self> {
        validate_width("power spectrum output", width_output, 1, 2 * width)?;
        debug!(
            "Creating PowerSpectrum: width {}, output {}",
            width, width_output
        );
        Ok(Self {
            width,
            width_output,
            mul_r: Multiplier::new(multiplier, width),
            mul_i: Multiplier::new(multiplier, width),
        })
    }

    /// Power of one bin, as computed by the stage
    pub fn power(&self, bin: ComplexSample) -> u64 {
        let re = i128::from(bin.re);
        let im = i128::from(bin.im);
        self.scale(re * re + im * im)
    }

    fn scale(&self, sum: i128) -> u64 {
        let sum = wrap_unsigned(sum as u64, 2 * self.width);
        sum >> (2 * self.width - self.width_output)
    }

    /// Both products are available and the consumer takes them
    fn drain(&self, out_ready: bool) -> bool {
        out_ready && self.output().is_some()
    }
}

impl Stage for PowerSpectrum {
    type Input = ComplexSample;
    type Output = u64;

    fn ready(&self, out_ready: bool) -> bool {
        let drain = self.drain(out_ready);
        self.mul_r.ready(drain) && self.mul_i.ready(drain)
    }

    fn output(&self) -> Option<Packet<u64>> {
        let r = self.mul_r.output()?;
        let i = self.mul_i.output()?;
        Some(Packet::with_flags(
            self.scale(r.data.product + i.data.product),
            r.first,
            r.last,
        ))
    }

    fn clock(&mut self, offered: Option<Packet<ComplexSample>>, out_ready: bool) {
        let drain = self.drain(out_ready);
        let offered = offered.filter(|_| self.ready(out_ready));

        let square = |value: i32| MulRequest::new(i64::from(value), i64::from(value), ());
        self.mul_r
            .clock(offered.map(|p| p.map(|bin| square(bin.re))), drain);
        self.mul_i
            .clock(offered.map(|p| p.map(|bin| square(bin.im))), drain);
    }

    fn reset(&mut self) {
        debug!("PowerSpectrum reset");
        self.mul_r.reset();
        self.mul_i.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamDriver, packets};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_scaling() {
        let stage = PowerSpectrum::new(16, 30, MultiplierKind::Pipelined).unwrap();
        assert_eq!(stage.power(ComplexSample::new(3, 4)), 25 >> 2);
        assert_eq!(stage.power(ComplexSample::new(-32768, -32768)), 1 << 29);
        assert_eq!(stage.power(ComplexSample::new(1000, 0)), 250_000);
        assert!(PowerSpectrum::new(16, 33, MultiplierKind::Pipelined).is_err());
    }

    #[test]
    fn test_stream_under_stalls() {
        let mut rng = SmallRng::seed_from_u64(3);
        let bins: Vec<ComplexSample> = (0..40)
            .map(|_| ComplexSample::new(rng.gen_range(-32768..32768), rng.gen_range(-32768..32768)))
            .collect();

        for kind in [MultiplierKind::Pipelined, MultiplierKind::ShiftAdd] {
            let stage = PowerSpectrum::new(16, 30, kind).unwrap();
            let expected: Vec<u64> = bins.iter().map(|&b| stage.power(b)).collect();
            let mut driver = StreamDriver::new(stage);
            let report = driver.run(&packets(&bins, true), bins.len(), |c| c % 3 != 0, |c| c % 4 != 1);
            assert_eq!(report.data(), expected, "{kind}");
            assert!(report.outputs[0].first);
            assert!(report.outputs[bins.len() - 1].last);
        }
    }
}
