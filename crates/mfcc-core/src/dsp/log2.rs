//! Fixed-point base-2 logarithm
//!
//! The integer part comes from normalising the input into `[1, 2)` by
//! doubling or halving; each step moves the result by one. The fractional
//! bits are produced one per iteration: square the normalised value and, if
//! the square reaches 2, emit a one and halve it.
//!
//! ```text
//! START -> SHIFT-LEFT -> SHIFT-RIGHT -> CALC-1 <-> CALC-2 -> START
//! ```
//!
//! Squaring goes through a [`Multiplier`], so the iterative strategy makes
//! each fractional bit take several cycles.

use tracing::debug;

use crate::dsp::multiplier::{MulRequest, Multiplier};
use crate::error::{MfccError, Result};
use crate::stream::Stage;
use crate::types::{MultiplierKind, Packet};
use crate::utils::fixed_point::{signed_max, wrap_signed};
use crate::utils::validation::validate_width;

/// Reference evaluation of the stage arithmetic, unwrapped
///
/// `x` is an unsigned value with `frac_bits` fractional bits; the result
/// has `precision` fractional bits. Zero is treated as the smallest
/// positive value.
pub fn log2_fix(x: u64, precision: u32, frac_bits: u32) -> i64 {
    let one = 1u64 << precision;
    let mut x = x.max(1);
    let mut o: i64 = 0;

    while x < one {
        x <<= 1;
        o -= one as i64;
    }
    while x >= 2 * one {
        x >>= 1;
        o += one as i64;
    }

    let mut z = x;
    let mut b = one as i64 >> 1;
    for _ in 0..precision {
        let square = (z * z) >> precision;
        if square >= 2 * one {
            z = square >> 1;
            o += b;
        } else {
            z = square;
        }
        b >>= 1;
    }

    o + (i64::from(precision) - i64::from(frac_bits)) * one as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    ShiftLeft,
    ShiftRight,
    Calc1,
    Calc2,
}

/// Streaming log2
///
/// Outputs are `log2(x)·2^precision`. The MFCC pipeline feeds integer
/// filter energies at precision 10, so its values are `log2(E)·1024`, not
/// Q15.
#[derive(Debug, Clone)]
pub struct Log2Fix {
    width: u32,
    precision: u32,
    frac_bits: u32,
    state: State,
    x: u64,
    o: i64,
    b: i64,
    remaining: u32,
    first: bool,
    last: bool,
    mul: Multiplier<()>,
    held: Option<Packet<i32>>,
}

impl Log2Fix {
    /// Create a stage for `input_width`-bit unsigned inputs with
    /// `frac_bits` fractional bits, producing `width`-bit signed results
    /// with `precision` fractional bits
    ///
    /// # Errors
    ///
    /// Fails when `log2` of the largest input cannot be represented in
    /// `width` bits at this precision.
    pub fn new(
        input_width: u32,
        width: u32,
        precision: u32,
        frac_bits: u32,
        multiplier: MultiplierKind,
    ) -> Result<Self> {
        validate_width("log2 input", input_width, 1, 32)?;
        validate_width("log2 output", width, 2, 32)?;
        validate_width("log2 precision", precision, 1, 20)?;
        if frac_bits > input_width {
            return Err(MfccError::invalid_config(format!(
                "log2 input has {} fractional bits out of {}",
                frac_bits, input_width
            )));
        }
        if (i64::from(input_width) << precision) > signed_max(width) {
            return Err(MfccError::invalid_bit_width(
                "log2 output",
                width,
                input_width.ilog2() + precision + 2,
                32,
            ));
        }

        debug!(
            "Creating Log2Fix: input {} bits ({} fractional), output {} bits, precision {}",
            input_width, frac_bits, width, precision
        );

        Ok(Self {
            width,
            precision,
            frac_bits,
            state: State::Start,
            x: 0,
            o: 0,
            b: 0,
            remaining: 0,
            first: false,
            last: false,
            mul: Multiplier::new(multiplier, precision + 2),
            held: None,
        })
    }

    /// Fractional bits of the result
    pub fn precision(&self) -> u32 {
        self.precision
    }

    fn one(&self) -> u64 {
        1 << self.precision
    }

    fn finish(&mut self) {
        let offset = (i64::from(self.precision) - i64::from(self.frac_bits)) << self.precision;
        let value = wrap_signed(self.o + offset, self.width) as i32;
        self.held = Some(Packet::with_flags(value, self.first, self.last));
        self.mul.reset();
        self.state = State::Start;
    }
}

impl Stage for Log2Fix {
    type Input = u32;
    type Output = i32;

    fn ready(&self, out_ready: bool) -> bool {
        self.state == State::Start && (self.held.is_none() || out_ready)
    }

    fn output(&self) -> Option<Packet<i32>> {
        self.held
    }

    fn clock(&mut self, offered: Option<Packet<u32>>, out_ready: bool) {
        let accepted = offered.filter(|_| self.ready(out_ready));
        if out_ready {
            self.held = None;
        }

        let one = self.one();
        match self.state {
            State::Start => {
                if let Some(packet) = accepted {
                    self.x = u64::from(packet.data).max(1);
                    self.o = 0;
                    self.first = packet.first;
                    self.last = packet.last;
                    self.state = State::ShiftLeft;
                }
                self.mul.clock(None, false);
            }
            State::ShiftLeft => {
                if self.x < one {
                    self.x <<= 1;
                    self.o -= one as i64;
                } else {
                    self.state = State::ShiftRight;
                }
                self.mul.clock(None, false);
            }
            State::ShiftRight => {
                if self.x >= 2 * one {
                    self.x >>= 1;
                    self.o += one as i64;
                } else {
                    self.b = one as i64 >> 1;
                    self.remaining = self.precision;
                    self.state = State::Calc1;
                }
                self.mul.clock(None, false);
            }
            State::Calc1 => {
                let z = self.x as i64;
                if self.mul.ready(false) {
                    self.state = State::Calc2;
                }
                self.mul.clock(Some(Packet::new(MulRequest::new(z, z, ()))), false);
            }
            State::Calc2 => {
                let Some(result) = self.mul.output() else {
                    self.mul.clock(None, true);
                    return;
                };
                self.mul.clock(None, true);

                let square = (result.data.product >> self.precision) as u64;
                if square >= 2 * one {
                    self.x = square >> 1;
                    self.o += self.b;
                } else {
                    self.x = square;
                }
                self.b >>= 1;
                self.remaining -= 1;

                if self.remaining == 0 {
                    self.finish();
                } else {
                    self.state = State::Calc1;
                }
            }
        }
    }

    fn reset(&mut self) {
        debug!("Log2Fix reset");
        self.state = State::Start;
        self.x = 0;
        self.o = 0;
        self.b = 0;
        self.remaining = 0;
        self.mul.reset();
        self.held = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamDriver, packets};
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        assert_eq!(log2_fix(1, 10, 0), 0);
        assert_eq!(log2_fix(2, 10, 0), 1024);
        assert_eq!(log2_fix(3, 10, 0), 1622);
        assert_eq!(log2_fix(0, 10, 0), 0);
        // 1.0 and 0.5 with ten fractional input bits
        assert_eq!(log2_fix(1024, 10, 10), 0);
        assert_eq!(log2_fix(512, 10, 10), -1024);
    }

    #[test]
    fn test_stage_matches_model() {
        let inputs: Vec<u32> = vec![1, 2, 3, 100, 1000, 4095, 65535, 0, 12345];
        for kind in [MultiplierKind::Pipelined, MultiplierKind::ShiftAdd] {
            let stage = Log2Fix::new(16, 16, 10, 0, kind).unwrap();
            let mut driver = StreamDriver::new(stage);
            let report = driver.run(&packets(&inputs, true), inputs.len(), |c| c % 2 == 0, |c| c % 5 != 3);
            let expected: Vec<i32> = inputs.iter().map(|&x| log2_fix(u64::from(x), 10, 0) as i32).collect();
            assert_eq!(report.data(), expected, "{kind}");
            assert!(report.outputs[0].first);
            assert!(report.outputs[inputs.len() - 1].last);
        }
    }

    #[test]
    fn test_output_scale() {
        let inputs: Vec<u32> = (0..16).map(|k| 1 << k).collect();
        let stage = Log2Fix::new(16, 16, 10, 0, MultiplierKind::Pipelined).unwrap();
        let report = StreamDriver::new(stage).run_free(&packets(&inputs, true), inputs.len());
        let expected: Vec<i32> = (0..16).map(|k| k << 10).collect();
        assert_eq!(report.data(), expected);
    }

    #[test]
    fn test_wide_inputs() {
        for x in [1u64 << 20, 3_000_000, u64::from(u32::MAX)] {
            let got = log2_fix(x, 10, 0) as f64 / 1024.0;
            assert!((got - (x as f64).log2()).abs() <= 6.0 / 1024.0, "x={}", x);
        }
    }

    #[test]
    fn test_rejects_overflowing_precision() {
        assert!(Log2Fix::new(16, 16, 10, 0, MultiplierKind::Pipelined).is_ok());
        assert!(Log2Fix::new(16, 16, 11, 0, MultiplierKind::Pipelined).is_err());
        assert!(Log2Fix::new(16, 16, 15, 0, MultiplierKind::Pipelined).is_err());
    }

    #[test]
    fn test_one_value_at_a_time() {
        let mut stage = Log2Fix::new(16, 16, 10, 0, MultiplierKind::Pipelined).unwrap();
        stage.clock(Some(Packet::new(8)), false);
        assert!(!stage.ready(true));
        let mut cycles = 0;
        while stage.output().is_none() {
            stage.clock(Some(Packet::new(9)), false);
            cycles += 1;
        }
        assert!(cycles >= 20);
        assert_eq!(stage.output().unwrap().data, 3 * 1024);
        // The result is held until taken.
        assert!(!stage.ready(false));
        stage.clock(None, false);
        assert_eq!(stage.output().unwrap().data, 3 * 1024);
    }

    proptest! {
        #[test]
        fn prop_log2_round_trip(x in 1u64..=65535, precision in 6u32..=12) {
            let y = log2_fix(x, precision, 0) as f64 / f64::from(1u32 << precision);
            let scale = f64::from(1u32 << precision);
            prop_assert!((y - (x as f64).log2()).abs() <= 4.0 / scale);
        }
    }
}
