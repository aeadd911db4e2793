//! Radix-2 butterfly
//!
//! `y0 = (x0 + ω·x1) / 2`, `y1 = (x0 - ω·x1) / 2`, with the complex product
//! computed from three real multiplications:
//!
//! ```text
//! m  = (Re x1 + Im x1)·Re ω
//! Re = m - Im x1·(Re ω + Im ω)
//! Im = m - Re x1·(Re ω - Im ω)
//! ```
//!
//! A rounding bias is added to `m` before the products are scaled back by
//! `width - 2` bits (the twiddle scale). Results wrap to `width` bits.

use crate::types::ComplexSample;
use crate::utils::fixed_point::wrap_signed;

/// Register stages between operands and results
pub const BUTTERFLY_LATENCY: usize = 7;

/// Butterfly outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButterflyOutput {
    /// `(x0 + ω·x1) / 2`
    pub y0: ComplexSample,
    /// `(x0 - ω·x1) / 2`
    pub y1: ComplexSample,
}

/// Evaluate one butterfly on `width`-bit operands
pub fn butterfly(
    x0: ComplexSample,
    x1: ComplexSample,
    tw: ComplexSample,
    width: u32,
) -> ButterflyOutput {
    let bias_width = width - 2;
    let bias = (1i64 << (bias_width - 1)) - 1;

    let (x0r, x0i) = (i64::from(x0.re), i64::from(x0.im));
    let (x1r, x1i) = (i64::from(x1.re), i64::from(x1.im));
    let (twr, twi) = (i64::from(tw.re), i64::from(tw.im));

    let mul0 = (x1r + x1i) * twr + bias;
    let re = (mul0 - x1i * (twr + twi)) >> bias_width;
    let im = (mul0 - x1r * (twr - twi)) >> bias_width;

    let scale = |value: i64| wrap_signed(value >> 1, width) as i32;
    ButterflyOutput {
        y0: ComplexSample::new(scale(x0r + re), scale(x0i + im)),
        y1: ComplexSample::new(scale(x0r - re), scale(x0i - im)),
    }
}

/// Fixed-latency butterfly pipeline
///
/// Each slot carries the tag of the operation it holds so the scheduler can
/// place results without tracking timing itself.
#[derive(Debug, Clone)]
pub struct ButterflyPipe<T> {
    width: u32,
    slots: [Option<(T, ButterflyOutput)>; BUTTERFLY_LATENCY],
}

impl<T: Copy> ButterflyPipe<T> {
    /// Create an empty pipeline for `width`-bit data
    pub fn new(width: u32) -> Self {
        Self {
            width,
            slots: [None; BUTTERFLY_LATENCY],
        }
    }

    /// Result leaving the pipeline this cycle
    pub fn output(&self) -> Option<(T, ButterflyOutput)> {
        self.slots[BUTTERFLY_LATENCY - 1]
    }

    /// Advance one cycle, entering `issued` operands
    pub fn clock(&mut self, issued: Option<(T, ComplexSample, ComplexSample, ComplexSample)>) {
        self.slots.rotate_right(1);
        self.slots[0] = issued.map(|(tag, x0, x1, tw)| (tag, butterfly(x0, x1, tw, self.width)));
    }

    /// True when no operation is in flight
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Flush every in-flight operation
    pub fn reset(&mut self) {
        self.slots = [None; BUTTERFLY_LATENCY];
    }
}
