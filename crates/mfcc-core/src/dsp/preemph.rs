//! Pre-emphasis filter
//!
//! First-order high-pass `y[n] = x[n] + (x[n-1] >> k) - x[n-1]`, i.e.
//! `x[n] - (1 - 2^-k)·x[n-1]` with the coefficient realised as a shift.
//! With `k = 5` the coefficient is 0.96875. Results wrap to the sample width
//! exactly as the hardware register does.
//!
//! The filter is combinational: it sits in front of the framer as a
//! [`StreamFilter`] and only its delay register carries state.

use tracing::debug;

use crate::stream::StreamFilter;
use crate::types::Packet;
use crate::utils::fixed_point::wrap_signed;

/// Pre-emphasis with a one-sample delay register
#[derive(Debug, Clone)]
pub struct PreEmphasis {
    width: u32,
    shift: u32,
    prev: i32,
}

impl PreEmphasis {
    /// Create a filter for `width`-bit samples with coefficient `1 - 2^-shift`
    pub fn new(width: u32, shift: u32) -> Self {
        debug!("Creating PreEmphasis: width {}, shift {}", width, shift);
        Self {
            width,
            shift,
            prev: 0,
        }
    }

    /// Filter output for `x` given the current delay register
    #[inline]
    pub fn emphasize(&self, x: i32) -> i32 {
        let prev = i64::from(self.prev);
        wrap_signed(i64::from(x) + (prev >> self.shift) - prev, self.width) as i32
    }

    /// Filter a block of samples in place
    pub fn process(&mut self, samples: &mut [i32]) {
        for sample in samples.iter_mut() {
            let input = *sample;
            *sample = self.emphasize(input);
            self.prev = input;
        }
    }
}

impl StreamFilter for PreEmphasis {
    type Input = i32;
    type Output = i32;

    fn apply(&self, packet: Packet<i32>) -> Packet<i32> {
        packet.map(|x| self.emphasize(x))
    }

    fn commit(&mut self, packet: &Packet<i32>) {
        self.prev = packet.data;
    }

    fn reset(&mut self) {
        self.prev = 0;
    }
}
