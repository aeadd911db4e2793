//! DCT-II through a `4N`-point FFT
//!
//! Each of the `N` inputs lands twice in a `4N`-point real buffer, at
//! `2n + 1` and at its mirror `4N - 1 - 2n`; every even slot is zero. The
//! FFT of that buffer is real-valued in its first `N` bins and equals the
//! unnormalised DCT-II
//!
//! ```text
//! X[k] = 2 · Σ x[n] · cos(π k (2n + 1) / 2N)
//! ```
//!
//! scaled by the engine's `1 / 4N`.
//!
//! The fill counter walks the `4N` slots in groups of four, advancing on
//! every cycle the producer is valid. The sample is written on the second
//! and fourth slot of its group and consumed on the fourth.

use tracing::{debug, trace};

use crate::dsp::fft::{FftConfig, FftEngine};
use crate::error::Result;
use crate::stream::Stage;
use crate::types::{ComplexSample, Packet};
use crate::utils::validation::validate_power_of_two;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fill { count: usize },
    Work,
    Empty { bin: usize },
}

/// Streaming DCT-II
#[derive(Debug, Clone)]
pub struct DctStream {
    n: usize,
    engine: FftEngine,
    state: State,
    frames: u64,
}

impl DctStream {
    /// Create a stage transforming `n` values of `width` bits
    ///
    /// # Errors
    ///
    /// `n` must be a power of two.
    pub fn new(width: u32, n: usize) -> Result<Self> {
        validate_power_of_two(n, 1)?;
        let engine = FftEngine::new(FftConfig::new(4 * n, width))?;
        debug!("Creating DctStream: {} points, {}-point FFT", n, 4 * n);

        Ok(Self {
            n,
            engine,
            state: State::Fill { count: 0 },
            frames: 0,
        })
    }

    /// Number of values per transform
    pub fn len(&self) -> usize {
        self.n
    }

    /// Always false; a DCT has at least one point
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Transforms emitted since construction or reset
    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    /// FFT address written at fill slot `count`
    fn slot_address(&self, count: usize) -> usize {
        let half = count >> 1;
        let mirrored = (count ^ (count >> 1)) & 1 == 1;
        if mirrored {
            4 * self.n - 1 - half
        } else {
            half
        }
    }

    fn write_slot(&mut self, count: usize, sample: i32) {
        let value = if count & 1 == 1 { sample } else { 0 };
        self.engine
            .load(self.slot_address(count), ComplexSample::new(value, 0));
    }
}

impl Stage for DctStream {
    type Input = i32;
    type Output = i32;

    fn ready(&self, _out_ready: bool) -> bool {
        matches!(self.state, State::Fill { count } if count % 4 == 3)
    }

    fn output(&self) -> Option<Packet<i32>> {
        match self.state {
            State::Empty { bin } => Some(Packet::with_flags(
                self.engine.read(bin).re,
                bin == 0,
                bin + 1 == self.n,
            )),
            _ => None,
        }
    }

    fn clock(&mut self, offered: Option<Packet<i32>>, out_ready: bool) {
        match self.state {
            State::Fill { count } => {
                let Some(packet) = offered else {
                    return;
                };
                self.write_slot(count, packet.data);
                let next = count + 1;

                if count % 4 == 3 && (packet.last || next == 4 * self.n) {
                    // A short sequence leaves the tail of the buffer zero.
                    for slot in next..4 * self.n {
                        self.write_slot(slot, 0);
                    }
                    self.engine.start();
                    self.state = State::Work;
                } else {
                    self.state = State::Fill { count: next };
                }
            }
            State::Work => {
                if self.engine.clock() {
                    trace!(
                        "DctStream: transform {} done in {} cycles",
                        self.frames,
                        self.engine.cycles()
                    );
                    self.state = State::Empty { bin: 0 };
                }
            }
            State::Empty { bin } => {
                if out_ready {
                    if bin + 1 == self.n {
                        self.frames += 1;
                        self.state = State::Fill { count: 0 };
                    } else {
                        self.state = State::Empty { bin: bin + 1 };
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        debug!("DctStream reset");
        self.engine.reset();
        self.state = State::Fill { count: 0 };
        self.frames = 0;
    }
}
