//! Streaming wrapper around the FFT engine
//!
//! Collects one frame of real samples, transforms it, then emits the lower
//! half of the spectrum (bins `0..nfft/2`) as complex packets. The sink is
//! only ready while filling, so frames are processed strictly one at a time.

use tracing::{debug, trace};

use crate::dsp::fft::{FftConfig, FftEngine};
use crate::error::Result;
use crate::stream::Stage;
use crate::types::{ComplexSample, Packet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fill { count: usize },
    Work,
    Empty { bin: usize },
}

/// Real-input FFT stage
#[derive(Debug, Clone)]
pub struct FftStream {
    engine: FftEngine,
    state: State,
    frames: u64,
}

impl FftStream {
    /// Create a stage for `nfft`-point frames of `width`-bit samples
    pub fn new(width: u32, nfft: usize) -> Result<Self> {
        let engine = FftEngine::new(FftConfig::new(nfft, width))?;
        debug!("Creating FftStream: nfft {}, width {}", nfft, width);
        Ok(Self {
            engine,
            state: State::Fill { count: 0 },
            frames: 0,
        })
    }

    /// Transform size
    pub fn nfft(&self) -> usize {
        self.engine.size()
    }

    /// Spectra emitted since construction or reset
    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    fn begin_transform(&mut self, count: usize) {
        for addr in count..self.nfft() {
            self.engine.load(addr, ComplexSample::new(0, 0));
        }
        self.engine.start();
        self.state = State::Work;
    }
}

impl Stage for FftStream {
    type Input = i32;
    type Output = ComplexSample;

    fn ready(&self, _out_ready: bool) -> bool {
        matches!(self.state, State::Fill { .. })
    }

    fn output(&self) -> Option<Packet<ComplexSample>> {
        match self.state {
            State::Empty { bin } => Some(Packet::with_flags(
                self.engine.read(bin),
                bin == 0,
                bin + 1 == self.nfft() / 2,
            )),
            _ => None,
        }
    }

    fn clock(&mut self, offered: Option<Packet<i32>>, out_ready: bool) {
        match self.state {
            State::Fill { count } => {
                if let Some(packet) = offered {
                    self.engine.load(count, ComplexSample::new(packet.data, 0));
                    let count = count + 1;
                    if packet.last || count == self.nfft() {
                        self.begin_transform(count);
                    } else {
                        self.state = State::Fill { count };
                    }
                }
            }
            State::Work => {
                if self.engine.clock() {
                    trace!(
                        "FftStream: frame {} transformed in {} cycles",
                        self.frames,
                        self.engine.cycles()
                    );
                    self.state = State::Empty { bin: 0 };
                }
            }
            State::Empty { bin } => {
                if out_ready {
                    if bin + 1 == self.nfft() / 2 {
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
        debug!("FftStream reset");
        self.engine.reset();
        self.state = State::Fill { count: 0 };
        self.frames = 0;
    }
}
