//! Memory-based FFT engine
//!
//! One butterfly unit, three `N/2`-word memory banks and a twiddle ROM. The
//! engine is loaded one word at a time, started, then clocked until it
//! reports completion; the spectrum can then be read back by bin index.
//! Every stage halves its results, so the output is `DFT / N`.

use tracing::{debug, trace};

use super::butterfly::ButterflyPipe;
use super::scheduler::{Bank, Scheduler, Tap};
use super::twiddle::TwiddleRom;
use crate::error::Result;
use crate::types::ComplexSample;
use crate::utils::fixed_point::{bit_reverse, wrap_signed};
use crate::utils::validation::{validate_power_of_two, validate_width};

/// Operands held in the memory read register
type Issued = (Tap, ComplexSample, ComplexSample, ComplexSample);

/// FFT engine parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FftConfig {
    /// Transform size, power of two, at least 4
    pub size: usize,
    /// Width of loaded words
    pub input_width: u32,
    /// Width of read-back words
    pub output_width: u32,
    /// Width of memory words and butterfly arithmetic
    pub memory_width: u32,
    /// Load addresses are already bit-reversed
    pub input_reversed: bool,
}

impl FftConfig {
    /// Same width everywhere, natural-order input
    pub fn new(size: usize, width: u32) -> Self {
        Self {
            size,
            input_width: width,
            output_width: width,
            memory_width: width,
            input_reversed: false,
        }
    }

    /// Set input and output widths independently of the memory width
    pub fn with_io_widths(mut self, input_width: u32, output_width: u32) -> Self {
        self.input_width = input_width;
        self.output_width = output_width;
        self
    }

    /// Declare load addresses as already bit-reversed
    pub fn with_input_reversed(mut self, input_reversed: bool) -> Self {
        self.input_reversed = input_reversed;
        self
    }
}

/// Fixed-point FFT engine
#[derive(Debug, Clone)]
pub struct FftEngine {
    config: FftConfig,
    stages: u32,
    banks: [Vec<ComplexSample>; 3],
    twiddle: TwiddleRom,
    scheduler: Scheduler,
    read_reg: Option<Issued>,
    butterfly: ButterflyPipe<Tap>,
    cycles: u64,
}

impl FftEngine {
    /// Create an engine
    ///
    /// # Errors
    ///
    /// Fails when the size is not a power of two of at least 4, or when the
    /// input or output width exceeds the memory width.
    pub fn new(config: FftConfig) -> Result<Self> {
        let stages = validate_power_of_two(config.size, 4)?;
        validate_width("FFT memory", config.memory_width, 4, 31)?;
        validate_width("FFT input", config.input_width, 2, config.memory_width)?;
        validate_width("FFT output", config.output_width, 2, config.memory_width)?;

        debug!(
            "Creating FftEngine: size {}, widths {}/{}/{}, input reversed {}",
            config.size,
            config.input_width,
            config.memory_width,
            config.output_width,
            config.input_reversed
        );

        let half = config.size / 2;
        Ok(Self {
            config,
            stages,
            banks: std::array::from_fn(|_| vec![ComplexSample::new(0, 0); half]),
            twiddle: TwiddleRom::new(config.size, config.memory_width),
            scheduler: Scheduler::new(config.size),
            read_reg: None,
            butterfly: ButterflyPipe::new(config.memory_width),
            cycles: 0,
        })
    }

    /// Transform size
    pub fn size(&self) -> usize {
        self.config.size
    }

    /// Engine parameters
    pub fn config(&self) -> &FftConfig {
        &self.config
    }

    /// Idle and accepting loads
    pub fn is_ready(&self) -> bool {
        !self.scheduler.is_busy()
    }

    /// Cycles taken by the last (or current) transform
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Write input word `addr`; ignored while a transform runs
    pub fn load(&mut self, addr: usize, value: ComplexSample) {
        if !self.is_ready() {
            trace!("FftEngine: load at {} ignored while busy", addr);
            return;
        }

        let width = self.config.input_width;
        let value = ComplexSample::new(
            wrap_signed(i64::from(value.re), width) as i32,
            wrap_signed(i64::from(value.im), width) as i32,
        );
        let addr = addr % self.config.size;
        let rev = if self.config.input_reversed {
            addr
        } else {
            bit_reverse(addr, self.stages)
        };

        if rev & 1 == 0 {
            self.banks[0][rev >> 1] = value;
        } else {
            self.banks[1][rev >> 1] = value;
            self.banks[2][rev >> 1] = value;
        }
    }

    /// Begin transforming the loaded data
    pub fn start(&mut self) {
        if self.is_ready() {
            self.scheduler.start();
            self.cycles = 0;
        }
    }

    /// Advance one clock; returns true on the cycle the transform completes
    pub fn clock(&mut self) -> bool {
        if !self.scheduler.is_busy() {
            return false;
        }
        self.cycles += 1;

        // Write-back happens before this cycle's read.
        let mut done = false;
        if let Some((tap, out)) = self.butterfly.output() {
            let (plan, finished) = self.scheduler.retire(tap);
            let (to_mem0, to_other) = if plan.swap { (out.y1, out.y0) } else { (out.y0, out.y1) };
            self.banks[Bank::Mem0.index()][plan.addr] = to_mem0;
            self.banks[plan.other.index()][plan.addr] = to_other;
            done = finished;
        }

        self.butterfly.clock(self.read_reg.take());

        if done {
            trace!(
                "FftEngine: {}-point transform in {} cycles",
                self.config.size, self.cycles
            );
            self.butterfly.reset();
            return true;
        }

        self.read_reg = self.scheduler.issue().map(|plan| {
            let (b0, a0) = plan.x0;
            let (b1, a1) = plan.x1;
            (
                plan.tap,
                self.banks[b0.index()][a0],
                self.banks[b1.index()][a1],
                self.twiddle.factor(plan.twiddle),
            )
        });
        false
    }

    /// Read bin `k` of the last completed transform
    pub fn read(&self, k: usize) -> ComplexSample {
        let half = self.config.size / 2;
        let k = k % self.config.size;
        let value = if k < half {
            self.banks[Bank::Mem0.index()][k]
        } else {
            self.banks[Bank::written_by(self.stages - 1).index()][k - half]
        };

        let width = self.config.output_width;
        ComplexSample::new(
            wrap_signed(i64::from(value.re), width) as i32,
            wrap_signed(i64::from(value.im), width) as i32,
        )
    }

    /// Load `input` (zero-extended to the transform size), run to
    /// completion and read every bin back
    pub fn transform(&mut self, input: &[ComplexSample]) -> Vec<ComplexSample> {
        for addr in 0..self.config.size {
            let value = input.get(addr).copied().unwrap_or_default();
            self.load(addr, value);
        }
        self.start();
        while !self.clock() {}
        (0..self.config.size).map(|k| self.read(k)).collect()
    }

    /// Abandon any transform and clear the memories
    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.butterfly.reset();
        self.read_reg = None;
        self.cycles = 0;
        for bank in self.banks.iter_mut() {
            bank.fill(ComplexSample::new(0, 0));
        }
    }
}
