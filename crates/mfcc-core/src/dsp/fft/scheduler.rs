//! Butterfly scheduler
//!
//! In-place radix-2 decimation-in-time over three memory banks of `N/2`
//! words. Before the first stage, even bit-reversed positions live in bank 0
//! and odd ones in banks 1 and 2 (duplicated). At stage `s`, tap `t` reads
//! bank 0 at `t` and bank 1 or 2 at `t ^ 2^(s-1)`, then writes both results
//! back at `t`: one to bank 0, the other to bank 1 on even stages and bank 2
//! on odd stages. The bank written last holds the upper half of the
//! spectrum.
//!
//! Small transforms would read an operand before the previous stage wrote it
//! back, so issue is held until both operands have been produced.

use tracing::trace;

/// Memory bank of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    /// Always holds the lower half
    Mem0,
    /// Written on even stages
    Mem1,
    /// Written on odd stages
    Mem2,
}

impl Bank {
    /// Index into the engine's bank array
    pub fn index(self) -> usize {
        match self {
            Self::Mem0 => 0,
            Self::Mem1 => 1,
            Self::Mem2 => 2,
        }
    }

    /// Bank receiving the second result at `stage`
    pub fn written_by(stage: u32) -> Self {
        if stage & 1 == 0 { Self::Mem1 } else { Self::Mem2 }
    }
}

/// Identifies one butterfly of the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tap {
    /// Stage, `0..log2 N`
    pub stage: u32,
    /// Butterfly within the stage, `0..N/2`
    pub tap: usize,
}

/// Where a butterfly finds its operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPlan {
    /// Operation being issued
    pub tap: Tap,
    /// Bank and address of `x0`
    pub x0: (Bank, usize),
    /// Bank and address of `x1`
    pub x1: (Bank, usize),
    /// Twiddle index, `0..N/2`
    pub twiddle: usize,
}

/// Where a butterfly writes its results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePlan {
    /// Address in both banks
    pub addr: usize,
    /// `y1` goes to bank 0 and `y0` to the other bank
    pub swap: bool,
    /// Bank receiving the result not written to bank 0
    pub other: Bank,
}

/// Issue and retire sequencing for one transform
#[derive(Debug, Clone)]
pub struct Scheduler {
    size: usize,
    stages: u32,
    /// Next operation to issue, as a linear index `stage * N/2 + tap`
    consume: usize,
    /// Results written back so far
    produce: usize,
    busy: bool,
}

impl Scheduler {
    /// Create a scheduler for a `size`-point transform (power of two, >= 4)
    pub fn new(size: usize) -> Self {
        Self {
            size,
            stages: size.trailing_zeros(),
            consume: 0,
            produce: 0,
            busy: false,
        }
    }

    fn half(&self) -> usize {
        self.size / 2
    }

    fn total(&self) -> usize {
        self.stages as usize * self.half()
    }

    /// Begin a transform
    pub fn start(&mut self) {
        self.consume = 0;
        self.produce = 0;
        self.busy = true;
    }

    /// A transform is in progress
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Results written back in the current transform
    pub fn produced(&self) -> usize {
        self.produce
    }

    /// Operands are available for the next operation
    fn operands_ready(&self, tap: Tap) -> bool {
        if tap.stage == 0 {
            return true;
        }
        let partner = tap.tap ^ (1 << (tap.stage - 1));
        let needed = (tap.stage as usize - 1) * self.half() + tap.tap.max(partner);
        self.produce > needed
    }

    /// Plan the next butterfly, or `None` when nothing can issue this cycle
    pub fn issue(&mut self) -> Option<ReadPlan> {
        if !self.busy || self.consume >= self.total() {
            return None;
        }

        let tap = Tap {
            stage: (self.consume / self.half()) as u32,
            tap: self.consume % self.half(),
        };
        if !self.operands_ready(tap) {
            return None;
        }
        self.consume += 1;

        let Tap { stage, tap: t } = tap;
        let partner = if stage == 0 { t } else { t ^ (1 << (stage - 1)) };
        let upper = stage != 0 && (t >> (stage - 1)) & 1 == 1;
        let other = if stage & 1 == 0 { Bank::Mem2 } else { Bank::Mem1 };

        let (x0, x1) = if upper {
            ((other, partner), (Bank::Mem0, t))
        } else {
            ((Bank::Mem0, t), (other, partner))
        };

        Some(ReadPlan {
            tap,
            x0,
            x1,
            twiddle: (t * (self.size >> (stage + 1))) & (self.half() - 1),
        })
    }

    /// Record a finished butterfly; returns where to write it and whether
    /// the transform is complete
    pub fn retire(&mut self, tap: Tap) -> (WritePlan, bool) {
        self.produce += 1;
        let done = self.produce == self.total();
        if done {
            trace!("Scheduler: {}-point transform complete", self.size);
            self.busy = false;
        }

        (
            WritePlan {
                addr: tap.tap,
                swap: (tap.tap >> tap.stage) & 1 == 1,
                other: Bank::written_by(tap.stage),
            },
            done,
        )
    }

    /// Abandon any transform in progress
    pub fn reset(&mut self) {
        self.consume = 0;
        self.produce = 0;
        self.busy = false;
    }
}
