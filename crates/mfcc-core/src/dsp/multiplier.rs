//! Fixed-point multiplier
//!
//! Every stage that multiplies owns its own multiplier. Operands travel with
//! a caller-defined tag so sideband state (filter index, ramp flags, ...)
//! stays aligned with the product whatever the latency of the chosen
//! implementation.

use tracing::debug;

use crate::stream::Stage;
use crate::types::{MultiplierKind, Packet};

/// Operands entering a multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulRequest<T> {
    /// Multiplicand, signed
    pub a: i64,
    /// Multiplier, signed
    pub b: i64,
    /// Sideband data returned with the product
    pub tag: T,
}

impl<T> MulRequest<T> {
    /// Operands with a tag
    pub fn new(a: i64, b: i64, tag: T) -> Self {
        Self { a, b, tag }
    }
}

/// Product leaving a multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulResult<T> {
    /// Full-width product `a * b`
    pub product: i128,
    /// Tag that entered with the operands
    pub tag: T,
}

/// Single register stage: one product per cycle
#[derive(Debug, Clone)]
pub struct PipelinedMultiplier<T> {
    held: Option<Packet<MulResult<T>>>,
}

impl<T: Copy> PipelinedMultiplier<T> {
    /// Create an empty multiplier
    pub fn new() -> Self {
        Self { held: None }
    }
}

impl<T: Copy> Default for PipelinedMultiplier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Stage for PipelinedMultiplier<T> {
    type Input = MulRequest<T>;
    type Output = MulResult<T>;

    fn ready(&self, out_ready: bool) -> bool {
        self.held.is_none() || out_ready
    }

    fn output(&self) -> Option<Packet<MulResult<T>>> {
        self.held
    }

    fn clock(&mut self, offered: Option<Packet<MulRequest<T>>>, out_ready: bool) {
        if self.ready(out_ready) {
            self.held = offered.map(|packet| {
                packet.map(|req| MulResult {
                    product: i128::from(req.a) * i128::from(req.b),
                    tag: req.tag,
                })
            });
        }
    }

    fn reset(&mut self) {
        self.held = None;
    }
}

#[derive(Debug, Clone, Copy)]
struct ShiftAddJob<T> {
    acc: i128,
    multiplicand: i128,
    magnitude: u64,
    negative: bool,
    bit: u32,
    tag: T,
    first: bool,
    last: bool,
}

/// Iterative shift-and-add multiplier
///
/// Consumes one bit of `|b|` per cycle, so a product takes `width_b` cycles.
/// The sink is busy for the whole computation.
#[derive(Debug, Clone)]
pub struct ShiftAddMultiplier<T> {
    width_b: u32,
    job: Option<ShiftAddJob<T>>,
    held: Option<Packet<MulResult<T>>>,
}

impl<T: Copy> ShiftAddMultiplier<T> {
    /// Create a multiplier for `b` operands of `width_b` bits
    pub fn new(width_b: u32) -> Self {
        Self {
            width_b: width_b.clamp(1, 64),
            job: None,
            held: None,
        }
    }

    fn step(&mut self) {
        let Some(mut job) = self.job.take() else {
            return;
        };

        if (job.magnitude >> job.bit) & 1 == 1 {
            job.acc += job.multiplicand << job.bit;
        }
        job.bit += 1;

        if job.bit == self.width_b {
            let product = if job.negative { -job.acc } else { job.acc };
            self.held = Some(Packet::with_flags(
                MulResult {
                    product,
                    tag: job.tag,
                },
                job.first,
                job.last,
            ));
        } else {
            self.job = Some(job);
        }
    }
}

impl<T: Copy> Stage for ShiftAddMultiplier<T> {
    type Input = MulRequest<T>;
    type Output = MulResult<T>;

    fn ready(&self, out_ready: bool) -> bool {
        self.job.is_none() && (self.held.is_none() || out_ready)
    }

    fn output(&self) -> Option<Packet<MulResult<T>>> {
        self.held
    }

    fn clock(&mut self, offered: Option<Packet<MulRequest<T>>>, out_ready: bool) {
        let accept = self.ready(out_ready);

        if out_ready {
            self.held = None;
        }
        self.step();

        if let Some(packet) = offered.filter(|_| accept) {
            let req = packet.data;
            self.job = Some(ShiftAddJob {
                acc: 0,
                multiplicand: i128::from(req.a),
                magnitude: req.b.unsigned_abs(),
                negative: req.b < 0,
                bit: 0,
                tag: req.tag,
                first: packet.first,
                last: packet.last,
            });
        }
    }

    fn reset(&mut self) {
        self.job = None;
        self.held = None;
    }
}

/// Multiplier with a strategy chosen at construction
#[derive(Debug, Clone)]
pub enum Multiplier<T> {
    /// One register stage
    Pipelined(PipelinedMultiplier<T>),
    /// One multiplier bit per cycle
    ShiftAdd(ShiftAddMultiplier<T>),
}

impl<T: Copy> Multiplier<T> {
    /// Create a multiplier whose `b` operand is `width_b` bits wide
    pub fn new(kind: MultiplierKind, width_b: u32) -> Self {
        debug!("Creating {} multiplier, b width {}", kind, width_b);
        match kind {
            MultiplierKind::Pipelined => Self::Pipelined(PipelinedMultiplier::new()),
            MultiplierKind::ShiftAdd => Self::ShiftAdd(ShiftAddMultiplier::new(width_b)),
        }
    }

    /// Strategy of this instance
    pub fn kind(&self) -> MultiplierKind {
        match self {
            Self::Pipelined(_) => MultiplierKind::Pipelined,
            Self::ShiftAdd(_) => MultiplierKind::ShiftAdd,
        }
    }
}

impl<T: Copy> Stage for Multiplier<T> {
    type Input = MulRequest<T>;
    type Output = MulResult<T>;

    fn ready(&self, out_ready: bool) -> bool {
        match self {
            Self::Pipelined(mul) => mul.ready(out_ready),
            Self::ShiftAdd(mul) => mul.ready(out_ready),
        }
    }

    fn output(&self) -> Option<Packet<MulResult<T>>> {
        match self {
            Self::Pipelined(mul) => mul.output(),
            Self::ShiftAdd(mul) => mul.output(),
        }
    }

    fn clock(&mut self, offered: Option<Packet<MulRequest<T>>>, out_ready: bool) {
        match self {
            Self::Pipelined(mul) => mul.clock(offered, out_ready),
            Self::ShiftAdd(mul) => mul.clock(offered, out_ready),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Pipelined(mul) => mul.reset(),
            Self::ShiftAdd(mul) => mul.reset(),
        }
    }
}
