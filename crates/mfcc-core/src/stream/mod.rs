//! Stream handshake model
//!
//! Every block of the pipeline is a [`Stage`]: a synchronous circuit with one
//! sink and one source, advanced one clock edge at a time. A link carries
//! `Option<Packet<T>>` (the `valid` half of the handshake) forward and a
//! `bool` (the `ready` half) backward. A transfer happens on a cycle where the
//! producer offers a packet and the consumer is ready.
//!
//! The split between [`Stage::output`], [`Stage::ready`] and [`Stage::clock`]
//! mirrors register/combinational structure:
//!
//! - `output` depends only on registered state, so a presented packet can
//!   never change before it is consumed;
//! - `ready` depends on registered state and the downstream `ready`, never on
//!   the data offered upstream, so no valid-to-ready loop can form;
//! - `clock` samples everything at the edge and commits the next state.
//!
//! [`Chain`] composes two stages into one by evaluating `ready` back to front
//! and outputs front to back before clocking either side, which reproduces a
//! single clock domain for arbitrarily long pipelines.

pub mod driver;
pub mod fifo;

pub use driver::{DriveReport, StreamDriver, packets, split_frames};
pub use fifo::SyncFifo;

use crate::types::Packet;

/// A clocked block with a stream sink and a stream source
pub trait Stage {
    /// Payload accepted on the sink
    type Input: Copy;
    /// Payload presented on the source
    type Output: Copy;

    /// Sink `ready` for the current cycle given the downstream `ready`
    fn ready(&self, out_ready: bool) -> bool;

    /// Packet presented on the source this cycle, `None` when not valid
    fn output(&self) -> Option<Packet<Self::Output>>;

    /// Advance one clock edge
    ///
    /// `offered` is whatever the upstream producer presents this cycle; it is
    /// accepted only if [`Stage::ready`] is true for the same `out_ready`.
    /// The presented output is consumed when it is valid and `out_ready` is
    /// set.
    fn clock(&mut self, offered: Option<Packet<Self::Input>>, out_ready: bool);

    /// Synchronous reset back to the power-on state
    fn reset(&mut self);
}

/// Composition helpers available on every stage
pub trait StageExt: Stage + Sized {
    /// Connect this stage's source to `next`'s sink
    fn then<B>(self, next: B) -> Chain<Self, B>
    where
        B: Stage<Input = Self::Output>,
    {
        Chain::new(self, next)
    }
}

impl<S: Stage> StageExt for S {}

/// Two stages connected source to sink
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    /// Connect `first` to `second`
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Upstream stage
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Downstream stage
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B> Stage for Chain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn ready(&self, out_ready: bool) -> bool {
        self.first.ready(self.second.ready(out_ready))
    }

    fn output(&self) -> Option<Packet<B::Output>> {
        self.second.output()
    }

    fn clock(&mut self, offered: Option<Packet<A::Input>>, out_ready: bool) {
        // Sample the link before either side moves.
        let link_ready = self.second.ready(out_ready);
        let link = self.first.output();

        self.first.clock(offered, link_ready);
        self.second.clock(link, out_ready);
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

/// Combinational per-packet transform placed in front of a stage
///
/// Flow control passes straight through; only the filter's own state (a
/// delay register, say) is updated, and only on a transfer.
pub trait StreamFilter {
    /// Payload accepted
    type Input: Copy;
    /// Payload forwarded
    type Output: Copy;

    /// Transform the packet currently offered
    fn apply(&self, packet: Packet<Self::Input>) -> Packet<Self::Output>;

    /// Commit state after `packet` was transferred
    fn commit(&mut self, _packet: &Packet<Self::Input>) {}

    /// Synchronous reset
    fn reset(&mut self) {}
}

/// A [`StreamFilter`] wired combinationally into the sink of a stage
#[derive(Debug, Clone)]
pub struct Filtered<F, S> {
    filter: F,
    stage: S,
}

impl<F, S> Filtered<F, S>
where
    F: StreamFilter,
    S: Stage<Input = F::Output>,
{
    /// Place `filter` in front of `stage`
    pub fn new(filter: F, stage: S) -> Self {
        Self { filter, stage }
    }

    /// The filter
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// The stage behind the filter
    pub fn stage(&self) -> &S {
        &self.stage
    }
}

impl<F, S> Stage for Filtered<F, S>
where
    F: StreamFilter,
    S: Stage<Input = F::Output>,
{
    type Input = F::Input;
    type Output = S::Output;

    fn ready(&self, out_ready: bool) -> bool {
        self.stage.ready(out_ready)
    }

    fn output(&self) -> Option<Packet<S::Output>> {
        self.stage.output()
    }

    fn clock(&mut self, offered: Option<Packet<F::Input>>, out_ready: bool) {
        let accepted = offered.filter(|_| self.stage.ready(out_ready));
        let forwarded = offered.map(|packet| self.filter.apply(packet));

        self.stage.clock(forwarded, out_ready);
        if let Some(packet) = accepted {
            self.filter.commit(&packet);
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.stage.reset();
    }
}

/// Stateless filter that replaces zero with one
///
/// Sits in front of the log2 stage so a silent band never reaches it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonZero;

impl StreamFilter for NonZero {
    type Input = u32;
    type Output = u32;

    fn apply(&self, packet: Packet<u32>) -> Packet<u32> {
        packet.map(|value| value.max(1))
    }
}
