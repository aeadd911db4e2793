//! Cycle driver and protocol checker
//!
//! [`StreamDriver`] plays the roles of an upstream producer and a downstream
//! consumer around any [`Stage`]. The producer asserts `valid` when a
//! caller-supplied pattern allows it and then holds the packet until it is
//! taken; the consumer asserts `ready` following a second pattern. Every
//! cycle the driver checks the handshake contract and panics on a violation,
//! so any test that runs through it is also a protocol test.
//!
//! `ready` cannot depend on the offered data: [`Stage::ready`] only sees the
//! stage's registered state and the downstream `ready`, and the driver
//! samples it before the packet is handed to [`Stage::clock`].

use crate::stream::Stage;
use crate::types::Packet;

/// Default bound on the number of simulated cycles per run
pub const DEFAULT_CYCLE_LIMIT: u64 = 50_000_000;

/// Result of a driven run
#[derive(Debug, Clone)]
pub struct DriveReport<T> {
    /// Packets received by the consumer, in order
    pub outputs: Vec<Packet<T>>,
    /// Cycles simulated
    pub cycles: u64,
    /// Input packets accepted by the stage
    pub accepted: usize,
}

impl<T: Copy> DriveReport<T> {
    /// Payloads only
    pub fn data(&self) -> Vec<T> {
        self.outputs.iter().map(|packet| packet.data).collect()
    }

    /// Payloads grouped into sequences delimited by `last`
    pub fn frames(&self) -> Vec<Vec<T>> {
        split_frames(&self.outputs)
    }
}

/// Drives a stage with stall patterns and checks the stream contract
#[derive(Debug)]
pub struct StreamDriver<S> {
    stage: S,
    cycle: u64,
    cycle_limit: u64,
}

impl<S: Stage> StreamDriver<S> {
    /// Wrap a stage
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            cycle: 0,
            cycle_limit: DEFAULT_CYCLE_LIMIT,
        }
    }

    /// Bound the cycles a single run may take before it is declared hung
    pub fn with_cycle_limit(mut self, cycle_limit: u64) -> Self {
        self.cycle_limit = cycle_limit;
        self
    }

    /// The driven stage
    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// Feed `inputs` and run until `wanted` output packets were consumed
    ///
    /// `valid(cycle)` decides whether the producer may present its next
    /// packet on that cycle; once presented it stays until accepted.
    /// `ready(cycle)` is the consumer's `ready`.
    ///
    /// # Panics
    ///
    /// Panics when the stage retracts or alters a presented packet before it
    /// was consumed, or when the run exceeds the cycle limit.
    pub fn run<V, R>(
        &mut self,
        inputs: &[Packet<S::Input>],
        wanted: usize,
        mut valid: V,
        mut ready: R,
    ) -> DriveReport<S::Output>
    where
        S::Output: PartialEq + std::fmt::Debug,
        V: FnMut(u64) -> bool,
        R: FnMut(u64) -> bool,
    {
        let start = self.cycle;
        let mut next = 0;
        let mut offering: Option<Packet<S::Input>> = None;
        let mut pending: Option<Packet<S::Output>> = None;
        let mut outputs = Vec::with_capacity(wanted);
        let mut accepted = 0;

        while outputs.len() < wanted {
            assert!(
                self.cycle - start < self.cycle_limit,
                "stage hung: {} of {} packets after {} cycles ({} inputs accepted)",
                outputs.len(),
                wanted,
                self.cycle - start,
                accepted
            );

            if offering.is_none() && next < inputs.len() && valid(self.cycle) {
                offering = Some(inputs[next]);
                next += 1;
            }
            let out_ready = ready(self.cycle);

            let presented = self.stage.output();
            if let Some(held) = pending {
                assert_eq!(
                    presented,
                    Some(held),
                    "valid packet retracted or altered before transfer at cycle {}",
                    self.cycle
                );
            }
            let in_ready = self.stage.ready(out_ready);

            self.stage.clock(offering, out_ready);

            if offering.is_some() && in_ready {
                offering = None;
                accepted += 1;
            }
            match presented {
                Some(packet) if out_ready => {
                    outputs.push(packet);
                    pending = None;
                }
                other => pending = other,
            }
            self.cycle += 1;
        }

        DriveReport {
            outputs,
            cycles: self.cycle - start,
            accepted,
        }
    }

    /// Feed `inputs` with no stalls on either side
    pub fn run_free(&mut self, inputs: &[Packet<S::Input>], wanted: usize) -> DriveReport<S::Output>
    where
        S::Output: PartialEq + std::fmt::Debug,
    {
        self.run(inputs, wanted, |_| true, |_| true)
    }
}

/// Build a packet sequence from raw payloads
///
/// The first packet is flagged `first`; the final one is flagged `last` when
/// `mark_last` is set.
pub fn packets<T: Copy>(data: &[T], mark_last: bool) -> Vec<Packet<T>> {
    let len = data.len();
    data.iter()
        .enumerate()
        .map(|(i, &value)| Packet::with_flags(value, i == 0, mark_last && i + 1 == len))
        .collect()
}

/// Group payloads into sequences delimited by `last`
///
/// A trailing sequence without `last` is returned as well.
pub fn split_frames<T: Copy>(outputs: &[Packet<T>]) -> Vec<Vec<T>> {
    let mut frames = Vec::new();
    let mut current = Vec::new();
    for packet in outputs {
        current.push(packet.data);
        if packet.last {
            frames.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        frames.push(current);
    }
    frames
}
