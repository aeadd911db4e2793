//! Synchronous FIFO
//!
//! Elastic buffer between stages whose rates differ over a frame, e.g. the
//! FFT stream that emits a whole spectrum in a burst and the power stage
//! behind it. Output is registered: a packet written on one edge can be read
//! from the next cycle on.

use std::collections::VecDeque;

use tracing::debug;

use crate::stream::Stage;
use crate::types::Packet;

/// Bounded first-in first-out buffer of stream packets
#[derive(Debug, Clone)]
pub struct SyncFifo<T> {
    depth: usize,
    entries: VecDeque<Packet<T>>,
}

impl<T: Copy> SyncFifo<T> {
    /// Create a FIFO holding up to `depth` packets (at least one)
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        debug!("Creating SyncFifo with depth {}", depth);
        Self {
            depth,
            entries: VecDeque::with_capacity(depth),
        }
    }

    /// Maximum number of buffered packets
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of buffered packets
    pub fn level(&self) -> usize {
        self.entries.len()
    }

    /// True when no packet is buffered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Copy> Stage for SyncFifo<T> {
    type Input = T;
    type Output = T;

    fn ready(&self, _out_ready: bool) -> bool {
        self.entries.len() < self.depth
    }

    fn output(&self) -> Option<Packet<T>> {
        self.entries.front().copied()
    }

    fn clock(&mut self, offered: Option<Packet<T>>, out_ready: bool) {
        let writable = self.entries.len() < self.depth;

        if out_ready {
            self.entries.pop_front();
        }
        if let Some(packet) = offered.filter(|_| writable) {
            self.entries.push_back(packet);
        }
    }

    fn reset(&mut self) {
        self.entries.clear();
    }
}
