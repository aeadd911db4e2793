//! Coefficient selection
//!
//! Keeps `count` values starting at index `first` of every sequence and
//! drops the rest. The kept span gets its own `first`/`last` flags.

use tracing::debug;

use crate::stream::Stage;
use crate::types::Packet;

/// Keep a contiguous span of each sequence
#[derive(Debug, Clone)]
pub struct Discard {
    first: usize,
    count: usize,
    index: usize,
    held: Option<Packet<i32>>,
}

impl Discard {
    /// Keep indices `first..first + count`
    pub fn new(first: usize, count: usize) -> Self {
        debug!("Creating Discard: keep {} from index {}", count, first);
        Self {
            first,
            count,
            index: 0,
            held: None,
        }
    }

    /// Index of the first kept value
    pub fn first(&self) -> usize {
        self.first
    }

    /// Values kept per sequence
    pub fn count(&self) -> usize {
        self.count
    }

    fn keeps(&self, index: usize) -> bool {
        index >= self.first && index < self.first + self.count
    }
}

impl Stage for Discard {
    type Input = i32;
    type Output = i32;

    fn ready(&self, out_ready: bool) -> bool {
        self.held.is_none() || out_ready
    }

    fn output(&self) -> Option<Packet<i32>> {
        self.held
    }

    fn clock(&mut self, offered: Option<Packet<i32>>, out_ready: bool) {
        let accepted = offered.filter(|_| self.ready(out_ready));
        if out_ready {
            self.held = None;
        }

        let Some(packet) = accepted else {
            return;
        };
        let index = if packet.first { 0 } else { self.index };
        if self.keeps(index) {
            let last = index + 1 == self.first + self.count || packet.last;
            self.held = Some(Packet::with_flags(packet.data, index == self.first, last));
        }
        self.index = if packet.last { 0 } else { index.saturating_add(1) };
    }

    fn reset(&mut self) {
        debug!("Discard reset");
        self.index = 0;
        self.held = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamDriver, packets};

    #[test]
    fn test_keeps_span_per_sequence() {
        let sequences: Vec<Vec<i32>> = (0..3).map(|s| (0..32).map(|i| s * 100 + i).collect()).collect();
        let inputs: Vec<Packet<i32>> = sequences.iter().flat_map(|s| packets(s, true)).collect();

        let mut driver = StreamDriver::new(Discard::new(1, 12));
        let report = driver.run(&inputs, 36, |c| c % 2 == 0, |c| c % 3 != 2);
        let frames = report.frames();
        assert_eq!(frames.len(), 3);
        for (s, frame) in frames.iter().enumerate() {
            let expected: Vec<i32> = (1..13).map(|i| s as i32 * 100 + i).collect();
            assert_eq!(frame, &expected);
        }
        assert!(report.outputs[0].first);
        assert!(!report.outputs[1].first);
    }

    #[test]
    fn test_pass_through() {
        let input: Vec<i32> = (0..16).collect();
        let mut driver = StreamDriver::new(Discard::new(0, 16));
        let report = driver.run_free(&packets(&input, true), 16);
        assert_eq!(report.data(), input);
        assert!(report.outputs[0].first);
        assert!(report.outputs[15].last);
    }

    #[test]
    fn test_short_sequence_ends_early() {
        let mut inputs = packets(&[1, 2, 3], true);
        inputs.extend(packets(&[4, 5, 6, 7, 8], true));
        let mut driver = StreamDriver::new(Discard::new(1, 3));
        let report = driver.run_free(&inputs, 5);
        assert_eq!(report.frames(), vec![vec![2, 3], vec![5, 6, 7]]);
    }
}
