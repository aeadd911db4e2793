//! Sequence delimiter insertion
//!
//! Prefixes every sequence with a fixed word so a reader joining a raw
//! sample stream can find column boundaries. The delimiter carries `first`;
//! the sequence's own `first` flag is cleared.

use tracing::debug;

use crate::stream::Stage;
use crate::types::Packet;

/// Default delimiter word
pub const MAGIC_WORD: u16 = 0xa55a;

/// Delimiter inserter
#[derive(Debug, Clone)]
pub struct MagicInserter {
    magic: u16,
    at_boundary: bool,
    held: Option<Packet<i32>>,
    stash: Option<Packet<i32>>,
}

impl MagicInserter {
    /// Insert `magic` in front of every sequence
    pub fn new(magic: u16) -> Self {
        debug!("Creating MagicInserter with delimiter {:#06x}", magic);
        Self {
            magic,
            at_boundary: true,
            held: None,
            stash: None,
        }
    }

    /// Delimiter word
    pub fn magic(&self) -> u16 {
        self.magic
    }

    /// Delimiter as a 16-bit signed sample
    fn word(&self) -> i32 {
        i32::from(self.magic as i16)
    }
}

impl Default for MagicInserter {
    fn default() -> Self {
        Self::new(MAGIC_WORD)
    }
}

impl Stage for MagicInserter {
    type Input = i32;
    type Output = i32;

    fn ready(&self, out_ready: bool) -> bool {
        self.stash.is_none() && (self.held.is_none() || out_ready)
    }

    fn output(&self) -> Option<Packet<i32>> {
        self.held
    }

    fn clock(&mut self, offered: Option<Packet<i32>>, out_ready: bool) {
        let accepted = offered.filter(|_| self.ready(out_ready));
        if out_ready && self.held.is_some() {
            self.held = self.stash.take();
        }

        let Some(packet) = accepted else {
            return;
        };
        let forwarded = Packet::with_flags(packet.data, false, packet.last);
        if self.at_boundary {
            self.held = Some(Packet::with_flags(self.word(), true, false));
            self.stash = Some(forwarded);
        } else {
            self.held = Some(forwarded);
        }
        self.at_boundary = packet.last;
    }

    fn reset(&mut self) {
        debug!("MagicInserter reset");
        self.at_boundary = true;
        self.held = None;
        self.stash = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamDriver, packets};

    #[test]
    fn test_delimits_each_sequence() {
        let mut inputs = packets(&[1, 2, 3], true);
        inputs.extend(packets(&[4, 5], true));

        let mut driver = StreamDriver::new(MagicInserter::default());
        let report = driver.run(&inputs, 7, |c| c % 2 == 1, |c| c % 3 != 0);
        let magic = i32::from(MAGIC_WORD as i16);
        assert_eq!(report.data(), vec![magic, 1, 2, 3, magic, 4, 5]);

        let firsts: Vec<bool> = report.outputs.iter().map(|p| p.first).collect();
        assert_eq!(firsts, vec![true, false, false, false, true, false, false]);
        assert!(report.outputs[3].last);
        assert!(report.outputs[6].last);
    }

    #[test]
    fn test_stalls_while_delimiter_pending() {
        let mut stage = MagicInserter::new(0x1234);
        stage.clock(Some(Packet::with_flags(9, true, true)), false);
        assert_eq!(stage.output().unwrap().data, 0x1234);
        assert!(!stage.ready(true));

        stage.clock(Some(Packet::new(10)), true);
        assert_eq!(stage.output(), Some(Packet::with_flags(9, false, true)));
        assert!(stage.ready(true));
    }
}
