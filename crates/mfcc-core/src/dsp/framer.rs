//! Sliding window framer
//!
//! Turns a continuous sample stream into overlapping frames of `window_len`
//! samples, `step` samples apart, each followed by `nfft - window_len` zeros
//! so every frame is exactly `nfft` beats long.
//!
//! Samples live in a circular buffer of `window_len` entries. Positions are
//! tracked as absolute sample indices, which makes the two intake limits
//! easy to state:
//!
//! - **full**: every slot holds a sample the current frame has not read yet;
//! - **blocked** (overrun): the write pointer has reached the first sample of
//!   the next frame, which must survive until this frame is done.
//!
//! Intake resumes once the frame has been read far enough, or when its last
//! beat is sent and the read pointer jumps forward by `step`. The very first
//! fill has no earlier frame to protect, so only the *full* limit applies.
//!
//! An input packet flagged `last` marks the end of the stream. The framer
//! stops taking samples, completes every frame that still contains a real
//! sample (zero-padding past the end), then starts over for the next stream.

use tracing::{debug, trace};

use crate::error::Result;
use crate::stream::Stage;
use crate::types::Packet;
use crate::utils::validation::validate_window;

/// Overlapping frame extractor
#[derive(Debug, Clone)]
pub struct Framer {
    window_len: usize,
    step: usize,
    nfft: usize,
    mem: Vec<i32>,
    /// Samples written since the stream started
    written: u64,
    /// Absolute index of the current frame's first sample
    frame_start: u64,
    /// Beat of the current frame presented on the source
    count: usize,
    end_of_input: bool,
    frames: u64,
}

impl Framer {
    /// Create a framer
    ///
    /// # Errors
    ///
    /// Fails unless `0 < step <= window_len <= nfft`.
    pub fn new(window_len: usize, step: usize, nfft: usize) -> Result<Self> {
        validate_window(window_len, step, nfft)?;
        debug!(
            "Creating Framer: window {}, step {}, nfft {}",
            window_len, step, nfft
        );

        Ok(Self {
            window_len,
            step,
            nfft,
            mem: vec![0; window_len],
            written: 0,
            frame_start: 0,
            count: 0,
            end_of_input: false,
            frames: 0,
        })
    }

    /// Samples of the current frame already read from the buffer
    fn reads(&self) -> u64 {
        self.count.min(self.window_len) as u64
    }

    /// Unread samples held in the buffer
    pub fn fill_level(&self) -> usize {
        self.written.saturating_sub(self.frame_start + self.reads()) as usize
    }

    /// Every slot holds unread data
    pub fn is_full(&self) -> bool {
        self.fill_level() >= self.window_len
    }

    /// The write pointer has reached the next frame's first sample
    pub fn is_blocked(&self) -> bool {
        self.written >= self.frame_start + (self.step + self.window_len) as u64
    }

    /// Frames completed since construction or reset
    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    fn restart(&mut self) {
        self.written = 0;
        self.frame_start = 0;
        self.count = 0;
        self.end_of_input = false;
    }
}

impl Stage for Framer {
    type Input = i32;
    type Output = i32;

    fn ready(&self, _out_ready: bool) -> bool {
        !self.end_of_input && !self.is_full() && !self.is_blocked()
    }

    fn output(&self) -> Option<Packet<i32>> {
        let first = self.count == 0;
        let last = self.count + 1 == self.nfft;

        let data = if self.count >= self.window_len {
            0
        } else {
            let index = self.frame_start + self.count as u64;
            if index < self.written {
                self.mem[(index % self.window_len as u64) as usize]
            } else if self.end_of_input {
                0
            } else {
                return None;
            }
        };

        Some(Packet::with_flags(data, first, last))
    }

    fn clock(&mut self, offered: Option<Packet<i32>>, out_ready: bool) {
        let accepted = offered.filter(|_| self.ready(out_ready));
        let sent = self.output().filter(|_| out_ready);

        if let Some(packet) = sent {
            if packet.last {
                self.count = 0;
                self.frame_start += self.step as u64;
                self.frames += 1;
                trace!("Framer: frame {} complete", self.frames);

                if self.end_of_input && self.frame_start >= self.written {
                    trace!("Framer: stream of {} samples drained", self.written);
                    self.restart();
                }
            } else {
                self.count += 1;
            }
        }

        if let Some(packet) = accepted {
            let slot = (self.written % self.window_len as u64) as usize;
            self.mem[slot] = packet.data;
            self.written += 1;
            self.end_of_input = packet.last;
        }
    }

    fn reset(&mut self) {
        debug!("Framer reset");
        self.restart();
        self.mem.fill(0);
        self.frames = 0;
    }
}
