//! Cepstrum post-processing
//!
//! Host-side helpers for the coefficient stream: sinusoidal liftering and
//! decoding of the delimited wire format produced by
//! [`MagicInserter`](crate::dsp::MagicInserter).

use std::f64::consts::PI;

use tracing::{debug, trace};

use crate::dsp::MAGIC_WORD;
use crate::error::Result;
use crate::utils::validation::decode_pcm_s16le;

/// Default lifter length
pub const DEFAULT_LIFTER: i32 = 22;

/// Apply a sinusoidal lifter to one coefficient column
///
/// Coefficient `n` is scaled by `1 + (L/2)·sin(πn/L)`. `L <= 0` leaves the
/// column unchanged.
pub fn lifter(frame: &[i16], lifter: i32) -> Vec<f64> {
    if lifter <= 0 {
        return frame.iter().map(|&c| f64::from(c)).collect();
    }
    let l = f64::from(lifter);
    frame
        .iter()
        .enumerate()
        .map(|(n, &c)| f64::from(c) * (1.0 + l / 2.0 * (PI * n as f64 / l).sin()))
        .collect()
}

/// Splits a delimited word stream back into coefficient columns
///
/// Words before the first delimiter are skipped. Once aligned, the next
/// `ncoeffs` words form a column whatever their value; the decoder then
/// waits for the following delimiter.
#[derive(Debug, Clone)]
pub struct ColumnDecoder {
    magic: u16,
    ncoeffs: usize,
    column: Option<Vec<i16>>,
    skipped: u64,
}

impl ColumnDecoder {
    /// Decoder for columns of `ncoeffs` values and the default delimiter
    pub fn new(ncoeffs: usize) -> Self {
        Self::with_magic(ncoeffs, MAGIC_WORD)
    }

    /// Decoder with a custom delimiter word
    pub fn with_magic(ncoeffs: usize, magic: u16) -> Self {
        debug!(
            "Creating ColumnDecoder: {} coefficients, delimiter {:#06x}",
            ncoeffs, magic
        );
        Self {
            magic,
            ncoeffs,
            column: None,
            skipped: 0,
        }
    }

    /// Words dropped while looking for a delimiter
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Feed one word, returning a column when it completes one
    pub fn push(&mut self, word: i16) -> Option<Vec<i16>> {
        match self.column.as_mut() {
            None if word as u16 == self.magic => {
                self.column = Some(Vec::with_capacity(self.ncoeffs));
                None
            }
            None => {
                self.skipped += 1;
                None
            }
            Some(column) => {
                column.push(word);
                if column.len() == self.ncoeffs {
                    self.column.take()
                } else {
                    None
                }
            }
        }
    }

    /// Feed a slice of words
    pub fn decode(&mut self, words: &[i16]) -> Vec<Vec<i16>> {
        let columns: Vec<Vec<i16>> = words.iter().filter_map(|&w| self.push(w)).collect();
        trace!("ColumnDecoder: {} columns from {} words", columns.len(), words.len());
        columns
    }

    /// Feed raw little-endian 16-bit words
    ///
    /// # Errors
    ///
    /// Fails on an odd number of bytes.
    pub fn decode_bytes(&mut self, bytes: &[u8]) -> Result<Vec<Vec<i16>>> {
        Ok(self.decode(&decode_pcm_s16le(bytes)?))
    }

    /// Drop any partial column
    pub fn reset(&mut self) {
        self.column = None;
        self.skipped = 0;
    }
}
