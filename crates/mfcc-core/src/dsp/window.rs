//! Hamming window multiplier
//!
//! The coefficient ROM holds one value out of two from the first quarter of
//! the window, i.e. `nfft/8` entries. The rest of the curve is rebuilt at
//! runtime from the position counter bits:
//!
//! - bit 0 selects a stored (odd) point or the average of its neighbours;
//! - the second most significant bit reverses the ROM direction
//!   (horizontal mirror within a half);
//! - when it differs from the most significant bit the value is reflected
//!   about the quarter point (vertical mirror for the two central quarters).
//!
//! The stored values are offset by the first one so they fit `precision`
//! bits; the offset is added back on the way out.

use tracing::debug;

use crate::dsp::multiplier::{MulRequest, Multiplier};
use crate::error::{MfccError, Result};
use crate::stream::Stage;
use crate::types::{MultiplierKind, Packet};
use crate::utils::fixed_point::wrap_signed;
use crate::utils::validation::{validate_power_of_two, validate_width};

/// Compressed Hamming coefficient table
#[derive(Debug, Clone)]
pub struct HammingTable {
    log2_nfft: u32,
    precision: u32,
    mem: Vec<i64>,
    off_fst: i64,
    off_lst: i64,
}

impl HammingTable {
    /// Build the table for an `nfft`-point periodic Hamming window
    ///
    /// # Errors
    ///
    /// Fails for sizes that are not a power of two of at least 8, or when
    /// the offset values do not fit `precision` bits.
    pub fn new(nfft: usize, precision: u32) -> Result<Self> {
        let log2_nfft = validate_power_of_two(nfft, 8)?;
        validate_width("window precision", precision, 2, 16)?;

        let maxheight = ((1i64 << (precision + 1)) - 1) as f64;
        // Periodic window: the first `nfft` points of a symmetric `nfft + 1` one.
        let full: Vec<i64> = apodize::hamming_iter(nfft + 1)
            .take(nfft)
            .map(|w| (w * maxheight) as i64)
            .collect();

        let mut mem: Vec<i64> = full[..nfft / 4].iter().skip(1).step_by(2).copied().collect();
        let off_fst = mem[0];
        for value in mem.iter_mut() {
            *value -= off_fst;
        }
        let off_lst = 2 * (full[nfft / 4] - off_fst);

        if mem.iter().any(|&v| v >= 1i64 << precision) {
            return Err(MfccError::invalid_bit_width(
                "window coefficient",
                precision,
                precision + 1,
                16,
            ));
        }

        Ok(Self {
            log2_nfft,
            precision,
            mem,
            off_fst,
            off_lst,
        })
    }

    /// Number of stored coefficients
    pub fn len(&self) -> usize {
        self.mem.len()
    }

    /// Frame length the table describes
    pub fn nfft(&self) -> usize {
        1 << self.log2_nfft
    }

    /// Mirrored ROM value for frame position `count`
    pub fn point(&self, count: usize) -> i64 {
        let msb = (count >> (self.log2_nfft - 1)) & 1;
        let dir = (count >> (self.log2_nfft - 2)) & 1;
        let addr_mask = self.mem.len() - 1;
        let addr = (count >> 1) & addr_mask;

        let value = self.mem[if dir == 1 { addr_mask - addr } else { addr }];
        if msb ^ dir == 1 { self.off_lst - value } else { value }
    }

    /// Window value at `count`, given the point latched at the previous odd
    /// position
    pub fn curve(&self, count: usize, point_r: i64) -> i64 {
        let point = self.point(count);
        if count & 1 == 1 {
            self.off_fst + point
        } else {
            self.off_fst + ((point + point_r) >> 1)
        }
    }
}

/// Streaming Hamming window
///
/// An input register feeds the multiplier; the source is the multiplier
/// output scaled back to the sample width.
#[derive(Debug, Clone)]
pub struct HammingWindow {
    table: HammingTable,
    width: u32,
    enabled: bool,
    count: usize,
    point_r: i64,
    staged: Option<Packet<MulRequest<()>>>,
    mul: Multiplier<()>,
}

impl HammingWindow {
    /// Create a window for `width`-bit samples and `nfft`-point frames
    ///
    /// A disabled window applies unity gain through the same pipeline.
    pub fn new(
        width: u32,
        nfft: usize,
        precision: u32,
        enabled: bool,
        multiplier: MultiplierKind,
    ) -> Result<Self> {
        let table = HammingTable::new(nfft, precision)?;
        debug!(
            "Creating HammingWindow: nfft {}, precision {}, {} ROM entries, enabled {}",
            nfft,
            precision,
            table.len(),
            enabled
        );

        Ok(Self {
            table,
            width,
            enabled,
            count: 0,
            point_r: 0,
            staged: None,
            mul: Multiplier::new(multiplier, precision + 2),
        })
    }

    /// Coefficient applied to the next accepted sample
    pub fn coefficient(&self) -> i64 {
        if self.enabled {
            self.table.curve(self.count, self.point_r)
        } else {
            1 << (self.table.precision + 1)
        }
    }
}

impl Stage for HammingWindow {
    type Input = i32;
    type Output = i32;

    fn ready(&self, out_ready: bool) -> bool {
        self.staged.is_none() || self.mul.ready(out_ready)
    }

    fn output(&self) -> Option<Packet<i32>> {
        let shift = self.table.precision + 1;
        self.mul.output().map(|packet| {
            packet.map(|res| wrap_signed((res.product >> shift) as i64, self.width) as i32)
        })
    }

    fn clock(&mut self, offered: Option<Packet<i32>>, out_ready: bool) {
        let advance = self.ready(out_ready);

        self.mul.clock(self.staged, out_ready);

        if advance {
            let coefficient = self.coefficient();
            self.staged = offered.map(|packet| {
                packet.map(|x| MulRequest::new(i64::from(x), coefficient, ()))
            });

            if let Some(packet) = offered {
                if self.count & 1 == 1 {
                    self.point_r = self.table.point(self.count);
                }
                self.count = if packet.last {
                    0
                } else {
                    (self.count + 1) % self.table.nfft()
                };
            }
        }
    }

    fn reset(&mut self) {
        debug!("HammingWindow reset");
        self.count = 0;
        self.point_r = 0;
        self.staged = None;
        self.mul.reset();
    }
}
