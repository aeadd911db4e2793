//! Core types for the MFCC pipeline
//!
//! This module defines the stream packet carried on every link, the complex
//! sample used by the spectral stages, and the pipeline configuration.

use crate::error::{MfccError, Result};
use crate::utils::validation::{validate_power_of_two, validate_width, validate_window};
use std::fmt;

/// Complex sample as held in FFT memory banks and carried to the power stage
pub type ComplexSample = num_complex::Complex<i32>;

/// One beat on a stream link
///
/// The `valid` half of the handshake is modelled by `Option<Packet<T>>`: a
/// link carries `Some(packet)` on every cycle its producer asserts `valid`.
/// `first` and `last` delimit a logical sequence (a frame, a spectrum, a set
/// of filter energies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packet<T> {
    /// Payload
    pub data: T,
    /// First beat of a sequence
    pub first: bool,
    /// Last beat of a sequence
    pub last: bool,
}

impl<T> Packet<T> {
    /// Packet with both boundary flags cleared
    pub fn new(data: T) -> Self {
        Self {
            data,
            first: false,
            last: false,
        }
    }

    /// Packet with explicit boundary flags
    pub fn with_flags(data: T, first: bool, last: bool) -> Self {
        Self { data, first, last }
    }

    /// Replace the payload, keeping the boundary flags
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Packet<U> {
        Packet {
            data: f(self.data),
            first: self.first,
            last: self.last,
        }
    }
}

/// Multiplier implementation strategy
///
/// Both strategies produce identical products; they differ in latency and
/// in how long the sink stays busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiplierKind {
    /// Single register stage, one product per cycle
    #[default]
    Pipelined,
    /// Iterative shift-and-add, one multiplier bit per cycle
    ShiftAdd,
}

impl fmt::Display for MultiplierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipelined => write!(f, "pipelined"),
            Self::ShiftAdd => write!(f, "shift-add"),
        }
    }
}

/// MFCC pipeline configuration
///
/// All parameters are fixed at construction. Use the `with_*` methods to
/// derive a configuration from the defaults and [`MfccConfig::validate`] (or
/// pipeline construction, which calls it) to check it.
#[derive(Debug, Clone, PartialEq)]
pub struct MfccConfig {
    /// Input sample width in bits
    pub width: u32,
    /// FFT size, power of two
    pub nfft: usize,
    /// Samples per analysis window
    pub window_len: usize,
    /// Samples between consecutive window starts
    pub step: usize,
    /// Sample rate in Hz, used to lay out the Mel filters
    pub sample_rate: u32,
    /// Number of Mel filters, power of two
    pub nfilters: usize,
    /// Cepstral coefficients kept per frame
    pub nceptrums: usize,
    /// Index of the first kept coefficient
    pub cepstrum_offset: usize,
    /// Pre-emphasis shift `k` in `1 - 2^-k`
    pub preemph_shift: u32,
    /// Apply the Hamming window (unity gain otherwise)
    pub window_enabled: bool,
    /// Hamming coefficient precision in bits
    pub window_precision: u32,
    /// Power spectrum output width in bits
    pub power_width: u32,
    /// Filterbank output gain (bits dropped below the accumulator top)
    pub filter_gain: u32,
    /// Filterbank output width in bits
    pub filter_width: u32,
    /// Fractional bits of the log2 result
    pub log_precision: u32,
    /// Multiplier strategy used by every stage
    pub multiplier: MultiplierKind,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            width: 16,
            nfft: 512,
            window_len: 512,
            step: 512 / 3,
            sample_rate: 16_000,
            nfilters: 32,
            nceptrums: 16,
            cepstrum_offset: 1,
            preemph_shift: 5,
            window_enabled: true,
            window_precision: 8,
            power_width: 30,
            filter_gain: 18,
            filter_width: 16,
            log_precision: 10,
            multiplier: MultiplierKind::Pipelined,
        }
    }
}

impl MfccConfig {
    /// Create the default configuration (512-point FFT, 32 filters, 16 coefficients)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set FFT size; window length follows and the step becomes a third of it
    pub fn with_nfft(mut self, nfft: usize) -> Self {
        self.nfft = nfft;
        self.window_len = nfft;
        self.step = nfft / 3;
        self
    }

    /// Set window length and step
    pub fn with_window(mut self, window_len: usize, step: usize) -> Self {
        self.window_len = window_len;
        self.step = step;
        self
    }

    /// Set sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set number of Mel filters
    pub fn with_nfilters(mut self, nfilters: usize) -> Self {
        self.nfilters = nfilters;
        self
    }

    /// Set number of kept cepstral coefficients and the first kept index
    pub fn with_ceptrums(mut self, nceptrums: usize, offset: usize) -> Self {
        self.nceptrums = nceptrums;
        self.cepstrum_offset = offset;
        self
    }

    /// Enable or bypass the Hamming window
    pub fn with_window_enabled(mut self, enabled: bool) -> Self {
        self.window_enabled = enabled;
        self
    }

    /// Set filterbank gain and output width
    pub fn with_filter_output(mut self, gain: u32, width: u32) -> Self {
        self.filter_gain = gain;
        self.filter_width = width;
        self
    }

    /// Set log2 fractional precision
    pub fn with_log_precision(mut self, precision: u32) -> Self {
        self.log_precision = precision;
        self
    }

    /// Select the multiplier strategy
    pub fn with_multiplier(mut self, multiplier: MultiplierKind) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Validate the configuration
    ///
    /// Stage constructors run their own, more specific, checks on top of
    /// these; this catches the geometry errors that involve several stages.
    pub fn validate(&self) -> Result<()> {
        validate_width("sample", self.width, 8, 24)?;
        validate_power_of_two(self.nfft, 8)?;
        validate_window(self.window_len, self.step, self.nfft)?;

        validate_power_of_two(self.nfilters, 1).map_err(|_| {
            MfccError::invalid_config(format!(
                "Filter count {} must be a power of two (the DCT runs a {}-point FFT)",
                self.nfilters,
                4 * self.nfilters
            ))
        })?;

        if self.nceptrums == 0 || self.cepstrum_offset + self.nceptrums > self.nfilters {
            return Err(MfccError::invalid_config(format!(
                "Cannot keep {} coefficients from offset {} out of {}",
                self.nceptrums, self.cepstrum_offset, self.nfilters
            )));
        }

        if self.sample_rate == 0 {
            return Err(MfccError::invalid_config("Sample rate must be positive"));
        }

        if self.preemph_shift == 0 || self.preemph_shift >= self.width {
            return Err(MfccError::invalid_config(format!(
                "Pre-emphasis shift {} out of range for {}-bit samples",
                self.preemph_shift, self.width
            )));
        }

        validate_width("window precision", self.window_precision, 2, 16)?;
        validate_width("power spectrum output", self.power_width, 2, 2 * self.width)?;
        validate_width("power spectrum output", self.power_width, 2, 31)?;
        validate_width("filterbank output", self.filter_width, 2, 32)?;
        validate_width("log2 precision", self.log_precision, 1, 20)?;

        Ok(())
    }

    /// Coefficients emitted per frame
    pub fn coefficients_per_frame(&self) -> usize {
        self.nceptrums
    }
}
