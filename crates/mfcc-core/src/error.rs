//! Error handling for the MFCC pipeline
//!
//! Every error in this crate is raised while a pipeline or one of its stages
//! is being built. Once constructed, a stage is a deterministic function of
//! its input stream and has no runtime failure path; stalls are expressed
//! through the handshake, never through `Err`.

#![allow(missing_docs)]

use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, MfccError>;

/// Error type for pipeline construction and host-side tooling
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MfccError {
    /// Invalid pipeline or stage configuration
    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },

    /// FFT size is not a supported power of two
    #[error("Invalid FFT size: {size} (must be a power of two, at least {min})")]
    InvalidFftSize { size: usize, min: usize },

    /// Window or step does not fit the frame
    #[error("Invalid window: length {window_len}, step {step}, nfft {nfft}")]
    InvalidWindow {
        window_len: usize,
        step: usize,
        nfft: usize,
    },

    /// A bit-width combination cannot be represented
    #[error("Invalid bit width for {what}: {width} bits (allowed {min}-{max})")]
    InvalidBitWidth {
        what: String,
        width: u32,
        min: u32,
        max: u32,
    },

    /// Mel filterbank cannot be laid out on the spectrum
    #[error("Invalid filterbank: {details}")]
    InvalidFilterBank { details: String },

    /// Malformed host-side input (raw PCM, framed cepstrum stream)
    #[error("Invalid input: {details}")]
    InvalidInput { details: String },

    /// I/O operation failed
    #[error("I/O operation failed: {reason}")]
    Io { reason: String },
}

impl MfccError {
    /// Create a new invalid configuration error
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a new bit width error
    pub fn invalid_bit_width(what: impl Into<String>, width: u32, min: u32, max: u32) -> Self {
        Self::InvalidBitWidth {
            what: what.into(),
            width,
            min,
            max,
        }
    }

    /// Create a new filterbank layout error
    pub fn invalid_filterbank(details: impl Into<String>) -> Self {
        Self::InvalidFilterBank {
            details: details.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(details: impl Into<String>) -> Self {
        Self::InvalidInput {
            details: details.into(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// Configuration errors never are: the same parameters fail the same way
    /// on every attempt.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig { .. }
            | Self::InvalidFftSize { .. }
            | Self::InvalidWindow { .. }
            | Self::InvalidBitWidth { .. }
            | Self::InvalidFilterBank { .. } => false,

            Self::InvalidInput { .. } | Self::Io { .. } => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. }
            | Self::InvalidFftSize { .. }
            | Self::InvalidWindow { .. }
            | Self::InvalidFilterBank { .. } => ErrorCategory::Configuration,

            Self::InvalidBitWidth { .. } => ErrorCategory::Arithmetic,

            Self::InvalidInput { .. } => ErrorCategory::Input,

            Self::Io { .. } => ErrorCategory::Io,
        }
    }
}

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration and parameter errors
    Configuration,
    /// Fixed-point width and range errors
    Arithmetic,
    /// Malformed data handed to host-side helpers
    Input,
    /// I/O related errors
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Arithmetic => write!(f, "Arithmetic"),
            Self::Input => write!(f, "Input"),
            Self::Io => write!(f, "I/O"),
        }
    }
}

/// Convert from I/O errors
impl From<std::io::Error> for MfccError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            reason: error.to_string(),
        }
    }
}

/// Convert from parsing errors
impl From<std::num::ParseIntError> for MfccError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::InvalidConfig {
            details: error.to_string(),
        }
    }
}
