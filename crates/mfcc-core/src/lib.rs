//! # MFCC-Core: Streaming Fixed-Point MFCC Extraction
//!
//! A cycle-level model of a hardware MFCC front end. PCM samples enter one
//! per handshake; cepstral coefficients leave one column per frame. Every
//! block is a synchronous [`Stage`](stream::Stage) with a valid/ready
//! stream on each side, so the pipeline can be simulated under arbitrary
//! producer and consumer stalls and still produce bit-identical output.
//!
//! ## Stages
//!
//! - **Pre-emphasis**: `y[n] = x[n] - (1 - 2^-k)·x[n-1]`
//! - **Framer**: overlapping windows over a circular buffer with overrun
//!   protection
//! - **Hamming window**: symmetry-compressed coefficient ROM
//! - **FFT**: radix-2 DIT over three memory banks, one butterfly per cycle
//! - **Power spectrum**, **Mel filterbank**, **log2** and a **DCT** that
//!   reuses the FFT engine at `4N` points
//!
//! ## Usage
//!
//! ```rust
//! use mfcc_core::{MfccConfig, MfccPipeline};
//!
//! let config = MfccConfig::new().with_nfft(64).with_nfilters(8).with_ceptrums(6, 1);
//! let mut pipeline = MfccPipeline::new(config)?;
//!
//! let samples = vec![0i16; 256];
//! let columns = pipeline.process(&samples);
//! assert!(columns.iter().all(|c| c.len() == 6));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cepstrum;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod reference;
pub mod stream;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types and traits
pub use error::{ErrorCategory, MfccError, Result};
pub use pipeline::{MfccPipeline, extract_batch};
pub use stream::{Stage, StageExt, StreamDriver};
pub use types::{ComplexSample, MfccConfig, MultiplierKind, Packet};

/// Version information for the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Pipeline stages, in signal order
pub const STAGES: &[&str] = &[
    "preemph",
    "framer",
    "window",
    "fft",
    "power",
    "filterbank",
    "log2",
    "dct",
    "discard",
];

/// Initialize the library
///
/// Installs a `tracing` fmt subscriber unless one is already set. Safe to
/// call multiple times.
///
/// # Errors
///
/// Currently infallible; the signature leaves room for setup that can fail.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    tracing::info!("MFCC-Core v{} initialized", VERSION);
    tracing::debug!("Pipeline stages: {:?}", STAGES);

    Ok(())
}

/// Get library information
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        stages: STAGES.to_vec(),
        default_config: MfccConfig::default(),
    }
}

/// Library information structure
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    /// Library version
    pub version: &'static str,
    /// Stage names in signal order
    pub stages: Vec<&'static str>,
    /// Default pipeline configuration
    pub default_config: MfccConfig,
}
