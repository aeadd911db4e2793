//! Pipeline blocks
//!
//! One module per stage, in signal order: pre-emphasis, framing, window,
//! FFT, power spectrum, Mel filterbank, log2 and DCT. The multiplier and the
//! small stream adapters (discard, delimiter insertion) are shared building
//! blocks.

pub mod dct;
pub mod discard;
pub mod fft;
pub mod fft_stream;
pub mod filterbank;
pub mod framer;
pub mod log2;
pub mod magic;
pub mod multiplier;
pub mod power;
pub mod preemph;
pub mod window;

pub use dct::DctStream;
pub use discard::Discard;
pub use fft::{FftConfig, FftEngine};
pub use fft_stream::FftStream;
pub use filterbank::{FilterBank, FilterBankConfig};
pub use framer::Framer;
pub use log2::{Log2Fix, log2_fix};
pub use magic::{MAGIC_WORD, MagicInserter};
pub use multiplier::{MulRequest, MulResult, Multiplier};
pub use power::PowerSpectrum;
pub use preemph::PreEmphasis;
pub use window::{HammingTable, HammingWindow};
