//! Fixed-point FFT
//!
//! A single-butterfly, memory-based radix-2 transform. [`FftEngine`] ties
//! together the [`twiddle`] ROM, the pipelined [`butterfly`] and the
//! [`scheduler`] that walks the stages. The streaming wrappers in
//! [`crate::dsp::fft_stream`] and [`crate::dsp::dct`] drive it.

pub mod butterfly;
pub mod engine;
pub mod scheduler;
pub mod twiddle;

pub use butterfly::{BUTTERFLY_LATENCY, ButterflyOutput, ButterflyPipe, butterfly};
pub use engine::{FftConfig, FftEngine};
pub use scheduler::{Bank, ReadPlan, Scheduler, Tap, WritePlan};
pub use twiddle::TwiddleRom;

#[cfg(test)]
mod tests;
