//! FFT Test Modules
//!
//! Engine-level tests against a floating-point transform.

pub mod utils;
pub mod engine_tests;
