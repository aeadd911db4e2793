//! Utility functions and helpers
//!
//! Fixed-point register emulation and construction-time validation shared by
//! every stage of the pipeline.

pub mod fixed_point;
pub mod validation;

pub use fixed_point::*;
pub use validation::*;
