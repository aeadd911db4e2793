//! Construction-time validation helpers

use crate::error::{MfccError, Result};
use crate::utils::fixed_point::exact_log2;

/// Validate a transform size and return its base-2 logarithm
pub fn validate_power_of_two(size: usize, min: usize) -> Result<u32> {
    match exact_log2(size) {
        Some(log2) if size >= min => Ok(log2),
        _ => Err(MfccError::InvalidFftSize { size, min }),
    }
}

/// Validate a register width against an inclusive range
pub fn validate_width(what: &str, width: u32, min: u32, max: u32) -> Result<()> {
    if width < min || width > max {
        return Err(MfccError::invalid_bit_width(what, width, min, max));
    }
    Ok(())
}

/// Validate the framing geometry of a sliding window
pub fn validate_window(window_len: usize, step: usize, nfft: usize) -> Result<()> {
    if window_len == 0 || step == 0 || step > window_len || window_len > nfft {
        return Err(MfccError::InvalidWindow {
            window_len,
            step,
            nfft,
        });
    }
    Ok(())
}

/// Decode little-endian signed 16-bit PCM
pub fn decode_pcm_s16le(bytes: &[u8]) -> Result<Vec<i16>> {
    if bytes.len() % 2 != 0 {
        return Err(MfccError::invalid_input(format!(
            "Raw PCM length {} is not a whole number of 16-bit samples",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
