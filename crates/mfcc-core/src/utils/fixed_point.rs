//! Fixed-point helpers shared by the pipeline stages
//!
//! Hardware registers silently drop bits that do not fit their declared
//! width. These helpers reproduce that behaviour on wider Rust integers so
//! each stage can compute with `i64`/`u128` and truncate at the same points
//! a register would.

/// Wrap a value into a signed two's complement register of `width` bits.
#[inline]
pub fn wrap_signed(value: i64, width: u32) -> i64 {
    debug_assert!(width >= 1 && width <= 64);
    if width >= 64 {
        return value;
    }
    let shift = 64 - width;
    (value << shift) >> shift
}

/// Wrap a value into an unsigned register of `width` bits.
#[inline]
pub fn wrap_unsigned(value: u64, width: u32) -> u64 {
    value & mask(width)
}

/// All-ones mask of `width` bits.
#[inline]
pub fn mask(width: u32) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

/// All-ones mask of `width` bits for 128-bit accumulators.
#[inline]
pub fn mask_wide(width: u32) -> u128 {
    if width >= 128 { u128::MAX } else { (1u128 << width) - 1 }
}

/// Largest value of a signed `width`-bit register.
#[inline]
pub fn signed_max(width: u32) -> i64 {
    (1i64 << (width - 1)) - 1
}

/// Reverse the low `bits` bits of `value`.
#[inline]
pub fn bit_reverse(value: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS - bits)
}

/// Exact base-2 logarithm of a power of two, `None` otherwise.
#[inline]
pub fn exact_log2(value: usize) -> Option<u32> {
    if value.is_power_of_two() {
        Some(value.trailing_zeros())
    } else {
        None
    }
}
