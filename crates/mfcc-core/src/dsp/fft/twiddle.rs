//! Twiddle factor ROM
//!
//! Only the first quarter turn is stored; the second quarter is derived by
//! swapping and negating components. Factors are `W_N^k = e^(-2πjk/N)`
//! scaled by `2^(width-2)` and rounded half to even.

use std::f64::consts::PI;

use crate::types::ComplexSample;

/// Quarter-wave twiddle table for an `N`-point transform
#[derive(Debug, Clone)]
pub struct TwiddleRom {
    size: usize,
    table: Vec<ComplexSample>,
}

impl TwiddleRom {
    /// Build the table for `size`-point transforms with `width`-bit factors
    pub fn new(size: usize, width: u32) -> Self {
        let scale = f64::from(1u32 << (width - 2));
        let table = (0..size / 4)
            .map(|k| {
                let phase = 2.0 * PI * k as f64 / size as f64;
                ComplexSample::new(
                    (scale * phase.cos()).round_ties_even() as i32,
                    (-scale * phase.sin()).round_ties_even() as i32,
                )
            })
            .collect();

        Self { size, table }
    }

    /// Factor `W_N^k` for `k < N/2`
    #[inline]
    pub fn factor(&self, k: usize) -> ComplexSample {
        let quarter = self.size / 4;
        if k < quarter {
            self.table[k]
        } else {
            let stored = self.table[k - quarter];
            // e^(-jπ/2) · (c - js) = -s - jc
            ComplexSample::new(stored.im, -stored.re)
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_points() {
        let rom = TwiddleRom::new(16, 16);
        assert_eq!(rom.len(), 4);
        assert_eq!(rom.factor(0), ComplexSample::new(16384, 0));
        assert_eq!(rom.factor(4), ComplexSample::new(0, -16384));
    }

    #[test]
    fn test_second_quarter_matches_direct_evaluation() {
        let size = 64;
        let rom = TwiddleRom::new(size, 16);
        for k in 0..size / 2 {
            let phase = 2.0 * PI * k as f64 / size as f64;
            let expected_re = 16384.0 * phase.cos();
            let expected_im = -16384.0 * phase.sin();
            let got = rom.factor(k);
            assert!((f64::from(got.re) - expected_re).abs() <= 0.5 + 1e-9, "k={}", k);
            assert!((f64::from(got.im) - expected_im).abs() <= 0.5 + 1e-9, "k={}", k);
        }
    }
}
