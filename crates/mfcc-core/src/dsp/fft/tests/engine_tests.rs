//! FFT Engine Tests
//!
//! Whole-transform checks against `rustfft`, plus the scheduling corner
//! cases: interlocked small sizes, back-to-back transforms and loads while
//! busy.

use super::utils::*;
use crate::dsp::fft::*;
use crate::types::ComplexSample;
use crate::utils::fixed_point::bit_reverse;

fn engine(size: usize) -> FftEngine {
    FftEngine::new(FftConfig::new(size, 16)).unwrap()
}

/// Test every supported size against the floating-point transform
#[test]
fn test_matches_reference_all_sizes() {
    for stages in 2..=10 {
        let size = 1 << stages;
        let input = random_input(size, 20000, true, size as u64);
        let got = engine(size).transform(&input);
        let expected = reference_dft(&input);
        let error = max_error(&got, &expected);
        assert!(
            error <= tolerance(size),
            "size {}: error {:.2} exceeds {:.2}",
            size,
            error,
            tolerance(size)
        );
    }
}

/// Test real-only input, as fed by the spectrum stream
#[test]
fn test_real_input() {
    let input = random_input(512, 32000, false, 99);
    let got = engine(512).transform(&input);
    assert!(max_error(&got, &reference_dft(&input)) <= tolerance(512));
}

/// Test that an impulse spreads exactly: every butterfly sees a zero `x1`
#[test]
fn test_impulse_is_exact() {
    let mut input = vec![ComplexSample::new(0, 0); 16];
    input[0] = ComplexSample::new(16384, 0);
    let got = engine(16).transform(&input);
    assert!(got.iter().all(|&bin| bin == ComplexSample::new(1024, 0)));
}

/// Test the cycle budget of a large transform: one butterfly per cycle plus
/// the pipeline drain
#[test]
fn test_cycle_count() {
    let mut fft = engine(512);
    let input = random_input(512, 1000, false, 5);
    fft.transform(&input);
    assert_eq!(fft.cycles(), 9 * 256 + 8);
}

/// Test that small sizes wait for their operands instead of reading stale
/// memory, and that 32 points is the first size that runs without a stall
#[test]
fn test_small_sizes_interlock() {
    for size in [4, 8, 16, 32] {
        let mut fft = engine(size);
        let input = random_input(size, 20000, true, 11);
        let got = fft.transform(&input);
        assert!(max_error(&got, &reference_dft(&input)) <= tolerance(size));

        // The last stage reads a partner issued N/4 slots earlier, which is
        // back from the 8-deep butterfly only once N/4 >= 8.
        let stages = size.trailing_zeros() as u64;
        let unstalled = stages * size as u64 / 2 + 8;
        if size < 32 {
            assert!(fft.cycles() > unstalled, "size {}", size);
        } else {
            assert_eq!(fft.cycles(), unstalled, "size {}", size);
        }
    }
}

/// Test loading with pre-reversed addresses
#[test]
fn test_input_reversed() {
    let size = 64;
    let input = random_input(size, 15000, true, 3);
    let natural = engine(size).transform(&input);

    let mut reversed =
        FftEngine::new(FftConfig::new(size, 16).with_input_reversed(true)).unwrap();
    for (addr, &value) in input.iter().enumerate() {
        reversed.load(bit_reverse(addr, 6), value);
    }
    reversed.start();
    while !reversed.clock() {}
    let got: Vec<_> = (0..size).map(|k| reversed.read(k)).collect();
    assert_eq!(got, natural);
}

/// Test consecutive transforms on the same engine
#[test]
fn test_back_to_back_transforms() {
    let mut fft = engine(128);
    let first = random_input(128, 20000, true, 21);
    let second = random_input(128, 20000, true, 22);

    let a = fft.transform(&first);
    let b = fft.transform(&second);
    assert!(max_error(&a, &reference_dft(&first)) <= tolerance(128));
    assert!(max_error(&b, &reference_dft(&second)) <= tolerance(128));
    assert_eq!(engine(128).transform(&second), b);
}

/// Test that loads are dropped while the engine runs
#[test]
fn test_load_ignored_while_busy() {
    let mut fft = engine(8);
    let input = random_input(8, 1000, false, 4);
    for (addr, &value) in input.iter().enumerate() {
        fft.load(addr, value);
    }
    fft.start();
    assert!(!fft.is_ready());
    fft.load(0, ComplexSample::new(12345, 0));
    while !fft.clock() {}
    assert!(fft.is_ready());

    let got: Vec<_> = (0..8).map(|k| fft.read(k)).collect();
    assert_eq!(got, engine(8).transform(&input));
}

/// Test that reset abandons a transform
#[test]
fn test_reset_mid_transform() {
    let mut fft = engine(32);
    fft.transform(&random_input(32, 1000, true, 8));
    fft.start();
    for _ in 0..10 {
        fft.clock();
    }
    fft.reset();
    assert!(fft.is_ready());
    assert!((0..32).all(|k| fft.read(k) == ComplexSample::new(0, 0)));

    let input = random_input(32, 20000, true, 9);
    assert_eq!(fft.transform(&input), engine(32).transform(&input));
}

/// Test output truncation to a narrower read-back width
#[test]
fn test_output_width() {
    let mut input = vec![ComplexSample::new(0, 0); 4];
    input[0] = ComplexSample::new(8192, 0);
    let config = FftConfig::new(4, 16).with_io_widths(16, 8);
    let got = FftEngine::new(config).unwrap().transform(&input);
    // 2048 does not fit 8 bits and wraps to zero.
    assert!(got.iter().all(|&bin| bin == ComplexSample::new(0, 0)));
}

/// Test rejected geometries
#[test]
fn test_invalid_configuration() {
    assert!(FftEngine::new(FftConfig::new(2, 16)).is_err());
    assert!(FftEngine::new(FftConfig::new(48, 16)).is_err());
    assert!(FftEngine::new(FftConfig::new(16, 16).with_io_widths(18, 16)).is_err());
}
