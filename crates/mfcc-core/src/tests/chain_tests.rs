//! Partial Chain Tests
//!
//! Hand-assembled sub-chains of the MFCC pipeline, checked stage group by
//! stage group against the reference models.

use super::utils::*;
use crate::dsp::*;
use crate::reference;
use crate::stream::{Filtered, StageExt, StreamDriver, packets};
use crate::types::{ComplexSample, MultiplierKind};

fn reference_input() -> Vec<i32> {
    REFERENCE_VECTOR.iter().map(|&w| i32::from(w as i16)).collect()
}

/// Test the reference vector through pre-emphasis, a 16-sample frame, a
/// bypassed window and the 16-point DCT against `DCT-II / 64`
#[test]
fn test_reference_vector_dct() {
    let input = reference_input();
    let chain = Filtered::new(PreEmphasis::new(16, 5), Framer::new(16, 16, 16).unwrap())
        .then(HammingWindow::new(16, 16, 8, false, MultiplierKind::Pipelined).unwrap())
        .then(DctStream::new(16, 16).unwrap());

    let mut driver = StreamDriver::new(chain);
    let report = driver.run(&packets(&input, true), 16, |c| c % 4 != 3, |c| c % 4 == 0);

    let mut emphasized = input.clone();
    PreEmphasis::new(16, 5).process(&mut emphasized);
    let x: Vec<f64> = emphasized.iter().map(|&v| f64::from(v)).collect();
    let expected: Vec<f64> = reference::dct_ii(&x).into_iter().map(|v| v / 64.0).collect();

    let got = report.data();
    assert_eq!(got.len(), 16);
    for (k, (&g, e)) in got.iter().zip(&expected).enumerate() {
        assert!((f64::from(g) - e).abs() <= 13.0, "coefficient {}: {} vs {:.1}", k, g, e);
    }
    assert!(report.outputs[0].first);
    assert!(report.outputs[15].last);
}

/// Test that a bypassed window passes framed samples unchanged
#[test]
fn test_framer_and_bypassed_window() {
    let input = reference_input();
    let chain = Framer::new(16, 8, 16)
        .unwrap()
        .then(HammingWindow::new(16, 16, 8, false, MultiplierKind::ShiftAdd).unwrap());
    let mut driver = StreamDriver::new(chain);
    let report = driver.run_free(&packets(&input, true), 32);

    let frames = report.frames();
    assert_eq!(frames[0], input);
    assert_eq!(frames[1][..8], input[8..]);
    assert!(frames[1][8..].iter().all(|&s| s == 0));
}

/// Test the spectrum front end: window, FFT and power against the float
/// model of a tone
#[test]
fn test_power_spectrum_of_tone() {
    let nfft = 64;
    // Bin 8 exactly.
    let tone: Vec<i32> = generate_tone(nfft, 16_000, 2000.0, 16000.0)
        .into_iter()
        .map(i32::from)
        .collect();
    let chain = HammingWindow::new(16, nfft, 8, true, MultiplierKind::Pipelined)
        .unwrap()
        .then(FftStream::new(16, nfft).unwrap())
        .then(crate::stream::SyncFifo::<ComplexSample>::new(nfft / 2))
        .then(PowerSpectrum::new(16, 30, MultiplierKind::Pipelined).unwrap());

    let mut driver = StreamDriver::new(chain);
    let power = driver.run_free(&packets(&tone, true), nfft / 2).data();

    let peak = (0..power.len()).max_by_key(|&k| power[k]).unwrap();
    assert_eq!(peak, 8);
    // Window leakage stays in the neighbouring bins.
    assert!(power[..6].iter().chain(&power[11..]).all(|&p| p < power[8] / 100));
}

/// Test filterbank, log and DCT on a flat spectrum: every band sees the
/// same shape so only low-order coefficients carry energy
#[test]
fn test_back_end_on_flat_spectrum() {
    let config = FilterBankConfig {
        nfft: 64,
        ntap: 8,
        ..FilterBankConfig::default()
    };
    let chain = FilterBank::new(config)
        .unwrap()
        .then(crate::stream::SyncFifo::new(8))
        .then(Filtered::new(crate::stream::NonZero, Log2Fix::new(16, 16, 10, 0, MultiplierKind::Pipelined).unwrap()))
        .then(DctStream::new(16, 8).unwrap());

    let spectrum = vec![1u64 << 8; 32];
    let mut inputs = packets(&spectrum, true);
    inputs.extend(packets(&spectrum, true));

    let mut driver = StreamDriver::new(chain);
    let report = driver.run(&inputs, 16, |c| c % 5 != 0, |c| c % 2 == 0);
    let frames = report.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], frames[1]);
    assert!(frames[0][0] > 0);
}
