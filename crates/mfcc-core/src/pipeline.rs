//! MFCC top level
//!
//! ```text
//! PCM -> pre-emphasis -> framer -> window -> FFT -> FIFO -> power -> FIFO
//!     -> filterbank -> FIFO -> (0 -> 1) -> log2 -> DCT -> discard -> cepstra
//! ```
//!
//! The whole chain is itself a [`Stage`], so it can be driven cycle by cycle
//! or embedded behind other stages. [`MfccPipeline::process`] is the
//! convenience path: one recording in, one coefficient column per frame out.

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::dsp::{
    DctStream, Discard, FftStream, FilterBank, FilterBankConfig, Framer, HammingWindow, Log2Fix,
    PowerSpectrum, PreEmphasis,
};
use crate::error::Result;
use crate::stream::{Chain, Filtered, NonZero, Stage, StageExt, SyncFifo};
use crate::types::{ComplexSample, MfccConfig, Packet};

/// Idle cycles after which [`MfccPipeline::process`] gives up on a stream
const STALL_LIMIT: u64 = 1 << 22;

type Front = Chain<Chain<Filtered<PreEmphasis, Framer>, HammingWindow>, FftStream>;
type Spectrum = Chain<Chain<Chain<Front, SyncFifo<ComplexSample>>, PowerSpectrum>, SyncFifo<u64>>;
type Bands = Chain<Chain<Chain<Spectrum, FilterBank>, SyncFifo<u32>>, Filtered<NonZero, Log2Fix>>;
type Cepstra = Chain<Chain<Bands, DctStream>, Discard>;

/// Streaming MFCC extractor
#[derive(Debug, Clone)]
pub struct MfccPipeline {
    config: MfccConfig,
    chain: Cepstra,
    cycles: u64,
}

impl MfccPipeline {
    /// Build every stage for `config`
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found, either by
    /// [`MfccConfig::validate`] or by a stage constructor.
    pub fn new(config: MfccConfig) -> Result<Self> {
        config.validate()?;

        let preemph = PreEmphasis::new(config.width, config.preemph_shift);
        let framer = Framer::new(config.window_len, config.step, config.nfft)?;
        let window = HammingWindow::new(
            config.width,
            config.nfft,
            config.window_precision,
            config.window_enabled,
            config.multiplier,
        )?;
        let fft = FftStream::new(config.width, config.nfft)?;
        let power = PowerSpectrum::new(config.width, config.power_width, config.multiplier)?;
        let filterbank = FilterBank::new(FilterBankConfig {
            width: config.power_width,
            width_output: config.filter_width,
            gain: config.filter_gain,
            sample_rate: config.sample_rate,
            nfft: config.nfft,
            ntap: config.nfilters,
            multiplier: config.multiplier,
        })?;
        let log2 = Log2Fix::new(
            config.filter_width,
            config.width,
            config.log_precision,
            0,
            config.multiplier,
        )?;
        let dct = DctStream::new(config.width, config.nfilters)?;
        let discard = Discard::new(config.cepstrum_offset, config.nceptrums);

        let chain = Filtered::new(preemph, framer)
            .then(window)
            .then(fft)
            .then(SyncFifo::new(config.nfft / 2))
            .then(power)
            .then(SyncFifo::new(4))
            .then(filterbank)
            .then(SyncFifo::new(config.nfilters))
            .then(Filtered::new(NonZero, log2))
            .then(dct)
            .then(discard);

        debug!(
            "Created MfccPipeline: nfft {}, window {}/{}, {} filters, {} coefficients from {}, {} multiplier",
            config.nfft,
            config.window_len,
            config.step,
            config.nfilters,
            config.nceptrums,
            config.cepstrum_offset,
            config.multiplier
        );

        Ok(Self {
            config,
            chain,
            cycles: 0,
        })
    }

    /// Configuration the pipeline was built with
    pub fn config(&self) -> &MfccConfig {
        &self.config
    }

    /// Cycles simulated by [`MfccPipeline::process`] since construction or reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Frames the framer cuts from a recording of `len` samples
    pub fn frames_for(&self, len: usize) -> usize {
        len.div_ceil(self.config.step)
    }

    /// Run one recording through the pipeline
    ///
    /// Stage state is cleared first, so every recording starts from the
    /// power-on state (the pre-emphasis delay register included). The last
    /// sample is flagged as end of input; the framer pads and flushes the
    /// final frames. The consumer is always ready.
    pub fn process(&mut self, samples: &[i16]) -> Vec<Vec<i16>> {
        self.chain.reset();
        let expected = self.frames_for(samples.len());
        let mut columns = Vec::with_capacity(expected);
        let mut column = Vec::with_capacity(self.config.coefficients_per_frame());
        let mut next = 0;
        let mut idle = 0u64;

        while columns.len() < expected {
            let offered = samples.get(next).map(|&sample| {
                Packet::with_flags(i32::from(sample), next == 0, next + 1 == samples.len())
            });
            let accepted = offered.is_some() && self.chain.ready(true);
            let produced = self.chain.output();

            self.chain.clock(offered, true);
            self.cycles += 1;

            if accepted {
                next += 1;
            }
            if let Some(packet) = produced {
                column.push(packet.data as i16);
                if packet.last {
                    trace!("MfccPipeline: column {} at cycle {}", columns.len(), self.cycles);
                    columns.push(std::mem::take(&mut column));
                }
            }

            if accepted || produced.is_some() {
                idle = 0;
            } else {
                idle += 1;
                if idle > STALL_LIMIT {
                    warn!(
                        "MfccPipeline stalled after {} of {} columns ({} of {} samples taken)",
                        columns.len(),
                        expected,
                        next,
                        samples.len()
                    );
                    break;
                }
            }
        }

        columns
    }
}

impl Stage for MfccPipeline {
    type Input = i32;
    type Output = i32;

    fn ready(&self, out_ready: bool) -> bool {
        self.chain.ready(out_ready)
    }

    fn output(&self) -> Option<Packet<i32>> {
        self.chain.output()
    }

    fn clock(&mut self, offered: Option<Packet<i32>>, out_ready: bool) {
        self.chain.clock(offered, out_ready);
    }

    fn reset(&mut self) {
        debug!("MfccPipeline reset");
        self.chain.reset();
        self.cycles = 0;
    }
}

/// Extract coefficients from many recordings in parallel
///
/// Each recording runs through its own pipeline instance; instances share
/// nothing, so the result equals running them one after the other.
///
/// # Errors
///
/// Fails when `config` does not describe a valid pipeline.
pub fn extract_batch<R>(config: &MfccConfig, recordings: &[R]) -> Result<Vec<Vec<Vec<i16>>>>
where
    R: AsRef<[i16]> + Sync,
{
    let prototype = MfccPipeline::new(config.clone())?;
    debug!("Extracting {} recordings in parallel", recordings.len());

    Ok(recordings
        .par_iter()
        .map(|recording| prototype.clone().process(recording.as_ref()))
        .collect())
}
