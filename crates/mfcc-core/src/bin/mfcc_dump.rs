//! MFCC Dump
//!
//! Runs raw s16le PCM through the fixed-point pipeline and prints one line
//! of coefficients per frame, optionally next to the floating-point model.

use std::num::ParseIntError;
use std::path::Path;
use std::process;
use std::str::FromStr;

use mfcc_core::cepstrum::{DEFAULT_LIFTER, lifter};
use mfcc_core::utils::validation::decode_pcm_s16le;
use mfcc_core::{MfccConfig, MfccPipeline, Result, reference};

struct Options {
    path: String,
    config: MfccConfig,
    lifter: i32,
    reference: bool,
}

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} <file.raw> [--nfft N] [--filters N] [--ceps N] [--step N] [--lifter L] [--reference]",
        program
    );
    eprintln!("A lifter of 0 or below leaves the coefficients unscaled.");
    eprintln!("Input is 16 kHz mono signed 16-bit little-endian PCM.");
    process::exit(1);
}

fn value<'a, T>(iter: &mut impl Iterator<Item = &'a String>, program: &str) -> Result<T>
where
    T: FromStr<Err = ParseIntError>,
{
    match iter.next() {
        Some(v) => Ok(v.parse()?),
        None => usage(program),
    }
}

fn parse_args(args: &[String]) -> Result<Options> {
    let program = args.first().map_or("mfcc_dump", String::as_str);
    let mut path = None;
    let mut config = MfccConfig::new();
    let mut step = None;
    let mut lifter = DEFAULT_LIFTER;
    let mut reference = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--nfft" => config = config.with_nfft(value(&mut iter, program)?),
            "--filters" => config = config.with_nfilters(value(&mut iter, program)?),
            "--ceps" => {
                let ceps = value(&mut iter, program)?;
                let offset = config.cepstrum_offset;
                config = config.with_ceptrums(ceps, offset);
            }
            "--step" => step = Some(value(&mut iter, program)?),
            "--lifter" => lifter = value(&mut iter, program)?,
            "--reference" => reference = true,
            "-h" | "--help" => usage(program),
            other if path.is_none() && !other.starts_with("--") => path = Some(other.to_string()),
            _ => usage(program),
        }
    }

    if let Some(step) = step {
        let window_len = config.window_len;
        config = config.with_window(window_len, step);
    }
    let Some(path) = path else { usage(program) };

    Ok(Options {
        path,
        config,
        lifter,
        reference,
    })
}

fn format_column(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:9.1}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn run(options: &Options) -> Result<()> {
    let path = Path::new(&options.path);
    let bytes = std::fs::read(path)?;
    let samples = decode_pcm_s16le(&bytes)?;

    let mut pipeline = MfccPipeline::new(options.config.clone())?;
    let columns = pipeline.process(&samples);
    let config = pipeline.config();

    println!("MFCC Dump");
    println!("=========");
    println!("File: {}", path.display());
    println!(
        "Samples: {}, frames: {}, cycles: {}",
        samples.len(),
        columns.len(),
        pipeline.cycles()
    );
    println!(
        "nfft {}, step {}, {} filters, {} coefficients, lifter {}\n",
        config.nfft,
        config.step,
        config.nfilters,
        config.coefficients_per_frame(),
        options.lifter
    );

    let floating = options
        .reference
        .then(|| reference::mfcc(&samples, config));

    for (i, column) in columns.iter().enumerate() {
        println!("{:5}: {}", i, format_column(&lifter(column, options.lifter)));
        if let Some(floating) = floating.as_ref().and_then(|f| f.get(i)) {
            println!("  ref: {}", format_column(floating));
        }
    }

    Ok(())
}

fn main() {
    let _ = mfcc_core::init();

    let args: Vec<String> = std::env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            usage(args.first().map_or("mfcc_dump", String::as_str));
        }
    };

    if let Err(e) = run(&options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
