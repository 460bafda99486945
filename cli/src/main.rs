//! Batch noise reduction CLI
//!
//! Reads an audio file, estimates or generates a noise profile, runs
//! spectral subtraction over all channels, and writes the cleaned result
//! as 32-bit float WAV.

use std::process;
use std::sync::mpsc;

use clap::{Arg, ArgAction, Command};
use denoise_lib::{
    utils::{self, format_frequency},
    NoisePreset, NoiseProfileSource, ProcessingParams, ProcessingResult,
};

/// Parse the --profile argument: `auto`, `preset:<name>`, or
/// `manual:<start>:<end>` (seconds)
fn parse_profile_source(arg: &str) -> Result<NoiseProfileSource, String> {
    if arg == "auto" {
        return Ok(NoiseProfileSource::Automatic);
    }

    if let Some(name) = arg.strip_prefix("preset:") {
        let preset = NoisePreset::parse(name).map_err(|_| {
            let names: Vec<&str> = NoisePreset::all().iter().map(|p| p.name()).collect();
            format!("unknown preset '{}', expected one of: {}", name, names.join(", "))
        })?;
        return Ok(NoiseProfileSource::Preset(preset));
    }

    if let Some(range) = arg.strip_prefix("manual:") {
        let mut parts = range.splitn(2, ':');
        let start = parts
            .next()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| format!("invalid manual range '{}'", range))?;
        let end = parts
            .next()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| format!("invalid manual range '{}'", range))?;
        return Ok(NoiseProfileSource::Manual {
            start_sec: start,
            end_sec: end,
        });
    }

    Err(format!(
        "invalid profile source '{}', expected auto, preset:<name>, or manual:<start>:<end>",
        arg
    ))
}

fn parse_f64(matches: &clap::ArgMatches, name: &str) -> Result<Option<f64>, String> {
    match matches.get_one::<String>(name) {
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("invalid value for --{}: '{}'", name, value)),
        None => Ok(None),
    }
}

fn print_report(result: &ProcessingResult) {
    let analysis = &result.analysis;
    let metrics = &result.metrics;

    println!("Noise analysis:");
    println!("  Noise floor:     {:.1} dB", analysis.noise_floor_db);
    println!("  Signal level:    {:.1} dB", analysis.signal_level_db);
    println!("  SNR:             {:.1} dB", analysis.snr_db);
    println!(
        "  Dominant freq:   {} ({})",
        format_frequency(analysis.dominant_freq_hz),
        analysis.kind.label()
    );
    println!("Result:");
    println!("  Noise reduction: {:.1} dB", metrics.noise_reduction_db);
    println!("  New SNR:         {:.1} dB", metrics.new_snr_db);
    println!("  Quality score:   {:.0}%", metrics.quality_score_percent);
}

fn run(matches: &clap::ArgMatches) -> Result<(), String> {
    let input = matches
        .get_one::<String>("input")
        .expect("input is required");
    let output = matches
        .get_one::<String>("output")
        .expect("output is required");

    let source = parse_profile_source(
        matches
            .get_one::<String>("profile")
            .map(String::as_str)
            .unwrap_or("auto"),
    )?;

    let mut params = ProcessingParams::default();
    if let Some(reduction) = parse_f64(matches, "reduction")? {
        params.reduction_db = reduction;
    }
    if let Some(sensitivity) = parse_f64(matches, "sensitivity")? {
        params.sensitivity = sensitivity;
    }
    if let Some(smoothing) = matches.get_one::<String>("smoothing") {
        params.smoothing_taps = smoothing
            .parse::<usize>()
            .map_err(|_| format!("invalid value for --smoothing: '{}'", smoothing))?;
    }
    if let Some(low) = parse_f64(matches, "low-cutoff")? {
        params.low_cutoff_hz = low;
    }
    if let Some(high) = parse_f64(matches, "high-cutoff")? {
        params.high_cutoff_hz = high;
    }
    params.high_quality = matches.get_flag("high-quality");

    println!("Processing {} -> {}", input, output);

    // Progress display on a separate thread; the channel closes when
    // processing finishes
    let (tx, rx) = mpsc::channel();
    let progress_thread = std::thread::spawn(move || {
        let mut last_percent = usize::MAX;
        for event in rx.iter() {
            let denoise_lib::Progress {
                frame,
                total_frames,
                ..
            } = event;
            if total_frames == 0 {
                continue;
            }
            let percent = (frame + 1) * 100 / total_frames;
            if percent != last_percent && percent % 10 == 0 {
                println!("  {}%", percent);
                last_percent = percent;
            }
        }
    });

    let result = utils::load_and_denoise(input, output, params, source, Some(tx))
        .map_err(|e| e.to_string())?;

    progress_thread.join().ok();
    print_report(&result);
    println!("Done.");
    Ok(())
}

fn main() {
    let matches = Command::new("Denoise")
        .version(denoise_lib::VERSION)
        .about("STFT spectral-subtraction noise reduction")
        .arg(
            Arg::new("input")
                .help("Audio file to clean (any format Symphonia can decode)")
                .value_name("INPUT")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .help("Output WAV file (32-bit float)")
                .value_name("OUTPUT")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .short('p')
                .help("Noise profile source: auto, preset:<hiss|hum|broadband|wind|fan>, or manual:<start>:<end> seconds")
                .value_name("SOURCE"),
        )
        .arg(
            Arg::new("reduction")
                .long("reduction")
                .short('r')
                .help("Subtraction strength in dB (default 12)")
                .value_name("DB"),
        )
        .arg(
            Arg::new("sensitivity")
                .long("sensitivity")
                .short('s')
                .help("Subtraction alpha multiplier (default 1.0)")
                .value_name("FACTOR"),
        )
        .arg(
            Arg::new("smoothing")
                .long("smoothing")
                .help("Gain smoothing width in bins (default 2)")
                .value_name("TAPS"),
        )
        .arg(
            Arg::new("low-cutoff")
                .long("low-cutoff")
                .help("High-pass post filter cutoff in Hz (active above 20 Hz)")
                .value_name("HZ"),
        )
        .arg(
            Arg::new("high-cutoff")
                .long("high-cutoff")
                .help("Low-pass post filter cutoff in Hz (active below Nyquist)")
                .value_name("HZ"),
        )
        .arg(
            Arg::new("high-quality")
                .long("high-quality")
                .short('q')
                .help("Use an 8192-sample frame instead of 4096")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    denoise_lib::init();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_source() {
        assert_eq!(
            parse_profile_source("auto").unwrap(),
            NoiseProfileSource::Automatic
        );
        assert_eq!(
            parse_profile_source("preset:hiss").unwrap(),
            NoiseProfileSource::Preset(NoisePreset::Hiss)
        );
        assert_eq!(
            parse_profile_source("manual:0.5:2.0").unwrap(),
            NoiseProfileSource::Manual {
                start_sec: 0.5,
                end_sec: 2.0
            }
        );
        assert!(parse_profile_source("preset:rain").is_err());
        assert!(parse_profile_source("manual:x:y").is_err());
        assert!(parse_profile_source("bogus").is_err());
    }
}
