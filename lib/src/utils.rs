//! Helper functions for frequency math, display formatting, and one-shot
//! file-to-file processing used by client applications.

use crate::audio_io::{read_audio_file, write_audio_file};
use crate::engine::{NoiseReducer, ProcessingResult, Progress};
use crate::error::Result;
use crate::params::ProcessingParams;
use crate::profile::NoiseProfileSource;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc::Sender;

/// Calculate the frequency corresponding to a given FFT bin
pub fn bin_to_frequency(bin: usize, sample_rate: u32, fft_size: usize) -> f64 {
    bin as f64 * sample_rate as f64 / fft_size as f64
}

/// Calculate the FFT bin corresponding to a given frequency
pub fn frequency_to_bin(frequency: f64, sample_rate: u32, fft_size: usize) -> usize {
    (frequency * fft_size as f64 / sample_rate as f64).round() as usize
}

/// Format a frequency value for display
pub fn format_frequency(freq_hz: f64) -> String {
    if freq_hz >= 1000.0 {
        format!("{:.2} kHz", freq_hz / 1000.0)
    } else {
        format!("{:.1} Hz", freq_hz)
    }
}

/// Format a time value for display
pub fn format_time(time_sec: f64) -> String {
    if time_sec >= 60.0 {
        let minutes = (time_sec / 60.0).floor();
        let seconds = time_sec % 60.0;
        format!("{:.0}m {:.1}s", minutes, seconds)
    } else {
        format!("{:.2}s", time_sec)
    }
}

/// Format duration in samples to time string
pub fn format_duration(samples: usize, sample_rate: u32) -> String {
    format_time(samples as f64 / sample_rate as f64)
}

/// One-shot convenience: load an input file, estimate a profile, process,
/// and write the cleaned audio as float WAV
#[cfg(not(target_arch = "wasm32"))]
pub fn load_and_denoise<P: AsRef<std::path::Path>>(
    input: P,
    output: P,
    params: ProcessingParams,
    source: NoiseProfileSource,
    progress: Option<Sender<Progress>>,
) -> Result<ProcessingResult> {
    let (audio_info, channel_data) = read_audio_file(input.as_ref())?;
    log::info!(
        "loaded {}: {} channels, {} Hz, {}",
        input.as_ref().display(),
        audio_info.channels,
        audio_info.sample_rate,
        format_duration(audio_info.duration_samples, audio_info.sample_rate)
    );

    let mut reducer = NoiseReducer::new(params)?;
    reducer.load_audio(audio_info.clone(), channel_data)?;
    reducer.estimate_profile(source)?;

    let result = reducer.process_with_progress(progress)?;
    write_audio_file(output.as_ref(), &audio_info, &result.channels)?;
    log::info!("saved cleaned audio to {}", output.as_ref().display());

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_frequency_round_trip() {
        let bin = frequency_to_bin(440.0, 44100, 4096);
        let freq = bin_to_frequency(bin, 44100, 4096);
        assert!((freq - 440.0).abs() < 44100.0 / 4096.0);
    }

    #[test]
    fn test_format_frequency() {
        assert_eq!(format_frequency(440.0), "440.0 Hz");
        assert_eq!(format_frequency(5000.0), "5.00 kHz");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(12.5), "12.50s");
        assert_eq!(format_time(95.0), "1m 35.0s");
    }
}
