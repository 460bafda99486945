//! Main noise reduction engine
//!
//! Coordinates noise-profile estimation, the per-channel STFT loop with the
//! spectral subtraction core, post filtering, and metrics for multi-channel
//! audio. Channels are independent and are processed on one worker thread
//! each; the noise profile is shared read-only across them.

use crate::audio_io::AudioInfo;
use crate::error::{DenoiseError, Result};
use crate::metrics::{NoiseAnalysis, ProcessingMetrics};
use crate::params::ProcessingParams;
use crate::postfilter::apply_post_filters;
use crate::profile::{NoiseProfile, NoiseProfileSource};
use crate::stft::StftPipeline;
use crate::subtraction::SpectralSubtractor;
use std::sync::mpsc::Sender;

/// Per-frame progress event
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub channel: usize,
    pub frame: usize,
    pub total_frames: usize,
}

/// Output of one processing session
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Cleaned channels, identical length and count to the input
    pub channels: Vec<Vec<f64>>,
    /// Before/after improvement estimates
    pub metrics: ProcessingMetrics,
    /// Pre-processing analysis of the input against the profile
    pub analysis: NoiseAnalysis,
    /// The noise profile the session used
    pub profile: NoiseProfile,
}

/// Batch noise reducer for multi-channel audio
pub struct NoiseReducer {
    params: ProcessingParams,
    audio_info: Option<AudioInfo>,
    channel_data: Option<Vec<Vec<f64>>>,
    profile: Option<NoiseProfile>,
}

impl NoiseReducer {
    /// Create a reducer with validated parameters
    pub fn new(params: ProcessingParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            audio_info: None,
            channel_data: None,
            profile: None,
        })
    }

    pub fn params(&self) -> &ProcessingParams {
        &self.params
    }

    /// Replace the parameters; clears the profile if the frame size changed
    pub fn set_params(&mut self, params: ProcessingParams) -> Result<()> {
        params.validate()?;
        if params.frame_size() != self.params.frame_size() {
            self.profile = None;
        }
        self.params = params;
        Ok(())
    }

    /// Load audio data into the engine
    ///
    /// The engine borrows these buffers for reading only; output is always
    /// freshly allocated.
    pub fn load_audio(&mut self, audio_info: AudioInfo, channel_data: Vec<Vec<f64>>) -> Result<()> {
        if channel_data.len() != audio_info.channels {
            return Err(DenoiseError::InvalidAudio(format!(
                "channel count mismatch: expected {}, got {}",
                audio_info.channels,
                channel_data.len()
            )));
        }

        if let Some(first_channel) = channel_data.first() {
            let expected_length = first_channel.len();
            for (i, channel) in channel_data.iter().enumerate() {
                if channel.len() != expected_length {
                    return Err(DenoiseError::InvalidAudio(format!(
                        "channel {} has length {}, expected {}",
                        i,
                        channel.len(),
                        expected_length
                    )));
                }
            }

            if expected_length != audio_info.duration_samples {
                return Err(DenoiseError::InvalidAudio(format!(
                    "duration mismatch: expected {} samples, got {}",
                    audio_info.duration_samples, expected_length
                )));
            }
        }

        self.audio_info = Some(audio_info);
        self.channel_data = Some(channel_data);
        Ok(())
    }

    pub fn audio_info(&self) -> Option<&AudioInfo> {
        self.audio_info.as_ref()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_info.is_some() && self.channel_data.is_some()
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Option<&NoiseProfile> {
        self.profile.as_ref()
    }

    /// Estimate the session's noise profile from the first channel
    pub fn estimate_profile(&mut self, source: NoiseProfileSource) -> Result<&NoiseProfile> {
        let info = self
            .audio_info
            .as_ref()
            .ok_or_else(|| DenoiseError::InvalidAudio("no audio loaded".to_string()))?;
        let channels = self
            .channel_data
            .as_ref()
            .ok_or_else(|| DenoiseError::InvalidAudio("no audio loaded".to_string()))?;
        let reference = channels
            .first()
            .ok_or(DenoiseError::EmptyInput)?;

        let profile = source.estimate(reference, info.sample_rate, self.params.frame_size())?;
        log::info!(
            "noise profile estimated from {:?}: {} bins, mean magnitude {:.6}",
            source,
            profile.len(),
            profile.mean()
        );

        self.profile = Some(profile);
        Ok(self.profile.as_ref().unwrap())
    }

    /// Install a caller-provided profile
    ///
    /// The profile length must equal frame_size/2 for the current
    /// parameters; a mismatch is a configuration error, never a silent
    /// truncation.
    pub fn set_profile(&mut self, profile: NoiseProfile) -> Result<()> {
        if profile.len() != self.params.profile_len() {
            return Err(DenoiseError::InvalidProfile(format!(
                "profile has {} bins, frame size {} requires {}",
                profile.len(),
                self.params.frame_size(),
                self.params.profile_len()
            )));
        }
        self.profile = Some(profile);
        Ok(())
    }

    /// Per-frame magnitude spectra of an input channel, for visualization
    pub fn input_spectra(&self, channel: usize, max_frames: usize) -> Result<Vec<Vec<f64>>> {
        let channels = self
            .channel_data
            .as_ref()
            .ok_or_else(|| DenoiseError::InvalidAudio("no audio loaded".to_string()))?;
        let data = channels.get(channel).ok_or_else(|| {
            DenoiseError::InvalidAudio(format!("channel {} out of range", channel))
        })?;

        StftPipeline::new(self.params.frame_size()).magnitude_spectra(data, max_frames)
    }

    /// Process all channels
    pub fn process(&self) -> Result<ProcessingResult> {
        self.process_with_progress(None)
    }

    /// Process all channels, reporting per-frame progress
    ///
    /// Progress sends are best-effort: a dropped receiver never fails the
    /// run. Processing is all-or-nothing per channel; a failure on one
    /// channel aborts the session before any output is returned.
    pub fn process_with_progress(
        &self,
        progress: Option<Sender<Progress>>,
    ) -> Result<ProcessingResult> {
        self.params.validate()?;

        let info = self
            .audio_info
            .as_ref()
            .ok_or_else(|| DenoiseError::InvalidAudio("no audio loaded".to_string()))?;
        let channels = self
            .channel_data
            .as_ref()
            .ok_or_else(|| DenoiseError::InvalidAudio("no audio loaded".to_string()))?;
        let profile = self
            .profile
            .as_ref()
            .ok_or_else(|| DenoiseError::InvalidProfile("no noise profile estimated".to_string()))?;

        if profile.len() != self.params.profile_len() {
            return Err(DenoiseError::InvalidProfile(format!(
                "profile has {} bins, frame size {} requires {}",
                profile.len(),
                self.params.frame_size(),
                self.params.profile_len()
            )));
        }

        if channels.is_empty() || channels.iter().any(|c| c.is_empty()) {
            return Err(DenoiseError::EmptyInput);
        }

        log::info!(
            "processing {} channels, {} samples each, frame size {}, hop {}",
            channels.len(),
            channels[0].len(),
            self.params.frame_size(),
            self.params.hop_size()
        );

        let output = self.run_channels(channels, profile, info.sample_rate, progress)?;

        let rms_before = pooled_rms(channels);
        let rms_after = pooled_rms(&output);
        let analysis = NoiseAnalysis::new(&channels[0], profile, info.sample_rate);
        let metrics = ProcessingMetrics::from_levels(rms_before, rms_after, analysis.snr_db);

        log::info!(
            "processing complete: {:.1} dB estimated reduction, new SNR {:.1} dB",
            metrics.noise_reduction_db,
            metrics.new_snr_db
        );

        Ok(ProcessingResult {
            channels: output,
            metrics,
            analysis,
            profile: profile.clone(),
        })
    }

    /// One worker thread per channel; frames within a channel stay
    /// sequential (overlap-add and filter state carry across frames)
    #[cfg(not(target_arch = "wasm32"))]
    fn run_channels(
        &self,
        channels: &[Vec<f64>],
        profile: &NoiseProfile,
        sample_rate: u32,
        progress: Option<Sender<Progress>>,
    ) -> Result<Vec<Vec<f64>>> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = channels
                .iter()
                .enumerate()
                .map(|(channel_idx, channel)| {
                    let progress = progress.clone();
                    scope.spawn(move || {
                        self.run_channel(channel_idx, channel, profile, sample_rate, progress)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().expect("channel worker panicked"))
                .collect()
        })
    }

    #[cfg(target_arch = "wasm32")]
    fn run_channels(
        &self,
        channels: &[Vec<f64>],
        profile: &NoiseProfile,
        sample_rate: u32,
        progress: Option<Sender<Progress>>,
    ) -> Result<Vec<Vec<f64>>> {
        channels
            .iter()
            .enumerate()
            .map(|(channel_idx, channel)| {
                self.run_channel(channel_idx, channel, profile, sample_rate, progress.clone())
            })
            .collect()
    }

    fn run_channel(
        &self,
        channel_idx: usize,
        channel: &[f64],
        profile: &NoiseProfile,
        sample_rate: u32,
        progress: Option<Sender<Progress>>,
    ) -> Result<Vec<f64>> {
        let pipeline = StftPipeline::new(self.params.frame_size());
        let mut subtractor = SpectralSubtractor::new(&self.params, profile.clone());

        let mut output = pipeline.process_channel(
            channel,
            |spectrum| subtractor.process_spectrum(spectrum),
            |frame, total_frames| {
                if let Some(tx) = &progress {
                    let _ = tx.send(Progress {
                        channel: channel_idx,
                        frame,
                        total_frames,
                    });
                }
            },
        )?;

        apply_post_filters(&mut output, &self.params, sample_rate);

        log::debug!(
            "channel {} done ({} frames)",
            channel_idx,
            pipeline.num_frames(channel.len())
        );
        Ok(output)
    }
}

fn pooled_rms(channels: &[Vec<f64>]) -> f64 {
    let total: usize = channels.iter().map(|c| c.len()).sum();
    if total == 0 {
        return 0.0;
    }
    let sum_squares: f64 = channels
        .iter()
        .flat_map(|c| c.iter())
        .map(|s| s * s)
        .sum();
    (sum_squares / total as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rms;
    use crate::profile::NoisePreset;
    use std::f64::consts::PI;
    use std::sync::mpsc;

    fn generate_test_audio(
        sample_rate: u32,
        duration_seconds: f64,
        num_channels: usize,
    ) -> (AudioInfo, Vec<Vec<f64>>) {
        let samples = (sample_rate as f64 * duration_seconds) as usize;
        let mut channels = Vec::with_capacity(num_channels);

        for ch in 0..num_channels {
            let frequency = 440.0 * (ch + 1) as f64;
            let channel_data: Vec<f64> = (0..samples)
                .map(|i| {
                    let t = i as f64 / sample_rate as f64;
                    (2.0 * PI * frequency * t).sin() * 0.5
                })
                .collect();
            channels.push(channel_data);
        }

        let info = AudioInfo::new(sample_rate, num_channels, samples);
        (info, channels)
    }

    fn zero_profile(params: &ProcessingParams) -> NoiseProfile {
        NoiseProfile::new(vec![0.0; params.profile_len()]).unwrap()
    }

    #[test]
    fn test_end_to_end_identity_with_zero_profile() {
        // 1 s of 440 Hz at 44100 Hz, zero profile, reduction 0 dB: the
        // pipeline must be near-identity
        let params = ProcessingParams {
            reduction_db: 0.0,
            ..Default::default()
        };
        let mut reducer = NoiseReducer::new(params.clone()).unwrap();
        let (info, channels) = generate_test_audio(44100, 1.0, 1);

        reducer.load_audio(info, channels.clone()).unwrap();
        reducer.set_profile(zero_profile(&params)).unwrap();

        let result = reducer.process().unwrap();
        assert_eq!(result.channels.len(), 1);
        assert_eq!(result.channels[0].len(), channels[0].len());

        let rms_in = rms(&channels[0]);
        let rms_out = rms(&result.channels[0]);
        assert!(
            (rms_in - rms_out).abs() / rms_in < 0.01,
            "rms {} vs {}",
            rms_in,
            rms_out
        );
    }

    #[test]
    fn test_output_shape_matches_input() {
        let params = ProcessingParams::default();
        let mut reducer = NoiseReducer::new(params.clone()).unwrap();
        let (info, channels) = generate_test_audio(44100, 0.7, 2);
        let input_len = channels[0].len();

        reducer.load_audio(info, channels).unwrap();
        reducer.set_profile(zero_profile(&params)).unwrap();

        let result = reducer.process().unwrap();
        assert_eq!(result.channels.len(), 2);
        assert!(result.channels.iter().all(|c| c.len() == input_len));
    }

    #[test]
    fn test_silent_input_stays_silent() {
        // Silence against any profile must yield silence, never NaN/Inf
        let params = ProcessingParams::default();
        let mut reducer = NoiseReducer::new(params.clone()).unwrap();

        let samples = 44100;
        let info = AudioInfo::new(44100, 1, samples);
        reducer.load_audio(info, vec![vec![0.0; samples]]).unwrap();

        let profile = NoisePreset::Broadband
            .generate(params.profile_len(), 44100)
            .unwrap();
        reducer.set_profile(profile).unwrap();

        let result = reducer.process().unwrap();
        for &sample in &result.channels[0] {
            assert!(sample.is_finite());
            assert!(sample.abs() < 1e-6, "expected silence, got {}", sample);
        }
    }

    #[test]
    fn test_progress_events_cover_all_channels() {
        let params = ProcessingParams::default();
        let mut reducer = NoiseReducer::new(params.clone()).unwrap();
        let (info, channels) = generate_test_audio(44100, 0.5, 2);

        reducer.load_audio(info, channels).unwrap();
        reducer.set_profile(zero_profile(&params)).unwrap();

        let (tx, rx) = mpsc::channel();
        reducer.process_with_progress(Some(tx)).unwrap();

        let events: Vec<Progress> = rx.iter().collect();
        assert!(!events.is_empty());
        assert!(events.iter().any(|e| e.channel == 0));
        assert!(events.iter().any(|e| e.channel == 1));
        let total = events[0].total_frames;
        assert_eq!(events.len(), total * 2);
    }

    #[test]
    fn test_profile_length_mismatch_rejected() {
        let params = ProcessingParams::default();
        let mut reducer = NoiseReducer::new(params).unwrap();
        let (info, channels) = generate_test_audio(44100, 0.5, 1);
        reducer.load_audio(info, channels).unwrap();

        let wrong = NoiseProfile::new(vec![0.1; 100]).unwrap();
        assert!(matches!(
            reducer.set_profile(wrong),
            Err(DenoiseError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_error_conditions() {
        let params = ProcessingParams::default();
        let mut reducer = NoiseReducer::new(params.clone()).unwrap();

        // No audio loaded
        assert!(reducer.process().is_err());
        assert!(reducer.estimate_profile(NoiseProfileSource::Automatic).is_err());

        // Audio loaded but no profile
        let (info, channels) = generate_test_audio(44100, 0.5, 1);
        reducer.load_audio(info, channels).unwrap();
        assert!(matches!(
            reducer.process(),
            Err(DenoiseError::InvalidProfile(_))
        ));

        // Mismatched channel data
        let info = AudioInfo::new(44100, 2, 1000);
        let channels = vec![vec![0.0; 1000]];
        assert!(matches!(
            reducer.load_audio(info, channels),
            Err(DenoiseError::InvalidAudio(_))
        ));
    }

    #[test]
    fn test_preset_profile_session() {
        let params = ProcessingParams::default();
        let mut reducer = NoiseReducer::new(params).unwrap();
        let (info, channels) = generate_test_audio(44100, 1.0, 1);

        reducer.load_audio(info, channels.clone()).unwrap();
        reducer
            .estimate_profile(NoiseProfileSource::Preset(NoisePreset::Hiss))
            .unwrap();

        let result = reducer.process().unwrap();
        assert_eq!(result.channels[0].len(), channels[0].len());
        assert!(result.metrics.quality_score_percent >= 0.0);
        assert!(result.metrics.quality_score_percent <= 100.0);

        // A 440 Hz tone against a hiss profile keeps most of its energy
        let rms_out = rms(&result.channels[0]);
        assert!(rms_out > 0.5 * rms(&channels[0]));
    }

    #[test]
    fn test_input_spectra_for_visualization() {
        let params = ProcessingParams::default();
        let mut reducer = NoiseReducer::new(params.clone()).unwrap();
        let (info, channels) = generate_test_audio(44100, 0.5, 1);
        reducer.load_audio(info, channels).unwrap();

        let spectra = reducer.input_spectra(0, 4).unwrap();
        assert_eq!(spectra.len(), 4);
        assert!(spectra.iter().all(|s| s.len() == params.profile_len()));

        assert!(reducer.input_spectra(3, 4).is_err());
    }

    #[test]
    fn test_gain_floor_bounds_attenuation() {
        // Even with extreme reduction, output RMS stays above roughly 10%
        // of the input (the 0.1 per-bin gain floor)
        let params = ProcessingParams {
            reduction_db: 60.0,
            sensitivity: 2.0,
            ..Default::default()
        };
        let mut reducer = NoiseReducer::new(params.clone()).unwrap();
        let (info, channels) = generate_test_audio(44100, 1.0, 1);
        reducer.load_audio(info, channels.clone()).unwrap();

        // Profile that dwarfs the signal at every bin
        let profile = NoiseProfile::new(vec![100.0; params.profile_len()]).unwrap();
        reducer.set_profile(profile).unwrap();

        let result = reducer.process().unwrap();
        let rms_in = rms(&channels[0]);
        let rms_out = rms(&result.channels[0]);
        assert!(
            rms_out > 0.09 * rms_in && rms_out < 0.12 * rms_in,
            "rms ratio {}",
            rms_out / rms_in
        );
    }
}
