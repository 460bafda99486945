//! Noise metrics and classification
//!
//! Noise floor, SNR, dominant frequency, a coarse noise-type label, and the
//! before/after improvement numbers. The improvement metrics are heuristics
//! derived from RMS-level deltas; they are display-only estimates, not
//! perceptual-quality measurements.

use crate::profile::NoiseProfile;

/// Guard for log-of-zero in dB conversions
const EPSILON: f64 = 1e-10;

/// Root mean square of a sample buffer
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Convert a linear level to dB with a zero guard
pub fn level_db(linear: f64) -> f64 {
    20.0 * (linear + EPSILON).log10()
}

/// Coarse noise-type label derived from the profile's dominant frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    LowFrequencyRumble,
    Hiss,
    ElectricalHum,
    Broadband,
}

impl NoiseKind {
    /// Classify by dominant frequency; first matching rule wins
    pub fn classify(dominant_freq_hz: f64) -> Self {
        if dominant_freq_hz < 200.0 {
            NoiseKind::LowFrequencyRumble
        } else if dominant_freq_hz > 5000.0 {
            NoiseKind::Hiss
        } else if dominant_freq_hz % 50.0 < 5.0 || dominant_freq_hz % 60.0 < 5.0 {
            NoiseKind::ElectricalHum
        } else {
            NoiseKind::Broadband
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoiseKind::LowFrequencyRumble => "low-frequency rumble",
            NoiseKind::Hiss => "hiss",
            NoiseKind::ElectricalHum => "electrical hum",
            NoiseKind::Broadband => "broadband",
        }
    }
}

impl std::fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Pre-processing analysis of the input against its noise profile
#[derive(Debug, Clone, Copy)]
pub struct NoiseAnalysis {
    pub noise_floor_db: f64,
    pub signal_level_db: f64,
    pub snr_db: f64,
    pub dominant_freq_hz: f64,
    pub kind: NoiseKind,
}

impl NoiseAnalysis {
    /// Analyze one channel against the session's noise profile
    pub fn new(channel: &[f64], profile: &NoiseProfile, sample_rate: u32) -> Self {
        let noise_floor_db = level_db(profile.mean());
        let signal_level_db = level_db(rms(channel));
        let snr_db = signal_level_db - noise_floor_db;

        let dominant_freq_hz =
            profile.dominant_bin() as f64 / profile.len() as f64 * sample_rate as f64 / 2.0;
        let kind = NoiseKind::classify(dominant_freq_hz);

        Self {
            noise_floor_db,
            signal_level_db,
            snr_db,
            dominant_freq_hz,
            kind,
        }
    }
}

/// Post-run improvement metrics
///
/// Approximations from before/after level deltas, intended for display.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingMetrics {
    pub noise_reduction_db: f64,
    pub new_snr_db: f64,
    pub quality_score_percent: f64,
}

impl ProcessingMetrics {
    /// Derive improvement metrics from pooled input/output levels
    pub fn from_levels(rms_before: f64, rms_after: f64, snr_before_db: f64) -> Self {
        let delta_db = 20.0 * ((rms_before + EPSILON) / (rms_after + EPSILON)).log10();
        let noise_reduction_db = delta_db.max(0.0);
        let new_snr_db = snr_before_db + noise_reduction_db;
        let quality_score_percent = (50.0 + 5.0 * noise_reduction_db).clamp(0.0, 100.0);

        Self {
            noise_reduction_db,
            new_snr_db,
            quality_score_percent,
        }
    }
}
