//! Processing configuration
//!
//! Recognized options for one noise-reduction session. Several fields are
//! accepted and threaded through the API but currently change no numeric
//! branch of the gain computation; they are kept as explicit, documented
//! extension points rather than silently dropping caller intent.

use crate::error::{DenoiseError, Result};

/// Default frame size (FFT size) in samples
pub const DEFAULT_FRAME_SIZE: usize = 4096;

/// Frame size used when `high_quality` is set
pub const HIGH_QUALITY_FRAME_SIZE: usize = 8192;

/// Noise reduction processing parameters
#[derive(Debug, Clone)]
pub struct ProcessingParams {
    /// Subtraction strength in dB
    pub reduction_db: f64,

    /// Alpha multiplier applied to the subtraction strength
    pub sensitivity: f64,

    /// Neighbor-averaging width for per-bin gain smoothing
    pub smoothing_taps: usize,

    /// Attack time in seconds (accepted, currently inert)
    pub attack_time: f64,

    /// Release time in seconds (accepted, currently inert)
    pub release_time: f64,

    /// Speech preservation ratio (accepted, currently inert)
    pub speech_preservation: f64,

    /// High-pass cutoff in Hz; the post filter runs only when > 20 Hz
    pub low_cutoff_hz: f64,

    /// Low-pass cutoff in Hz; the post filter runs only when < Nyquist
    pub high_cutoff_hz: f64,

    /// Gate threshold in dB (accepted, currently inert)
    pub gate_threshold_db: f64,

    /// Adaptive noise tracking switch (accepted, currently inert)
    pub adaptive_mode: bool,

    /// Transient preservation switch (accepted, currently inert)
    pub preserve_transients: bool,

    /// Selects frame size 8192 instead of 4096
    pub high_quality: bool,

    /// Music-optimized mode switch (accepted, currently inert)
    pub music_mode: bool,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            reduction_db: 12.0,
            sensitivity: 1.0,
            smoothing_taps: 2,
            attack_time: 0.005,
            release_time: 0.05,
            speech_preservation: 0.5,
            low_cutoff_hz: 0.0,
            high_cutoff_hz: f64::INFINITY,
            gate_threshold_db: -60.0,
            adaptive_mode: false,
            preserve_transients: false,
            high_quality: false,
            music_mode: false,
        }
    }
}

impl ProcessingParams {
    /// Frame size (FFT size) selected by the quality flag
    pub fn frame_size(&self) -> usize {
        if self.high_quality {
            HIGH_QUALITY_FRAME_SIZE
        } else {
            DEFAULT_FRAME_SIZE
        }
    }

    /// Hop size between frames (75% overlap)
    pub fn hop_size(&self) -> usize {
        self.frame_size() / 4
    }

    /// Number of noise-profile bins matching this configuration
    pub fn profile_len(&self) -> usize {
        self.frame_size() / 2
    }

    /// Validate parameter values
    ///
    /// Out-of-range values are rejected, not clamped: negative or NaN
    /// cutoffs, reduction, sensitivity and times are configuration errors.
    pub fn validate(&self) -> Result<()> {
        fn check_finite_non_negative(name: &str, value: f64) -> Result<()> {
            if value.is_nan() || value < 0.0 {
                return Err(DenoiseError::ParameterOutOfRange(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
            Ok(())
        }

        check_finite_non_negative("reduction_db", self.reduction_db)?;
        check_finite_non_negative("sensitivity", self.sensitivity)?;
        check_finite_non_negative("attack_time", self.attack_time)?;
        check_finite_non_negative("release_time", self.release_time)?;
        check_finite_non_negative("speech_preservation", self.speech_preservation)?;
        check_finite_non_negative("low_cutoff_hz", self.low_cutoff_hz)?;

        if self.high_cutoff_hz.is_nan() || self.high_cutoff_hz < 0.0 {
            return Err(DenoiseError::ParameterOutOfRange(format!(
                "high_cutoff_hz must be non-negative, got {}",
                self.high_cutoff_hz
            )));
        }

        if self.gate_threshold_db.is_nan() {
            return Err(DenoiseError::ParameterOutOfRange(
                "gate_threshold_db must not be NaN".to_string(),
            ));
        }

        // reduction_db must stay finite so alpha = sensitivity * 10^(dB/20)
        // stays finite too
        if self.reduction_db.is_infinite() || self.sensitivity.is_infinite() {
            return Err(DenoiseError::ParameterOutOfRange(
                "reduction_db and sensitivity must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let params = ProcessingParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.frame_size(), 4096);
        assert_eq!(params.hop_size(), 1024);
        assert_eq!(params.profile_len(), 2048);
    }

    #[test]
    fn test_high_quality_frame_size() {
        let params = ProcessingParams {
            high_quality: true,
            ..Default::default()
        };
        assert_eq!(params.frame_size(), 8192);
        assert_eq!(params.hop_size(), 2048);
    }

    #[test]
    fn test_rejects_nan_and_negative() {
        let mut params = ProcessingParams::default();
        params.sensitivity = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(DenoiseError::ParameterOutOfRange(_))
        ));

        let mut params = ProcessingParams::default();
        params.reduction_db = -3.0;
        assert!(params.validate().is_err());

        let mut params = ProcessingParams::default();
        params.low_cutoff_hz = -1.0;
        assert!(params.validate().is_err());
    }
}
