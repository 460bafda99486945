//! Spectral subtraction gain computation
//!
//! Attenuates each frequency bin's magnitude in proportion to the estimated
//! noise magnitude at that bin. Phase is always preserved unmodified.

use crate::params::ProcessingParams;
use crate::profile::NoiseProfile;
use num_complex::Complex64;

/// Division-by-zero guard for the noise/magnitude ratio
const EPSILON: f64 = 1e-10;

/// Lower gain floor; prevents musical noise and total silence from
/// over-aggressive subtraction
pub const GAIN_FLOOR: f64 = 0.1;

/// Per-frame gain computation against a fixed noise profile
pub struct SpectralSubtractor {
    alpha: f64,
    smoothing_taps: usize,
    profile: NoiseProfile,
    gains: Vec<f64>,
    smoothed: Vec<f64>,
}

impl SpectralSubtractor {
    pub fn new(params: &ProcessingParams, profile: NoiseProfile) -> Self {
        let alpha = params.sensitivity * 10f64.powf(params.reduction_db / 20.0);
        Self {
            alpha,
            smoothing_taps: params.smoothing_taps,
            profile,
            gains: Vec::new(),
            smoothed: Vec::new(),
        }
    }

    /// Effective over-subtraction factor
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Raw clamped gain for one bin
    fn bin_gain(&self, k: usize, magnitude: f64) -> f64 {
        let noise = self.profile.estimate(k);
        let raw = 1.0 - self.alpha * (noise / (magnitude + EPSILON));
        raw.clamp(GAIN_FLOOR, 1.0)
    }

    /// Attenuate a frame's complex spectrum in place
    ///
    /// Gains are computed per bin, averaged with up to `smoothing_taps`
    /// neighbors on either side (the two spectral edges keep their own
    /// gain), and applied as a real multiply so phase is untouched.
    pub fn process_spectrum(&mut self, spectrum: &mut [Complex64]) {
        let n = spectrum.len();
        if n == 0 {
            return;
        }

        self.gains.resize(n, 1.0);
        for (k, bin) in spectrum.iter().enumerate() {
            self.gains[k] = self.bin_gain(k, bin.norm());
        }

        if self.smoothing_taps > 0 && n > 2 {
            self.smoothed.resize(n, 1.0);
            self.smoothed[0] = self.gains[0];
            self.smoothed[n - 1] = self.gains[n - 1];
            for k in 1..n - 1 {
                let lo = k.saturating_sub(self.smoothing_taps);
                let hi = (k + self.smoothing_taps).min(n - 1);
                let sum: f64 = self.gains[lo..=hi].iter().sum();
                self.smoothed[k] = sum / (hi - lo + 1) as f64;
            }
            std::mem::swap(&mut self.gains, &mut self.smoothed);
        }

        for (bin, &gain) in spectrum.iter_mut().zip(self.gains.iter()) {
            *bin *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_with_alpha(alpha: f64) -> ProcessingParams {
        ProcessingParams {
            sensitivity: alpha,
            reduction_db: 0.0,
            smoothing_taps: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_alpha_from_db() {
        let params = ProcessingParams {
            sensitivity: 1.0,
            reduction_db: 20.0,
            ..Default::default()
        };
        let profile = NoiseProfile::new(vec![0.0; 8]).unwrap();
        let sub = SpectralSubtractor::new(&params, profile);
        assert!((sub.alpha() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_profile_zero_reduction_is_identity() {
        let profile = NoiseProfile::new(vec![0.0; 8]).unwrap();
        let mut sub = SpectralSubtractor::new(&params_with_alpha(0.0), profile);

        let original: Vec<Complex64> = (0..9)
            .map(|i| Complex64::new(i as f64 * 0.1, -(i as f64) * 0.05))
            .collect();
        let mut spectrum = original.clone();
        sub.process_spectrum(&mut spectrum);

        for (a, b) in original.iter().zip(spectrum.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_gain_floor_holds_under_extreme_reduction() {
        let profile = NoiseProfile::new(vec![1.0; 8]).unwrap();
        let params = ProcessingParams {
            sensitivity: 1.0,
            reduction_db: 120.0,
            smoothing_taps: 0,
            ..Default::default()
        };
        let mut sub = SpectralSubtractor::new(&params, profile);

        let mut spectrum = vec![Complex64::new(0.5, 0.5); 9];
        let magnitude_before = spectrum[0].norm();
        sub.process_spectrum(&mut spectrum);

        for bin in &spectrum {
            let ratio = bin.norm() / magnitude_before;
            assert!((ratio - GAIN_FLOOR).abs() < 1e-12, "ratio {}", ratio);
        }
    }

    #[test]
    fn test_flat_profile_alpha_two_clamps_to_floor() {
        // Magnitude 2v against flat profile v with alpha = 2: unclamped gain
        // is exactly 0, clamped to 0.1, so output magnitude is 0.2v
        let v = 0.25;
        let profile = NoiseProfile::new(vec![v; 8]).unwrap();
        let mut sub = SpectralSubtractor::new(&params_with_alpha(2.0), profile);

        let mut spectrum = vec![Complex64::new(2.0 * v, 0.0); 9];
        sub.process_spectrum(&mut spectrum);

        for bin in &spectrum {
            assert!((bin.norm() - 0.2 * v).abs() < 1e-9, "mag {}", bin.norm());
        }
    }

    #[test]
    fn test_silent_spectrum_stays_silent() {
        let profile = NoiseProfile::new(vec![0.5; 8]).unwrap();
        let mut sub = SpectralSubtractor::new(&params_with_alpha(3.0), profile);

        let mut spectrum = vec![Complex64::new(0.0, 0.0); 9];
        sub.process_spectrum(&mut spectrum);

        for bin in &spectrum {
            assert_eq!(bin.norm(), 0.0);
            assert!(bin.re.is_finite() && bin.im.is_finite());
        }
    }

    #[test]
    fn test_phase_preserved() {
        let profile = NoiseProfile::new(vec![0.1; 8]).unwrap();
        let mut sub = SpectralSubtractor::new(&params_with_alpha(1.5), profile);

        let original = Complex64::new(0.3, 0.4);
        let mut spectrum = vec![original; 9];
        sub.process_spectrum(&mut spectrum);

        for bin in &spectrum {
            assert!((bin.arg() - original.arg()).abs() < 1e-12);
            assert!(bin.norm() < original.norm());
        }
    }

    #[test]
    fn test_smoothing_averages_neighbors() {
        // One outlier bin magnitude among equals: smoothing pulls its gain
        // toward the neighborhood average
        let make = |taps| {
            let params = ProcessingParams {
                sensitivity: 1.0,
                reduction_db: 0.0,
                smoothing_taps: taps,
                ..Default::default()
            };
            SpectralSubtractor::new(&params, NoiseProfile::new(vec![0.2; 16]).unwrap())
        };

        let mut base = vec![Complex64::new(1.0, 0.0); 17];
        base[8] = Complex64::new(0.21, 0.0); // near the noise level, low gain

        let mut unsmoothed = base.clone();
        make(0).process_spectrum(&mut unsmoothed);
        let mut smoothed = base.clone();
        make(2).process_spectrum(&mut smoothed);

        let raw_ratio = unsmoothed[8].norm() / base[8].norm();
        let smooth_ratio = smoothed[8].norm() / base[8].norm();
        assert!(smooth_ratio > raw_ratio);
    }
}
