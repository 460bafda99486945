//! Forward/inverse spectral transform of a single windowed frame
//!
//! Wraps a realfft plan pair for one frame size. Both directions are pure,
//! deterministic numeric functions; the inverse is normalized so that
//! forward followed by inverse reproduces the input frame.

use crate::error::{DenoiseError, Result};
use num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Real-input FFT pair for frames of a fixed size
pub struct FrameTransform {
    size: usize,
    forward_plan: Arc<dyn RealToComplex<f64>>,
    inverse_plan: Arc<dyn ComplexToReal<f64>>,
}

impl FrameTransform {
    /// Create a transform for frames of length `size` (power of two)
    pub fn new(size: usize) -> Self {
        assert!(
            size.is_power_of_two() && size >= 2,
            "frame size must be a power of two, got {}",
            size
        );

        let mut planner = RealFftPlanner::<f64>::new();
        let forward_plan = planner.plan_fft_forward(size);
        let inverse_plan = planner.plan_fft_inverse(size);

        Self {
            size,
            forward_plan,
            inverse_plan,
        }
    }

    /// Frame size this transform was planned for
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of complex bins produced by the forward transform
    pub fn bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Forward transform of a real frame into a complex spectrum
    ///
    /// The spectrum of a real frame is conjugate-symmetric; realfft returns
    /// the size/2 + 1 independent positive-frequency bins.
    pub fn forward(&self, frame: &[f64]) -> Result<Vec<Complex64>> {
        assert_eq!(frame.len(), self.size, "frame length mismatch");

        let mut input = frame.to_vec();
        let mut spectrum = vec![Complex64::new(0.0, 0.0); self.bins()];
        self.forward_plan
            .process(&mut input, &mut spectrum)
            .map_err(|e| DenoiseError::Fft(e.to_string()))?;
        Ok(spectrum)
    }

    /// Inverse transform of a complex spectrum back to a real frame
    ///
    /// Output is scaled by 1/size so a forward then inverse round trip is
    /// the identity.
    pub fn inverse(&self, spectrum: &[Complex64]) -> Result<Vec<f64>> {
        assert_eq!(spectrum.len(), self.bins(), "spectrum length mismatch");

        let mut input = spectrum.to_vec();
        let mut frame = vec![0.0; self.size];
        self.inverse_plan
            .process(&mut input, &mut frame)
            .map_err(|e| DenoiseError::Fft(e.to_string()))?;

        let scale = 1.0 / self.size as f64;
        for sample in frame.iter_mut() {
            *sample *= scale;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_round_trip_identity() {
        let size = 1024;
        let transform = FrameTransform::new(size);

        let frame: Vec<f64> = (0..size)
            .map(|i| (2.0 * PI * 13.0 * i as f64 / size as f64).sin() * 0.7)
            .collect();

        let spectrum = transform.forward(&frame).unwrap();
        assert_eq!(spectrum.len(), size / 2 + 1);

        let reconstructed = transform.inverse(&spectrum).unwrap();
        for (a, b) in frame.iter().zip(reconstructed.iter()) {
            assert!((a - b).abs() < 1e-10, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_sine_bin_peak() {
        let size = 4096;
        let transform = FrameTransform::new(size);

        // Exact bin frequency: 32 cycles per frame
        let frame: Vec<f64> = (0..size)
            .map(|i| (2.0 * PI * 32.0 * i as f64 / size as f64).sin())
            .collect();

        let spectrum = transform.forward(&frame).unwrap();
        let peak_bin = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 32);
    }

    #[test]
    #[should_panic(expected = "frame length mismatch")]
    fn test_length_contract() {
        let transform = FrameTransform::new(256);
        let _ = transform.forward(&vec![0.0; 100]);
    }
}
