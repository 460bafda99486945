//! STFT framework: segmentation, windowing, and overlap-add reconstruction
//!
//! Segments an input channel into overlapping frames, applies a Hann
//! analysis window, transforms each frame, hands the spectrum to a caller
//! hook (the spectral subtraction core), inverse-transforms, applies the
//! same window at synthesis, and overlap-adds into an output buffer of the
//! input's length. Synthesis normalizes by the accumulated squared window
//! so an unmodified (gain = 1) round trip reproduces the input.

use crate::error::{DenoiseError, Result};
use crate::transform::FrameTransform;
use crate::window::hann_window;
use num_complex::Complex64;


/// Frame-by-frame analysis/modification/synthesis over one channel
pub struct StftPipeline {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f64>,
    transform: FrameTransform,
}

impl StftPipeline {
    /// Create a pipeline with 75% overlap (hop = frame_size/4)
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            hop_size: frame_size / 4,
            window: hann_window(frame_size),
            transform: FrameTransform::new(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of frames for a channel of the given length
    ///
    /// The final frame may run past the end of input; it is zero-padded on
    /// read and its overlap-add write is clipped to the output bounds.
    pub fn num_frames(&self, input_len: usize) -> usize {
        if input_len == 0 {
            0
        } else {
            (input_len + self.hop_size - 1) / self.hop_size
        }
    }

    /// Magnitude spectra of the analysis frames, for visualization
    pub fn magnitude_spectra(&self, input: &[f64], max_frames: usize) -> Result<Vec<Vec<f64>>> {
        if input.is_empty() {
            return Err(DenoiseError::EmptyInput);
        }

        let num_frames = self.num_frames(input.len()).min(max_frames);
        let mut spectra = Vec::with_capacity(num_frames);
        let mut frame = vec![0.0; self.frame_size];

        for frame_idx in 0..num_frames {
            self.read_windowed_frame(input, frame_idx * self.hop_size, &mut frame);
            let spectrum = self.transform.forward(&frame)?;
            spectra.push(spectrum[..self.frame_size / 2].iter().map(|c| c.norm()).collect());
        }

        Ok(spectra)
    }

    /// Run the full analysis, hook, and synthesis loop over one channel
    ///
    /// `spectrum_hook` receives each frame's complex spectrum for in-place
    /// modification. `progress` is invoked once per completed frame with
    /// (frame_index, total_frames).
    pub fn process_channel<S, P>(
        &self,
        input: &[f64],
        mut spectrum_hook: S,
        mut progress: P,
    ) -> Result<Vec<f64>>
    where
        S: FnMut(&mut [Complex64]),
        P: FnMut(usize, usize),
    {
        if input.is_empty() {
            return Err(DenoiseError::EmptyInput);
        }

        let num_frames = self.num_frames(input.len());
        let mut output = vec![0.0; input.len()];
        let mut window_sum = vec![0.0; input.len()];
        let mut frame = vec![0.0; self.frame_size];

        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop_size;
            self.read_windowed_frame(input, start, &mut frame);

            let mut spectrum = self.transform.forward(&frame)?;
            spectrum_hook(&mut spectrum);
            let synthesized = self.transform.inverse(&spectrum)?;

            // Synthesis window and overlap-add, clipped to output bounds
            for (i, &sample) in synthesized.iter().enumerate() {
                let pos = start + i;
                if pos >= output.len() {
                    break;
                }
                let w = self.window[i];
                output[pos] += sample * w;
                window_sum[pos] += w * w;
            }

            progress(frame_idx, num_frames);
        }

        // An unmodified accumulated sample is exactly x·Σw², so dividing by
        // any positive sum is numerically exact; only a true zero (the Hann
        // endpoint at sample 0) is left untouched
        for (sample, &sum) in output.iter_mut().zip(window_sum.iter()) {
            if sum > 0.0 {
                *sample /= sum;
            }
        }

        Ok(output)
    }

    /// Copy `frame_size` windowed samples starting at `start`, zero-padding
    /// past the end of input
    fn read_windowed_frame(&self, input: &[f64], start: usize, frame: &mut [f64]) {
        for (i, slot) in frame.iter_mut().enumerate() {
            let pos = start + i;
            *slot = if pos < input.len() {
                input[pos] * self.window[i]
            } else {
                0.0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, sample_rate: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin() * 0.5)
            .collect()
    }

    fn rms(samples: &[f64]) -> f64 {
        (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_empty_input_rejected() {
        let pipeline = StftPipeline::new(4096);
        let result = pipeline.process_channel(&[], |_| {}, |_, _| {});
        assert_eq!(result.unwrap_err(), DenoiseError::EmptyInput);
    }

    #[test]
    fn test_output_length_matches_input() {
        let pipeline = StftPipeline::new(4096);
        // Deliberately not a multiple of the hop size
        let input = sine(440.0, 44100.0, 10_000);
        let output = pipeline.process_channel(&input, |_| {}, |_, _| {}).unwrap();
        assert_eq!(output.len(), input.len());
    }

    #[test]
    fn test_identity_round_trip() {
        // Unmodified spectra must reproduce the input to floating-point
        // tolerance; validates window normalization and overlap-add
        let pipeline = StftPipeline::new(4096);
        let input = sine(440.0, 44100.0, 44100);
        let output = pipeline.process_channel(&input, |_| {}, |_, _| {}).unwrap();

        let mut max_error = 0.0f64;
        for (a, b) in input.iter().zip(output.iter()) {
            max_error = max_error.max((a - b).abs());
        }
        assert!(max_error < 1e-9, "max reconstruction error {}", max_error);

        let rms_in = rms(&input);
        let rms_out = rms(&output);
        assert!((rms_in - rms_out).abs() / rms_in < 0.01);
    }

    #[test]
    fn test_channel_edges_reconstructed() {
        // The first few samples are covered only by the near-zero tail of
        // frame 0's window; normalization must still restore them exactly
        let pipeline = StftPipeline::new(4096);
        let input = sine(440.0, 44100.0, 44100);
        let output = pipeline.process_channel(&input, |_| {}, |_, _| {}).unwrap();

        for i in 1..16 {
            assert!(
                (input[i] - output[i]).abs() < 1e-9,
                "sample {}: {} != {}",
                i,
                input[i],
                output[i]
            );
        }
        for i in input.len() - 16..input.len() {
            assert!((input[i] - output[i]).abs() < 1e-9, "sample {}", i);
        }
    }

    #[test]
    fn test_progress_reported_per_frame() {
        let pipeline = StftPipeline::new(4096);
        let input = sine(440.0, 44100.0, 8192);
        let expected = pipeline.num_frames(input.len());

        let mut seen = Vec::new();
        pipeline
            .process_channel(&input, |_| {}, |idx, total| seen.push((idx, total)))
            .unwrap();

        assert_eq!(seen.len(), expected);
        assert_eq!(seen[0], (0, expected));
        assert_eq!(seen[expected - 1], (expected - 1, expected));
    }

    #[test]
    fn test_short_input_zero_padded() {
        // Input shorter than one frame still processes without panics or
        // out-of-range writes
        let pipeline = StftPipeline::new(4096);
        let input = sine(1000.0, 44100.0, 1500);
        let output = pipeline.process_channel(&input, |_| {}, |_, _| {}).unwrap();
        assert_eq!(output.len(), 1500);
        assert!(output.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_magnitude_spectra_shape() {
        let pipeline = StftPipeline::new(4096);
        let input = sine(440.0, 44100.0, 44100);
        let spectra = pipeline.magnitude_spectra(&input, 8).unwrap();
        assert_eq!(spectra.len(), 8);
        assert!(spectra.iter().all(|s| s.len() == 2048));
    }
}
