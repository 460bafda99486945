//! Single-pole post filters over the reconstructed channel
//!
//! A high-pass then a low-pass run once over the full output, each only when
//! its cutoff actually constrains the band. Both carry running state across
//! the entire channel; each sample depends on the previous output, so a
//! channel cannot be filtered in parallel.

use crate::params::ProcessingParams;

/// Single-pole high-pass filter
///
/// `RC = 1/(2π·cutoff)`, `a = RC/(RC+dt)`,
/// `y[n] = a·(y[n-1] + x[n] − x[n-1])`
pub struct HighPass {
    a: f64,
    prev_input: f64,
    prev_output: f64,
}

impl HighPass {
    pub fn new(cutoff_hz: f64, sample_rate: f64) -> Self {
        let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz);
        let dt = 1.0 / sample_rate;
        Self {
            a: rc / (rc + dt),
            prev_input: 0.0,
            prev_output: 0.0,
        }
    }

    pub fn process(&mut self, samples: &mut [f64]) {
        for sample in samples.iter_mut() {
            let x = *sample;
            let y = self.a * (self.prev_output + x - self.prev_input);
            self.prev_input = x;
            self.prev_output = y;
            *sample = y;
        }
    }
}

/// Single-pole low-pass filter
///
/// `a = dt/(RC+dt)`, `y[n] = y[n-1] + a·(x[n] − y[n-1])`
pub struct LowPass {
    a: f64,
    prev_output: f64,
}

impl LowPass {
    pub fn new(cutoff_hz: f64, sample_rate: f64) -> Self {
        let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz);
        let dt = 1.0 / sample_rate;
        Self {
            a: dt / (rc + dt),
            prev_output: 0.0,
        }
    }

    pub fn process(&mut self, samples: &mut [f64]) {
        for sample in samples.iter_mut() {
            let y = self.prev_output + self.a * (*sample - self.prev_output);
            self.prev_output = y;
            *sample = y;
        }
    }
}

/// Apply the configured post filters in sequence (high-pass, then low-pass)
pub fn apply_post_filters(samples: &mut [f64], params: &ProcessingParams, sample_rate: u32) {
    let nyquist = sample_rate as f64 / 2.0;

    if params.low_cutoff_hz > 20.0 {
        log::debug!("post filter: high-pass at {} Hz", params.low_cutoff_hz);
        HighPass::new(params.low_cutoff_hz, sample_rate as f64).process(samples);
    }

    if params.high_cutoff_hz < nyquist {
        log::debug!("post filter: low-pass at {} Hz", params.high_cutoff_hz);
        LowPass::new(params.high_cutoff_hz, sample_rate as f64).process(samples);
    }
}
