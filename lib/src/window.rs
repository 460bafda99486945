//! Window functions for STFT analysis and synthesis
//!
//! The pipeline uses a Hann window at both analysis and synthesis (classic
//! windowed overlap-add). At 75% overlap this satisfies the constant
//! overlap-add condition once the synthesis stage normalizes by the
//! accumulated squared window.

use std::f64::consts::PI;

/// Generate a Hann window of the given size
///
/// `w[i] = 0.5 * (1 - cos(2π·i/(N-1)))`
pub fn hann_window(size: usize) -> Vec<f64> {
    let mut window = vec![0.0; size];
    if size == 1 {
        window[0] = 1.0;
        return window;
    }

    let n = size;
    for (i, w) in window.iter_mut().enumerate() {
        *w = 0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos());
    }
    window
}

/// Calculate the coherent gain of a window (sum of window values)
pub fn coherent_gain(window: &[f64]) -> f64 {
    window.iter().sum()
}

/// Calculate the power gain of a window (sum of squared window values)
pub fn power_gain(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}
