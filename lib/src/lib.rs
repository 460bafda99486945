//! Denoise Library
//!
//! A batch noise-reduction engine based on Short-Time Fourier Transform (STFT)
//! spectral subtraction. Provides noise-profile estimation (automatic, manual
//! region, or procedural presets), per-bin gain computation with smoothing,
//! single-pole post filtering, and summary metrics over in-memory audio
//! buffers.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

pub mod audio_io;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod params;
pub mod postfilter;
pub mod profile;
pub mod stft;
pub mod subtraction;
pub mod transform;
pub mod utils;
pub mod window;

pub use audio_io::AudioInfo;
pub use engine::{NoiseReducer, ProcessingResult, Progress};
pub use metrics::{NoiseAnalysis, NoiseKind, ProcessingMetrics};
pub use error::{DenoiseError, Result};
pub use num_complex::Complex64;
pub use params::ProcessingParams;
pub use profile::{NoisePreset, NoiseProfile, NoiseProfileSource};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
///
/// Sets up logging and other initialization for the library.
/// For WASM targets, this will set up browser-specific error handling.
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub fn init() {
    #[cfg(feature = "wasm")]
    {
        console_error_panic_hook::set_once();
    }

    // Initialize logging
    #[cfg(all(not(target_arch = "wasm32"), feature = "env_logger"))]
    {
        let _ = env_logger::try_init();
    }
}
