//! Error types for the noise reduction engine
//!
//! All errors are recoverable by the caller; processing never panics on bad
//! input. Errors are detected and returned before any output is written for
//! the affected channel.

use std::fmt;

/// Errors produced by the noise reduction pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum DenoiseError {
    /// A zero-length channel was supplied for processing
    EmptyInput,

    /// Manual noise-profile mode invoked without a valid, in-bounds time range
    InvalidSelection(String),

    /// Resulting noise profile is empty, wrong length, or degenerate
    InvalidProfile(String),

    /// Negative or NaN values for cutoffs, reduction, sensitivity, etc.
    ParameterOutOfRange(String),

    /// Channel count or channel length mismatch in supplied audio
    InvalidAudio(String),

    /// FFT processing error
    Fft(String),

    /// File read/write or decode failure
    Io(String),
}

impl From<std::io::Error> for DenoiseError {
    fn from(err: std::io::Error) -> Self {
        DenoiseError::Io(err.to_string())
    }
}

impl fmt::Display for DenoiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenoiseError::EmptyInput => write!(f, "empty input channel"),
            DenoiseError::InvalidSelection(msg) => write!(f, "invalid noise selection: {}", msg),
            DenoiseError::InvalidProfile(msg) => write!(f, "invalid noise profile: {}", msg),
            DenoiseError::ParameterOutOfRange(msg) => {
                write!(f, "parameter out of range: {}", msg)
            }
            DenoiseError::InvalidAudio(msg) => write!(f, "invalid audio data: {}", msg),
            DenoiseError::Fft(msg) => write!(f, "FFT error: {}", msg),
            DenoiseError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DenoiseError {}

/// Result type for noise reduction operations
pub type Result<T> = std::result::Result<T, DenoiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = DenoiseError::ParameterOutOfRange("sensitivity must not be NaN".to_string());
        assert!(err.to_string().contains("sensitivity"));
        assert_eq!(DenoiseError::EmptyInput.to_string(), "empty input channel");
    }
}
