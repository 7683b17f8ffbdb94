//! Error types shared by every processing stage

use thiserror::Error;

/// Result type alias using [`DspError`]
pub type Result<T> = std::result::Result<T, DspError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    /// Operation invoked on a buffer with no samples
    #[error("No signal data")]
    NoData,

    #[error("Invalid parameter `{param}`: {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    #[error("Sample rates do not match: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    /// Sample data that is neither mono nor (samples x channels) shaped, or
    /// that has no channels. `channels` is the length of the last axis.
    #[error("Unsupported channel layout: {dimensions}-dimensional sample data with {channels} channel(s)")]
    UnsupportedChannelLayout { dimensions: usize, channels: usize },

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("FFT processing failed: {0}")]
    Fft(String),
}

impl DspError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param,
            reason: reason.into(),
        }
    }
}
