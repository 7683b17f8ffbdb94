//! Waveform DSP Core - offline audio filtering and spectral analysis
//!
//! Zero-phase Butterworth filtering, impulse-response convolution,
//! dominant-frequency estimation and STFT spectrograms over whole
//! in-memory sample buffers.

pub mod audio;
pub mod error;
pub mod filters;
pub mod spectrum;

pub use audio::{resample, AudioBuffer, ChannelLayout, DEFAULT_TARGET_AMPLITUDE};
pub use error::{DspError, Result};
pub use filters::{
    apply_filter, apply_filter_in_place, butterworth, convolve, convolve_with, design_filter,
    zero_phase_filter, zero_phase_filter_in_place, ConvolutionMethod, EdgePolicy,
    FilterCoefficients, FilterKind, FilterSpec, WindowType,
};
pub use spectrum::{
    estimate_dominant_frequency, spectrogram, EstimatorConfig, Spectrogram, SpectrogramConfig,
};
