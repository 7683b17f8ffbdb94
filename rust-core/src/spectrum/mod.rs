//! Spectral analysis with FFT

pub mod fft;
pub mod windowing;
pub mod frequency;
pub mod spectrogram;

pub use fft::FftEngine;
pub use frequency::{estimate_dominant_frequency, estimate_dominant_frequency_samples, EstimatorConfig};
pub use spectrogram::{
    spectrogram, spectrogram_samples, Detrend, SpectralScaling, Spectrogram, SpectrogramConfig,
};
