//! Short-time Fourier transform spectrogram
//!
//! Segments of `segment_len` samples advance by `segment_len - overlap`.
//! Each segment is detrended, multiplied by a periodic window, zero-padded
//! to `fft_len` and reduced to a one-sided power spectrum.

use super::fft::FftEngine;
use super::windowing::{apply_window_inplace, remove_mean, window_energy, window_sum};
use crate::audio::AudioBuffer;
use crate::error::{DspError, Result};
use crate::filters::windows::{generate_periodic_window, WindowType};
use log::debug;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Power normalization of each segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralScaling {
    /// Power spectral density in units²/Hz: 1/(fs·Σw²)
    #[default]
    Density,

    /// Power spectrum in units²: 1/(Σw)²
    Spectrum,
}

/// Per-segment trend removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detrend {
    None,

    /// Subtract the segment mean
    #[default]
    Constant,
}

/// Spectrogram configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    /// Samples per segment
    pub segment_len: usize,

    /// Samples shared by consecutive segments (default: segment_len / 8)
    pub overlap: Option<usize>,

    /// FFT length, at least `segment_len` (default: segment_len)
    pub fft_len: Option<usize>,

    /// Window applied to each segment (periodic form)
    pub window: WindowType,

    pub scaling: SpectralScaling,

    pub detrend: Detrend,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            segment_len: 256,
            overlap: None,
            fft_len: None,
            window: WindowType::Hann,
            scaling: SpectralScaling::Density,
            detrend: Detrend::Constant,
        }
    }
}

impl SpectrogramConfig {
    /// Overlap after applying the default
    pub fn effective_overlap(&self) -> usize {
        self.overlap.unwrap_or(self.segment_len / 8)
    }

    /// FFT length after applying the default
    pub fn effective_fft_len(&self) -> usize {
        self.fft_len.unwrap_or(self.segment_len)
    }

    fn validate(&self, num_samples: usize) -> Result<()> {
        if self.segment_len == 0 {
            return Err(DspError::invalid("segment_len", "must be at least 1"));
        }
        if self.segment_len > num_samples {
            return Err(DspError::invalid(
                "segment_len",
                format!(
                    "segment of {} samples exceeds the {}-sample signal",
                    self.segment_len, num_samples
                ),
            ));
        }
        if self.effective_overlap() >= self.segment_len {
            return Err(DspError::invalid(
                "overlap",
                format!(
                    "{} must be smaller than the segment length {}",
                    self.effective_overlap(),
                    self.segment_len
                ),
            ));
        }
        if self.effective_fft_len() < self.segment_len {
            return Err(DspError::invalid(
                "fft_len",
                format!(
                    "{} is shorter than the segment length {}",
                    self.effective_fft_len(),
                    self.segment_len
                ),
            ));
        }
        Ok(())
    }
}

/// Time-frequency power grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrogram {
    /// Bin frequencies in Hz, DC to Nyquist
    pub frequencies: Vec<f64>,

    /// Segment centres in seconds
    pub times: Vec<f64>,

    /// Power indexed `[frequency, time]`
    pub power: Array2<f64>,
}

impl Spectrogram {
    pub fn num_frequencies(&self) -> usize {
        self.frequencies.len()
    }

    pub fn num_segments(&self) -> usize {
        self.times.len()
    }

    /// Power spectrum of one segment
    pub fn segment(&self, index: usize) -> ArrayView1<'_, f64> {
        self.power.column(index)
    }
}

/// Compute the spectrogram of a buffer
///
/// Multi-channel buffers are averaged to mono first.
pub fn spectrogram(buffer: &AudioBuffer, config: &SpectrogramConfig) -> Result<Spectrogram> {
    buffer.validate()?;
    spectrogram_samples(&buffer.mono_mix(), buffer.sample_rate(), config)
}

/// Slice form of [`spectrogram`]
pub fn spectrogram_samples(
    samples: &[f64],
    sample_rate: u32,
    config: &SpectrogramConfig,
) -> Result<Spectrogram> {
    if samples.is_empty() {
        return Err(DspError::NoData);
    }
    if sample_rate == 0 {
        return Err(DspError::invalid("sample_rate", "must be greater than zero"));
    }
    config.validate(samples.len())?;

    let fs = sample_rate as f64;
    let segment_len = config.segment_len;
    let fft_len = config.effective_fft_len();
    let step = segment_len - config.effective_overlap();
    let num_segments = (samples.len() - segment_len) / step + 1;

    let window = generate_periodic_window(config.window, segment_len);
    let scale = match config.scaling {
        SpectralScaling::Density => 1.0 / (fs * window_energy(&window)),
        SpectralScaling::Spectrum => 1.0 / window_sum(&window).powi(2),
    };
    if !scale.is_finite() {
        return Err(DspError::invalid(
            "window",
            format!("{:?} window of length {} has no energy", config.window, segment_len),
        ));
    }

    let mut engine = FftEngine::new(fft_len)?;
    let num_bins = engine.num_bins();
    // Nyquist bin appears once in a two-sided spectrum of even length
    let last_doubled = if fft_len % 2 == 0 { num_bins - 1 } else { num_bins };

    debug!(
        "Spectrogram: {} segments of {} samples (step {}, fft {}, {:?})",
        num_segments, segment_len, step, fft_len, config.scaling
    );

    let mut power = Array2::zeros((num_bins, num_segments));
    let mut segment = vec![0.0; segment_len];

    for (t, mut column) in power.columns_mut().into_iter().enumerate() {
        let start = t * step;
        segment.copy_from_slice(&samples[start..start + segment_len]);
        if config.detrend == Detrend::Constant {
            remove_mean(&mut segment);
        }
        apply_window_inplace(&mut segment, &window);

        let spectrum = engine.compute_power(&segment)?;
        for (k, (dst, p)) in column.iter_mut().zip(spectrum).enumerate() {
            let doubled = if k > 0 && k < last_doubled { 2.0 } else { 1.0 };
            *dst = p * scale * doubled;
        }
    }

    let times = (0..num_segments)
        .map(|t| (segment_len as f64 / 2.0 + (t * step) as f64) / fs)
        .collect();

    Ok(Spectrogram {
        frequencies: engine.frequency_axis(fs),
        times,
        power,
    })
}
