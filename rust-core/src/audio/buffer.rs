//! Whole-buffer audio container
//!
//! Samples are held as a `(frames, channels)` matrix together with the
//! sample rate and a channel layout tag that is resolved once, when the
//! buffer is built.

use crate::error::{DspError, Result};
use log::debug;
use ndarray::{Array2, ArrayD, ArrayView1, Axis, Ix1, Ix2};
use std::f64::consts::PI;

/// Peak amplitude used when no explicit normalization target is given
pub const DEFAULT_TARGET_AMPLITUDE: f64 = 1.0;

/// Channel arrangement of an [`AudioBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Single channel
    Mono,

    /// Two or more independent channels
    Multi(usize),
}

impl ChannelLayout {
    /// Resolve the layout for a channel count
    pub fn from_channel_count(channels: usize) -> Result<Self> {
        match channels {
            0 => Err(DspError::UnsupportedChannelLayout {
                dimensions: 2,
                channels: 0,
            }),
            1 => Ok(ChannelLayout::Mono),
            n => Ok(ChannelLayout::Multi(n)),
        }
    }

    /// Number of channels described by this layout
    pub fn channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Multi(n) => *n,
        }
    }

    pub fn is_mono(&self) -> bool {
        matches!(self, ChannelLayout::Mono)
    }
}

/// Sampled audio held entirely in memory
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample matrix, one row per frame and one column per channel
    samples: Array2<f64>,

    /// Sample rate in Hz (always > 0)
    sample_rate: u32,

    layout: ChannelLayout,
}

impl AudioBuffer {
    /// Create a mono buffer
    ///
    /// # Arguments
    /// * `samples` - Mono samples
    /// * `sample_rate` - Sample rate in Hz
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Result<Self> {
        let frames = samples.len();
        let matrix = Array2::from_shape_vec((frames, 1), samples)
            .map_err(|e| DspError::invalid("samples", e.to_string()))?;
        Self::from_frames(matrix, sample_rate)
    }

    /// Create a buffer from a `(frames, channels)` sample matrix
    pub fn from_frames(samples: Array2<f64>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(DspError::invalid("sample_rate", "sample rate must be greater than zero"));
        }
        let layout = ChannelLayout::from_channel_count(samples.ncols())?;

        Ok(Self {
            samples,
            sample_rate,
            layout,
        })
    }

    /// Create a buffer from interleaved samples (`L R L R ...` for stereo)
    pub fn from_interleaved(data: &[f64], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(DspError::UnsupportedChannelLayout {
                dimensions: 2,
                channels: 0,
            });
        }
        if data.len() % channels != 0 {
            return Err(DspError::invalid(
                "data",
                format!(
                    "{} interleaved samples do not divide into {} channels",
                    data.len(),
                    channels
                ),
            ));
        }

        let matrix = Array2::from_shape_vec((data.len() / channels, channels), data.to_vec())
            .map_err(|e| DspError::invalid("data", e.to_string()))?;
        Self::from_frames(matrix, sample_rate)
    }

    /// Create a buffer from sample data of arbitrary dimensionality
    ///
    /// One-dimensional data is treated as mono, two-dimensional data as
    /// `(frames, channels)`. Anything else is rejected.
    pub fn from_dyn(samples: ArrayD<f64>, sample_rate: u32) -> Result<Self> {
        match samples.ndim() {
            1 => {
                let mono = samples
                    .into_dimensionality::<Ix1>()
                    .map_err(|e| DspError::invalid("samples", e.to_string()))?;
                Self::mono(mono.to_vec(), sample_rate)
            }
            2 => {
                let frames = samples
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| DspError::invalid("samples", e.to_string()))?;
                Self::from_frames(frames, sample_rate)
            }
            dimensions => Err(DspError::UnsupportedChannelLayout {
                dimensions,
                channels: samples.shape().last().copied().unwrap_or(0),
            }),
        }
    }

    /// Generate a mono sine tone
    pub fn sine_wave(
        frequency: f64,
        duration_secs: f64,
        amplitude: f64,
        sample_rate: u32,
    ) -> Result<Self> {
        let frames = (duration_secs * sample_rate as f64).round().max(0.0) as usize;
        let rate = sample_rate as f64;
        let samples = (0..frames)
            .map(|n| amplitude * (2.0 * PI * frequency * n as f64 / rate).sin())
            .collect();
        Self::mono(samples, sample_rate)
    }

    /// Fail with [`DspError::NoData`] if the buffer holds no samples
    pub fn validate(&self) -> Result<()> {
        if self.samples.is_empty() {
            return Err(DspError::NoData);
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn num_channels(&self) -> usize {
        self.layout.channels()
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Sample matrix, `(frames, channels)`
    pub fn samples(&self) -> &Array2<f64> {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut Array2<f64> {
        &mut self.samples
    }

    pub fn into_samples(self) -> Array2<f64> {
        self.samples
    }

    /// View of a single channel
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn channel(&self, index: usize) -> ArrayView1<'_, f64> {
        self.samples.column(index)
    }

    /// Average of all channels, one value per frame
    pub fn mono_mix(&self) -> Vec<f64> {
        match self.layout {
            ChannelLayout::Mono => self.samples.column(0).to_vec(),
            ChannelLayout::Multi(_) => self
                .samples
                .mean_axis(Axis(1))
                .map(|mix| mix.to_vec())
                .unwrap_or_default(),
        }
    }

    /// Mono copy of this buffer (channels averaged)
    pub fn to_mono(&self) -> Result<Self> {
        if self.layout.is_mono() {
            debug!("Buffer is already mono");
            return Ok(self.clone());
        }
        Self::mono(self.mono_mix(), self.sample_rate)
    }

    /// Replace the contents with the channel average
    pub fn mix_to_mono_in_place(&mut self) -> Result<()> {
        if self.layout.is_mono() {
            debug!("Buffer is already mono");
            return Ok(());
        }
        *self = self.to_mono()?;
        Ok(())
    }

    /// Largest absolute sample value across all channels
    pub fn peak_amplitude(&self) -> Result<f64> {
        self.validate()?;
        Ok(self.samples.iter().fold(0.0_f64, |peak, &s| peak.max(s.abs())))
    }

    /// Per-frame amplitude: the largest absolute value across channels
    pub fn amplitude_envelope(&self) -> Result<Vec<f64>> {
        self.validate()?;
        Ok(self
            .samples
            .rows()
            .into_iter()
            .map(|frame| frame.iter().fold(0.0_f64, |peak, &s| peak.max(s.abs())))
            .collect())
    }

    /// Peak absolute value of each channel
    pub fn channel_peaks(&self) -> Vec<f64> {
        self.samples
            .columns()
            .into_iter()
            .map(|channel| channel.iter().fold(0.0_f64, |peak, &s| peak.max(s.abs())))
            .collect()
    }

    /// Normalized copy of this buffer
    ///
    /// Each channel is scaled so its peak absolute value equals `target`.
    /// Silent channels are left untouched.
    pub fn normalized(&self, target: f64) -> Result<Self> {
        let mut copy = self.clone();
        copy.normalize_in_place(target)?;
        Ok(copy)
    }

    /// Normalize this buffer in place (see [`AudioBuffer::normalized`])
    pub fn normalize_in_place(&mut self, target: f64) -> Result<()> {
        self.validate()?;
        if !target.is_finite() || target < 0.0 {
            return Err(DspError::invalid(
                "target_amplitude",
                format!("target must be a finite, non-negative amplitude (got {})", target),
            ));
        }

        let factors: Vec<f64> = self
            .channel_peaks()
            .into_iter()
            .map(|peak| if peak == 0.0 { 1.0 } else { target / peak })
            .collect();

        if factors.iter().all(|&f| f == 1.0) {
            debug!("Normalization is a no-op (silent or already at target)");
            return Ok(());
        }

        for (mut channel, factor) in self.samples.columns_mut().into_iter().zip(factors) {
            channel.mapv_inplace(|s| s * factor);
        }

        Ok(())
    }
}
