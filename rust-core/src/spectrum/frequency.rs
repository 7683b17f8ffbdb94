//! Dominant-frequency estimation by framed FFT peak picking
//!
//! The buffer is cut into overlapping frames, each frame is Hann-windowed
//! and transformed, and the strongest bin over the whole buffer wins. A
//! single loud transient therefore outweighs a quieter sustained tone.

use super::fft::FftEngine;
use super::windowing::apply_window_inplace;
use crate::audio::AudioBuffer;
use crate::error::{DspError, Result};
use crate::filters::windows::{generate_window, WindowType};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Framing parameters for [`estimate_dominant_frequency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Samples per analysis frame (also the FFT size)
    pub frame_size: usize,

    /// Samples between the starts of consecutive frames
    pub hop_size: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 1024,
        }
    }
}

/// Estimate the dominant frequency of a buffer in Hz
///
/// Multi-channel buffers are averaged to mono first. Returns 0.0 when the
/// buffer is shorter than one frame or entirely silent.
pub fn estimate_dominant_frequency(buffer: &AudioBuffer, config: &EstimatorConfig) -> Result<f64> {
    buffer.validate()?;
    estimate_dominant_frequency_samples(
        &buffer.mono_mix(),
        buffer.sample_rate(),
        config.frame_size,
        config.hop_size,
    )
}

/// Slice form of [`estimate_dominant_frequency`]
///
/// # Arguments
/// * `samples` - Mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - Samples per frame
/// * `hop_size` - Samples between frame starts
pub fn estimate_dominant_frequency_samples(
    samples: &[f64],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<f64> {
    if samples.is_empty() {
        return Err(DspError::NoData);
    }
    if sample_rate == 0 {
        return Err(DspError::invalid("sample_rate", "must be greater than zero"));
    }
    if frame_size == 0 {
        return Err(DspError::invalid("frame_size", "must be at least 1"));
    }
    if hop_size == 0 {
        return Err(DspError::invalid("hop_size", "must be at least 1"));
    }
    if samples.len() < frame_size {
        debug!(
            "Buffer of {} samples is shorter than one {}-sample frame",
            samples.len(),
            frame_size
        );
        return Ok(0.0);
    }

    let window = generate_window(WindowType::Hann, frame_size);
    let mut engine = FftEngine::new(frame_size)?;
    let mut frame = vec![0.0; frame_size];

    let mut peaks = Vec::new();
    for start in (0..=samples.len() - frame_size).step_by(hop_size) {
        frame.copy_from_slice(&samples[start..start + frame_size]);
        apply_window_inplace(&mut frame, &window);

        let magnitude = engine.compute_magnitude(&frame)?;
        let (bin, peak_magnitude) = first_peak(&magnitude);
        trace!("Frame at {}: peak bin {} ({:.3})", start, bin, peak_magnitude);
        peaks.push(FramePeak {
            start,
            bin,
            magnitude: peak_magnitude,
        });
    }

    match loudest_frame(&peaks) {
        Some(peak) => {
            let frequency = engine.bin_to_hz(peak.bin, sample_rate as f64);
            debug!(
                "Dominant frequency {:.2} Hz from frame at {} (magnitude {:.3})",
                frequency, peak.start, peak.magnitude
            );
            Ok(frequency)
        }
        None => {
            debug!("No spectral peak above zero, reporting 0 Hz");
            Ok(0.0)
        }
    }
}

/// Strongest bin of one analysis frame
#[derive(Debug, Clone, Copy, PartialEq)]
struct FramePeak {
    /// First sample of the frame
    start: usize,
    bin: usize,
    magnitude: f64,
}

/// Frame with the largest peak magnitude, earliest on ties
///
/// `peaks` must be in time order. Peaks of zero magnitude never win.
fn loudest_frame(peaks: &[FramePeak]) -> Option<FramePeak> {
    let mut best: Option<FramePeak> = None;
    for &peak in peaks {
        let threshold = best.map_or(0.0, |b| b.magnitude);
        if peak.magnitude > threshold {
            best = Some(peak);
        }
    }
    best
}

/// Index and value of the first maximal element
fn first_peak(values: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &v) in values.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}
