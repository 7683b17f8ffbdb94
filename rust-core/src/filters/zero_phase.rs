//! Zero-phase (forward/backward) filtering
//!
//! The kernel runs forward, the result is reversed, filtered again and
//! reversed back. Phase delays of the two passes cancel, the magnitude
//! response is squared, and the whole channel has to be in memory.

use super::design::{FilterCoefficients, FilterSpec};
use super::iir::{filter_samples_in_place, filter_samples_with_state, for_each_channel, steady_state};
use crate::audio::AudioBuffer;
use crate::error::{DspError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Edge handling for the two filter passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Both passes start from rest and no padding is added. Samples near
    /// either end carry start-up transients; buffers shorter than the
    /// filter are still processed.
    #[default]
    ZeroState,

    /// Extend the channel by `3 * taps` samples of odd reflection at each
    /// end, start both passes from the step-response steady state and trim
    /// the extension afterwards. Needs more than `3 * taps` samples.
    OddExtension,
}

/// Forward/backward filter bound to a set of coefficients
#[derive(Debug, Clone)]
pub struct ZeroPhaseFilter {
    coeffs: FilterCoefficients,
    edge: EdgePolicy,
}

impl ZeroPhaseFilter {
    pub fn new(coeffs: FilterCoefficients) -> Self {
        Self {
            coeffs,
            edge: EdgePolicy::ZeroState,
        }
    }

    pub fn with_edge(mut self, edge: EdgePolicy) -> Self {
        self.edge = edge;
        self
    }

    pub fn coefficients(&self) -> &FilterCoefficients {
        &self.coeffs
    }

    pub fn edge(&self) -> EdgePolicy {
        self.edge
    }

    /// Number of samples added at each end by [`EdgePolicy::OddExtension`]
    pub fn pad_len(&self) -> usize {
        3 * self.coeffs.taps()
    }

    /// Filter one channel
    pub fn process_samples(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut output = input.to_vec();
        self.process_samples_in_place(&mut output)?;
        Ok(output)
    }

    /// Filter one channel in place
    pub fn process_samples_in_place(&self, channel: &mut [f64]) -> Result<()> {
        match self.edge {
            EdgePolicy::ZeroState => {
                filter_samples_in_place(&self.coeffs, channel);
                channel.reverse();
                filter_samples_in_place(&self.coeffs, channel);
                channel.reverse();
                Ok(())
            }
            EdgePolicy::OddExtension => self.process_odd_extended(channel),
        }
    }

    fn process_odd_extended(&self, channel: &mut [f64]) -> Result<()> {
        let pad = self.pad_len();
        let n = channel.len();
        if n <= pad {
            return Err(DspError::invalid(
                "edge",
                format!(
                    "odd extension needs more than {} samples, channel has {}",
                    pad, n
                ),
            ));
        }

        let zi = steady_state(&self.coeffs);
        if zi.iter().any(|z| !z.is_finite()) {
            return Err(DspError::invalid(
                "a",
                "filter has no finite step-response steady state",
            ));
        }

        let mut extended = odd_extend(channel, pad);

        let initial: Vec<f64> = zi.iter().map(|z| z * extended[0]).collect();
        filter_samples_with_state(&self.coeffs, &mut extended, &initial)?;
        extended.reverse();

        let initial: Vec<f64> = zi.iter().map(|z| z * extended[0]).collect();
        filter_samples_with_state(&self.coeffs, &mut extended, &initial)?;
        extended.reverse();

        channel.copy_from_slice(&extended[pad..pad + n]);
        Ok(())
    }

    /// Filter every channel of a buffer, returning a new buffer
    pub fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let mut output = buffer.clone();
        self.apply_in_place(&mut output)?;
        Ok(output)
    }

    /// Filter every channel of a buffer in place
    pub fn apply_in_place(&self, buffer: &mut AudioBuffer) -> Result<()> {
        buffer.validate()?;
        debug!(
            "Zero-phase filtering {} channel(s) x {} frames ({} taps, {:?})",
            buffer.num_channels(),
            buffer.num_frames(),
            self.coeffs.taps(),
            self.edge
        );
        for_each_channel(buffer, |channel| self.process_samples_in_place(channel))
    }
}

/// Odd reflection of `x` around its end samples, `pad` samples per side
fn odd_extend(x: &[f64], pad: usize) -> Vec<f64> {
    let n = x.len();
    let first = x[0];
    let last = x[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - x[i]));
    extended.extend_from_slice(x);
    extended.extend((1..=pad).map(|i| 2.0 * last - x[n - 1 - i]));
    extended
}

/// Zero-phase filter a buffer (zero initial state, no padding)
pub fn zero_phase_filter(coeffs: &FilterCoefficients, buffer: &AudioBuffer) -> Result<AudioBuffer> {
    ZeroPhaseFilter::new(coeffs.clone()).apply(buffer)
}

/// In-place variant of [`zero_phase_filter`]
pub fn zero_phase_filter_in_place(
    coeffs: &FilterCoefficients,
    buffer: &mut AudioBuffer,
) -> Result<()> {
    ZeroPhaseFilter::new(coeffs.clone()).apply_in_place(buffer)
}

/// Design a filter for the buffer's sample rate and apply it with zero phase
pub fn apply_filter_spec(spec: &FilterSpec, buffer: &AudioBuffer) -> Result<AudioBuffer> {
    let mut output = buffer.clone();
    apply_filter_spec_in_place(spec, &mut output)?;
    Ok(output)
}

/// In-place variant of [`apply_filter_spec`]
pub fn apply_filter_spec_in_place(spec: &FilterSpec, buffer: &mut AudioBuffer) -> Result<()> {
    buffer.validate()?;
    let coeffs = spec.design(buffer.sample_rate() as f64)?;
    ZeroPhaseFilter::new(coeffs)
        .with_edge(spec.edge)
        .apply_in_place(buffer)
}

/// Spec used by the high/low-pass helpers: odd-extended edges
fn edge_padded(spec: FilterSpec, order: usize) -> FilterSpec {
    spec.with_order(order).with_edge(EdgePolicy::OddExtension)
}

/// Butterworth high-pass, zero phase with odd-extended edges
///
/// Each channel needs more than `3 * (order + 1)` samples.
///
/// # Arguments
/// * `buffer` - Input audio
/// * `cutoff_hz` - Cutoff frequency in Hz
/// * `order` - Butterworth order (>= 1)
pub fn high_pass(buffer: &AudioBuffer, cutoff_hz: f64, order: usize) -> Result<AudioBuffer> {
    apply_filter_spec(&edge_padded(FilterSpec::high_pass(cutoff_hz), order), buffer)
}

pub fn high_pass_in_place(buffer: &mut AudioBuffer, cutoff_hz: f64, order: usize) -> Result<()> {
    apply_filter_spec_in_place(&edge_padded(FilterSpec::high_pass(cutoff_hz), order), buffer)
}

/// Butterworth low-pass, zero phase with odd-extended edges
pub fn low_pass(buffer: &AudioBuffer, cutoff_hz: f64, order: usize) -> Result<AudioBuffer> {
    apply_filter_spec(&edge_padded(FilterSpec::low_pass(cutoff_hz), order), buffer)
}

pub fn low_pass_in_place(buffer: &mut AudioBuffer, cutoff_hz: f64, order: usize) -> Result<()> {
    apply_filter_spec_in_place(&edge_padded(FilterSpec::low_pass(cutoff_hz), order), buffer)
}
