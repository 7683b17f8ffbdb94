//! Single-pass IIR filtering (Direct Form II transposed)
//!
//! y[i] = b[0]x[i] + Σ b[k]x[i-k] - Σ a[k]y[i-k], k = 1..m-1
//!
//! The delay line holds m-1 partial sums, so a block costs O(N·m). Every
//! output depends on the previous ones: a channel can only be processed in
//! time order.

use super::design::FilterCoefficients;
use crate::audio::AudioBuffer;
use crate::error::{DspError, Result};

/// IIR filter processor with explicit delay-line state
#[derive(Debug, Clone)]
pub struct IirFilter {
    /// Feed-forward coefficients, zero-extended to `taps`
    b: Vec<f64>,

    /// Feedback coefficients, zero-extended to `taps`, a[0] == 1
    a: Vec<f64>,

    /// Transposed delay line (taps - 1 entries)
    state: Vec<f64>,
}

impl IirFilter {
    /// Create a filter with zero initial state
    pub fn new(coeffs: &FilterCoefficients) -> Self {
        let taps = coeffs.taps();
        let mut b = coeffs.b().to_vec();
        let mut a = coeffs.a().to_vec();
        b.resize(taps, 0.0);
        a.resize(taps, 0.0);

        Self {
            b,
            a,
            state: vec![0.0; taps - 1],
        }
    }

    /// Replace the delay line
    ///
    /// # Arguments
    /// * `state` - New delay line, must hold `taps - 1` values
    pub fn set_state(&mut self, state: &[f64]) -> Result<()> {
        if state.len() != self.state.len() {
            return Err(DspError::invalid(
                "state",
                format!(
                    "expected {} delay-line values, got {}",
                    self.state.len(),
                    state.len()
                ),
            ));
        }
        self.state.copy_from_slice(state);
        Ok(())
    }

    /// Current delay line
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Process single sample
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let b = &self.b;
        let a = &self.a;
        let z = &mut self.state;

        let output = b[0] * input + z.first().copied().unwrap_or(0.0);

        let order = z.len();
        for k in 0..order {
            let carried = if k + 1 < order { z[k + 1] } else { 0.0 };
            z[k] = b[k + 1] * input + carried - a[k + 1] * output;
        }

        output
    }

    /// Process a block of samples
    ///
    /// # Returns
    /// Filtered output samples (same length as input)
    pub fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }

    /// Process a block in-place
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Reset filter state (clear delay line)
    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }
}

/// Delay line matching the steady state of a unit step input
///
/// Scaling it by the first input sample starts a filter as if that sample
/// had been present forever, which suppresses the start-up transient.
pub fn steady_state(coeffs: &FilterCoefficients) -> Vec<f64> {
    let filter = IirFilter::new(coeffs);
    let (b, a) = (&filter.b, &filter.a);
    let order = filter.state.len();
    if order == 0 {
        return Vec::new();
    }

    let a_sum: f64 = a.iter().sum();
    let forced_sum: f64 = (1..=order).map(|k| b[k] - a[k] * b[0]).sum();

    let mut zi = vec![0.0; order];
    zi[0] = forced_sum / a_sum;

    let mut running_a = 1.0;
    let mut running_forced = 0.0;
    for k in 1..order {
        running_a += a[k];
        running_forced += b[k] - a[k] * b[0];
        zi[k] = running_a * zi[0] - running_forced;
    }
    zi
}

/// Filter a sequence once, starting from rest
pub fn filter_samples(coeffs: &FilterCoefficients, input: &[f64]) -> Vec<f64> {
    IirFilter::new(coeffs).process_block(input)
}

/// Filter a sequence once in place, starting from rest
pub fn filter_samples_in_place(coeffs: &FilterCoefficients, buffer: &mut [f64]) {
    IirFilter::new(coeffs).process_block_inplace(buffer);
}

/// Filter a sequence once in place from a given delay line
///
/// # Returns
/// The delay line after the last sample
pub fn filter_samples_with_state(
    coeffs: &FilterCoefficients,
    buffer: &mut [f64],
    initial_state: &[f64],
) -> Result<Vec<f64>> {
    let mut filter = IirFilter::new(coeffs);
    filter.set_state(initial_state)?;
    filter.process_block_inplace(buffer);
    Ok(filter.state)
}

/// Run `process` over every channel of a buffer
pub(crate) fn for_each_channel<F>(buffer: &mut AudioBuffer, mut process: F) -> Result<()>
where
    F: FnMut(&mut [f64]) -> Result<()>,
{
    for mut column in buffer.samples_mut().columns_mut() {
        let mut channel = column.to_vec();
        process(channel.as_mut_slice())?;
        for (dst, src) in column.iter_mut().zip(channel) {
            *dst = src;
        }
    }
    Ok(())
}

/// Filter every channel of a buffer once (single pass, causal)
pub fn apply_filter(coeffs: &FilterCoefficients, buffer: &AudioBuffer) -> Result<AudioBuffer> {
    let mut output = buffer.clone();
    apply_filter_in_place(coeffs, &mut output)?;
    Ok(output)
}

/// In-place variant of [`apply_filter`]
pub fn apply_filter_in_place(coeffs: &FilterCoefficients, buffer: &mut AudioBuffer) -> Result<()> {
    buffer.validate()?;
    for_each_channel(buffer, |channel| {
        filter_samples_in_place(coeffs, channel);
        Ok(())
    })
}
