//! Full linear convolution (impulse-response application)
//!
//! Direct evaluation costs O(N*M) and is the bottleneck for long impulse
//! responses. The FFT path zero-pads both inputs to a power of two of at
//! least N+M-1 samples and multiplies spectra: O((N+M) log(N+M)).

use crate::audio::{AudioBuffer, DEFAULT_TARGET_AMPLITUDE};
use crate::error::{DspError, Result};
use log::debug;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// Above this many multiply-adds `Auto` switches to the FFT path
const DIRECT_WORK_LIMIT: usize = 1 << 16;

/// Inputs this short are always convolved directly
const DIRECT_SHORT_LIMIT: usize = 64;

/// Convolution algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvolutionMethod {
    /// Pick by input size
    #[default]
    Auto,

    /// Time-domain sum, exact up to summation order
    Direct,

    /// Frequency-domain product, equal to `Direct` within rounding
    Fft,
}

impl ConvolutionMethod {
    fn resolve(self, n: usize, m: usize) -> ConvolutionMethod {
        match self {
            ConvolutionMethod::Auto => {
                if n.min(m) <= DIRECT_SHORT_LIMIT || n.saturating_mul(m) <= DIRECT_WORK_LIMIT {
                    ConvolutionMethod::Direct
                } else {
                    ConvolutionMethod::Fft
                }
            }
            other => other,
        }
    }
}

/// Full convolution of two sequences
///
/// # Returns
/// `a.len() + b.len() - 1` samples, or nothing if either input is empty
pub fn convolve_full(a: &[f64], b: &[f64], method: ConvolutionMethod) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    match method.resolve(a.len(), b.len()) {
        ConvolutionMethod::Fft => convolve_fft(a, b),
        _ => convolve_direct(a, b),
    }
}

/// out[n] = Σ a[k] * b[n-k]
fn convolve_direct(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut output = vec![0.0; a.len() + b.len() - 1];
    for (k, &x) in a.iter().enumerate() {
        for (j, &h) in b.iter().enumerate() {
            output[k + j] += x * h;
        }
    }
    output
}

fn convolve_fft(a: &[f64], b: &[f64]) -> Vec<f64> {
    let out_len = a.len() + b.len() - 1;
    let fft_size = out_len.next_power_of_two();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);

    let mut a_freq = vec![Complex::new(0.0, 0.0); fft_size];
    for (dst, &src) in a_freq.iter_mut().zip(a) {
        *dst = Complex::new(src, 0.0);
    }
    let mut b_freq = vec![Complex::new(0.0, 0.0); fft_size];
    for (dst, &src) in b_freq.iter_mut().zip(b) {
        *dst = Complex::new(src, 0.0);
    }

    fft.process(&mut a_freq);
    fft.process(&mut b_freq);

    // Multiply in frequency domain (convolution in time domain)
    for (x, h) in a_freq.iter_mut().zip(&b_freq) {
        *x *= *h;
    }

    ifft.process(&mut a_freq);

    // IFFT normalization
    let scale = 1.0 / fft_size as f64;
    a_freq[..out_len].iter().map(|c| c.re * scale).collect()
}

/// Convolve a signal with an impulse response
///
/// Both buffers are mixed down to mono first. The result is mono, at the
/// common sample rate, and `signal + impulse - 1` frames long.
///
/// # Arguments
/// * `signal` - Dry signal
/// * `impulse` - Impulse response
/// * `normalize` - Scale the result to a peak of 1.0
pub fn convolve(signal: &AudioBuffer, impulse: &AudioBuffer, normalize: bool) -> Result<AudioBuffer> {
    convolve_with(signal, impulse, normalize, ConvolutionMethod::Auto)
}

/// [`convolve`] with an explicit algorithm choice
pub fn convolve_with(
    signal: &AudioBuffer,
    impulse: &AudioBuffer,
    normalize: bool,
    method: ConvolutionMethod,
) -> Result<AudioBuffer> {
    signal.validate()?;
    impulse.validate()?;
    if signal.sample_rate() != impulse.sample_rate() {
        return Err(DspError::SampleRateMismatch {
            expected: signal.sample_rate(),
            actual: impulse.sample_rate(),
        });
    }

    let dry = signal.mono_mix();
    let response = impulse.mono_mix();
    let resolved = method.resolve(dry.len(), response.len());
    debug!(
        "Convolving {} samples with a {}-sample impulse response ({:?})",
        dry.len(),
        response.len(),
        resolved
    );

    let wet = convolve_full(&dry, &response, resolved);
    let mut output = AudioBuffer::mono(wet, signal.sample_rate())?;
    if normalize {
        output.normalize_in_place(DEFAULT_TARGET_AMPLITUDE)?;
    }
    Ok(output)
}
