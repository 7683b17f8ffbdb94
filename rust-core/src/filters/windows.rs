//! Window functions for spectral analysis
//!
//! Symmetric windows are used when a frame is analysed on its own
//! (dominant-frequency estimation); periodic windows are used for the
//! overlapping segments of the spectrogram.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    /// Sidelobe attenuation: ~44 dB
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    /// Sidelobe attenuation: ~53 dB
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/(M-1)) + 0.08*cos(4πn/(M-1))
    /// Sidelobe attenuation: ~74 dB
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

impl WindowType {
    /// Window value at position `n` of a symmetric window spanning `m` points
    fn value(&self, n: usize, m: usize) -> f64 {
        let denom = (m - 1) as f64;
        match self {
            WindowType::Hann => 0.5 - 0.5 * (2.0 * PI * n as f64 / denom).cos(),
            WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * n as f64 / denom).cos(),
            WindowType::Blackman => {
                let angle = 2.0 * PI * n as f64 / denom;
                0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos()
            }
            WindowType::Rectangular => 1.0,
        }
    }
}

/// Generate symmetric window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    match length {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..length).map(|n| window_type.value(n, length)).collect(),
    }
}

/// Generate periodic window coefficients (the first `length` points of a
/// symmetric window of `length + 1`)
pub fn generate_periodic_window(window_type: WindowType, length: usize) -> Vec<f64> {
    match length {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..length).map(|n| window_type.value(n, length + 1)).collect(),
    }
}
