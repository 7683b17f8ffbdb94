//! Windowing helpers for spectral analysis
//!
//! Applies windows to time-domain frames before FFT to reduce spectral
//! leakage, and provides the window sums used to scale power spectra.

/// Multiply `signal` by `window` sample by sample
///
/// # Returns
/// Windowed signal, truncated to the shorter of the two inputs
pub fn apply_window(signal: &[f64], window: &[f64]) -> Vec<f64> {
    signal
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| s * w)
        .collect()
}

/// Apply window in-place
pub fn apply_window_inplace(signal: &mut [f64], window: &[f64]) {
    for (s, w) in signal.iter_mut().zip(window.iter()) {
        *s *= w;
    }
}

/// Σw, the coherent gain of a window (amplitude scaling)
pub fn window_sum(window: &[f64]) -> f64 {
    window.iter().sum()
}

/// Σw², the energy of a window (power-density scaling)
pub fn window_energy(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}

/// Subtract the mean of a frame from every sample
pub fn remove_mean(frame: &mut [f64]) {
    if frame.is_empty() {
        return;
    }
    let mean = frame.iter().sum::<f64>() / frame.len() as f64;
    for s in frame.iter_mut() {
        *s -= mean;
    }
}
