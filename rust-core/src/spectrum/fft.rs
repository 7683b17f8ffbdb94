//! FFT engine using realfft for real-valued signals
//!
//! One engine is planned per frame length and reused across all frames of
//! an analysis pass.

use crate::error::{DspError, Result};
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples), at least 1
    pub fn new(fft_size: usize) -> Result<Self> {
        if fft_size == 0 {
            return Err(DspError::invalid("fft_size", "must be at least 1"));
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();

        Ok(Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
        })
    }

    /// Transform `signal` and return the one-sided complex spectrum
    ///
    /// Signals shorter than the FFT size are zero-padded, longer ones are
    /// truncated.
    pub fn compute_spectrum(&mut self, signal: &[f64]) -> Result<&[Complex<f64>]> {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .map_err(|e| DspError::Fft(e.to_string()))?;

        Ok(self.output_buffer.as_slice())
    }

    /// Compute FFT and return magnitude spectrum
    ///
    /// # Returns
    /// Magnitude spectrum |X[k]| for k = 0..fft_size/2 (positive frequencies only)
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.compute_spectrum(signal)?.iter().map(|c| c.norm()).collect())
    }

    /// Compute power spectrum (magnitude squared)
    pub fn compute_power(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.compute_spectrum(signal)?.iter().map(|c| c.norm_sqr()).collect())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Centre frequency of `bin` in Hz
    pub fn bin_to_hz(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.fft_size as f64
    }

    /// Frequency axis in Hz, DC to Nyquist
    pub fn frequency_axis(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| self.bin_to_hz(bin, sample_rate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_dc_signal() {
        let mut fft = FftEngine::new(1024).unwrap();

        // Zero-padded DC block
        let signal = vec![1.0; 100];
        let spectrum = fft.compute_magnitude(&signal).unwrap();

        assert!((spectrum[0] - 100.0).abs() < 1e-9);
        assert!(spectrum[10] < 1.0);
    }

    #[test]
    fn test_fft_sine_wave() {
        let mut fft = FftEngine::new(1024).unwrap();

        // 64 whole cycles land on bin 64
        let signal: Vec<f64> = (0..1024)
            .map(|n| (2.0 * PI * 64.0 * n as f64 / 1024.0).sin())
            .collect();

        let spectrum = fft.compute_magnitude(&signal).unwrap();
        let (peak_bin, &peak_mag) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        assert_eq!(peak_bin, 64);
        // N/2 for a unit sine on a bin centre
        assert!((peak_mag - 512.0).abs() < 1e-6);
    }

    #[test]
    fn test_power_is_squared_magnitude() {
        let mut fft = FftEngine::new(16).unwrap();
        let signal: Vec<f64> = (0..16).map(|n| (n as f64 * 0.7).cos()).collect();

        let magnitude = fft.compute_magnitude(&signal).unwrap();
        let power = fft.compute_power(&signal).unwrap();
        for (m, p) in magnitude.iter().zip(&power) {
            assert!((m * m - p).abs() < 1e-9);
        }
    }

    #[test]
    fn test_frequency_axis() {
        let fft = FftEngine::new(1024).unwrap();
        let freqs = fft.frequency_axis(48000.0);

        assert_eq!(freqs.len(), 513);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[512] - 24000.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            FftEngine::new(0),
            Err(DspError::InvalidParameter { param: "fft_size", .. })
        ));
    }
}
