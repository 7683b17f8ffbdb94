//! Butterworth IIR filter design
//!
//! Analog prototype poles are pre-warped, moved to the requested cutoff
//! (and band), mapped to the z-plane with the bilinear transform, and
//! expanded into transfer-function polynomials.

use super::zero_phase::EdgePolicy;
use crate::error::{DspError, Result};
use log::debug;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default Butterworth order
pub const DEFAULT_ORDER: usize = 5;

/// Band type of a designed filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    LowPass,
    HighPass,
}

/// High/low-pass filter request, resolved against a buffer's sample rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Cutoff frequency in Hz
    pub cutoff_hz: f64,

    /// Butterworth order (>= 1)
    pub order: usize,

    pub kind: FilterKind,

    /// How the zero-phase pass treats the buffer edges
    pub edge: EdgePolicy,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            cutoff_hz: 1000.0,
            order: DEFAULT_ORDER,
            kind: FilterKind::LowPass,
            edge: EdgePolicy::ZeroState,
        }
    }
}

impl FilterSpec {
    pub fn low_pass(cutoff_hz: f64) -> Self {
        Self {
            cutoff_hz,
            kind: FilterKind::LowPass,
            ..Self::default()
        }
    }

    pub fn high_pass(cutoff_hz: f64) -> Self {
        Self {
            cutoff_hz,
            kind: FilterKind::HighPass,
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_edge(mut self, edge: EdgePolicy) -> Self {
        self.edge = edge;
        self
    }

    /// Cutoff as a fraction of the Nyquist frequency
    pub fn normalized_cutoff(&self, sample_rate: f64) -> f64 {
        self.cutoff_hz / (0.5 * sample_rate)
    }

    /// Design the coefficients for a given sample rate
    pub fn design(&self, sample_rate: f64) -> Result<FilterCoefficients> {
        design_filter(self.order, self.cutoff_hz, sample_rate, self.kind)
    }
}

/// Transfer-function coefficients of a digital filter
///
/// `a[0]` is always 1: the constructor divides every coefficient by the
/// leading feedback term.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterCoefficients {
    /// Create coefficients from feed-forward `b` and feedback `a` terms
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Result<Self> {
        if b.is_empty() {
            return Err(DspError::invalid("b", "feed-forward coefficients are empty"));
        }
        if a.is_empty() {
            return Err(DspError::invalid("a", "feedback coefficients are empty"));
        }
        if b.iter().chain(a.iter()).any(|c| !c.is_finite()) {
            return Err(DspError::invalid("b/a", "coefficients must be finite"));
        }
        let a0 = a[0];
        if a0 == 0.0 {
            return Err(DspError::invalid("a", "leading feedback coefficient is zero"));
        }

        Ok(Self {
            b: b.into_iter().map(|c| c / a0).collect(),
            a: a.into_iter().map(|c| c / a0).collect(),
        })
    }

    /// Feed-forward (numerator) coefficients
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Feedback (denominator) coefficients, `a[0] == 1`
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Number of taps in the recurrence, `max(len(a), len(b))`
    pub fn taps(&self) -> usize {
        self.a.len().max(self.b.len())
    }

    /// Complex frequency response H(e^jω)
    ///
    /// # Arguments
    /// * `frequencies` - Normalized frequencies (units of π rad/sample, 1 = Nyquist)
    pub fn frequency_response(&self, frequencies: &[f64]) -> Vec<Complex64> {
        frequencies
            .iter()
            .map(|&omega| {
                let omega_rad = omega * PI;
                let num = evaluate_polynomial(&self.b, omega_rad);
                let den = evaluate_polynomial(&self.a, omega_rad);
                num / den
            })
            .collect()
    }

    /// Magnitude response in dB
    pub fn magnitude_response_db(&self, frequencies: &[f64]) -> Vec<f64> {
        self.frequency_response(frequencies)
            .iter()
            .map(|h| 20.0 * h.norm().max(1e-300).log10())
            .collect()
    }
}

/// Σ c[n] e^{-jωn}
fn evaluate_polynomial(coeffs: &[f64], omega_rad: f64) -> Complex64 {
    coeffs
        .iter()
        .enumerate()
        .map(|(n, &c)| c * Complex64::from_polar(1.0, -(omega_rad * n as f64)))
        .sum()
}

/// Design a Butterworth filter from a sample rate and a cutoff in Hz
///
/// # Arguments
/// * `order` - Filter order (>= 1)
/// * `cutoff_hz` - Cutoff frequency, strictly between 0 and Nyquist
/// * `sample_rate` - Sample rate in Hz
/// * `kind` - Low-pass or high-pass
pub fn design_filter(
    order: usize,
    cutoff_hz: f64,
    sample_rate: f64,
    kind: FilterKind,
) -> Result<FilterCoefficients> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(DspError::invalid("sample_rate", "sample rate must be positive"));
    }
    let nyquist = 0.5 * sample_rate;
    butterworth(order, cutoff_hz / nyquist, kind).map_err(|e| match e {
        DspError::InvalidParameter { param: "cutoff", .. } => DspError::invalid(
            "cutoff",
            format!(
                "cutoff must lie strictly between 0 and the Nyquist frequency {} Hz (got {} Hz)",
                nyquist, cutoff_hz
            ),
        ),
        other => other,
    })
}

/// Design a digital Butterworth filter
///
/// # Arguments
/// * `order` - Filter order (>= 1)
/// * `normalized_cutoff` - Cutoff as a fraction of Nyquist, in (0, 1)
/// * `kind` - Low-pass or high-pass
pub fn butterworth(
    order: usize,
    normalized_cutoff: f64,
    kind: FilterKind,
) -> Result<FilterCoefficients> {
    if order < 1 {
        return Err(DspError::invalid("order", "filter order must be at least 1"));
    }
    if !(normalized_cutoff.is_finite() && normalized_cutoff > 0.0 && normalized_cutoff < 1.0) {
        return Err(DspError::invalid(
            "cutoff",
            format!(
                "normalized cutoff must lie in (0, 1) (got {})",
                normalized_cutoff
            ),
        ));
    }

    // Bilinear transform with fs = 2, so 2*fs = 4
    let fs2 = Complex64::new(4.0, 0.0);
    let warped = 4.0 * (PI * normalized_cutoff / 2.0).tan();
    let prototype = prototype_poles(order);

    let (zeros, poles, gain) = match kind {
        FilterKind::LowPass => {
            let poles: Vec<Complex64> = prototype.iter().map(|&p| p * warped).collect();
            (Vec::new(), poles, warped.powi(order as i32))
        }
        FilterKind::HighPass => {
            let poles: Vec<Complex64> = prototype.iter().map(|&p| warped / p).collect();
            let gain = (Complex64::new(1.0, 0.0) / product(prototype.iter().map(|&p| -p))).re;
            (vec![Complex64::new(0.0, 0.0); order], poles, gain)
        }
    };

    // Map to the z-plane
    let mut z_zeros: Vec<Complex64> = zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    let z_poles: Vec<Complex64> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
    // Zeros at infinity land on Nyquist
    z_zeros.resize(z_poles.len(), Complex64::new(-1.0, 0.0));

    let z_gain = gain
        * (product(zeros.iter().map(|&z| fs2 - z)) / product(poles.iter().map(|&p| fs2 - p))).re;

    let b: Vec<f64> = polynomial(&z_zeros).iter().map(|c| z_gain * c.re).collect();
    let a: Vec<f64> = polynomial(&z_poles).iter().map(|c| c.re).collect();

    debug!(
        "Designed order-{} {:?} Butterworth at {:.6} x Nyquist",
        order, kind, normalized_cutoff
    );

    FilterCoefficients::new(b, a)
}

/// Poles of the normalized analog Butterworth prototype (unit cutoff)
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - n + 1.0;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect()
}

fn product(values: impl Iterator<Item = Complex64>) -> Complex64 {
    values.fold(Complex64::new(1.0, 0.0), |acc, v| acc * v)
}

/// Expand roots into monic polynomial coefficients (highest power first)
fn polynomial(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= root * c;
        }
        coeffs = next;
    }
    coeffs
}
