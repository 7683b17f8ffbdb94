//! Butterworth design, IIR/zero-phase filtering and convolution

pub mod windows;
pub mod design;
pub mod iir;
pub mod zero_phase;
pub mod convolve;

pub use windows::{generate_periodic_window, generate_window, WindowType};
pub use design::{butterworth, design_filter, FilterCoefficients, FilterKind, FilterSpec, DEFAULT_ORDER};
pub use iir::{apply_filter, apply_filter_in_place, IirFilter};
pub use zero_phase::{
    apply_filter_spec, apply_filter_spec_in_place, high_pass, high_pass_in_place, low_pass,
    low_pass_in_place, zero_phase_filter, zero_phase_filter_in_place, EdgePolicy, ZeroPhaseFilter,
};
pub use convolve::{convolve, convolve_full, convolve_with, ConvolutionMethod};
