//! In-memory audio buffers and buffer-level utilities

pub mod buffer;
pub mod resample;

pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_TARGET_AMPLITUDE};
pub use resample::resample;
