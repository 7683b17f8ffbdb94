//! Offline sample-rate conversion with rubato
//!
//! The whole buffer is pushed through a sinc resampler in fixed-size
//! chunks, the tail is flushed, and the resampler's output delay is trimmed
//! so the result lines up with the input.

use super::buffer::AudioBuffer;
use crate::error::{DspError, Result};
use log::debug;
use ndarray::Array2;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Input frames handed to the resampler per call
const CHUNK_SIZE: usize = 1024;

fn sinc_parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resample a buffer to a new sample rate
///
/// # Arguments
/// * `buffer` - Source audio (any channel layout)
/// * `new_rate` - Target sample rate in Hz
///
/// # Returns
/// A buffer at `new_rate` holding `round(frames * new_rate / old_rate)` frames
pub fn resample(buffer: &AudioBuffer, new_rate: u32) -> Result<AudioBuffer> {
    buffer.validate()?;
    if new_rate == 0 {
        return Err(DspError::invalid("new_rate", "sample rate must be greater than zero"));
    }
    if new_rate == buffer.sample_rate() {
        debug!("Already at {} Hz", new_rate);
        return Ok(buffer.clone());
    }

    let ratio = new_rate as f64 / buffer.sample_rate() as f64;
    let channels = buffer.num_channels();
    let frames = buffer.num_frames();
    let expected = (frames as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f64>::new(ratio, 1.1, sinc_parameters(), CHUNK_SIZE, channels)
        .map_err(|e| DspError::Resample(e.to_string()))?;
    let delay = resampler.output_delay();

    let input: Vec<Vec<f64>> = (0..channels).map(|c| buffer.channel(c).to_vec()).collect();
    let mut output: Vec<Vec<f64>> = vec![Vec::with_capacity(expected + delay); channels];

    let mut position = 0;
    while position + CHUNK_SIZE <= frames {
        let chunk: Vec<&[f64]> = input
            .iter()
            .map(|ch| &ch[position..position + CHUNK_SIZE])
            .collect();
        let produced = resampler
            .process(chunk.as_slice(), None)
            .map_err(|e| DspError::Resample(e.to_string()))?;
        append_channels(&mut output, produced);
        position += CHUNK_SIZE;
    }

    if position < frames {
        let tail: Vec<&[f64]> = input.iter().map(|ch| &ch[position..]).collect();
        let produced = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(|e| DspError::Resample(e.to_string()))?;
        append_channels(&mut output, produced);
    }

    // Flush the delay line until the trimmed output is long enough
    while output[0].len() < expected + delay {
        let produced = resampler
            .process_partial(None::<&[Vec<f64>]>, None)
            .map_err(|e| DspError::Resample(e.to_string()))?;
        if produced.first().map_or(true, |ch| ch.is_empty()) {
            break;
        }
        append_channels(&mut output, produced);
    }

    for channel in output.iter_mut() {
        let start = delay.min(channel.len());
        channel.drain(..start);
        channel.resize(expected, 0.0);
    }

    debug!(
        "Resampled {} frames at {} Hz to {} frames at {} Hz",
        frames,
        buffer.sample_rate(),
        expected,
        new_rate
    );

    let matrix = Array2::from_shape_fn((expected, channels), |(i, c)| output[c][i]);
    AudioBuffer::from_frames(matrix, new_rate)
}

fn append_channels(output: &mut [Vec<f64>], produced: Vec<Vec<f64>>) {
    for (dst, src) in output.iter_mut().zip(produced) {
        dst.extend_from_slice(&src);
    }
}

impl AudioBuffer {
    /// Resampled copy of this buffer (see [`resample`])
    pub fn resampled(&self, new_rate: u32) -> Result<AudioBuffer> {
        resample(self, new_rate)
    }
}
