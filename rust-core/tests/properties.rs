//! Public API properties
//!
//! End-to-end checks of filtering, convolution, normalization and analysis
//! through the crate-root exports.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::{array, Array2};
use waveform_dsp::filters::{high_pass, low_pass, EdgePolicy, ZeroPhaseFilter};
use waveform_dsp::spectrum::spectrogram_samples;
use waveform_dsp::{
    apply_filter, butterworth, convolve, convolve_with, design_filter, estimate_dominant_frequency,
    resample, spectrogram, zero_phase_filter, zero_phase_filter_in_place, AudioBuffer,
    ConvolutionMethod, DspError, EstimatorConfig, FilterKind, SpectrogramConfig,
};

fn impulse(len: usize, at: usize, sample_rate: u32) -> AudioBuffer {
    let mut samples = vec![0.0; len];
    samples[at] = 1.0;
    AudioBuffer::mono(samples, sample_rate).unwrap()
}

// === Filter design ===

#[test]
fn test_design_rejects_cutoff_outside_band() {
    for cutoff in [0.0, -10.0, 22050.0, 30000.0, f64::NAN] {
        let result = design_filter(5, cutoff, 44100.0, FilterKind::HighPass);
        assert!(
            matches!(result, Err(DspError::InvalidParameter { .. })),
            "cutoff {} accepted",
            cutoff
        );
    }
    assert!(matches!(
        design_filter(0, 1000.0, 44100.0, FilterKind::LowPass),
        Err(DspError::InvalidParameter { param: "order", .. })
    ));
}

#[test]
fn test_butterworth_band_edges() {
    for order in 1..=8 {
        let lp = butterworth(order, 0.3, FilterKind::LowPass).unwrap();
        let hp = butterworth(order, 0.3, FilterKind::HighPass).unwrap();

        let lp_response = lp.frequency_response(&[0.0, 0.3]);
        assert_abs_diff_eq!(lp_response[0].norm(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp_response[1].norm(), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);

        let hp_response = hp.frequency_response(&[0.0, 0.3, 1.0]);
        assert_abs_diff_eq!(hp_response[0].norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hp_response[1].norm(), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
        assert_abs_diff_eq!(hp_response[2].norm(), 1.0, epsilon = 1e-9);
    }
}

// === Zero-phase filtering ===

#[test]
fn test_zero_phase_impulse_response_is_symmetric() {
    let coeffs = design_filter(4, 2000.0, 20000.0, FilterKind::LowPass).unwrap();
    let centre = 500;
    let filtered = zero_phase_filter(&coeffs, &impulse(1001, centre, 20000)).unwrap();
    let response = filtered.channel(0);

    for k in 1..=200 {
        assert_abs_diff_eq!(response[centre - k], response[centre + k], epsilon = 1e-12);
    }
    // Peak stays on the impulse: no group delay
    let peak = (0..response.len())
        .max_by(|&i, &j| response[i].partial_cmp(&response[j]).unwrap())
        .unwrap();
    assert_eq!(peak, centre);
}

#[test]
fn test_single_pass_is_causal_and_delayed() {
    let coeffs = design_filter(4, 2000.0, 20000.0, FilterKind::LowPass).unwrap();
    let filtered = apply_filter(&coeffs, &impulse(400, 100, 20000)).unwrap();
    let response = filtered.channel(0);

    assert!(response.iter().take(100).all(|&y| y == 0.0));
    let peak = (0..response.len())
        .max_by(|&i, &j| response[i].partial_cmp(&response[j]).unwrap())
        .unwrap();
    assert!(peak > 100);
}

#[test]
fn test_zero_phase_in_place_matches_pure() {
    let coeffs = butterworth(3, 0.1, FilterKind::HighPass).unwrap();
    let input = AudioBuffer::sine_wave(300.0, 0.1, 0.7, 16000).unwrap();

    let pure = zero_phase_filter(&coeffs, &input).unwrap();
    let mut in_place = input.clone();
    zero_phase_filter_in_place(&coeffs, &mut in_place).unwrap();

    assert_eq!(pure, in_place);
}

#[test]
fn test_high_pass_removes_low_tone() {
    let sample_rate = 8000;
    let low = AudioBuffer::sine_wave(60.0, 1.0, 1.0, sample_rate).unwrap();
    let high = AudioBuffer::sine_wave(2000.0, 1.0, 1.0, sample_rate).unwrap();

    let low_out = high_pass(&low, 1000.0, 5).unwrap();
    let high_out = high_pass(&high, 1000.0, 5).unwrap();

    // Away from the edge transients
    let middle = 2000..6000;
    let peak = |buffer: &AudioBuffer| {
        buffer.channel(0).to_vec()[middle.clone()]
            .iter()
            .fold(0.0_f64, |m, &s| m.max(s.abs()))
    };
    let low_peak = peak(&low_out);
    let high_peak = peak(&high_out);

    assert!(low_peak < 1e-6, "60 Hz leaked through at {}", low_peak);
    assert_relative_eq!(high_peak, 1.0, epsilon = 1e-3);
}

#[test]
fn test_low_pass_odd_extension_keeps_edges_clean() {
    let sample_rate = 8000;
    let tone = AudioBuffer::sine_wave(100.0, 0.5, 1.0, sample_rate).unwrap();
    let coeffs = design_filter(4, 1000.0, sample_rate as f64, FilterKind::LowPass).unwrap();

    let extended = ZeroPhaseFilter::new(coeffs)
        .with_edge(EdgePolicy::OddExtension)
        .apply(&tone)
        .unwrap();

    // A pass-band tone survives up to the first and last samples
    for (x, y) in tone.channel(0).iter().zip(extended.channel(0).iter()) {
        assert_abs_diff_eq!(*x, *y, epsilon = 5e-2);
    }

    let plain = low_pass(&tone, 1000.0, 4).unwrap();
    assert_eq!(plain.num_frames(), tone.num_frames());
}

#[test]
fn test_filters_reject_empty_buffers() {
    let empty = AudioBuffer::mono(Vec::new(), 44100).unwrap();
    assert_eq!(high_pass(&empty, 100.0, 5), Err(DspError::NoData));
    assert_eq!(low_pass(&empty, 100.0, 5), Err(DspError::NoData));
}

// === Convolution ===

#[test]
fn test_convolution_length_and_identity() {
    let signal = AudioBuffer::sine_wave(440.0, 0.05, 0.5, 8000).unwrap();
    let unit = AudioBuffer::mono(vec![1.0], 8000).unwrap();

    let same = convolve(&signal, &unit, false).unwrap();
    assert_eq!(same.num_frames(), signal.num_frames());
    assert_eq!(same.channel(0), signal.channel(0));

    let ir = AudioBuffer::mono(vec![0.5; 37], 8000).unwrap();
    for method in [ConvolutionMethod::Direct, ConvolutionMethod::Fft, ConvolutionMethod::Auto] {
        let out = convolve_with(&signal, &ir, false, method).unwrap();
        assert_eq!(out.num_frames(), signal.num_frames() + 37 - 1);
    }
}

#[test]
fn test_convolution_known_sequence() {
    let signal = AudioBuffer::mono(vec![0.0, 0.0, 1.0, 0.0, 0.0], 8000).unwrap();
    let ir = AudioBuffer::mono(vec![1.0, 2.0, 1.0], 8000).unwrap();
    let out = convolve(&signal, &ir, false).unwrap();
    assert_eq!(out.channel(0).to_vec(), vec![0.0, 0.0, 1.0, 2.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_long_convolution_fft_matches_direct() {
    let signal = AudioBuffer::sine_wave(330.0, 0.5, 1.0, 8000).unwrap();
    let decay: Vec<f64> = (0..800).map(|i| (-(i as f64) / 100.0).exp()).collect();
    let ir = AudioBuffer::mono(decay, 8000).unwrap();

    let direct = convolve_with(&signal, &ir, true, ConvolutionMethod::Direct).unwrap();
    let fft = convolve_with(&signal, &ir, true, ConvolutionMethod::Fft).unwrap();
    for (d, f) in direct.channel(0).iter().zip(fft.channel(0).iter()) {
        assert_abs_diff_eq!(*d, *f, epsilon = 1e-9);
    }
}

// === Normalization ===

#[test]
fn test_normalize_is_idempotent() {
    let buffer = AudioBuffer::sine_wave(440.0, 0.1, 0.3, 44100).unwrap();
    let once = buffer.normalized(0.9).unwrap();
    let twice = once.normalized(0.9).unwrap();

    assert_abs_diff_eq!(once.peak_amplitude().unwrap(), 0.9, epsilon = 1e-12);
    for (a, b) in once.samples().iter().zip(twice.samples().iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_multichannel_normalize_keeps_silent_channel() {
    let samples: Array2<f64> = array![[0.5, 0.0, -0.125], [-0.25, 0.0, 0.0625], [0.1, 0.0, 0.0]];
    let buffer = AudioBuffer::from_frames(samples, 48000).unwrap();

    let normalized = buffer.normalized(1.0).unwrap();
    assert_eq!(normalized.channel_peaks(), vec![1.0, 0.0, 1.0]);
    assert!(normalized.channel(1).iter().all(|&s| s == 0.0));
}

// === Analysis ===

#[test]
fn test_sine_frequency_within_one_bin() {
    let config = EstimatorConfig::default();
    for sample_rate in [22050, 44100, 48000] {
        let bin_width = sample_rate as f64 / config.frame_size as f64;
        for freq in [110.0, 987.0, 4321.0] {
            let buffer = AudioBuffer::sine_wave(freq, 0.5, 0.8, sample_rate).unwrap();
            let estimate = estimate_dominant_frequency(&buffer, &config).unwrap();
            assert!(
                (estimate - freq).abs() <= bin_width,
                "{} Hz at {} Hz sample rate estimated as {}",
                freq,
                sample_rate,
                estimate
            );
        }
    }
}

#[test]
fn test_estimator_and_convolution_reject_empty() {
    let empty = AudioBuffer::mono(Vec::new(), 44100).unwrap();
    let unit = AudioBuffer::mono(vec![1.0], 44100).unwrap();
    assert_eq!(
        estimate_dominant_frequency(&empty, &EstimatorConfig::default()),
        Err(DspError::NoData)
    );
    assert_eq!(convolve(&empty, &unit, true), Err(DspError::NoData));
    assert_eq!(
        spectrogram(&empty, &SpectrogramConfig::default()).map(|s| s.num_segments()),
        Err(DspError::NoData)
    );
}

#[test]
fn test_spectrogram_tracks_tone_change() {
    let sample_rate = 8000;
    let first = AudioBuffer::sine_wave(500.0, 0.5, 1.0, sample_rate).unwrap();
    let second = AudioBuffer::sine_wave(2000.0, 0.5, 1.0, sample_rate).unwrap();
    let mut samples = first.mono_mix();
    samples.extend(second.mono_mix());

    let spec = spectrogram_samples(&samples, sample_rate, &SpectrogramConfig::default()).unwrap();
    let peak_frequency = |t: usize| {
        let column = spec.segment(t);
        let bin = (0..column.len())
            .max_by(|&i, &j| column[i].partial_cmp(&column[j]).unwrap())
            .unwrap();
        spec.frequencies[bin]
    };

    assert_abs_diff_eq!(peak_frequency(0), 500.0, epsilon = 1e-9);
    assert_abs_diff_eq!(peak_frequency(spec.num_segments() - 1), 2000.0, epsilon = 1e-9);
}

#[test]
fn test_resample_round_trip_frequency() {
    let buffer = AudioBuffer::sine_wave(1000.0, 0.5, 0.5, 44100).unwrap();
    let down = resample(&buffer, 22050).unwrap();
    assert_eq!(down.sample_rate(), 22050);
    assert_eq!(down.num_frames(), 11025);

    let estimate = estimate_dominant_frequency(&down, &EstimatorConfig::default()).unwrap();
    assert!((estimate - 1000.0).abs() <= 22050.0 / 2048.0);
}
