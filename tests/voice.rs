//! Speech pipeline tests
//!
//! Exercises the endpointer and WAV encoding with synthetic signals; no
//! audio hardware required.

use valet::speech::{Endpoint, SAMPLE_RATE, UtteranceDetector, samples_to_wav};

mod common;

/// Generate sine wave audio samples
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn sine(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn silence(duration_secs: f32) -> Vec<f32> {
    vec![0.0; (SAMPLE_RATE as f32 * duration_secs) as usize]
}

/// Quiet ambient noise for calibration
fn ambient() -> Vec<f32> {
    sine(200.0, 0.5, 0.005)
}

#[test]
fn silence_never_opens_an_utterance() {
    let mut detector = UtteranceDetector::calibrated(&ambient());

    for _ in 0..50 {
        assert!(matches!(detector.feed(&silence(0.1)), Endpoint::Pending));
    }
    assert!(!detector.speech_started());
}

#[test]
fn speech_onset_starts_capture() {
    let mut detector = UtteranceDetector::calibrated(&ambient());

    assert!(matches!(detector.feed(&silence(0.1)), Endpoint::Pending));
    assert!(!detector.speech_started());

    detector.feed(&sine(440.0, 0.1, 0.5));
    assert!(detector.speech_started());
}

#[test]
fn trailing_silence_closes_the_utterance() {
    let mut detector = UtteranceDetector::calibrated(&ambient());

    // Half a second of speech in capture-sized chunks
    for _ in 0..5 {
        assert!(matches!(detector.feed(&sine(440.0, 0.1, 0.5)), Endpoint::Pending));
    }

    // Feed silence until the trailing window closes the segment
    let mut completed = None;
    for _ in 0..20 {
        if let Endpoint::Complete(samples) = detector.feed(&silence(0.1)) {
            completed = Some(samples);
            break;
        }
    }

    let samples = completed.expect("utterance should close on trailing silence");
    // At least the spoken half second survives, trailing silence included
    assert!(samples.len() >= silence(0.5).len());
    assert!(!detector.speech_started());
}

#[test]
fn continuous_speech_stays_open() {
    let mut detector = UtteranceDetector::calibrated(&ambient());

    for _ in 0..30 {
        assert!(matches!(detector.feed(&sine(440.0, 0.1, 0.5)), Endpoint::Pending));
    }
    assert!(detector.speech_started());
    assert!(detector.speech_duration().as_secs_f32() > 2.9);
}

#[test]
fn take_speech_resets_the_detector() {
    let mut detector = UtteranceDetector::calibrated(&ambient());

    detector.feed(&sine(440.0, 0.5, 0.5));
    assert!(detector.speech_started());

    let taken = detector.take_speech();
    assert!(!taken.is_empty());
    assert!(!detector.speech_started());
    assert!(detector.speech_duration().is_zero());
}

#[test]
fn wav_encoding_produces_a_valid_header() {
    let samples = sine(440.0, 0.25, 0.5);
    let wav = samples_to_wav(&samples, SAMPLE_RATE).expect("encoding succeeds");

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
    // 44-byte header plus 16-bit mono PCM
    assert_eq!(wav.len(), 44 + samples.len() * 2);

    let rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
    assert_eq!(rate, SAMPLE_RATE);
}

#[test]
fn wav_encoding_clamps_out_of_range_samples() {
    let wav = samples_to_wav(&[2.0, -2.0], SAMPLE_RATE).expect("encoding succeeds");

    let first = i16::from_le_bytes([wav[44], wav[45]]);
    let second = i16::from_le_bytes([wav[46], wav[47]]);
    assert_eq!(first, i16::MAX);
    assert_eq!(second, i16::MIN);
}

#[test]
fn empty_input_encodes_to_a_bare_header() {
    let wav = samples_to_wav(&[], SAMPLE_RATE).expect("encoding succeeds");
    assert_eq!(wav.len(), 44);
}
