// Integration tests for the transcription adapter
//
// These tests verify request validation, silence handling and how provider
// outcomes are classified. WAV fixtures are synthesised in memory.

use anyhow::Result;
use signbridge::audio::{AudioFile, AudioFormat};
use signbridge::speech::{MockRecognizer, RecognitionError, Transcriber, TranscriptionError};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

fn wav_bytes(amplitude: f32, seconds: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let samples = (16000.0 * seconds) as usize;
        for i in 0..samples {
            let t = i as f32 / 16000.0;
            let value = (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * amplitude;
            writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn transcriber(recognizer: &MockRecognizer) -> Transcriber {
    Transcriber::new(Arc::new(recognizer.clone()))
}

#[tokio::test]
async fn test_transcribes_speech() -> Result<()> {
    let recognizer = MockRecognizer::fixed("  hello world ");
    let transcript = transcriber(&recognizer)
        .transcribe(&wav_bytes(0.5, 1.0), AudioFormat::Wav)
        .await?;

    assert_eq!(transcript.text, "hello world");
    assert_eq!(recognizer.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_non_wav_is_rejected_before_provider() {
    let recognizer = MockRecognizer::fixed("hello");
    let result = transcriber(&recognizer)
        .transcribe(&wav_bytes(0.5, 0.5), AudioFormat::from_filename("speech.mp3"))
        .await;

    match result {
        Err(e @ TranscriptionError::InvalidFormat(_)) => assert_eq!(e.code(), "invalid_format"),
        other => panic!("expected invalid_format, got {:?}", other),
    }
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn test_garbage_bytes_are_invalid_format() {
    let recognizer = MockRecognizer::fixed("hello");
    let result = transcriber(&recognizer)
        .transcribe(b"definitely not a wav file", AudioFormat::Wav)
        .await;

    assert!(matches!(result, Err(TranscriptionError::InvalidFormat(_))));
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn test_silence_is_no_speech_without_provider_call() {
    let recognizer = MockRecognizer::fixed("should not be used");
    let result = transcriber(&recognizer)
        .transcribe(&wav_bytes(0.0, 1.0), AudioFormat::Wav)
        .await;

    assert_eq!(result, Err(TranscriptionError::NoSpeech));
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn test_empty_provider_text_is_no_speech() {
    let recognizer = MockRecognizer::fixed("   ");
    let result = transcriber(&recognizer)
        .transcribe(&wav_bytes(0.5, 1.0), AudioFormat::Wav)
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.code(), "no_speech");
    assert_eq!(err.to_string(), "Unable to understand audio");
}

#[tokio::test]
async fn test_provider_outcomes_are_classified() {
    let cases = [
        (RecognitionError::NoSpeech, "no_speech", "Unable to understand audio"),
        (
            RecognitionError::Unavailable("connection refused".into()),
            "unavailable",
            "Service unavailable",
        ),
        (
            RecognitionError::Failed("quota exceeded for key".into()),
            "unknown",
            "quota exceeded for key",
        ),
    ];

    for (failure, code, message) in cases {
        let recognizer = MockRecognizer::failing(failure);
        let err = transcriber(&recognizer)
            .transcribe(&wav_bytes(0.5, 0.5), AudioFormat::Wav)
            .await
            .unwrap_err();

        assert_eq!(err.code(), code);
        assert_eq!(err.to_string(), message);
        assert_eq!(recognizer.calls(), 1, "No retries for {}", code);
    }
}

#[tokio::test]
async fn test_transcribe_file_reads_from_disk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("chunk.wav");
    std::fs::write(&path, wav_bytes(0.3, 0.5))?;

    let recognizer = MockRecognizer::fixed("from disk");
    let transcript = transcriber(&recognizer)
        .transcribe_file(&path, AudioFormat::Wav)
        .await?;

    assert_eq!(transcript.text, "from disk");

    let missing = transcriber(&recognizer)
        .transcribe_file(temp_dir.path().join("missing.wav"), AudioFormat::Wav)
        .await;
    assert!(matches!(missing, Err(TranscriptionError::Unknown(_))));

    Ok(())
}

#[test]
fn test_audio_file_reports_wav_properties() -> Result<()> {
    let audio = AudioFile::from_wav_bytes(&wav_bytes(0.25, 2.0))?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.bits_per_sample, 16);
    assert_eq!(audio.samples.len(), 32000);
    assert!((audio.duration_seconds - 2.0).abs() < 0.01);
    assert!(audio.peak() > 0.2 && audio.peak() <= 0.26);
    assert!(!audio.is_silent());

    Ok(())
}

#[test]
fn test_format_detection() {
    assert_eq!(AudioFormat::from_filename("Meeting.WAV"), AudioFormat::Wav);
    assert!(!AudioFormat::from_filename("clip.ogg").is_supported());
    assert!(!AudioFormat::from_filename("noextension").is_supported());
    assert_eq!(AudioFormat::from_content_type("audio/x-wav"), AudioFormat::Wav);
    assert_eq!(
        AudioFormat::from_content_type("audio/wav; codecs=1"),
        AudioFormat::Wav
    );
    assert!(!AudioFormat::from_content_type("audio/mpeg").is_supported());
}
