use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use tracing::debug;

/// Peak amplitude (full scale = 1.0) under which a clip counts as silent
pub const SILENCE_PEAK_THRESHOLD: f32 = 0.005;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("not a valid WAV file: {0}")]
    InvalidWav(String),

    #[error("unsupported WAV encoding: {0}")]
    UnsupportedEncoding(String),
}

/// Decoded PCM WAV audio
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Interleaved samples normalised to [-1.0, 1.0]
    pub samples: Vec<f32>,
}

impl AudioFile {
    /// Parse an in-memory WAV file. Only integer PCM is accepted.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        let reader =
            WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::InvalidWav(e.to_string()))?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int {
            return Err(AudioError::UnsupportedEncoding(format!(
                "{:?} samples, expected integer PCM",
                spec.sample_format
            )));
        }
        if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
            return Err(AudioError::UnsupportedEncoding(format!(
                "{} bits per sample",
                spec.bits_per_sample
            )));
        }

        let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
        let samples: Vec<f32> = reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / scale))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AudioError::InvalidWav(e.to_string()))?;

        let duration_seconds = if spec.sample_rate == 0 || spec.channels == 0 {
            0.0
        } else {
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64)
        };

        debug!(
            "WAV parsed: {:.2}s, {}Hz, {} channels, {} bits",
            duration_seconds, spec.sample_rate, spec.channels, spec.bits_per_sample
        );

        Ok(Self {
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            samples,
        })
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().copied().map(f32::abs).fold(0.0, f32::max)
    }

    /// True when there is nothing a recognizer could possibly hear
    pub fn is_silent(&self) -> bool {
        self.samples.is_empty() || self.peak() < SILENCE_PEAK_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_parses_pcm_wav() {
        let audio = AudioFile::from_wav_bytes(&wav_bytes(&[0; 16000])).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.channels, 1);
        assert!((audio.duration_seconds - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_samples_are_silent() {
        let audio = AudioFile::from_wav_bytes(&wav_bytes(&[0; 1600])).unwrap();
        assert!(audio.is_silent());
    }

    #[test]
    fn test_loud_samples_are_not_silent() {
        let audio = AudioFile::from_wav_bytes(&wav_bytes(&[8000, -8000, 4000])).unwrap();
        assert!(!audio.is_silent());
        assert!(audio.peak() > 0.2);
    }

    #[test]
    fn test_rejects_non_wav_bytes() {
        let result = AudioFile::from_wav_bytes(b"ID3\x04\x00not a wav");
        assert!(matches!(result, Err(AudioError::InvalidWav(_))));
    }
}
