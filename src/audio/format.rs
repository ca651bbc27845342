use std::path::Path;

/// Encoding tag attached to a transcription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    /// Uncompressed PCM WAV, the only encoding the pipeline accepts
    Wav,
    /// Anything else, with the tag the caller supplied
    Other(String),
}

impl AudioFormat {
    pub fn from_filename(name: &str) -> Self {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => AudioFormat::Wav,
            Some(ext) => AudioFormat::Other(ext.to_ascii_lowercase()),
            None => AudioFormat::Other(String::new()),
        }
    }

    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => AudioFormat::Wav,
            _ => AudioFormat::Other(essence),
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, AudioFormat::Wav)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Wav => f.write_str("wav"),
            AudioFormat::Other(tag) if tag.is_empty() => f.write_str("unknown"),
            AudioFormat::Other(tag) => f.write_str(tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename() {
        assert_eq!(AudioFormat::from_filename("hello.wav"), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_filename("HELLO.WAV"), AudioFormat::Wav);
        assert_eq!(
            AudioFormat::from_filename("hello.mp3"),
            AudioFormat::Other("mp3".into())
        );
        assert!(!AudioFormat::from_filename("noext").is_supported());
    }

    #[test]
    fn test_from_content_type() {
        assert_eq!(AudioFormat::from_content_type("audio/x-wav"), AudioFormat::Wav);
        assert_eq!(
            AudioFormat::from_content_type("audio/wav; codecs=1"),
            AudioFormat::Wav
        );
        assert_eq!(
            AudioFormat::from_content_type("audio/webm"),
            AudioFormat::Other("audio/webm".into())
        );
    }
}
