use std::path::{Component, Path, PathBuf};

use crate::error::PipelineError;

/// Ordered, non-empty list of clip identifiers to concatenate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipManifest {
    clips: Vec<String>,
}

impl ClipManifest {
    pub fn new(clips: Vec<String>) -> Result<Self, PipelineError> {
        if clips.is_empty() {
            return Err(PipelineError::Validation("No video names provided".to_string()));
        }
        if let Some(pos) = clips.iter().position(|c| c.trim().is_empty()) {
            return Err(PipelineError::Validation(format!(
                "Video name at position {} is empty",
                pos
            )));
        }
        Ok(Self { clips })
    }

    /// One `<word>.mp4` clip per word of `text`, punctuation around words
    /// stripped
    pub fn from_sentence(text: &str) -> Result<Self, PipelineError> {
        let clips = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .map(|w| format!("{}.mp4", w))
            .collect();
        Self::new(clips)
    }

    pub fn clips(&self) -> &[String] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// A manifest entry that passed resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClip {
    pub id: String,
    pub path: PathBuf,
}

/// Directory of pre-recorded sign clips, addressed by file name
#[derive(Debug, Clone)]
pub struct ClipLibrary {
    root: PathBuf,
}

impl ClipLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an id to an existing file inside the library.
    ///
    /// Ids must be a single plain path component; anything that could
    /// escape the library directory is a validation error.
    pub fn resolve(&self, id: &str) -> Result<ResolvedClip, PipelineError> {
        let mut components = Path::new(id).components();
        let is_plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !is_plain || id.contains('\\') {
            return Err(PipelineError::Validation(format!(
                "Invalid video name: {}",
                id
            )));
        }

        let path = self.root.join(id);
        if !path.is_file() {
            return Err(PipelineError::NotFound {
                clip: id.to_string(),
            });
        }

        Ok(ResolvedClip {
            id: id.to_string(),
            path,
        })
    }

    /// Resolve every entry, failing on the first invalid or missing one
    pub fn resolve_all(&self, manifest: &ClipManifest) -> Result<Vec<ResolvedClip>, PipelineError> {
        manifest.clips().iter().map(|id| self.resolve(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest_rejected() {
        assert!(matches!(
            ClipManifest::new(vec![]),
            Err(PipelineError::Validation(_))
        ));
        assert!(ClipManifest::new(vec!["a.mp4".into(), " ".into()]).is_err());
    }

    #[test]
    fn test_from_sentence() {
        let manifest = ClipManifest::from_sentence("Hello, my friend!").unwrap();
        assert_eq!(manifest.clips(), ["Hello.mp4", "my.mp4", "friend.mp4"]);
        assert!(ClipManifest::from_sentence(" ... ").is_err());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let library = ClipLibrary::new("/tmp");
        for id in ["../secret.mp4", "a/b.mp4", "/etc/passwd", "..", "a\\b.mp4"] {
            assert!(
                matches!(library.resolve(id), Err(PipelineError::Validation(_))),
                "{} should be rejected",
                id
            );
        }
    }
}
