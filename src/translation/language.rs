use serde::Serialize;

/// Target languages offered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetLanguage {
    English,
    Arabic,
    Hindi,
}

impl TargetLanguage {
    /// Used for any label outside the known set
    pub const DEFAULT: TargetLanguage = TargetLanguage::English;

    pub const ALL: [TargetLanguage; 3] = [
        TargetLanguage::English,
        TargetLanguage::Arabic,
        TargetLanguage::Hindi,
    ];

    /// Resolve a human-readable label. Unknown labels fall back to
    /// [`TargetLanguage::DEFAULT`] instead of failing.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.label().eq_ignore_ascii_case(label))
            .unwrap_or(Self::DEFAULT)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Arabic => "Arabic",
            TargetLanguage::Hindi => "Hindi",
        }
    }

    /// Provider language code
    pub fn code(&self) -> &'static str {
        match self {
            TargetLanguage::English => "en",
            TargetLanguage::Arabic => "ar",
            TargetLanguage::Hindi => "hi",
        }
    }
}

impl Default for TargetLanguage {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(TargetLanguage::from_label("English").code(), "en");
        assert_eq!(TargetLanguage::from_label("Arabic").code(), "ar");
        assert_eq!(TargetLanguage::from_label("Hindi").code(), "hi");
    }

    #[test]
    fn test_labels_ignore_case_and_whitespace() {
        assert_eq!(TargetLanguage::from_label("  arabic "), TargetLanguage::Arabic);
        assert_eq!(TargetLanguage::from_label("HINDI"), TargetLanguage::Hindi);
    }

    #[test]
    fn test_unknown_label_falls_back() {
        assert_eq!(TargetLanguage::from_label("Klingon"), TargetLanguage::DEFAULT);
        assert_eq!(TargetLanguage::from_label("").code(), "en");
    }
}
