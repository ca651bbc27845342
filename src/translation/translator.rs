use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::language::TargetLanguage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    #[error("nothing to translate: text is empty")]
    EmptyText,

    #[error("translation service unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// External translation capability. The source language is always
/// auto-detected by the provider.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub text: String,
    pub target: TargetLanguage,
}

/// Maps user-facing labels to provider codes and calls the [`Translator`].
///
/// Provider output is returned as-is; no quality checks.
pub struct TranslationService {
    translator: Arc<dyn Translator>,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    pub async fn translate(
        &self,
        text: &str,
        label: &str,
    ) -> Result<Translation, TranslationError> {
        self.translate_to(text, TargetLanguage::from_label(label)).await
    }

    pub async fn translate_to(
        &self,
        text: &str,
        target: TargetLanguage,
    ) -> Result<Translation, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyText);
        }

        match self.translator.translate(text, target.code()).await {
            Ok(translated) => {
                info!(
                    "Translated {} chars to {} via {}",
                    text.len(),
                    target.code(),
                    self.translator.name()
                );
                Ok(Translation {
                    text: translated,
                    target,
                })
            }
            Err(e) => {
                warn!("Translation to {} failed: {}", target.code(), e);
                Err(e)
            }
        }
    }
}
