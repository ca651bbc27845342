use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::translator::{TranslationError, Translator};

/// Test translator: answers `"[<code>] <text>"` and records the codes it saw
#[derive(Clone, Default)]
pub struct MockTranslator {
    failure: Option<TranslationError>,
    seen_codes: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: TranslationError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn seen_codes(&self) -> Vec<String> {
        self.seen_codes
            .lock()
            .map(|codes| codes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        if let Ok(mut codes) = self.seen_codes.lock() {
            codes.push(target_code.to_string());
        }

        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(format!("[{}] {}", target_code, text)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
