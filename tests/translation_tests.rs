// Integration tests for the translation adapter

use anyhow::Result;
use signbridge::translation::{
    MockTranslator, TargetLanguage, TranslationError, TranslationService,
};
use std::sync::Arc;

#[tokio::test]
async fn test_known_labels_map_to_codes() -> Result<()> {
    let mock = MockTranslator::new();
    let service = TranslationService::new(Arc::new(mock.clone()));

    for (label, code) in [("English", "en"), ("Arabic", "ar"), ("Hindi", "hi")] {
        let translation = service.translate("good morning", label).await?;
        assert_eq!(translation.target.code(), code);
        assert_eq!(translation.text, format!("[{}] good morning", code));
    }

    assert_eq!(mock.seen_codes(), vec!["en", "ar", "hi"]);

    Ok(())
}

#[tokio::test]
async fn test_unknown_label_falls_back_to_english() -> Result<()> {
    let mock = MockTranslator::new();
    let service = TranslationService::new(Arc::new(mock.clone()));

    let translation = service.translate("hello", "Klingon").await?;
    assert_eq!(translation.target, TargetLanguage::English);

    let translation = service.translate("hello", "").await?;
    assert_eq!(translation.target, TargetLanguage::DEFAULT);

    assert_eq!(mock.seen_codes(), vec!["en", "en"]);

    Ok(())
}

#[tokio::test]
async fn test_labels_ignore_case_and_whitespace() -> Result<()> {
    let service = TranslationService::new(Arc::new(MockTranslator::new()));

    let translation = service.translate("hello", "  arabic ").await?;
    assert_eq!(translation.target, TargetLanguage::Arabic);

    Ok(())
}

#[tokio::test]
async fn test_empty_text_is_rejected_without_provider_call() {
    let mock = MockTranslator::new();
    let service = TranslationService::new(Arc::new(mock.clone()));

    let result = service.translate("   ", "Hindi").await;

    assert_eq!(result.unwrap_err(), TranslationError::EmptyText);
    assert!(mock.seen_codes().is_empty());
}

#[tokio::test]
async fn test_provider_unavailable_is_reported() {
    let service = TranslationService::new(Arc::new(MockTranslator::failing(
        TranslationError::Unavailable("connection refused".into()),
    )));

    let result = service.translate("hello", "Arabic").await;

    assert!(matches!(result, Err(TranslationError::Unavailable(_))));
}
