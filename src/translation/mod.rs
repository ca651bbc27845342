//! Translation adapter

mod http;
mod language;
mod mock;
mod translator;

pub use http::HttpTranslator;
pub use language::TargetLanguage;
pub use mock::MockTranslator;
pub use translator::{Translation, TranslationError, TranslationService, Translator};
