use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::recognizer::{RecognitionError, SpeechRecognizer};

type Responder = dyn Fn(&[u8]) -> Result<String, RecognitionError> + Send + Sync;

/// Scripted recognizer for tests; counts how often it is called
#[derive(Clone)]
pub struct MockRecognizer {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockRecognizer {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<String, RecognitionError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(f),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::from_fn(move |_| Ok(text.clone()))
    }

    pub fn failing(error: RecognitionError) -> Self {
        Self::from_fn(move |_| Err(error.clone()))
    }

    /// Sleep before answering, to keep a request in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn recognize(&self, wav: &[u8]) -> Result<String, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(wav)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
