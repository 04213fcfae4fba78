use crate::error::{LivesubError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Trait for text translation backends.
///
/// Implementations translate one finalized phrase at a time; the
/// dispatcher handles concurrency, retries and ordering around them.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_lang`.
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;

    /// Name of the backing model, for logging
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: Translator> Translator for Arc<T> {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        (**self).translate(text, target_lang).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Mock translator for testing.
///
/// By default echoes the input wrapped in the target language. Can be
/// configured to fail the first N calls with a retryable error, to
/// fail permanently, or to delay specific inputs so out-of-order
/// completion can be simulated.
pub struct MockTranslator {
    response: Option<String>,
    fail_first: AtomicU32,
    permanent_failure: bool,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            response: None,
            fail_first: AtomicU32::new(0),
            permanent_failure: false,
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always return this exact response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    /// Fail the first `n` calls with a retryable error
    pub fn with_transient_failures(self, n: u32) -> Self {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every call with a non-retryable error
    pub fn with_permanent_failure(mut self) -> Self {
        self.permanent_failure = true;
        self
    }

    /// Delay translation of this exact input text
    pub fn with_delay_for(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    /// Inputs seen so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(text.to_string());

        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }

        if self.permanent_failure {
            return Err(LivesubError::Translation {
                message: "mock permanent failure".to_string(),
                retryable: false,
            });
        }

        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0
            && self
                .fail_first
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(LivesubError::Translation {
                message: "mock transient failure".to_string(),
                retryable: true,
            });
        }

        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| format!("[{}] {}", target_lang, text)))
    }

    fn model_name(&self) -> &str {
        "mock-translator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_translator_echoes_by_default() {
        let translator = MockTranslator::new();
        let result = translator.translate("hola", "English").await.unwrap();
        assert_eq!(result, "[English] hola");
    }

    #[tokio::test]
    async fn test_mock_translator_fixed_response() {
        let translator = MockTranslator::new().with_response("hello");
        assert_eq!(translator.translate("hola", "English").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_mock_translator_transient_then_success() {
        let translator = MockTranslator::new().with_transient_failures(2);

        let first = translator.translate("x", "English").await;
        assert!(matches!(
            first,
            Err(LivesubError::Translation { retryable: true, .. })
        ));

        let second = translator.translate("x", "English").await;
        assert!(second.is_err());

        let third = translator.translate("x", "English").await;
        assert!(third.is_ok());
        assert_eq!(translator.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_translator_permanent_failure_not_retryable() {
        let translator = MockTranslator::new().with_permanent_failure();
        let err = translator.translate("x", "English").await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_translator_trait_is_object_safe() {
        let translator: Box<dyn Translator> = Box::new(MockTranslator::new());
        assert_eq!(translator.model_name(), "mock-translator");
    }
}
