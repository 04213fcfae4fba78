use crate::error::{LivesubError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for speech-to-text recognition.
///
/// This trait allows swapping implementations (real Whisper vs mock).
pub trait Recognizer: Send + Sync {
    /// Recognize audio samples as text.
    ///
    /// # Arguments
    /// * `audio` - Audio samples as 16-bit PCM at 16kHz mono
    ///
    /// # Returns
    /// Recognized text or error
    fn recognize(&self, audio: &[i16]) -> Result<String>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the recognizer is ready
    fn is_ready(&self) -> bool;
}

/// Implement Recognizer for Arc<T> to allow sharing across workers.
impl<T: Recognizer> Recognizer for Arc<T> {
    fn recognize(&self, audio: &[i16]) -> Result<String> {
        (**self).recognize(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock recognizer for testing.
///
/// Returns either a fixed response or a scripted sequence of responses,
/// one per `recognize` call (the last entry repeats once exhausted).
#[derive(Debug)]
pub struct MockRecognizer {
    model_name: String,
    responses: Vec<String>,
    call_index: AtomicUsize,
    should_fail: bool,
}

impl MockRecognizer {
    /// Create a new mock recognizer with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            responses: vec!["mock recognition".to_string()],
            call_index: AtomicUsize::new(0),
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.responses = vec![response.to_string()];
        self
    }

    /// Configure the mock to return scripted responses in call order
    pub fn with_responses(mut self, responses: &[&str]) -> Self {
        self.responses = responses.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Configure the mock to fail on recognize
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of recognize calls made so far
    pub fn call_count(&self) -> usize {
        self.call_index.load(Ordering::SeqCst)
    }
}

impl Recognizer for MockRecognizer {
    fn recognize(&self, _audio: &[i16]) -> Result<String> {
        let index = self.call_index.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(LivesubError::Recognition {
                message: "mock recognition failure".to_string(),
            });
        }
        let clamped = index.min(self.responses.len().saturating_sub(1));
        Ok(self.responses[clamped].clone())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
