//! Speech-to-text backends and output filtering.

pub mod filter;
pub mod recognizer;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use recognizer::{MockRecognizer, Recognizer};
#[cfg(feature = "whisper")]
pub use whisper::WhisperRecognizer;
