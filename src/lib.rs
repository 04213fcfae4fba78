//! livesub - Live subtitles for the Linux desktop
//!
//! Captures microphone audio, transcribes it as the speaker talks and
//! translates finalized phrases through any OpenAI-compatible endpoint.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod streaming;
pub mod stt;
pub mod translate;

// Core traits (source → recognize → translate)
pub use audio::source::AudioSource;
pub use stt::recognizer::Recognizer;
pub use translate::translator::Translator;

// Pipeline
pub use streaming::pipeline::{Pipeline, PipelineConfig, PipelineHandle};

// Events delivered to consumers
pub use events::{EventReceiver, EventSender, PipelineEvent};

// Error handling
pub use error::{LivesubError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.0+abc1234"` when git hash is available, `"0.3.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
