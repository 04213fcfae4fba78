//! Default configuration constants for livesub.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default speech-activity threshold.
///
/// Normalized RMS (0.0 to 1.0) above which a frame counts as speech.
/// Tuned for typical microphone input levels.
pub const SILENCE_THRESHOLD: f32 = 0.01;

/// Default silence duration in seconds before a phrase is finalized.
pub const SILENCE_DURATION_SECS: f32 = 0.5;

/// Default hard cap on phrase length in seconds.
///
/// A phrase still accumulating when it reaches this length is finalized
/// immediately so continuous speech cannot grow windows without bound.
pub const MAX_PHRASE_DURATION_SECS: f32 = 10.0;

/// Default streaming window step in seconds.
///
/// A new cumulative window is emitted each time this much fresh audio
/// has accumulated in the current phrase.
pub const STREAMING_STEP_SECS: f32 = 1.0;

/// Default number of concurrent transcription workers.
pub const TRANSCRIPTION_WORKERS: usize = 2;

/// Maximum allowed transcription workers.
///
/// Whisper inference is memory-hungry; more than 4 concurrent contexts
/// degrades rather than improves throughput on typical hardware.
pub const MAX_TRANSCRIPTION_WORKERS: usize = 4;

/// Default number of concurrent translation workers.
pub const TRANSLATION_WORKERS: usize = 2;

/// Bound on windows queued for transcription.
///
/// When the queue exceeds this, the oldest non-terminal window is dropped:
/// a newer cumulative window supersedes it. Terminal windows are never dropped.
pub const WINDOW_QUEUE_DEPTH: usize = 8;

/// Default minimum interval between display updates, in seconds.
pub const UPDATE_INTERVAL_SECS: f32 = 0.1;

/// Default retry bound for transient translation failures.
pub const TRANSLATION_MAX_RETRIES: u32 = 2;

/// Upper bound on configurable translation retries. Keeps the doubling
/// backoff well inside Duration arithmetic.
pub const TRANSLATION_RETRY_CAP: u32 = 10;

/// Initial backoff before a translation retry, in milliseconds (doubles per attempt).
pub const TRANSLATION_BACKOFF_MS: u64 = 500;

/// Translation request timeout in seconds.
pub const TRANSLATE_TIMEOUT_SECS: u64 = 10;

/// Sampling temperature for translation requests.
pub const TRANSLATE_TEMPERATURE: f32 = 0.3;

/// Token cap for translation responses.
pub const TRANSLATE_MAX_TOKENS: u32 = 500;

/// Default translation target language (natural-language name, goes into the prompt).
pub const TARGET_LANG: &str = "English";

/// Default translation model name.
pub const TRANSLATE_MODEL: &str = "gpt-4o-mini";

/// Default Whisper model name.
///
/// "base" (multilingual) supports auto-detection of any language.
/// Use "base.en" explicitly for English-only optimized transcription.
pub const DEFAULT_MODEL: &str = "base";

/// Default language code for transcription.
///
/// "auto" lets Whisper detect the spoken language automatically.
/// Set to a specific code (e.g., "en", "de") to force a language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default inference device preference ("auto", "cpu", or "gpu").
pub const STT_DEVICE: &str = "auto";

/// Default quantization hint for model file selection.
pub const COMPUTE_TYPE: &str = "default";

/// Minimum RMS energy for a window to be worth transcribing.
///
/// Non-terminal windows below this are silence/ambient noise and are
/// skipped; a newer window will cover the same audio anyway. The speech
/// threshold is 0.01; this is set 10× lower to only reject truly silent
/// windows while allowing anything borderline.
pub const MIN_ENERGY_FOR_TRANSCRIPTION: f32 = 0.001;

/// Capacity of the capture-to-segmenter frame channel.
pub const FRAME_CHANNEL_CAPACITY: usize = 1024;

/// Capacity of the inter-station channels downstream of the segmenter.
pub const STATION_CHANNEL_CAPACITY: usize = 64;

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else {
        "CPU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_backend_matches_compiled_feature() {
        let expected = if cfg!(feature = "cuda") {
            "CUDA"
        } else if cfg!(feature = "vulkan") {
            "Vulkan"
        } else {
            "CPU"
        };
        assert_eq!(gpu_backend(), expected);
    }

    #[test]
    fn min_energy_below_speech_threshold() {
        assert!(MIN_ENERGY_FOR_TRANSCRIPTION < SILENCE_THRESHOLD);
    }
}
