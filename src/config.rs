use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;

use crate::defaults;
use crate::error::{LivesubError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub translate: TranslateConfig,
    pub display: DisplayConfig,
}

/// Audio capture and phrase segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture device by name; `None` uses the system default.
    pub device: Option<String>,
    /// Capture device by enumeration index; takes precedence over `device`.
    pub device_index: Option<usize>,
    pub sample_rate: u32,
    /// Normalized RMS above which a frame counts as speech.
    pub silence_threshold: f32,
    /// Seconds of continuous silence that finalize a phrase.
    pub silence_duration: f32,
    /// Hard cap on phrase length in seconds.
    pub max_phrase_duration: f32,
    /// Seconds of new audio between cumulative transcription windows.
    pub streaming_step_size: f32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub whisper_model: String,
    /// Inference device preference: "auto", "cpu", or "gpu".
    pub device: String,
    /// Model quantization hint: "default", "int8", or "float16".
    /// With ggml models the quantization is baked into the model file,
    /// so this only selects which file name to look for.
    pub compute_type: String,
    /// Source language code, or "auto" for detection.
    pub source_language: String,
    pub transcription_workers: usize,
}

/// Translation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslateConfig {
    /// OpenAI-compatible API base URL; `None` uses the public OpenAI endpoint.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    /// Target language as a natural-language name (goes into the prompt).
    pub target_lang: String,
    pub translation_workers: usize,
    /// Retry bound for transient request failures.
    pub max_retries: u32,
}

/// Display update configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Minimum seconds between display-update events per coalescing pass.
    pub update_interval: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            device_index: None,
            sample_rate: defaults::SAMPLE_RATE,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            silence_duration: defaults::SILENCE_DURATION_SECS,
            max_phrase_duration: defaults::MAX_PHRASE_DURATION_SECS,
            streaming_step_size: defaults::STREAMING_STEP_SECS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            whisper_model: defaults::DEFAULT_MODEL.to_string(),
            device: defaults::STT_DEVICE.to_string(),
            compute_type: defaults::COMPUTE_TYPE.to_string(),
            source_language: defaults::DEFAULT_LANGUAGE.to_string(),
            transcription_workers: defaults::TRANSCRIPTION_WORKERS,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: defaults::TRANSLATE_MODEL.to_string(),
            target_lang: defaults::TARGET_LANG.to_string(),
            translation_workers: defaults::TRANSLATION_WORKERS,
            max_retries: defaults::TRANSLATION_MAX_RETRIES,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            update_interval: defaults::UPDATE_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file is missing
    ///
    /// Invalid TOML is still an error; only absence falls back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(LivesubError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LIVESUB_MODEL → stt.whisper_model
    /// - LIVESUB_TARGET_LANG → translate.target_lang
    /// - LIVESUB_AUDIO_DEVICE → audio.device
    /// - LIVESUB_API_KEY or OPENAI_API_KEY → translate.api_key
    /// - OPENAI_BASE_URL → translate.base_url
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("LIVESUB_MODEL")
            && !model.is_empty()
        {
            self.stt.whisper_model = model;
        }

        if let Ok(lang) = std::env::var("LIVESUB_TARGET_LANG")
            && !lang.is_empty()
        {
            self.translate.target_lang = lang;
        }

        if let Ok(device) = std::env::var("LIVESUB_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(key) = std::env::var("LIVESUB_API_KEY")
            && !key.is_empty()
        {
            self.translate.api_key = Some(key);
        } else if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            self.translate.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("OPENAI_BASE_URL")
            && !url.is_empty()
        {
            self.translate.base_url = Some(url);
        }

        self
    }

    /// Reject out-of-range values before the pipeline starts.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.audio.silence_threshold) {
            return Err(invalid(
                "audio.silence_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        if self.audio.silence_duration <= 0.0 {
            return Err(invalid("audio.silence_duration", "must be positive"));
        }
        if self.audio.max_phrase_duration <= self.audio.silence_duration {
            return Err(invalid(
                "audio.max_phrase_duration",
                "must exceed silence_duration",
            ));
        }
        if self.audio.streaming_step_size <= 0.0 {
            return Err(invalid("audio.streaming_step_size", "must be positive"));
        }
        if !matches!(self.stt.device.as_str(), "auto" | "cpu" | "gpu") {
            return Err(invalid("stt.device", "must be auto, cpu, or gpu"));
        }
        if !matches!(
            self.stt.compute_type.as_str(),
            "default" | "int8" | "float16"
        ) {
            return Err(invalid(
                "stt.compute_type",
                "must be default, int8, or float16",
            ));
        }
        if self.stt.transcription_workers == 0
            || self.stt.transcription_workers > defaults::MAX_TRANSCRIPTION_WORKERS
        {
            return Err(invalid(
                "stt.transcription_workers",
                "must be between 1 and 4",
            ));
        }
        if self.translate.translation_workers == 0 {
            return Err(invalid("translate.translation_workers", "must be positive"));
        }
        if self.translate.max_retries > defaults::TRANSLATION_RETRY_CAP {
            return Err(invalid("translate.max_retries", "must be 10 or fewer"));
        }
        if self.display.update_interval <= 0.0 {
            return Err(invalid("display.update_interval", "must be positive"));
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/livesub/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("livesub")
            .join("config.toml")
    }
}

fn invalid(key: &str, message: &str) -> LivesubError {
    LivesubError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
