//! Whisper-based speech recognition.
//!
//! Implements [`Recognizer`] on top of whisper-rs.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature and cmake to build:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::defaults;
use crate::error::{LivesubError, Result};
use crate::stt::recognizer::Recognizer;
use std::path::PathBuf;
use std::sync::Once;
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for Whisper recognition.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,
    /// Language code (e.g., "en", "es"), or "auto" for detection
    pub language: String,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
    /// Offload inference to the compiled GPU backend, if any
    pub use_gpu: bool,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
            use_gpu: true,
        }
    }
}

/// Whisper-backed recognizer.
///
/// The WhisperContext holds the immutable model and is shared across
/// workers; each `recognize` call creates its own inference state, so
/// concurrent windows run in parallel.
pub struct WhisperRecognizer {
    context: WhisperContext,
    config: WhisperConfig,
    model_name: String,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

impl WhisperRecognizer {
    /// Load a Whisper model.
    ///
    /// # Errors
    /// Returns `LivesubError::ModelNotFound` if the model file doesn't
    /// exist and `LivesubError::Recognition` if loading fails.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Suppress whisper.cpp's own logging (only once per process)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(LivesubError::ModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = config
            .model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(config.use_gpu);
        // Fused attention kernels avoid the standalone softmax CUDA
        // kernel, which crashes on Blackwell GPUs with ggml <= 1.7.6
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| LivesubError::Recognition {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| LivesubError::Recognition {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context,
            config,
            model_name,
        })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0],
    /// the format Whisper expects.
    fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

impl Recognizer for WhisperRecognizer {
    fn recognize(&self, audio: &[i16]) -> Result<String> {
        let audio_f32 = Self::convert_audio(audio);

        let mut state = self
            .context
            .create_state()
            .map_err(|e| LivesubError::Recognition {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio_f32)
            .map_err(|e| LivesubError::Recognition {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let mut text = String::new();
        for segment in state.as_iter() {
            text.push_str(&segment.to_string());
        }

        Ok(text.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}
