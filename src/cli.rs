//! Command-line interface for livesub
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Live subtitles for the Linux desktop
#[derive(Parser, Debug)]
#[command(name = "livesub", version, about = "Live speech transcription and translation")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress partial-text updates, print only finalized phrases
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device by name (e.g., hw:0)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Audio input device by index (see `livesub devices`)
    #[arg(long, value_name = "INDEX")]
    pub device_index: Option<usize>,

    /// Whisper model (default: base, multilingual). Use base.en for English-only
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Source language code (default: auto-detect). Examples: auto, en, de, es
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Translation target language (default: English)
    #[arg(long, value_name = "LANG")]
    pub target_lang: Option<String>,

    /// Disable translation, show transcription only
    #[arg(long)]
    pub no_translate: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Transcribe a WAV file instead of the microphone ("-" for stdin)
    File {
        /// Path to a 16-bit PCM WAV file
        path: PathBuf,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

impl Cli {
    /// Fold command-line overrides into a loaded configuration.
    ///
    /// CLI flags outrank both the config file and environment variables.
    pub fn apply_to_config(&self, mut config: Config) -> Config {
        if let Some(device) = &self.device {
            config.audio.device = Some(device.clone());
        }
        if let Some(index) = self.device_index {
            config.audio.device_index = Some(index);
        }
        if let Some(model) = &self.model {
            config.stt.whisper_model = model.clone();
        }
        if let Some(language) = &self.language {
            config.stt.source_language = language.clone();
        }
        if let Some(target) = &self.target_lang {
            config.translate.target_lang = target.clone();
        }
        config
    }

    /// Tracing filter directive for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "livesub=warn",
            1 => "livesub=info",
            _ => "livesub=debug",
        }
    }
}
