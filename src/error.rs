//! Error types for livesub.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivesubError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Recognition errors
    #[error("Recognition model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Recognition failed: {message}")]
    Recognition { message: String },

    // Translation errors. `retryable` distinguishes transient transport
    // failures (timeout, 429, 5xx) from terminal ones (auth, bad request).
    #[error("Translation request failed: {message}")]
    Translation { message: String, retryable: bool },

    #[error("Malformed translation response: {message}")]
    TranslationResponse { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LivesubError {
    /// True for errors where retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LivesubError::Translation { retryable: true, .. })
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LivesubError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = LivesubError::ConfigInvalidValue {
            key: "sample_rate".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for sample_rate: must be positive"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = LivesubError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_capture_display() {
        let error = LivesubError::AudioCapture {
            message: "buffer overflow".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: buffer overflow");
    }

    #[test]
    fn test_model_not_found_display() {
        let error = LivesubError::ModelNotFound {
            path: "/models/whisper.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Recognition model not found at /models/whisper.bin"
        );
    }

    #[test]
    fn test_recognition_display() {
        let error = LivesubError::Recognition {
            message: "out of memory".to_string(),
        };
        assert_eq!(error.to_string(), "Recognition failed: out of memory");
    }

    #[test]
    fn test_translation_display() {
        let error = LivesubError::Translation {
            message: "request timed out".to_string(),
            retryable: true,
        };
        assert_eq!(
            error.to_string(),
            "Translation request failed: request timed out"
        );
    }

    #[test]
    fn test_translation_retryable_flag() {
        let transient = LivesubError::Translation {
            message: "503 Service Unavailable".to_string(),
            retryable: true,
        };
        assert!(transient.is_retryable());

        let terminal = LivesubError::Translation {
            message: "401 Unauthorized".to_string(),
            retryable: false,
        };
        assert!(!terminal.is_retryable());

        let malformed = LivesubError::TranslationResponse {
            message: "missing choices".to_string(),
        };
        assert!(!malformed.is_retryable());
    }

    #[test]
    fn test_translation_response_display() {
        let error = LivesubError::TranslationResponse {
            message: "missing choices".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed translation response: missing choices"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: LivesubError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: LivesubError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);

        fn returns_error() -> Result<i32> {
            Err(LivesubError::Recognition {
                message: "test error".to_string(),
            })
        }
        assert!(returns_error().is_err());
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: LivesubError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LivesubError>();
        assert_sync::<LivesubError>();
    }

    #[test]
    fn test_error_debug_format() {
        let error = LivesubError::ModelNotFound {
            path: "/test/path".to_string(),
        };
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("ModelNotFound"));
        assert!(debug_str.contains("/test/path"));
    }
}
