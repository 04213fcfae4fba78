//! Phrase translation over OpenAI-compatible endpoints.

pub mod dispatcher;
pub mod openai;
pub mod translator;

pub use dispatcher::{DispatcherConfig, TranslationDispatcher};
pub use openai::OpenAiTranslator;
pub use translator::{MockTranslator, Translator};
