//! Translation over the OpenAI chat-completions API.
//!
//! Works against the public endpoint or any OpenAI-compatible local
//! server (Ollama, llama.cpp, LM Studio) via `base_url`. Local servers
//! usually ignore authentication, so a placeholder key is sent when
//! none is configured and a custom base URL is set.

use crate::config::TranslateConfig;
use crate::defaults;
use crate::error::{LivesubError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

use super::translator::Translator;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DUMMY_API_KEY: &str = "not-needed";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Translator backed by an OpenAI-compatible chat endpoint.
pub struct OpenAiTranslator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    /// Last successfully translated (source, translation) pair, fed
    /// back into the next request so consecutive phrases translate
    /// coherently.
    context: Mutex<Option<(String, String)>>,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None if config.base_url.is_some() => DUMMY_API_KEY.to_string(),
            None => {
                return Err(LivesubError::ConfigInvalidValue {
                    key: "translate.api_key".to_string(),
                    message: "required unless translate.base_url points at a local server"
                        .to_string(),
                });
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::TRANSLATE_TIMEOUT_SECS))
            .build()
            .map_err(|e| LivesubError::Translation {
                message: format!("failed to build HTTP client: {}", e),
                retryable: false,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            context: Mutex::new(None),
        })
    }

    fn build_messages(&self, text: &str, target_lang: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: format!(
                "You are a translation engine. Translate everything the user says \
                 into {}. Output only the translation, nothing else.",
                target_lang
            ),
        }];

        if let Some((source, translation)) = self
            .context
            .lock()
            .expect("context lock poisoned")
            .clone()
        {
            messages.push(ChatMessage {
                role: "user".to_string(),
                content: source,
            });
            messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: translation,
            });
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: text.to_string(),
        });
        messages
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: self.build_messages(text, target_lang),
            temperature: defaults::TRANSLATE_TEMPERATURE,
            max_tokens: defaults::TRANSLATE_MAX_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LivesubError::Translation {
                message: format!("request failed: {}", e),
                retryable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LivesubError::Translation {
                message: format!("API returned {}: {}", status, body),
                retryable: status.as_u16() == 429 || status.is_server_error(),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| LivesubError::TranslationResponse {
                    message: format!("malformed response body: {}", e),
                })?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| LivesubError::TranslationResponse {
                message: "response contained no choices".to_string(),
            })?;

        let translation = strip_reasoning(content).trim().to_string();
        if translation.is_empty() {
            return Err(LivesubError::TranslationResponse {
                message: "response contained no translation text".to_string(),
            });
        }

        *self.context.lock().expect("context lock poisoned") =
            Some((text.to_string(), translation.clone()));

        Ok(translation)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Drops `<think>...</think>` blocks, keeping the surrounding text.
///
/// Reasoning models wrap their chain of thought in think tags before
/// the actual answer; only the text after the closing tag is wanted.
fn strip_reasoning(content: &str) -> String {
    let mut out = String::new();
    let mut rest = content;
    while let Some(start) = rest.find("<think>") {
        let Some(end) = rest[start..].find("</think>") else {
            // unterminated tag left alone
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start + end + "</think>".len()..];
    }
    out.push_str(rest);
    out
}
