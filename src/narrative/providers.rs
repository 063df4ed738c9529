//! Text-generation collaborators for the narrative stage

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{NarrativeConfig, RuntimeConfig};
use crate::error::{MbtiError, Result};

/// Accepts a prompt, returns free text. May be slow, may fail.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn name(&self) -> &str;

    /// False for the no-op stand-in; the augmenter skips retries then
    fn is_available(&self) -> bool {
        true
    }
}

/// OpenAI-compatible `/chat/completions` client
pub struct ChatCompletionsGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &NarrativeConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MbtiError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });
        tracing::debug!(
            "Requesting narrative (model={}, prompt_chars={})",
            self.model,
            prompt.len()
        );

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            let snippet: String = body_text.chars().take(300).collect();
            return Err(MbtiError::Collaborator {
                message: format!("provider returned HTTP {}: {}", status.as_u16(), snippet),
            });
        }

        let val: serde_json::Value = resp.json().await?;
        val.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| MbtiError::Collaborator {
                message: "provider response had no message content".into(),
            })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Stand-in used when no provider is configured
pub struct UnavailableGenerator {
    reason: String,
}

impl UnavailableGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for UnavailableGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(MbtiError::Collaborator {
            message: self.reason.clone(),
        })
    }

    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Deterministic generator for tests and offline runs.
///
/// Fails the first `failures` calls, then replays `replies` in order (the
/// last reply repeats).
pub struct ScriptedGenerator {
    failures: Mutex<u32>,
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<u32>,
}

impl ScriptedGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new(0, vec![reply.into()])
    }

    pub fn failing() -> Self {
        Self::new(u32::MAX, Vec::new())
    }

    pub fn new(failures: u32, replies: Vec<String>) -> Self {
        Self {
            failures: Mutex::new(failures),
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(0),
        }
    }

    pub async fn calls(&self) -> u32 {
        *self.calls.lock().await
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        *self.calls.lock().await += 1;
        {
            let mut failures = self.failures.lock().await;
            if *failures > 0 {
                *failures = failures.saturating_sub(1);
                return Err(MbtiError::Collaborator {
                    message: "scripted failure".into(),
                });
            }
        }
        let mut replies = self.replies.lock().await;
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        reply.ok_or_else(|| MbtiError::Collaborator {
            message: "no scripted reply".into(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Pick a generator from configuration.
///
/// Provider selection order:
/// 1) `provider = "none"` disables narrative generation
/// 2) `provider = "openai"` requires an API key
/// 3) otherwise use the chat endpoint when a key is present
/// 4) else fall back to the unavailable stand-in
pub fn create_generator(
    config: &NarrativeConfig,
    runtime: &RuntimeConfig,
) -> Result<Arc<dyn TextGenerator>> {
    let is_placeholder = |s: &str| {
        let t = s.trim();
        t.is_empty()
            || t.contains("${")
            || t.eq_ignore_ascii_case("your-api-key-here")
            || t.eq_ignore_ascii_case("changeme")
    };
    let key = runtime
        .llm_api_key
        .as_deref()
        .filter(|k| !is_placeholder(k))
        .map(str::to_string);

    match config.provider.as_str() {
        "none" | "off" => {
            info!("Narrative generation disabled by configuration");
            Ok(Arc::new(UnavailableGenerator::new(
                "LLM not available - narrative generation is disabled",
            )))
        }
        "openai" => {
            let key = key.ok_or_else(|| MbtiError::Config {
                message: "narrative provider is 'openai' but no API key is set".into(),
            })?;
            info!("Using chat completions for narrative (model={})", config.model);
            Ok(Arc::new(ChatCompletionsGenerator::new(config, key)?))
        }
        _ => match key {
            Some(key) => {
                info!("Using chat completions for narrative (model={})", config.model);
                Ok(Arc::new(ChatCompletionsGenerator::new(config, key)?))
            }
            None => {
                tracing::warn!("No LLM API key configured; narrative will use fallback text");
                Ok(Arc::new(UnavailableGenerator::new(
                    "LLM not available - set OPENAI_API_KEY to enable narrative analysis",
                )))
            }
        },
    }
}
