use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::questions::QuestionnaireLength;

/// Main configuration structure loaded from mbti_flow.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub questionnaire: QuestionnaireConfig,
    pub narrative: NarrativeConfig,
    pub output: OutputConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuestionnaireConfig {
    /// 20, 40 or 60; anything else reads as 20
    pub default_length: i64,
}

impl Default for QuestionnaireConfig {
    fn default() -> Self {
        Self { default_length: 20 }
    }
}

impl QuestionnaireConfig {
    pub fn length(&self) -> QuestionnaireLength {
        QuestionnaireLength::from_len_or_default(self.default_length)
    }
}

/// Narrative collaborator settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// "openai", "none", or empty for auto-detect
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_attempts: 3,
            retry_delay_ms: 500,
            temperature: 0.7,
            max_tokens: 2000,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where reports and exports land; OS temp dir when unset
    pub dir: Option<PathBuf>,
}

impl OutputConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

/// Runtime configuration from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub llm_api_key: Option<String>,
    pub log_level: String,
    pub mcp_no_log: bool,
    pub transport: Transport,
    pub http_bind: SocketAddr,
    pub http_path: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            log_level: "mbti_flow=info,rmcp=info".to_string(),
            mcp_no_log: false,
            transport: Transport::Stdio,
            http_bind: SocketAddr::from(([127, 0, 0, 1], 7860)),
            http_path: "/mcp".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses MBTI_FLOW_CONFIG environment variable or defaults to "mbti_flow.toml"
    pub fn load() -> anyhow::Result<Self> {
        // 1) MBTI_ENV_FILE if set
        // 2) ./.env
        if let Ok(env_path) = std::env::var("MBTI_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path =
            std::env::var("MBTI_FLOW_CONFIG").unwrap_or_else(|_| "mbti_flow.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.runtime = RuntimeConfig::load_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Env-first overrides for file-backed settings
    pub fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(len) = env("MBTI_DEFAULT_LENGTH").and_then(|v| v.parse::<i64>().ok()) {
            self.questionnaire.default_length = len;
        }
        if let Some(provider) = env("MBTI_LLM_PROVIDER") {
            self.narrative.provider = provider.trim().to_lowercase();
        }
        if let Some(model) = env("MBTI_LLM_MODEL") {
            self.narrative.model = model;
        }
        if let Some(base) = env("MBTI_LLM_BASE_URL") {
            self.narrative.base_url = base;
        }
        if let Some(attempts) = env("MBTI_LLM_MAX_ATTEMPTS").and_then(|v| v.parse::<u32>().ok()) {
            self.narrative.max_attempts = attempts;
        }
        if let Some(dir) = env("MBTI_OUTPUT_DIR").filter(|d| !d.trim().is_empty()) {
            self.output.dir = Some(PathBuf::from(dir));
        }

        let clamped = self.narrative.max_attempts.clamp(1, 10);
        if clamped != self.narrative.max_attempts {
            tracing::warn!(
                "narrative.max_attempts={} out of range, using {}",
                self.narrative.max_attempts,
                clamped
            );
            self.narrative.max_attempts = clamped;
        }
    }
}

impl RuntimeConfig {
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut http_bind = env("MBTI_HTTP_BIND")
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or(defaults.http_bind);
        if let Some(port) = env("PORT").and_then(|v| v.parse::<u16>().ok()) {
            http_bind.set_port(port);
        }

        Self {
            llm_api_key: env("MBTI_LLM_API_KEY").or_else(|| env("OPENAI_API_KEY")),
            log_level: env("RUST_LOG").unwrap_or(defaults.log_level),
            mcp_no_log: env("MCP_NO_LOG").is_some_and(|v| v == "true" || v == "1"),
            transport: match env("MBTI_TRANSPORT").as_deref().map(str::trim) {
                Some(t) if t.eq_ignore_ascii_case("http") => Transport::Http,
                _ => Transport::Stdio,
            },
            http_bind,
            http_path: env("MBTI_HTTP_PATH")
                .filter(|p| p.starts_with('/'))
                .unwrap_or(defaults.http_path),
        }
    }
}
