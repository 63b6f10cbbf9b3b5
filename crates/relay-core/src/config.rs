use figment::{
    providers::{Env, Serialized},
    value::{Dict, Map, Value},
    Figment, Metadata, Profile, Provider,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RelayError, Result};

/// Prefix for every environment variable the relay reads.
pub const ENV_PREFIX: &str = "RELAY_";
/// Separator between nested keys, e.g. `RELAY_OPENAI__API_KEY`.
pub const ENV_SPLIT: &str = "__";

/// String-typed keys, as `(section, field)`. `Env` parses values, so `007`
/// would arrive as the integer 7; these are re-read verbatim instead.
const STRING_KEYS: &[(&str, &str)] = &[
    ("telegram", "bot_token"),
    ("openai", "api_key"),
    ("openai", "base_url"),
    ("openai", "model"),
    ("proxy", "address"),
    ("proxy", "login"),
    ("proxy", "password"),
    ("history", "system_prompt"),
];

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TURNS: usize = 8;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Top-level config, sourced from `RELAY_*` environment variables at start-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Outbound HTTP proxy for completion requests. `None` connects directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    /// Base URL without trailing slash; `/v1/chat/completions` is appended.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `http://10.0.0.1:3128`.
    pub address: String,
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Histories longer than this lose their two oldest turns on trim.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Instruction seeded as the first turn of every new conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl RelayConfig {
    /// Load config from `RELAY_*` env vars and validate credentials.
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(RelayConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SPLIT))
            .merge(RawStringEnv);
        Self::from_figment(figment)
    }

    /// Extract and validate from an arbitrary figment (tests feed their own providers).
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: RelayConfig = figment
            .extract()
            .map_err(|e| RelayError::Config(e.to_string()))?;
        config.validate()?;
        debug!(
            model = %config.openai.model,
            base_url = %config.openai.base_url,
            proxy = config.proxy.is_some(),
            max_turns = config.history.max_turns,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Reject configs that cannot possibly reach Telegram or the completion API.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(RelayError::MissingCredential {
                name: "RELAY_TELEGRAM__BOT_TOKEN",
            });
        }
        if self.openai.api_key.trim().is_empty() {
            return Err(RelayError::MissingCredential {
                name: "RELAY_OPENAI__API_KEY",
            });
        }
        if self.history.max_turns < 2 {
            return Err(RelayError::Config(format!(
                "history.max_turns must be at least 2 (got {})",
                self.history.max_turns
            )));
        }
        Ok(())
    }
}

/// Emits the `STRING_KEYS` environment variables as unparsed strings.
struct RawStringEnv;

impl RawStringEnv {
    fn var_name(section: &str, field: &str) -> String {
        format!("{ENV_PREFIX}{section}{ENV_SPLIT}{field}").to_uppercase()
    }
}

impl Provider for RawStringEnv {
    fn metadata(&self) -> Metadata {
        Metadata::named("environment variable(s), unparsed strings")
    }

    fn data(&self) -> std::result::Result<Map<Profile, Dict>, figment::Error> {
        let mut root = Dict::new();
        for (section, field) in STRING_KEYS {
            let Some(value) = Env::var(&Self::var_name(section, field)) else {
                continue;
            };
            let entry = root
                .entry(section.to_string())
                .or_insert_with(|| Value::from(Dict::new()));
            if let Value::Dict(_, fields) = entry {
                fields.insert(field.to_string(), Value::from(value));
            }
        }
        Ok(Profile::Default.collect(root))
    }
}
