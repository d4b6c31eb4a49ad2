use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::error::ConfigError;

/// DeepSeek chat-completions endpoint (search backend).
const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Gemini REST base (conversational backend). The model name and
/// `:generateContent` verb are appended per request.
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the SQLite history file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Overrides `data_dir` resolution entirely when set.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    #[serde(default)]
    pub deepseek_api_key: Option<String>,

    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_deepseek_url")]
    pub deepseek_url: String,

    #[serde(default = "default_gemini_url")]
    pub gemini_url: String,

    #[serde(default = "default_search_model")]
    pub search_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Per-request timeout for the search backend, in seconds.
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dkchat")
}

fn default_deepseek_url() -> String {
    DEEPSEEK_API_URL.into()
}

fn default_gemini_url() -> String {
    GEMINI_API_URL.into()
}

fn default_search_model() -> String {
    "deepseek-chat".into()
}

fn default_chat_model() -> String {
    "gemini-1.5-flash-latest".into()
}

fn default_search_timeout() -> u64 {
    20
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_path: None,
            deepseek_api_key: None,
            gemini_api_key: None,
            deepseek_url: default_deepseek_url(),
            gemini_url: default_gemini_url(),
            search_model: default_search_model(),
            chat_model: default_chat_model(),
            search_timeout_secs: default_search_timeout(),
        }
    }
}

impl AppConfig {
    /// Build a config from the process environment. Missing keys are not an
    /// error here; they disable the corresponding backend downstream.
    pub fn from_env() -> Self {
        Self {
            deepseek_api_key: env_nonempty("DEEPSEEK_API_KEY"),
            gemini_api_key: env_nonempty("GEMINI_API_KEY"),
            ..Default::default()
        }
    }

    /// Resolved path of the SQLite file.
    pub fn database_path(&self) -> PathBuf {
        match &self.db_path {
            Some(p) => p.clone(),
            None => self.data_dir.join("history.db"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "search_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
