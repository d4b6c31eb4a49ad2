mod deepseek;
mod gemini;

pub use deepseek::DeepSeekClient;
pub use gemini::{to_turns, GeminiClient, Part, Turn, TurnRole};

use async_trait::async_trait;
use tracing::warn;

use crate::core::config::AppConfig;
use crate::core::error::ProviderError;
use crate::core::message::HistoryEntry;

/// Availability of one backend, decided once at startup. Keeping this as a
/// sum type keeps null-checks out of the routing logic.
pub enum BackendState<T> {
    /// No API key configured; the branch is disabled for the process lifetime.
    Unconfigured,
    Ready(T),
    /// Configured but the client could not be constructed.
    Failed(String),
}

impl<T> BackendState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            BackendState::Ready(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BackendState::Ready(_))
    }
}

/// Free-text answers to ad-hoc queries, used for time-sensitive lookups.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<String, ProviderError>;
}

/// Session-oriented dialogue: ordered prior turns plus one new message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(
        &self,
        history: &[HistoryEntry],
        message: &str,
    ) -> Result<String, ProviderError>;
}

pub fn search_backend(config: &AppConfig) -> BackendState<Box<dyn SearchBackend>> {
    let Some(key) = config.deepseek_api_key.clone() else {
        warn!("DEEPSEEK_API_KEY not set; live-lookup branch disabled");
        return BackendState::Unconfigured;
    };
    match DeepSeekClient::new(
        key,
        config.deepseek_url.clone(),
        config.search_model.clone(),
        config.search_timeout_secs,
    ) {
        Ok(client) => BackendState::Ready(Box::new(client)),
        Err(e) => {
            warn!("search backend unavailable: {e}");
            BackendState::Failed(e.to_string())
        }
    }
}

pub fn chat_backend(config: &AppConfig) -> BackendState<Box<dyn ChatBackend>> {
    let Some(key) = config.gemini_api_key.clone() else {
        warn!("GEMINI_API_KEY not set; conversational branch disabled");
        return BackendState::Unconfigured;
    };
    match GeminiClient::new(key, config.gemini_url.clone(), config.chat_model.clone()) {
        Ok(client) => BackendState::Ready(Box::new(client)),
        Err(e) => {
            warn!("conversational backend unavailable: {e}");
            BackendState::Failed(e.to_string())
        }
    }
}
