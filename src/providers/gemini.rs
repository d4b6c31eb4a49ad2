use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ChatBackend;
use crate::core::error::ProviderError;
use crate::core::message::{HistoryEntry, Sender};

/// Role tokens the conversational backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Map internal history onto the backend's turn format, order preserved.
pub fn to_turns(history: &[HistoryEntry]) -> Vec<Turn> {
    history
        .iter()
        .map(|entry| match entry.sender {
            Sender::User => Turn::user(entry.text.clone()),
            Sender::Assistant => Turn::model(entry.text.clone()),
        })
        .collect()
}

/// Session-oriented client for the conversational backend.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Turn>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
    block_reason_message: Option<String>,
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn send(
        &self,
        history: &[HistoryEntry],
        message: &str,
    ) -> Result<String, ProviderError> {
        debug!(model = %self.model, turns = history.len(), "querying conversational backend");

        let mut contents = to_turns(history);
        contents.push(Turn::user(message));

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest { contents })
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if is_api_key_error(status.as_u16(), &message) {
                return Err(ProviderError::InvalidApiKey(message));
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        // An empty candidate list means the reply was withheld by policy.
        if parsed.candidates.is_empty() {
            let (reason, message) = match parsed.prompt_feedback {
                Some(fb) => (
                    fb.block_reason.unwrap_or_else(|| "Não especificado".into()),
                    fb.block_reason_message,
                ),
                None => ("Não especificado".into(), None),
            };
            return Err(ProviderError::Blocked { reason, message });
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::EmptyReply);
        }
        Ok(text)
    }
}

fn is_api_key_error(status: u16, body: &str) -> bool {
    if status == 401 || status == 403 {
        return true;
    }
    let upper = body.to_uppercase();
    status == 400 && (upper.contains("API_KEY") || upper.contains("API KEY"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::HistoryEntry;

    #[test]
    fn maps_roles_in_order() {
        let history = vec![
            HistoryEntry::user("oi"),
            HistoryEntry::assistant("olá!"),
            HistoryEntry::user("tudo bem?"),
        ];
        let turns = to_turns(&history);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Model);
        assert_eq!(turns[2].role, TurnRole::User);
        assert_eq!(turns[2].parts[0].text, "tudo bem?");
    }

    #[test]
    fn turn_wire_format() {
        let turn = Turn::model("resposta");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "model");
        assert_eq!(json["parts"][0]["text"], "resposta");
    }

    #[test]
    fn turn_roles_round_trip() {
        let history = vec![HistoryEntry::user("a"), HistoryEntry::assistant("b")];
        let turns = to_turns(&history);
        let json = serde_json::to_string(&turns).unwrap();
        let back: Vec<Turn> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0].role, TurnRole::User);
        assert_eq!(back[1].role, TurnRole::Model);
        assert_eq!(back[1].parts[0].text, "b");
    }

    #[test]
    fn parses_text_response() {
        let raw = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Olá, "}, {"text": "mundo"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "Olá, mundo");
    }

    #[test]
    fn parses_block_feedback() {
        let raw = r#"{
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY", "blockReasonMessage": "harmful"}
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.candidates.is_empty());
        let fb = parsed.prompt_feedback.unwrap();
        assert_eq!(fb.block_reason.as_deref(), Some("SAFETY"));
        assert_eq!(fb.block_reason_message.as_deref(), Some("harmful"));
    }

    #[test]
    fn api_key_error_detection() {
        assert!(is_api_key_error(401, ""));
        assert!(is_api_key_error(403, "forbidden"));
        assert!(is_api_key_error(400, "API_KEY_INVALID"));
        assert!(!is_api_key_error(400, "bad request"));
        assert!(!is_api_key_error(500, "API_KEY"));
    }
}
