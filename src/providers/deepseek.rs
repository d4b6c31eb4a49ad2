use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::SearchBackend;
use crate::core::error::ProviderError;

/// System line sent ahead of every lookup query.
const SEARCH_SYSTEM_PROMPT: &str =
    "Você é um assistente prestativo que busca informações atualizadas na web \
     sobre o seguinte tópico.";

/// Chat-completions client used as the live-lookup backend.
pub struct DeepSeekClient {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    timeout_secs: u64,
}

impl DeepSeekClient {
    pub fn new(
        api_key: String,
        url: String,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            url,
            model,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl SearchBackend for DeepSeekClient {
    async fn lookup(&self, query: &str) -> Result<String, ProviderError> {
        debug!(model = %self.model, "querying search backend");

        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: SEARCH_SYSTEM_PROMPT,
                },
                WireMessage {
                    role: "user",
                    content: query,
                },
            ],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ProviderError::EmptyReply)?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = CompletionRequest {
            model: "deepseek-chat",
            messages: vec![
                WireMessage {
                    role: "system",
                    content: "sys",
                },
                WireMessage {
                    role: "user",
                    content: "qual a cotação do dólar?",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "qual a cotação do dólar?");
    }

    #[test]
    fn parses_completion_response() {
        let raw = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "  R$5,20\n"}}
            ]
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        let content = parsed.choices[0]
            .message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .unwrap();
        assert_eq!(content.trim(), "R$5,20");
    }

    #[test]
    fn empty_choices_deserialize() {
        let parsed: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
