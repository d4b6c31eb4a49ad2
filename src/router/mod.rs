
use chrono::{Datelike, Utc};
use tracing::{debug, warn};

use crate::core::config::AppConfig;
use crate::core::error::ProviderError;
use crate::core::message::{HistoryEntry, Sender};
use crate::providers::{self, BackendState, ChatBackend, SearchBackend};

/// Terms that mark a message as time-sensitive. Kept as a plain list so the
/// classifier stays replaceable without touching the routing control flow.
pub const NEWS_KEYWORDS: &[&str] = &[
    "notícia",
    "notícias",
    "hoje",
    "agora",
    "recente",
    "últimas",
    "o que aconteceu",
    "qual a novidade",
    "aconteceu com",
    "previsão do tempo",
    "cotação",
    "dólar",
    "bolsa de valores",
    "resultado de jogo",
    "quem ganhou",
];

const RELATIVE_TIME_WORDS: &[&str] = &["ontem", "esta semana"];
const INTERROGATIVES: &[&str] = &["quando", "quem", "onde", "qual foi"];
const GREETINGS: &[&str] = &["olá", "oi", "hello", "hi"];

/// Whether a message calls for a live lookup rather than plain conversation.
/// Pure over its inputs; the current year is passed in so the heuristic is
/// testable at any date.
pub fn needs_live_lookup(message: &str, current_year: i32) -> bool {
    let lower = message.to_lowercase();
    if NEWS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return true;
    }
    message.contains('?')
        && (lower.contains(&current_year.to_string())
            || RELATIVE_TIME_WORDS.iter().any(|w| lower.contains(w)))
        && INTERROGATIVES.iter().any(|w| lower.contains(w))
}

/// Decides which backend answers a message and turns every backend outcome
/// into a displayable reply. Never fails: the caller always gets a string.
pub struct Router {
    search: BackendState<Box<dyn SearchBackend>>,
    chat: BackendState<Box<dyn ChatBackend>>,
}

impl Router {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            search: providers::search_backend(config),
            chat: providers::chat_backend(config),
        }
    }

    pub fn new(
        search: BackendState<Box<dyn SearchBackend>>,
        chat: BackendState<Box<dyn ChatBackend>>,
    ) -> Self {
        Self { search, chat }
    }

    /// Produce one reply for `message` given the prior conversation,
    /// oldest first. `history` may already carry the current message at its
    /// tail (the caller persists before routing); it is not resent.
    pub async fn get_response(&self, message: &str, history: &[HistoryEntry]) -> String {
        if let Some(search) = self.search.ready() {
            if needs_live_lookup(message, Utc::now().year()) {
                debug!("routing to search backend");
                let info = match search.lookup(message).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("search backend failed: {e}");
                        search_fallback(&e)
                    }
                };
                return self.contextualize(info, message).await;
            }
        }

        if let Some(chat) = self.chat.ready() {
            debug!("routing to conversational backend");
            let prior = trim_current_message(history, message);
            return match chat.send(prior, message).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("conversational backend failed: {e}");
                    chat_fallback(&e)
                }
            };
        }

        canned_reply(message).to_string()
    }

    /// Blend a search result into the conversational backend, or fall back to
    /// the raw result. The blend call deliberately starts with no history.
    async fn contextualize(&self, info: String, message: &str) -> String {
        let Some(chat) = self.chat.ready() else {
            return info;
        };
        let prompt = format!(
            "Com base na seguinte informação de busca: '{info}'.\n\n\
             Responda à pergunta do usuário: '{message}'"
        );
        match chat.send(&[], &prompt).await {
            Ok(text) => text,
            Err(ProviderError::EmptyReply) => format!(
                "(Informação da busca: {info})\n\n\
                 Não consegui contextualizar com Gemini. Tente perguntar diretamente."
            ),
            Err(e) => {
                warn!("blend call failed: {e}");
                format!(
                    "(Informação da busca: {info})\n\n\
                     Ocorreu um erro ao tentar usar Gemini para contextualizar."
                )
            }
        }
    }
}

/// Drop the trailing history entry when it is the user message being routed,
/// so the backend does not see it twice.
fn trim_current_message<'a>(history: &'a [HistoryEntry], message: &str) -> &'a [HistoryEntry] {
    match history.last() {
        Some(last) if last.sender == Sender::User && last.text == message => {
            &history[..history.len() - 1]
        }
        _ => history,
    }
}

fn search_fallback(err: &ProviderError) -> String {
    match err {
        ProviderError::EmptyReply => "Não consegui obter uma resposta da DeepSeek.".into(),
        ProviderError::MalformedResponse(_) => {
            "Desculpe, ocorreu um erro inesperado ao processar a busca online com DeepSeek."
                .into()
        }
        e => format!(
            "Desculpe, tive um problema ao tentar buscar informações online com DeepSeek: {e}"
        ),
    }
}

fn chat_fallback(err: &ProviderError) -> String {
    match err {
        ProviderError::Blocked { reason, .. } => format!(
            "Minha resposta foi bloqueada pelas políticas de segurança (Razão: {reason}). \
             Por favor, reformule sua pergunta ou tente um tópico diferente."
        ),
        ProviderError::InvalidApiKey(_) => {
            "A chave da API do Gemini parece ser inválida ou está com problemas. \
             Verifique suas configurações."
                .into()
        }
        ProviderError::EmptyReply => "Recebi uma resposta vazia do Gemini.".into(),
        e => format!("Desculpe, tive um problema ao tentar me comunicar com o Gemini: {e}"),
    }
}

fn canned_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if GREETINGS.iter().any(|g| lower.contains(g)) {
        "Olá! Como posso ajudar você hoje? (APIs não configuradas)"
    } else {
        "Desculpe, minhas capacidades de IA não estão configuradas no momento."
    }
}
