// Assistant proxy: prompt assembly plus the upstream LLM backend

pub mod groq;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Language;

pub use groq::GroqClient;

pub const CHAT_MODEL: &str = "llama-3.1-8b-instant";
pub const TRANSCRIBE_MODEL: &str = "whisper-large-v3";
pub const MAX_CONTEXT_TURNS: usize = 10;
pub const NO_RESPONSE_FALLBACK: &str = "I apologize, but I could not generate a response.";
pub const NO_RESULT_FALLBACK: &str = "Unable to process request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Chat turn: localized system prompt, the last `MAX_CONTEXT_TURNS` of
    /// client-supplied history (system turns dropped), then the new message.
    pub fn chat(language: Language, context: Vec<ChatMessage>, message: &str) -> Self {
        let history: Vec<ChatMessage> = context
            .into_iter()
            .filter(|m| m.role != ChatRole::System)
            .collect();
        let skip = history.len().saturating_sub(MAX_CONTEXT_TURNS);

        let mut messages = Vec::with_capacity(MAX_CONTEXT_TURNS + 2);
        messages.push(ChatMessage::new(ChatRole::System, prompts::system_prompt(language)));
        messages.extend(history.into_iter().skip(skip));
        messages.push(ChatMessage::new(ChatRole::User, message));

        Self {
            messages,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn text_task(action: TextAction, text: &str, target_language: Option<&str>) -> AppResult<Self> {
        let prompt = match (action, target_language) {
            (TextAction::Summarize, _) => prompts::summarize_prompt(text),
            (TextAction::Translate, Some(target)) if !target.trim().is_empty() => {
                prompts::translate_prompt(text, target.trim())
            }
            (TextAction::Translate, _) => {
                return Err(AppError::BadRequest(
                    "Invalid action or missing target language".to_string(),
                ))
            }
        };

        Ok(Self {
            messages: vec![
                ChatMessage::new(ChatRole::System, prompts::SUMMARIZE_SYSTEM_PROMPT),
                ChatMessage::new(ChatRole::User, prompt),
            ],
            temperature: 0.5,
            max_tokens: 512,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAction {
    #[default]
    Summarize,
    Translate,
}

#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio: Vec<u8>,
    pub mime_type: String,
    pub language: Option<Language>,
}

/// Upstream speech and text model provider.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Returns `None` when the provider produced no choices.
    async fn complete(&self, request: CompletionRequest) -> AppResult<Option<String>>;

    async fn transcribe(&self, request: TranscriptionRequest) -> AppResult<String>;
}
