use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AssistantBackend, ChatMessage, CompletionRequest, TranscriptionRequest, CHAT_MODEL, TRANSCRIBE_MODEL};
use crate::config::AiConfig;
use crate::error::{AppError, AppResult};

/// OpenAI-compatible Groq endpoint client.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl GroqClient {
    pub fn new(config: &AiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Missing GROQ_API_KEY".to_string()))
    }

    async fn fail(message: &str, response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, "{}", message);
        AppError::Upstream {
            message: message.to_string(),
            body,
        }
    }
}

fn first_choice(response: ChatCompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|content| !content.is_empty())
}

#[async_trait]
impl AssistantBackend for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> AppResult<Option<String>> {
        let api_key = self.api_key()?;

        let body = ChatCompletionBody {
            model: CHAT_MODEL,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: &request.messages,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail("AI request failed", response).await);
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        Ok(first_choice(parsed))
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> AppResult<String> {
        let api_key = self.api_key()?;

        let file = Part::bytes(request.audio)
            .file_name("audio.webm")
            .mime_str(&request.mime_type)
            .map_err(|_| AppError::BadRequest(format!("Invalid mimeType: {}", request.mime_type)))?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", TRANSCRIBE_MODEL);
        if let Some(language) = request.language {
            form = form.text("language", language.as_str());
        }

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail("Transcription failed", response).await);
        }

        let parsed: TranscriptionResponse = response.json().await?;
        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatRole;
    use crate::models::Language;

    fn unconfigured() -> GroqClient {
        GroqClient::new(&AiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/".to_string(),
        })
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let client = unconfigured();
        let err = client
            .complete(CompletionRequest::chat(Language::En, vec![], "hello"))
            .await
            .unwrap_err();
        match err {
            AppError::Configuration(msg) => assert_eq!(msg, "Missing GROQ_API_KEY"),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = client
            .transcribe(TranscriptionRequest {
                audio: vec![1, 2, 3],
                mime_type: "audio/webm".to_string(),
                language: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(unconfigured().base_url, "http://127.0.0.1:9");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::new(ChatRole::User, "hi")];
        let body = ChatCompletionBody {
            model: CHAT_MODEL,
            temperature: 0.5,
            max_tokens: 512,
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_first_choice() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"Use clean litter."}}]}"#)
                .unwrap();
        assert_eq!(first_choice(parsed).as_deref(), Some("Use clean litter."));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_choice(empty).is_none());

        let missing: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(first_choice(missing).is_none());
    }
}
