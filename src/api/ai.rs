use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{auth::parse_language, extract::ValidJson};
use crate::{
    ai::{
        ChatMessage, CompletionRequest, TextAction, TranscriptionRequest, NO_RESPONSE_FALLBACK,
        NO_RESULT_FALLBACK,
    },
    app_state::AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    media::decode_base64,
    models::{non_blank, Language},
};

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub context: Vec<ChatMessage>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    pub audio_base64: Option<String>,
    pub mime_type: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub text: Option<String>,
    pub action: Option<String>,
    pub target_language: Option<String>,
}

fn parse_action(raw: Option<String>) -> AppResult<TextAction> {
    match non_blank(raw).as_deref() {
        None | Some("summarize") => Ok(TextAction::Summarize),
        Some("translate") => Ok(TextAction::Translate),
        Some(_) => Err(AppError::BadRequest(
            "Invalid action or missing target language".to_string(),
        )),
    }
}

/// The requested language, else the caller's saved preference.
async fn reply_language(
    state: &AppState,
    auth: &AuthUser,
    requested: Option<String>,
) -> AppResult<Language> {
    if let Some(language) = parse_language(requested)? {
        return Ok(language);
    }
    Ok(state
        .store
        .find_user(auth.user_id)
        .await?
        .map(|u| u.preferred_language)
        .unwrap_or_default())
}

pub async fn chat_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<ChatRequest>,
) -> AppResult<Json<Value>> {
    let message = non_blank(req.message)
        .ok_or_else(|| AppError::Validation("Message is required".to_string()))?;
    let language = reply_language(&state, &auth, req.language).await?;

    let request = CompletionRequest::chat(language, req.context, &message);
    let response = state
        .assistant
        .complete(request)
        .await?
        .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string());

    Ok(Json(json!({ "response": response })))
}

pub async fn transcribe_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidJson(req): ValidJson<TranscribeRequest>,
) -> AppResult<Json<Value>> {
    let encoded = non_blank(req.audio_base64)
        .ok_or_else(|| AppError::Validation("audioBase64 is required".to_string()))?;

    let request = TranscriptionRequest {
        audio: decode_base64(&encoded)?,
        mime_type: non_blank(req.mime_type).unwrap_or_else(|| DEFAULT_AUDIO_MIME.to_string()),
        language: parse_language(req.language)?,
    };
    tracing::debug!(bytes = request.audio.len(), mime = %request.mime_type, "Transcribing audio");

    let text = state.assistant.transcribe(request).await?;
    Ok(Json(json!({ "text": text })))
}

pub async fn summarize_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidJson(req): ValidJson<SummarizeRequest>,
) -> AppResult<Json<Value>> {
    let text = non_blank(req.text)
        .ok_or_else(|| AppError::Validation("Text is required".to_string()))?;
    let action = parse_action(req.action)?;

    let request = CompletionRequest::text_task(action, &text, req.target_language.as_deref())?;
    let result = state
        .assistant
        .complete(request)
        .await?
        .unwrap_or_else(|| NO_RESULT_FALLBACK.to_string());

    Ok(Json(json!({ "result": result, "action": action })))
}
