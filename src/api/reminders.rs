use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::ValidJson;
use crate::{
    app_state::AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        activity::{parse_date, parse_time},
        non_blank,
        reminder::default_reminder_time,
        NewReminder, Reminder,
    },
};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderRequest {
    #[serde(rename = "type")]
    pub reminder_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub reminder_date: Option<String>,
    pub reminder_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderUpdateRequest {
    pub reminder_id: Option<Uuid>,
    pub is_completed: Option<bool>,
}

impl CreateReminderRequest {
    fn validate(self) -> AppResult<NewReminder> {
        let (Some(reminder_type), Some(title), Some(date)) = (
            non_blank(self.reminder_type),
            non_blank(self.title),
            non_blank(self.reminder_date),
        ) else {
            return Err(AppError::Validation(
                "Type, title, and date are required".to_string(),
            ));
        };

        let reminder_time = match non_blank(self.reminder_time) {
            Some(raw) => parse_time(&raw)?,
            None => default_reminder_time(),
        };

        Ok(NewReminder {
            reminder_type,
            title,
            description: self.description.unwrap_or_default(),
            reminder_date: parse_date(&date)?,
            reminder_time,
        })
    }
}

fn require_id(id: Option<Uuid>) -> AppResult<Uuid> {
    id.ok_or_else(|| AppError::Validation("Reminder ID is required".to_string()))
}

fn reminder_not_found() -> AppError {
    AppError::NotFound("Reminder not found".to_string())
}

pub async fn list_reminders_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Reminder>>> {
    Ok(Json(state.store.list_reminders(auth.user_id).await?))
}

pub async fn create_reminder_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateReminderRequest>,
) -> AppResult<(StatusCode, Json<Reminder>)> {
    let reminder = state.store.create_reminder(auth.user_id, req.validate()?).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn update_reminder_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<ReminderUpdateRequest>,
) -> AppResult<Json<Value>> {
    let id = require_id(req.reminder_id)?;
    let reminder = state
        .store
        .set_reminder_completed(auth.user_id, id, req.is_completed.unwrap_or(false))
        .await?
        .ok_or_else(reminder_not_found)?;

    Ok(Json(json!({ "message": "Reminder updated successfully", "reminder": reminder })))
}

pub async fn delete_reminder_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<ReminderUpdateRequest>,
) -> AppResult<Json<Value>> {
    let id = require_id(req.reminder_id)?;
    if !state.store.delete_reminder(auth.user_id, id).await? {
        return Err(reminder_not_found());
    }
    Ok(Json(json!({ "message": "Reminder deleted successfully" })))
}
