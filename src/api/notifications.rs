use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{ValidPath, ValidQuery};
use crate::{
    app_state::AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::Notification,
    store::NOTIFICATION_LIMIT,
};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidQuery(query): ValidQuery<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .store
        .list_notifications(auth.user_id, query.unread_only, NOTIFICATION_LIMIT)
        .await?;
    Ok(Json(notifications))
}

pub async fn unread_count_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Value>> {
    let count = state.store.unread_notification_count(auth.user_id).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn mark_read_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<Notification>> {
    let notification = state
        .store
        .mark_notification_read(auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok(Json(notification))
}

pub async fn mark_all_read_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Value>> {
    let updated = state.store.mark_all_notifications_read(auth.user_id).await?;
    tracing::debug!(user_id = %auth.user_id, updated, "Notifications marked read");
    Ok(Json(json!({ "message": "All notifications marked as read" })))
}
