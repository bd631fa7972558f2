use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{auth::parse_language, extract::ValidJson};
use crate::{
    app_state::AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::UserPatch,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub farm_size: Option<String>,
    pub poultry_type: Option<String>,
    pub preferred_language: Option<String>,
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": user })))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<ProfileUpdate>,
) -> AppResult<Json<Value>> {
    let name = match req.name {
        Some(name) if name.trim().is_empty() => {
            return Err(AppError::Validation("Name cannot be empty".to_string()))
        }
        other => other.map(|n| n.trim().to_string()),
    };

    let patch = UserPatch {
        name,
        farm_size: req.farm_size.map(|s| s.trim().to_string()),
        poultry_type: req.poultry_type.map(|s| s.trim().to_string()),
        preferred_language: parse_language(req.preferred_language)?,
        ..Default::default()
    };

    let user = state
        .store
        .update_user(auth.user_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": user })))
}
