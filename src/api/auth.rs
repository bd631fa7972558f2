use axum::{extract::State, http::StatusCode, Json};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract::ValidJson;
use crate::{
    app_state::AppState,
    auth::{hash_password, verify_password, AuthUser, MIN_PASSWORD_LEN},
    error::{AppError, AppResult},
    models::{non_blank, Language, NewUser, Role, User},
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub farm_size: Option<String>,
    pub poultry_type: Option<String>,
    pub preferred_language: Option<String>,
    /// Only honoured on the admin create-user route.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes and checks an email address.
pub(super) fn checked_email(raw: &str) -> AppResult<String> {
    let email = normalize_email(raw);
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    Ok(email)
}

pub(super) fn parse_language(raw: Option<String>) -> AppResult<Option<Language>> {
    non_blank(raw)
        .map(|l| l.parse::<Language>())
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))
}

pub(super) fn parse_role(raw: Option<String>) -> AppResult<Option<Role>> {
    non_blank(raw)
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Validates a sign-up payload and stores the account with `role`.
pub(super) async fn create_account(
    state: &AppState,
    req: RegisterRequest,
    role: Role,
) -> AppResult<User> {
    let invalid = || {
        AppError::Validation(format!(
            "Invalid input. Name, email, and password (min {} chars) are required.",
            MIN_PASSWORD_LEN
        ))
    };

    let name = non_blank(req.name).ok_or_else(invalid)?;
    let email = non_blank(req.email).ok_or_else(invalid)?;
    let password = req
        .password
        .filter(|p| p.chars().count() >= MIN_PASSWORD_LEN)
        .ok_or_else(invalid)?;
    let email = checked_email(&email)?;

    let preferred_language = parse_language(req.preferred_language)?.unwrap_or_default();

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let user = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash: hash_password(&password)?,
            farm_size: req.farm_size.unwrap_or_default().trim().to_string(),
            poultry_type: req.poultry_type.unwrap_or_default().trim().to_string(),
            preferred_language,
            role,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "Account created");
    Ok(user)
}

pub async fn register_handler(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user = create_account(&state, req, Role::Farmer).await?;
    let token = state.tokens.issue(user.id)?;

    Ok((StatusCode::CREATED, Json(json!({ "token": token, "user": user }))))
}

pub async fn login_handler(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AppResult<Json<Value>> {
    let (Some(email), Some(password)) = (non_blank(req.email), req.password) else {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    };

    let invalid = || AppError::BadRequest("Invalid credentials".to_string());

    let user = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is inactive".to_string()));
    }

    let token = state.tokens.issue(user.id)?;
    Ok(Json(json!({ "token": token, "user": user })))
}

pub async fn me_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Json(json!({ "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL_RE.is_match("farmer@example.com"));
        assert!(!EMAIL_RE.is_match("farmer@example"));
        assert!(!EMAIL_RE.is_match("farmer example@x.io"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Farm.IO "), "jane@farm.io");
        assert_eq!(checked_email(" Jane@Farm.IO").unwrap(), "jane@farm.io");
        assert!(checked_email("jane").is_err());
    }

    #[test]
    fn test_parse_language_and_role() {
        assert_eq!(parse_language(Some("FR".into())).unwrap(), Some(Language::Fr));
        assert_eq!(parse_language(Some(" ".into())).unwrap(), None);
        assert!(parse_language(Some("xx".into())).is_err());
        assert_eq!(parse_role(Some("admin".into())).unwrap(), Some(Role::Admin));
        assert!(parse_role(Some("owner".into())).is_err());
    }
}
