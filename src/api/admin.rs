use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{
    auth::{checked_email, create_account, parse_language, parse_role, RegisterRequest},
    extract::{ValidJson, ValidPath},
    knowledge::{entry_not_found, KnowledgeRequest},
    posts::{load_post, parse_post_type},
};
use crate::{
    app_state::AppState,
    auth::{hash_password, AdminUser, MIN_PASSWORD_LEN},
    error::{AppError, AppResult},
    models::{
        non_blank, AdminStats, KnowledgeEntry, NewPost, PostDetail, PostSummary, PostType, User,
        UserPatch,
    },
    store::PostQuery,
};

/// Admin knowledge listing is not paged.
const ADMIN_KNOWLEDGE_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub farm_size: Option<String>,
    pub poultry_type: Option<String>,
    pub preferred_language: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl UserUpdateRequest {
    fn into_patch(self) -> AppResult<UserPatch> {
        let password_hash = match non_blank(self.password) {
            Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
                return Err(AppError::Validation(format!(
                    "Password must be at least {} characters",
                    MIN_PASSWORD_LEN
                )))
            }
            Some(p) => Some(hash_password(&p)?),
            None => None,
        };

        Ok(UserPatch {
            name: non_blank(self.name),
            email: non_blank(self.email).map(|e| checked_email(&e)).transpose()?,
            password_hash,
            farm_size: self.farm_size.map(|s| s.trim().to_string()),
            poultry_type: self.poultry_type.map(|s| s.trim().to_string()),
            preferred_language: parse_language(self.preferred_language)?,
            role: parse_role(self.role)?,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub post_id: Option<Uuid>,
    pub is_approved: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub author_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct KnowledgeIdRequest {
    pub id: Option<Uuid>,
}

fn require_user_id(id: Option<Uuid>) -> AppResult<Uuid> {
    id.ok_or_else(|| AppError::Validation("User ID is required".to_string()))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

// Users

pub async fn list_users_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(mut req): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let role = parse_role(req.role.take())?.unwrap_or_default();
    let user = create_account(&state, req, role).await?;
    tracing::info!(admin_id = %admin.id, user_id = %user.id, "Admin created user");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn apply_user_update(
    state: &AppState,
    admin: &User,
    id: Uuid,
    req: UserUpdateRequest,
) -> AppResult<Json<User>> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot modify your own account from the admin panel".to_string(),
        ));
    }

    let patch = req.into_patch()?;
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let user = state.store.update_user(id, patch).await?.ok_or_else(user_not_found)?;
    tracing::info!(admin_id = %admin.id, user_id = %id, "Admin updated user");
    Ok(Json(user))
}

async fn remove_user(state: &AppState, admin: &User, id: Uuid) -> AppResult<Json<Value>> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    if !state.store.delete_user(id).await? {
        return Err(user_not_found());
    }
    tracing::info!(admin_id = %admin.id, user_id = %id, "Admin deleted user");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    apply_user_update(&state, &admin, id, req).await
}

pub async fn update_user_by_body_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    let id = require_user_id(req.user_id)?;
    apply_user_update(&state, &admin, id, req).await
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<Value>> {
    remove_user(&state, &admin, id).await
}

pub async fn delete_user_by_body_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<UserIdRequest>,
) -> AppResult<Json<Value>> {
    let id = require_user_id(req.user_id)?;
    remove_user(&state, &admin, id).await
}

// Posts

pub async fn list_posts_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<PostSummary>>> {
    Ok(Json(state.store.list_posts(PostQuery::admin()).await?))
}

async fn set_approval(state: &AppState, id: Uuid, approved: bool) -> AppResult<Json<Value>> {
    if !state.store.set_post_approval(id, approved).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    let post = load_post(state, id).await?;

    let author_email = match post.author_id() {
        Some(author_id) => state.store.find_user(author_id).await?.map(|u| u.email),
        None => None,
    };

    tracing::info!(post_id = %id, approved, "Post moderation updated");
    Ok(Json(json!({
        "id": post.id,
        "title": post.title,
        "isApproved": post.is_approved,
        "author": { "name": post.author.name, "email": author_email },
    })))
}

pub async fn approve_post_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<ApprovalRequest>,
) -> AppResult<Json<Value>> {
    set_approval(&state, id, req.is_approved.unwrap_or(true)).await
}

pub async fn approve_post_by_body_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidJson(req): ValidJson<ApprovalRequest>,
) -> AppResult<Json<Value>> {
    let id = req
        .post_id
        .ok_or_else(|| AppError::Validation("Post ID is required".to_string()))?;
    set_approval(&state, id, req.is_approved.unwrap_or(true)).await
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<Value>> {
    if !state.store.delete_post(id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    tracing::info!(admin_id = %admin.id, post_id = %id, "Admin deleted post");
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<AdminPostRequest>,
) -> AppResult<(StatusCode, Json<PostDetail>)> {
    let (Some(title), Some(content)) = (non_blank(req.title), non_blank(req.content)) else {
        return Err(AppError::Validation(
            "Title and content are required".to_string(),
        ));
    };
    let post_type = parse_post_type(req.post_type)?.unwrap_or(PostType::Tip);

    let author_id = match req.author_id {
        Some(id) if id != admin.id => {
            state
                .store
                .find_user(id)
                .await?
                .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?
                .id
        }
        _ => admin.id,
    };

    let post = state
        .store
        .create_post(NewPost {
            author_id,
            title,
            content,
            post_type,
            is_approved: true,
            image_urls: Vec::new(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

// Knowledge base

pub async fn list_knowledge_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<KnowledgeEntry>>> {
    Ok(Json(state.store.list_knowledge(None, ADMIN_KNOWLEDGE_LIMIT).await?))
}

pub async fn update_knowledge_by_body_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidJson(req): ValidJson<KnowledgeRequest>,
) -> AppResult<Json<KnowledgeEntry>> {
    let complete = non_blank(req.title.clone()).is_some() && non_blank(req.content.clone()).is_some();
    let Some(id) = req.id.filter(|_| complete) else {
        return Err(AppError::Validation(
            "ID, title, and content are required".to_string(),
        ));
    };

    let entry = state
        .store
        .update_knowledge(id, req.into_patch())
        .await?
        .ok_or_else(entry_not_found)?;
    Ok(Json(entry))
}

pub async fn delete_knowledge_by_body_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidJson(req): ValidJson<KnowledgeIdRequest>,
) -> AppResult<Json<Value>> {
    let id = req
        .id
        .ok_or_else(|| AppError::Validation("ID is required".to_string()))?;
    if !state.store.delete_knowledge(id).await? {
        return Err(entry_not_found());
    }
    Ok(Json(json!({ "message": "Entry deleted successfully" })))
}

// Stats

pub async fn stats_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<AdminStats>> {
    Ok(Json(state.store.admin_stats(Utc::now()).await?))
}
