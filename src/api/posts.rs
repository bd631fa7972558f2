use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{ValidJson, ValidPath, ValidQuery};
use crate::{
    app_state::AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    media::{decode_images, ImageUpload},
    models::{non_blank, NewNotification, NewPost, PostDetail, PostPatch, PostSummary, PostType},
    store::{clamp_post_limit, PostQuery},
};

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub limit: Option<i64>,
    pub id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

/// Either one post (when `?id=` is given) or the approved feed.
#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum PostsResponse {
    One(PostDetail),
    Many(Vec<PostSummary>),
}

pub(super) fn parse_post_type(raw: Option<String>) -> AppResult<Option<PostType>> {
    non_blank(raw)
        .map(|t| t.parse::<PostType>())
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

pub(super) async fn load_post(state: &AppState, id: Uuid) -> AppResult<PostDetail> {
    state.store.get_post(id).await?.ok_or_else(post_not_found)
}

/// Loads a post that regular members may interact with.
async fn load_approved_post(state: &AppState, id: Uuid) -> AppResult<PostDetail> {
    let post = load_post(state, id).await?;
    if !post.is_approved {
        return Err(post_not_found());
    }
    Ok(post)
}

async fn is_active_admin(state: &AppState, user_id: Uuid) -> AppResult<bool> {
    Ok(state
        .store
        .find_user(user_id)
        .await?
        .map(|u| u.is_admin() && u.is_active)
        .unwrap_or(false))
}

/// Notification failures never fail the triggering request.
pub(super) async fn notify(state: &AppState, notification: NewNotification) {
    if let Err(e) = state.store.create_notification(notification).await {
        tracing::warn!("Failed to create notification: {}", e);
    }
}

async fn display_name(state: &AppState, user_id: Uuid) -> String {
    match state.store.find_user(user_id).await {
        Ok(Some(user)) => user.name,
        _ => "Someone".to_string(),
    }
}

pub async fn list_posts_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ListPostsQuery>,
) -> AppResult<Json<PostsResponse>> {
    if let Some(id) = query.id {
        let post = load_approved_post(&state, id).await?;
        return Ok(Json(PostsResponse::One(post)));
    }

    let limit = clamp_post_limit(query.limit);
    let posts = state.store.list_posts(PostQuery::public(limit)).await?;
    Ok(Json(PostsResponse::Many(posts)))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<PostDetail>)> {
    let (Some(title), Some(content)) = (non_blank(req.title), non_blank(req.content)) else {
        return Err(AppError::Validation(
            "Title and content are required".to_string(),
        ));
    };
    let post_type = parse_post_type(req.post_type)?.unwrap_or_default();

    let mut image_urls: Vec<String> = req
        .image_urls
        .into_iter()
        .filter_map(|u| non_blank(Some(u)))
        .collect();

    if !req.images.is_empty() {
        let decoded = decode_images(&req.images)?;
        let uploader = state.media.as_ref().ok_or_else(|| {
            AppError::BadRequest("Image uploads are not configured".to_string())
        })?;
        image_urls.extend(uploader.upload_all(&decoded).await?);
    }

    let post = state
        .store
        .create_post(NewPost {
            author_id: auth.user_id,
            title,
            content,
            post_type,
            is_approved: true,
            image_urls,
        })
        .await?;

    tracing::info!(post_id = %post.id, author_id = %auth.user_id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// Unapproved posts stay readable by their author and by admins only.
pub async fn get_post_handler(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<PostDetail>> {
    let post = load_post(&state, id).await?;
    if post.is_approved {
        return Ok(Json(post));
    }

    let visible = match auth {
        Some(auth) if post.author_id() == Some(auth.user_id) => true,
        Some(auth) => is_active_admin(&state, auth.user_id).await?,
        None => false,
    };
    if !visible {
        return Err(post_not_found());
    }
    Ok(Json(post))
}

pub async fn update_post_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UpdatePostRequest>,
) -> AppResult<Json<PostDetail>> {
    let post = load_post(&state, id).await?;

    if post.author_id() != Some(auth.user_id) && !is_active_admin(&state, auth.user_id).await? {
        return Err(AppError::Forbidden(
            "Only the author or an admin can edit this post".to_string(),
        ));
    }

    let patch = PostPatch {
        title: non_blank(req.title),
        content: non_blank(req.content),
        post_type: parse_post_type(req.post_type)?,
    };
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let updated = state
        .store
        .update_post(id, patch)
        .await?
        .ok_or_else(post_not_found)?;
    Ok(Json(updated))
}

pub async fn toggle_like_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<PostDetail>> {
    let post = load_approved_post(&state, id).await?;
    let liked = state.store.toggle_like(id, auth.user_id).await?;

    if let Some(author_id) = post.author_id().filter(|a| liked && *a != auth.user_id) {
        let liker = display_name(&state, auth.user_id).await;
        notify(
            &state,
            NewNotification::post_liked(author_id, id, &liker, &post.title),
        )
        .await;
    }

    let mut updated = load_post(&state, id).await?;
    updated.liked = Some(liked);
    Ok(Json(updated))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<CommentRequest>,
) -> AppResult<Json<PostDetail>> {
    let content = non_blank(req.content)
        .ok_or_else(|| AppError::Validation("Comment content is required".to_string()))?;

    let post = load_approved_post(&state, id).await?;
    state.store.add_comment(id, auth.user_id, &content).await?;

    if let Some(author_id) = post.author_id().filter(|a| *a != auth.user_id) {
        let commenter = display_name(&state, auth.user_id).await;
        notify(
            &state,
            NewNotification::post_commented(author_id, id, &commenter, &post.title),
        )
        .await;
    }

    Ok(Json(load_post(&state, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_type() {
        assert_eq!(parse_post_type(None).unwrap(), None);
        assert_eq!(parse_post_type(Some("tip".into())).unwrap(), Some(PostType::Tip));
        assert!(parse_post_type(Some("rant".into())).is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(req.image_urls.is_empty());
        assert!(req.images.is_empty());
        assert!(req.post_type.is_none());
    }
}
