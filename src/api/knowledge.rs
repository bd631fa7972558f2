use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{ValidJson, ValidPath, ValidQuery};
use crate::{
    app_state::AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{
        knowledge::DEFAULT_CATEGORY, non_blank, KnowledgeEntry, KnowledgePatch,
        NewKnowledgeEntry, StringList,
    },
    store::{KNOWLEDGE_LIST_LIMIT, KNOWLEDGE_SEARCH_LIMIT},
};

#[derive(Debug, Deserialize)]
pub struct ListKnowledgeQuery {
    pub id: Option<Uuid>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

/// Body shared by create and update; update leaves absent fields untouched.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeRequest {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<StringList>,
    pub keywords: Option<StringList>,
    #[serde(rename = "isAIVerified")]
    pub is_ai_verified: Option<bool>,
}

impl KnowledgeRequest {
    pub(super) fn into_new_entry(self, created_by: Uuid) -> AppResult<NewKnowledgeEntry> {
        let (Some(title), Some(content)) = (non_blank(self.title), non_blank(self.content)) else {
            return Err(AppError::Validation(
                "Title and content are required".to_string(),
            ));
        };

        Ok(NewKnowledgeEntry {
            title,
            content,
            category: non_blank(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: self.tags.map(StringList::into_inner).unwrap_or_default(),
            keywords: self.keywords.map(StringList::into_inner).unwrap_or_default(),
            is_ai_verified: self.is_ai_verified.unwrap_or(false),
            created_by: Some(created_by),
        })
    }

    pub(super) fn into_patch(self) -> KnowledgePatch {
        KnowledgePatch {
            title: non_blank(self.title),
            content: non_blank(self.content),
            category: non_blank(self.category),
            tags: self.tags.map(StringList::into_inner),
            keywords: self.keywords.map(StringList::into_inner),
            is_ai_verified: self.is_ai_verified,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum KnowledgeResponse {
    One(KnowledgeEntry),
    Many(Vec<KnowledgeEntry>),
}

pub(super) fn entry_not_found() -> AppError {
    AppError::NotFound("Knowledge entry not found".to_string())
}

pub async fn list_knowledge_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ListKnowledgeQuery>,
) -> AppResult<Json<KnowledgeResponse>> {
    if let Some(id) = query.id {
        let entry = state.store.view_knowledge(id).await?.ok_or_else(entry_not_found)?;
        return Ok(Json(KnowledgeResponse::One(entry)));
    }

    let category = non_blank(query.category);
    let entries = state
        .store
        .list_knowledge(category.as_deref(), KNOWLEDGE_LIST_LIMIT)
        .await?;
    Ok(Json(KnowledgeResponse::Many(entries)))
}

pub async fn get_knowledge_handler(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<KnowledgeEntry>> {
    let entry = state.store.view_knowledge(id).await?.ok_or_else(entry_not_found)?;
    Ok(Json(entry))
}

pub async fn search_knowledge_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> AppResult<Json<Vec<KnowledgeEntry>>> {
    let Some(q) = non_blank(query.q) else {
        return Ok(Json(Vec::new()));
    };
    let category = non_blank(query.category);

    let results = state
        .store
        .search_knowledge(&q, category.as_deref(), KNOWLEDGE_SEARCH_LIMIT)
        .await?;
    tracing::debug!(query = %q, hits = results.len(), "Knowledge search");
    Ok(Json(results))
}

pub async fn create_knowledge_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<KnowledgeRequest>,
) -> AppResult<(StatusCode, Json<KnowledgeEntry>)> {
    let entry = state.store.create_knowledge(req.into_new_entry(admin.id)?).await?;
    tracing::info!(entry_id = %entry.id, admin_id = %admin.id, "Knowledge entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_knowledge_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<KnowledgeRequest>,
) -> AppResult<Json<KnowledgeEntry>> {
    let entry = state
        .store
        .update_knowledge(id, req.into_patch())
        .await?
        .ok_or_else(entry_not_found)?;
    Ok(Json(entry))
}

pub async fn delete_knowledge_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<Value>> {
    if !state.store.delete_knowledge(id).await? {
        return Err(entry_not_found());
    }
    Ok(Json(json!({ "message": "Entry deleted successfully" })))
}
