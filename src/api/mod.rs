// HTTP surface: every route lives under /api

mod activity;
mod admin;
mod ai;
mod auth;
pub mod extract;
mod health;
mod knowledge;
mod notifications;
mod posts;
mod reminders;
mod users;

use axum::{
    extract::OriginalUri,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{app_state::AppState, error::AppError};

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/users/profile",
            get(users::get_profile_handler).put(users::update_profile_handler),
        )
        // Community posts
        .route(
            "/posts",
            get(posts::list_posts_handler).post(posts::create_post_handler),
        )
        .route(
            "/posts/{id}",
            get(posts::get_post_handler).put(posts::update_post_handler),
        )
        .route("/posts/{id}/like", post(posts::toggle_like_handler))
        .route("/posts/{id}/comment", post(posts::add_comment_handler))
        // Knowledge base
        .route(
            "/knowledge",
            get(knowledge::list_knowledge_handler).post(knowledge::create_knowledge_handler),
        )
        .route("/knowledge/search", get(knowledge::search_knowledge_handler))
        .route(
            "/knowledge/{id}",
            get(knowledge::get_knowledge_handler)
                .put(knowledge::update_knowledge_handler)
                .delete(knowledge::delete_knowledge_handler),
        )
        // Farm activity
        .route(
            "/activity",
            get(activity::get_activity_handler).post(activity::create_activity_handler),
        )
        .route(
            "/reminders",
            get(reminders::list_reminders_handler).post(reminders::create_reminder_handler),
        )
        .route(
            "/reminders/update",
            put(reminders::update_reminder_handler).delete(reminders::delete_reminder_handler),
        )
        .route("/notifications", get(notifications::list_notifications_handler))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count_handler),
        )
        .route("/notifications/read-all", put(notifications::mark_all_read_handler))
        .route("/notifications/{id}/read", put(notifications::mark_read_handler))
        // Admin panel
        .route(
            "/admin/users",
            get(admin::list_users_handler)
                .post(admin::create_user_handler)
                .put(admin::update_user_by_body_handler)
                .delete(admin::delete_user_by_body_handler),
        )
        .route(
            "/admin/users/{id}",
            put(admin::update_user_handler).delete(admin::delete_user_handler),
        )
        .route("/admin/posts", get(admin::list_posts_handler))
        .route("/admin/posts/approve", put(admin::approve_post_by_body_handler))
        .route("/admin/posts/create", post(admin::create_post_handler))
        .route("/admin/posts/{id}", delete(admin::delete_post_handler))
        .route("/admin/posts/{id}/approve", put(admin::approve_post_handler))
        .route(
            "/admin/knowledge",
            get(admin::list_knowledge_handler).post(knowledge::create_knowledge_handler),
        )
        .route(
            "/admin/knowledge/update",
            put(admin::update_knowledge_by_body_handler)
                .delete(admin::delete_knowledge_by_body_handler),
        )
        .route("/admin/stats", get(admin::stats_handler))
        // Assistant
        .route("/ai/chat", post(ai::chat_handler))
        .route("/ai/transcribe", post(ai::transcribe_handler))
        .route("/ai/summarize", post(ai::summarize_handler))
        .method_not_allowed_fallback(method_not_allowed_handler);

    Router::new()
        .nest("/api", api)
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found_handler(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("Route not found: {}", uri.path()), "status": 404 })),
    )
}

async fn method_not_allowed_handler() -> AppError {
    AppError::MethodNotAllowed
}
