// Persistence layer
//
// Handlers talk to a `Store` trait object. `PostgresStore` is the production
// implementation; `MemoryStore` backs the test suite and local demos.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    AdminStats, CommentView, FarmLog, FarmLogInput, FeedingSchedule, FeedingScheduleInput,
    KnowledgeEntry, KnowledgePatch, NewKnowledgeEntry, NewNotification, NewPost, NewReminder,
    NewUser, Notification, PostDetail, PostPatch, PostSummary, Reminder, User, UserPatch,
};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

pub const DEFAULT_POST_LIMIT: i64 = 20;
pub const MAX_POST_LIMIT: i64 = 50;
pub const KNOWLEDGE_LIST_LIMIT: i64 = 50;
pub const KNOWLEDGE_SEARCH_LIMIT: i64 = 20;
pub const NOTIFICATION_LIMIT: i64 = 50;
/// Categories listed in the admin stats breakdown.
pub const STATS_CATEGORY_LIMIT: i64 = 10;

/// Which posts a listing returns.
#[derive(Debug, Clone, Copy)]
pub struct PostQuery {
    pub approved_only: bool,
    pub limit: Option<i64>,
    /// Admin listings expose the author's email.
    pub with_author_email: bool,
}

impl PostQuery {
    pub fn public(limit: i64) -> Self {
        Self {
            approved_only: true,
            limit: Some(limit),
            with_author_email: false,
        }
    }

    pub fn admin() -> Self {
        Self {
            approved_only: false,
            limit: None,
            with_author_email: true,
        }
    }
}

/// Clamp a requested page size to `1..=MAX_POST_LIMIT`.
pub fn clamp_post_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_POST_LIMIT)
        .clamp(1, MAX_POST_LIMIT)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    // Posts
    async fn list_posts(&self, query: PostQuery) -> AppResult<Vec<PostSummary>>;
    async fn get_post(&self, id: Uuid) -> AppResult<Option<PostDetail>>;
    async fn create_post(&self, post: NewPost) -> AppResult<PostDetail>;
    async fn update_post(&self, id: Uuid, patch: PostPatch) -> AppResult<Option<PostDetail>>;
    /// Flips the caller's like on a post. Returns whether the post is now liked.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> AppResult<bool>;
    async fn add_comment(&self, post_id: Uuid, author_id: Uuid, content: &str)
        -> AppResult<CommentView>;
    async fn set_post_approval(&self, id: Uuid, approved: bool) -> AppResult<bool>;
    async fn delete_post(&self, id: Uuid) -> AppResult<bool>;

    // Knowledge base
    async fn list_knowledge(&self, category: Option<&str>, limit: i64)
        -> AppResult<Vec<KnowledgeEntry>>;
    async fn get_knowledge(&self, id: Uuid) -> AppResult<Option<KnowledgeEntry>>;
    /// Loads an entry and increments its view counter in one step.
    async fn view_knowledge(&self, id: Uuid) -> AppResult<Option<KnowledgeEntry>>;
    async fn search_knowledge(
        &self,
        query: &str,
        category: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<KnowledgeEntry>>;
    async fn create_knowledge(&self, entry: NewKnowledgeEntry) -> AppResult<KnowledgeEntry>;
    async fn update_knowledge(&self, id: Uuid, patch: KnowledgePatch)
        -> AppResult<Option<KnowledgeEntry>>;
    async fn delete_knowledge(&self, id: Uuid) -> AppResult<bool>;

    // Farm activity
    async fn list_feeding_schedules(&self, user_id: Uuid) -> AppResult<Vec<FeedingSchedule>>;
    async fn create_feeding_schedule(
        &self,
        user_id: Uuid,
        input: FeedingScheduleInput,
    ) -> AppResult<FeedingSchedule>;
    /// Most recent logs first.
    async fn list_farm_logs(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<FarmLog>>;
    /// Inserts or replaces the log for `(user_id, input.log_date)`.
    async fn upsert_farm_log(&self, user_id: Uuid, input: FarmLogInput) -> AppResult<FarmLog>;

    // Reminders
    async fn list_reminders(&self, user_id: Uuid) -> AppResult<Vec<Reminder>>;
    async fn create_reminder(&self, user_id: Uuid, reminder: NewReminder) -> AppResult<Reminder>;
    async fn set_reminder_completed(
        &self,
        user_id: Uuid,
        id: Uuid,
        completed: bool,
    ) -> AppResult<Option<Reminder>>;
    async fn delete_reminder(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;

    // Notifications
    async fn create_notification(&self, notification: NewNotification)
        -> AppResult<Notification>;
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;
    async fn unread_notification_count(&self, user_id: Uuid) -> AppResult<i64>;
    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid)
        -> AppResult<Option<Notification>>;
    async fn mark_all_notifications_read(&self, user_id: Uuid) -> AppResult<u64>;

    // Admin
    async fn admin_stats(&self, now: DateTime<Utc>) -> AppResult<AdminStats>;
}
