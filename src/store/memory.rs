use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostQuery, Store, STATS_CATEGORY_LIMIT};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminStats, AuthorRef, CategoryCount, CommentView, FarmLog, FarmLogInput, FeedingSchedule,
    FeedingScheduleInput, KnowledgeEntry, KnowledgePatch, NewKnowledgeEntry, NewNotification,
    NewPost, NewReminder, NewUser, Notification, PostDetail, PostPatch, PostSummary, PostType,
    Reminder, RoleCount, StatsBreakdown, StatsOverview, TypeCount, User, UserPatch,
};

#[derive(Debug, Clone)]
struct PostRow {
    id: Uuid,
    author_id: Option<Uuid>,
    title: String,
    content: String,
    post_type: PostType,
    is_approved: bool,
    created_at: DateTime<Utc>,
    images: Vec<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Option<Uuid>,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LikeRow {
    post_id: Uuid,
    user_id: Uuid,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<PostRow>,
    comments: Vec<CommentRow>,
    likes: Vec<LikeRow>,
    knowledge: Vec<KnowledgeEntry>,
    feeding_schedules: Vec<FeedingSchedule>,
    farm_logs: Vec<FarmLog>,
    reminders: Vec<Reminder>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn author_ref(&self, author_id: Option<Uuid>, with_email: bool) -> AuthorRef {
        match author_id.and_then(|id| self.users.iter().find(|u| u.id == id)) {
            Some(user) => AuthorRef {
                id: Some(user.id),
                name: Some(user.name.clone()),
                email: with_email.then(|| user.email.clone()),
            },
            None => AuthorRef::default(),
        }
    }

    fn post_detail(&self, post: &PostRow) -> PostDetail {
        let mut comments: Vec<&CommentRow> =
            self.comments.iter().filter(|c| c.post_id == post.id).collect();
        comments.sort_by_key(|c| c.created_at);

        PostDetail {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            post_type: post.post_type,
            is_approved: post.is_approved,
            created_at: post.created_at,
            author: self.author_ref(post.author_id, false),
            likes: self
                .likes
                .iter()
                .filter(|l| l.post_id == post.id)
                .map(|l| l.user_id)
                .collect(),
            comments: comments
                .into_iter()
                .map(|c| self.comment_view(c))
                .collect(),
            images: post.images.clone(),
            liked: None,
        }
    }

    fn comment_view(&self, comment: &CommentRow) -> CommentView {
        CommentView {
            id: comment.id,
            content: comment.content.clone(),
            author: self.author_ref(comment.author_id, false),
            created_at: comment.created_at,
        }
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// Newest first; rows inserted later win ties on identical timestamps.
fn newest_first<T, F>(rows: &[T], created_at: F) -> Vec<&T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut out: Vec<&T> = rows.iter().rev().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

fn counts_by<I>(keys: I) -> Vec<(String, i64)>
where
    I: Iterator<Item = String>,
{
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut counts: Vec<(String, i64)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn limit(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// In-process store behind a single `RwLock`. Mirrors the constraints of the
/// Postgres schema (unique emails, one farm log per user per day, one like
/// per user per post, cascading deletes).
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            farm_size: user.farm_size,
            poultry_type: user.poultry_type,
            preferred_language: user.preferred_language,
            role: user.role,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.users, |u| u.created_at)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &patch.email {
            if tables.email_taken(email, Some(id)) {
                return Err(AppError::BadRequest("User already exists".to_string()));
            }
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        patch.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        for post in tables.posts.iter_mut().filter(|p| p.author_id == Some(id)) {
            post.author_id = None;
        }
        for comment in tables.comments.iter_mut().filter(|c| c.author_id == Some(id)) {
            comment.author_id = None;
        }
        for entry in tables.knowledge.iter_mut().filter(|k| k.created_by == Some(id)) {
            entry.created_by = None;
        }
        tables.likes.retain(|l| l.user_id != id);
        tables.feeding_schedules.retain(|f| f.user_id != id);
        tables.farm_logs.retain(|f| f.user_id != id);
        tables.reminders.retain(|r| r.user_id != id);
        tables.notifications.retain(|n| n.user_id != id);
        Ok(true)
    }

    async fn list_posts(&self, query: PostQuery) -> AppResult<Vec<PostSummary>> {
        let tables = self.tables.read().await;
        let take = query.limit.map(limit).unwrap_or(usize::MAX);

        Ok(newest_first(&tables.posts, |p| p.created_at)
            .into_iter()
            .filter(|p| !query.approved_only || p.is_approved)
            .take(take)
            .map(|p| PostSummary {
                id: p.id,
                title: p.title.clone(),
                content: p.content.clone(),
                post_type: p.post_type,
                is_approved: p.is_approved,
                created_at: p.created_at,
                author: tables.author_ref(p.author_id, query.with_author_email),
                like_count: tables.likes.iter().filter(|l| l.post_id == p.id).count() as i64,
                comment_count: tables.comments.iter().filter(|c| c.post_id == p.id).count()
                    as i64,
            })
            .collect())
    }

    async fn get_post(&self, id: Uuid) -> AppResult<Option<PostDetail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.post_detail(p)))
    }

    async fn create_post(&self, post: NewPost) -> AppResult<PostDetail> {
        let mut tables = self.tables.write().await;
        let row = PostRow {
            id: Uuid::new_v4(),
            author_id: Some(post.author_id),
            title: post.title,
            content: post.content,
            post_type: post.post_type,
            is_approved: post.is_approved,
            created_at: Utc::now(),
            images: post.image_urls,
        };
        let detail = tables.post_detail(&row);
        tables.posts.push(row);
        Ok(detail)
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> AppResult<Option<PostDetail>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(post_type) = patch.post_type {
            post.post_type = post_type;
        }
        let post = post.clone();
        Ok(Some(tables.post_detail(&post)))
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        let before = tables.likes.len();
        tables
            .likes
            .retain(|l| !(l.post_id == post_id && l.user_id == user_id));
        if tables.likes.len() < before {
            return Ok(false);
        }
        tables.likes.push(LikeRow { post_id, user_id });
        Ok(true)
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> AppResult<CommentView> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        let comment = CommentRow {
            id: Uuid::new_v4(),
            post_id,
            author_id: Some(author_id),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let view = tables.comment_view(&comment);
        tables.comments.push(comment);
        Ok(view)
    }

    async fn set_post_approval(&self, id: Uuid, approved: bool) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                post.is_approved = approved;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }
        tables.comments.retain(|c| c.post_id != id);
        tables.likes.retain(|l| l.post_id != id);
        Ok(true)
    }

    async fn list_knowledge(
        &self,
        category: Option<&str>,
        limit_to: i64,
    ) -> AppResult<Vec<KnowledgeEntry>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.knowledge, |k| k.created_at)
            .into_iter()
            .filter(|k| category.map_or(true, |c| k.category == c))
            .take(limit(limit_to))
            .cloned()
            .collect())
    }

    async fn get_knowledge(&self, id: Uuid) -> AppResult<Option<KnowledgeEntry>> {
        let tables = self.tables.read().await;
        Ok(tables.knowledge.iter().find(|k| k.id == id).cloned())
    }

    async fn view_knowledge(&self, id: Uuid) -> AppResult<Option<KnowledgeEntry>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .knowledge
            .iter_mut()
            .find(|k| k.id == id)
            .map(|entry| {
                entry.views += 1;
                entry.clone()
            }))
    }

    async fn search_knowledge(
        &self,
        query: &str,
        category: Option<&str>,
        limit_to: i64,
    ) -> AppResult<Vec<KnowledgeEntry>> {
        let tables = self.tables.read().await;
        let needle = query.to_lowercase();

        let mut hits: Vec<(u8, &KnowledgeEntry)> = newest_first(&tables.knowledge, |k| k.created_at)
            .into_iter()
            .filter(|k| category.map_or(true, |c| k.category == c))
            .filter_map(|k| k.match_rank(&needle).map(|rank| (rank, k)))
            .collect();
        hits.sort_by_key(|(rank, _)| *rank);

        Ok(hits
            .into_iter()
            .take(limit(limit_to))
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn create_knowledge(&self, entry: NewKnowledgeEntry) -> AppResult<KnowledgeEntry> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let entry = KnowledgeEntry {
            id: Uuid::new_v4(),
            title: entry.title,
            content: entry.content,
            category: entry.category,
            tags: entry.tags,
            keywords: entry.keywords,
            is_ai_verified: entry.is_ai_verified,
            views: 0,
            created_by: entry.created_by,
            created_at: now,
            updated_at: now,
        };
        tables.knowledge.push(entry.clone());
        Ok(entry)
    }

    async fn update_knowledge(
        &self,
        id: Uuid,
        patch: KnowledgePatch,
    ) -> AppResult<Option<KnowledgeEntry>> {
        let mut tables = self.tables.write().await;
        let Some(entry) = tables.knowledge.iter_mut().find(|k| k.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            entry.title = title;
        }
        if let Some(content) = patch.content {
            entry.content = content;
        }
        if let Some(category) = patch.category {
            entry.category = category;
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }
        if let Some(keywords) = patch.keywords {
            entry.keywords = keywords;
        }
        if let Some(verified) = patch.is_ai_verified {
            entry.is_ai_verified = verified;
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete_knowledge(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.knowledge.len();
        tables.knowledge.retain(|k| k.id != id);
        Ok(tables.knowledge.len() < before)
    }

    async fn list_feeding_schedules(&self, user_id: Uuid) -> AppResult<Vec<FeedingSchedule>> {
        let tables = self.tables.read().await;
        let mut schedules: Vec<FeedingSchedule> = tables
            .feeding_schedules
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        schedules.sort_by_key(|f| f.time_of_day);
        Ok(schedules)
    }

    async fn create_feeding_schedule(
        &self,
        user_id: Uuid,
        input: FeedingScheduleInput,
    ) -> AppResult<FeedingSchedule> {
        let mut tables = self.tables.write().await;
        let schedule = FeedingSchedule {
            id: Uuid::new_v4(),
            user_id,
            time_of_day: input.time_of_day,
            feed_type: input.feed_type,
            ration_grams: input.ration_grams,
            notes: input.notes,
        };
        tables.feeding_schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn list_farm_logs(&self, user_id: Uuid, limit_to: i64) -> AppResult<Vec<FarmLog>> {
        let tables = self.tables.read().await;
        let mut logs: Vec<FarmLog> = tables
            .farm_logs
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.log_date.cmp(&a.log_date));
        logs.truncate(limit(limit_to));
        Ok(logs)
    }

    async fn upsert_farm_log(&self, user_id: Uuid, input: FarmLogInput) -> AppResult<FarmLog> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(log) = tables
            .farm_logs
            .iter_mut()
            .find(|f| f.user_id == user_id && f.log_date == input.log_date)
        {
            log.num_birds = input.num_birds;
            log.feed_type = input.feed_type;
            log.daily_feed_kg = input.daily_feed_kg;
            log.mortality = input.mortality;
            log.notes = input.notes;
            log.updated_at = now;
            return Ok(log.clone());
        }

        let log = FarmLog {
            id: Uuid::new_v4(),
            user_id,
            log_date: input.log_date,
            num_birds: input.num_birds,
            feed_type: input.feed_type,
            daily_feed_kg: input.daily_feed_kg,
            mortality: input.mortality,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        tables.farm_logs.push(log.clone());
        Ok(log)
    }

    async fn list_reminders(&self, user_id: Uuid) -> AppResult<Vec<Reminder>> {
        let tables = self.tables.read().await;
        let mut reminders: Vec<Reminder> = tables
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| (r.reminder_date, r.reminder_time));
        Ok(reminders)
    }

    async fn create_reminder(&self, user_id: Uuid, reminder: NewReminder) -> AppResult<Reminder> {
        let mut tables = self.tables.write().await;
        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id,
            reminder_type: reminder.reminder_type,
            title: reminder.title,
            description: reminder.description,
            reminder_date: reminder.reminder_date,
            reminder_time: reminder.reminder_time,
            is_completed: false,
            created_at: Utc::now(),
        };
        tables.reminders.push(reminder.clone());
        Ok(reminder)
    }

    async fn set_reminder_completed(
        &self,
        user_id: Uuid,
        id: Uuid,
        completed: bool,
    ) -> AppResult<Option<Reminder>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .reminders
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .map(|r| {
                r.is_completed = completed;
                r.clone()
            }))
    }

    async fn delete_reminder(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.reminders.len();
        tables
            .reminders
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(tables.reminders.len() < before)
    }

    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> AppResult<Notification> {
        let mut tables = self.tables.write().await;
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            link: notification.link,
            is_read: false,
            created_at: Utc::now(),
        };
        tables.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit_to: i64,
    ) -> AppResult<Vec<Notification>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.notifications, |n| n.created_at)
            .into_iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .take(limit(limit_to))
            .cloned()
            .collect())
    }

    async fn unread_notification_count(&self, user_id: Uuid) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Notification>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let mut updated = 0;
        for n in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn admin_stats(&self, now: DateTime<Utc>) -> AppResult<AdminStats> {
        let tables = self.tables.read().await;
        let week_ago = now - Duration::days(7);
        let approved = tables.posts.iter().filter(|p| p.is_approved).count() as i64;

        let overview = StatsOverview {
            total_users: tables.users.len() as i64,
            active_users: tables.users.iter().filter(|u| u.is_active).count() as i64,
            total_posts: tables.posts.len() as i64,
            approved_posts: approved,
            pending_posts: tables.posts.len() as i64 - approved,
            total_knowledge: tables.knowledge.len() as i64,
            total_notifications: tables.notifications.len() as i64,
            new_users_last7_days: tables
                .users
                .iter()
                .filter(|u| u.created_at >= week_ago)
                .count() as i64,
        };

        let breakdown = StatsBreakdown {
            posts_by_type: counts_by(
                tables
                    .posts
                    .iter()
                    .filter(|p| p.is_approved)
                    .map(|p| p.post_type.as_str().to_string()),
            )
            .into_iter()
            .map(|(post_type, count)| TypeCount { post_type, count })
            .collect(),
            users_by_role: counts_by(tables.users.iter().map(|u| u.role.as_str().to_string()))
                .into_iter()
                .map(|(role, count)| RoleCount { role, count })
                .collect(),
            knowledge_by_category: counts_by(tables.knowledge.iter().map(|k| k.category.clone()))
                .into_iter()
                .take(limit(STATS_CATEGORY_LIMIT))
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        };

        Ok(AdminStats { overview, breakdown })
    }
}
