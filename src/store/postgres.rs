use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use super::{escape_like, PostQuery, Store, STATS_CATEGORY_LIMIT};
use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminStats, AuthorRef, CategoryCount, CommentView, FarmLog, FarmLogInput, FeedingSchedule,
    FeedingScheduleInput, KnowledgeEntry, KnowledgePatch, NewKnowledgeEntry, NewNotification,
    NewPost, NewReminder, NewUser, Notification, ParseEnumError, PostDetail, PostPatch,
    PostSummary, Reminder, RoleCount, StatsBreakdown, StatsOverview, TypeCount, User, UserPatch,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn db_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.to_string()),
        _ => None,
    }
}

/// Maps a unique-email violation to the client-facing duplicate error.
fn user_write_error(err: sqlx::Error) -> AppError {
    if db_code(&err).as_deref() == Some(UNIQUE_VIOLATION) {
        AppError::BadRequest("User already exists".to_string())
    } else {
        AppError::Database(format!("Failed to write user: {}", err))
    }
}

fn post_write_error(err: sqlx::Error) -> AppError {
    if db_code(&err).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
        AppError::NotFound("Post not found".to_string())
    } else {
        AppError::Database(err.to_string())
    }
}

fn enum_column<T>(row: &PgRow, column: &str) -> AppResult<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: ParseEnumError| AppError::Database(format!("column {}: {}", column, e)))
}

fn user_from_row(row: &PgRow) -> AppResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        farm_size: row.try_get("farm_size")?,
        poultry_type: row.try_get("poultry_type")?,
        preferred_language: enum_column(row, "preferred_language")?,
        role: enum_column(row, "role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn author_from_row(row: &PgRow, with_email: bool) -> AppResult<AuthorRef> {
    Ok(AuthorRef {
        id: row.try_get("author_id")?,
        name: row.try_get("author_name")?,
        email: if with_email {
            row.try_get("author_email")?
        } else {
            None
        },
    })
}

fn comment_from_row(row: &PgRow) -> AppResult<CommentView> {
    Ok(CommentView {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        author: author_from_row(row, false)?,
        created_at: row.try_get("created_at")?,
    })
}

fn knowledge_from_row(row: &PgRow) -> AppResult<KnowledgeEntry> {
    Ok(KnowledgeEntry {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category: row.try_get("category")?,
        tags: row.try_get("tags")?,
        keywords: row.try_get("keywords")?,
        is_ai_verified: row.try_get("is_ai_verified")?,
        views: row.try_get("views")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn feeding_from_row(row: &PgRow) -> AppResult<FeedingSchedule> {
    Ok(FeedingSchedule {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        time_of_day: row.try_get("time_of_day")?,
        feed_type: row.try_get("feed_type")?,
        ration_grams: row.try_get("ration_grams")?,
        notes: row.try_get("notes")?,
    })
}

fn farm_log_from_row(row: &PgRow) -> AppResult<FarmLog> {
    Ok(FarmLog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        log_date: row.try_get("log_date")?,
        num_birds: row.try_get("num_birds")?,
        feed_type: row.try_get("feed_type")?,
        daily_feed_kg: row.try_get("daily_feed_kg")?,
        mortality: row.try_get("mortality")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn reminder_from_row(row: &PgRow) -> AppResult<Reminder> {
    Ok(Reminder {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        reminder_type: row.try_get("reminder_type")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        reminder_date: row.try_get("reminder_date")?,
        reminder_time: row.try_get("reminder_time")?,
        is_completed: row.try_get("is_completed")?,
        created_at: row.try_get("created_at")?,
    })
}

fn notification_from_row(row: &PgRow) -> AppResult<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: row.try_get("kind")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        link: row.try_get("link")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

fn counts_from_rows(rows: &[PgRow]) -> AppResult<Vec<(String, i64)>> {
    rows.iter()
        .map(|row| -> AppResult<(String, i64)> {
            Ok((row.try_get("label")?, row.try_get("count")?))
        })
        .collect()
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the configured pool size and apply pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(8))
            .idle_timeout(std::time::Duration::from_secs(600))
            .connect(&config.url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(
            max_connections = config.max_connections,
            "Database pool ready, migrations applied"
        );

        Ok(Self::new(pool))
    }

    async fn load_post_detail(&self, id: Uuid) -> AppResult<Option<PostDetail>> {
        let row = sqlx::query(
            "SELECT p.id, p.title, p.content, p.post_type, p.is_approved, p.created_at,
                    p.author_id, u.name AS author_name
             FROM posts p LEFT JOIN users u ON u.id = p.author_id
             WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get post {}: {}", id, e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (likes, comment_rows, images) = futures::try_join!(
            sqlx::query_scalar::<_, Uuid>(
                "SELECT user_id FROM post_likes WHERE post_id = $1 ORDER BY created_at",
            )
            .bind(id)
            .fetch_all(&self.pool),
            sqlx::query(
                "SELECT c.id, c.content, c.created_at, c.author_id, u.name AS author_name
                 FROM comments c LEFT JOIN users u ON u.id = c.author_id
                 WHERE c.post_id = $1
                 ORDER BY c.created_at",
            )
            .bind(id)
            .fetch_all(&self.pool),
            sqlx::query_scalar::<_, String>(
                "SELECT url FROM post_images WHERE post_id = $1 ORDER BY position",
            )
            .bind(id)
            .fetch_all(&self.pool),
        )?;

        Ok(Some(PostDetail {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            post_type: enum_column(&row, "post_type")?,
            is_approved: row.try_get("is_approved")?,
            created_at: row.try_get("created_at")?,
            author: author_from_row(&row, false)?,
            likes,
            comments: comment_rows
                .iter()
                .map(comment_from_row)
                .collect::<AppResult<Vec<_>>>()?,
            images,
            liked: None,
        }))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, farm_size, poultry_type,
                                preferred_language, role)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.farm_size)
        .bind(&user.poultry_type)
        .bind(user.preferred_language.as_str())
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(user_write_error)?;

        user_from_row(&row)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user {}: {}", id, e)))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                farm_size = COALESCE($5, farm_size),
                poultry_type = COALESCE($6, poultry_type),
                preferred_language = COALESCE($7, preferred_language),
                role = COALESCE($8, role),
                is_active = COALESCE($9, is_active)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.password_hash)
        .bind(patch.farm_size)
        .bind(patch.poultry_type)
        .bind(patch.preferred_language.map(|l| l.as_str()))
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(user_write_error)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, query: PostQuery) -> AppResult<Vec<PostSummary>> {
        let rows = sqlx::query(
            "SELECT p.id, p.title, p.content, p.post_type, p.is_approved, p.created_at,
                    p.author_id, u.name AS author_name, u.email AS author_email,
                    (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
             FROM posts p LEFT JOIN users u ON u.id = p.author_id
             WHERE ($1 = FALSE OR p.is_approved)
             ORDER BY p.created_at DESC
             LIMIT $2",
        )
        .bind(query.approved_only)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list posts: {}", e)))?;

        rows.iter()
            .map(|row| -> AppResult<PostSummary> {
                Ok(PostSummary {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    content: row.try_get("content")?,
                    post_type: enum_column(row, "post_type")?,
                    is_approved: row.try_get("is_approved")?,
                    created_at: row.try_get("created_at")?,
                    author: author_from_row(row, query.with_author_email)?,
                    like_count: row.try_get("like_count")?,
                    comment_count: row.try_get("comment_count")?,
                })
            })
            .collect()
    }

    async fn get_post(&self, id: Uuid) -> AppResult<Option<PostDetail>> {
        self.load_post_detail(id).await
    }

    async fn create_post(&self, post: NewPost) -> AppResult<PostDetail> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO posts (id, author_id, title, content, post_type, is_approved)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.post_type.as_str())
        .bind(post.is_approved)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create post: {}", e)))?;

        for (position, url) in post.image_urls.iter().enumerate() {
            sqlx::query(
                "INSERT INTO post_images (id, post_id, url, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(url)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.load_post_detail(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Post {} vanished after insert", id)))
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> AppResult<Option<PostDetail>> {
        let result = sqlx::query(
            "UPDATE posts SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                post_type = COALESCE($4, post_type)
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.post_type.map(|t| t.as_str()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.load_post_detail(id).await
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let removed = sqlx::query(
            "DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2 RETURNING post_id",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if removed.is_some() {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)
             ON CONFLICT (post_id, user_id) DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(post_write_error)?;

        Ok(true)
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> AppResult<CommentView> {
        let row = sqlx::query(
            "WITH inserted AS (
                 INSERT INTO comments (id, post_id, author_id, content)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, content, created_at, author_id
             )
             SELECT i.id, i.content, i.created_at, i.author_id, u.name AS author_name
             FROM inserted i LEFT JOIN users u ON u.id = i.author_id",
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(post_write_error)?;

        comment_from_row(&row)
    }

    async fn set_post_approval(&self, id: Uuid, approved: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE posts SET is_approved = $2 WHERE id = $1")
            .bind(id)
            .bind(approved)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_knowledge(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<KnowledgeEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM knowledge_base
             WHERE ($1::text IS NULL OR category = $1)
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(knowledge_from_row).collect()
    }

    async fn get_knowledge(&self, id: Uuid) -> AppResult<Option<KnowledgeEntry>> {
        let row = sqlx::query("SELECT * FROM knowledge_base WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(knowledge_from_row).transpose()
    }

    async fn view_knowledge(&self, id: Uuid) -> AppResult<Option<KnowledgeEntry>> {
        let row = sqlx::query(
            "UPDATE knowledge_base SET views = views + 1 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(knowledge_from_row).transpose()
    }

    async fn search_knowledge(
        &self,
        query: &str,
        category: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<KnowledgeEntry>> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query(
            "SELECT * FROM knowledge_base
             WHERE (title ILIKE $1
                    OR content ILIKE $1
                    OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE $1)
                    OR EXISTS (SELECT 1 FROM unnest(keywords) k WHERE k ILIKE $1))
               AND ($2::text IS NULL OR category = $2)
             ORDER BY CASE WHEN title ILIKE $1 THEN 1 ELSE 2 END, created_at DESC
             LIMIT $3",
        )
        .bind(&pattern)
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Knowledge search failed: {}", e)))?;

        rows.iter().map(knowledge_from_row).collect()
    }

    async fn create_knowledge(&self, entry: NewKnowledgeEntry) -> AppResult<KnowledgeEntry> {
        let row = sqlx::query(
            "INSERT INTO knowledge_base (id, title, content, category, tags, keywords,
                                         is_ai_verified, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(&entry.category)
        .bind(&entry.tags)
        .bind(&entry.keywords)
        .bind(entry.is_ai_verified)
        .bind(entry.created_by)
        .fetch_one(&self.pool)
        .await?;

        knowledge_from_row(&row)
    }

    async fn update_knowledge(
        &self,
        id: Uuid,
        patch: KnowledgePatch,
    ) -> AppResult<Option<KnowledgeEntry>> {
        let row = sqlx::query(
            "UPDATE knowledge_base SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                category = COALESCE($4, category),
                tags = COALESCE($5, tags),
                keywords = COALESCE($6, keywords),
                is_ai_verified = COALESCE($7, is_ai_verified),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.category)
        .bind(patch.tags)
        .bind(patch.keywords)
        .bind(patch.is_ai_verified)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(knowledge_from_row).transpose()
    }

    async fn delete_knowledge(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM knowledge_base WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_feeding_schedules(&self, user_id: Uuid) -> AppResult<Vec<FeedingSchedule>> {
        let rows = sqlx::query(
            "SELECT * FROM feeding_schedules WHERE user_id = $1 ORDER BY time_of_day ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(feeding_from_row).collect()
    }

    async fn create_feeding_schedule(
        &self,
        user_id: Uuid,
        input: FeedingScheduleInput,
    ) -> AppResult<FeedingSchedule> {
        let row = sqlx::query(
            "INSERT INTO feeding_schedules (id, user_id, time_of_day, feed_type, ration_grams, notes)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.time_of_day)
        .bind(&input.feed_type)
        .bind(input.ration_grams)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await?;

        feeding_from_row(&row)
    }

    async fn list_farm_logs(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<FarmLog>> {
        let rows = sqlx::query(
            "SELECT * FROM farm_logs WHERE user_id = $1 ORDER BY log_date DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(farm_log_from_row).collect()
    }

    async fn upsert_farm_log(&self, user_id: Uuid, input: FarmLogInput) -> AppResult<FarmLog> {
        let row = sqlx::query(
            "INSERT INTO farm_logs (id, user_id, log_date, num_birds, feed_type, daily_feed_kg,
                                    mortality, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (user_id, log_date) DO UPDATE SET
                num_birds = EXCLUDED.num_birds,
                feed_type = EXCLUDED.feed_type,
                daily_feed_kg = EXCLUDED.daily_feed_kg,
                mortality = EXCLUDED.mortality,
                notes = EXCLUDED.notes,
                updated_at = NOW()
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.log_date)
        .bind(input.num_birds)
        .bind(&input.feed_type)
        .bind(input.daily_feed_kg)
        .bind(input.mortality)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to upsert farm log: {}", e)))?;

        farm_log_from_row(&row)
    }

    async fn list_reminders(&self, user_id: Uuid) -> AppResult<Vec<Reminder>> {
        let rows = sqlx::query(
            "SELECT * FROM reminders WHERE user_id = $1
             ORDER BY reminder_date ASC, reminder_time ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reminder_from_row).collect()
    }

    async fn create_reminder(&self, user_id: Uuid, reminder: NewReminder) -> AppResult<Reminder> {
        let row = sqlx::query(
            "INSERT INTO reminders (id, user_id, reminder_type, title, description,
                                    reminder_date, reminder_time)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&reminder.reminder_type)
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(reminder.reminder_date)
        .bind(reminder.reminder_time)
        .fetch_one(&self.pool)
        .await?;

        reminder_from_row(&row)
    }

    async fn set_reminder_completed(
        &self,
        user_id: Uuid,
        id: Uuid,
        completed: bool,
    ) -> AppResult<Option<Reminder>> {
        let row = sqlx::query(
            "UPDATE reminders SET is_completed = $3
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(completed)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(reminder_from_row).transpose()
    }

    async fn delete_reminder(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> AppResult<Notification> {
        let row = sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, title, message, link)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.link)
        .fetch_one(&self.pool)
        .await?;

        notification_from_row(&row)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications
             WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn unread_notification_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Notification>> {
        let row = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(notification_from_row).transpose()
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn admin_stats(&self, now: DateTime<Utc>) -> AppResult<AdminStats> {
        let week_ago = now - Duration::days(7);

        let (users, posts, total_knowledge, total_notifications, by_type, by_role, by_category) =
            futures::try_join!(
                sqlx::query(
                    "SELECT COUNT(*) AS total,
                            COUNT(*) FILTER (WHERE is_active) AS active,
                            COUNT(*) FILTER (WHERE created_at >= $1) AS recent
                     FROM users",
                )
                .bind(week_ago)
                .fetch_one(&self.pool),
                sqlx::query(
                    "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE is_approved) AS approved
                     FROM posts",
                )
                .fetch_one(&self.pool),
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM knowledge_base")
                    .fetch_one(&self.pool),
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications")
                    .fetch_one(&self.pool),
                sqlx::query(
                    "SELECT post_type AS label, COUNT(*) AS count FROM posts
                     WHERE is_approved = TRUE
                     GROUP BY post_type ORDER BY count DESC, label",
                )
                .fetch_all(&self.pool),
                sqlx::query(
                    "SELECT role AS label, COUNT(*) AS count FROM users
                     GROUP BY role ORDER BY count DESC, label",
                )
                .fetch_all(&self.pool),
                sqlx::query(
                    "SELECT category AS label, COUNT(*) AS count FROM knowledge_base
                     GROUP BY category ORDER BY count DESC, label LIMIT $1",
                )
                .bind(STATS_CATEGORY_LIMIT)
                .fetch_all(&self.pool),
            )?;

        let total_posts: i64 = posts.try_get("total")?;
        let approved_posts: i64 = posts.try_get("approved")?;

        let overview = StatsOverview {
            total_users: users.try_get("total")?,
            active_users: users.try_get("active")?,
            total_posts,
            approved_posts,
            pending_posts: total_posts - approved_posts,
            total_knowledge,
            total_notifications,
            new_users_last7_days: users.try_get("recent")?,
        };

        let breakdown = StatsBreakdown {
            posts_by_type: counts_from_rows(&by_type)?
                .into_iter()
                .map(|(post_type, count)| TypeCount { post_type, count })
                .collect(),
            users_by_role: counts_from_rows(&by_role)?
                .into_iter()
                .map(|(role, count)| RoleCount { role, count })
                .collect(),
            knowledge_by_category: counts_from_rows(&by_category)?
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        };

        Ok(AdminStats { overview, breakdown })
    }
}

/// These run against a scratch database created by `sqlx::test`, so they need
/// a reachable server in `DATABASE_URL`: `cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, PostType, Role};
    use chrono::NaiveDate;

    async fn seed_user(store: &PostgresStore, email: &str) -> User {
        store
            .create_user(NewUser {
                name: "Amina".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                farm_size: "small".to_string(),
                poultry_type: "Layers".to_string(),
                preferred_language: Language::En,
                role: Role::Farmer,
            })
            .await
            .unwrap()
    }

    fn post(author_id: Uuid, approved: bool) -> NewPost {
        NewPost {
            author_id,
            title: "Egg prices".to_string(),
            content: "Trays went up".to_string(),
            post_type: PostType::Question,
            is_approved: approved,
            image_urls: vec![],
        }
    }

    fn entry(title: &str, content: &str, category: &str, tags: &[&str]) -> NewKnowledgeEntry {
        NewKnowledgeEntry {
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            keywords: vec![],
            is_ai_verified: false,
            created_by: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs Postgres"]
    async fn test_upsert_farm_log_keeps_row_per_day(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let user = seed_user(&store, "logs@farm.io").await;
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let input = |birds: i32, feed: f64| FarmLogInput {
            log_date: date,
            num_birds: birds,
            feed_type: "layer mash".to_string(),
            daily_feed_kg: feed,
            mortality: 1,
            notes: String::new(),
        };

        let first = store.upsert_farm_log(user.id, input(300, 33.5)).await.unwrap();
        let second = store.upsert_farm_log(user.id, input(298, 32.75)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.num_birds, 298);
        assert_eq!(second.daily_feed_kg, 32.75);

        let next_day = FarmLogInput {
            log_date: date.succ_opt().unwrap(),
            ..input(298, 30.0)
        };
        let third = store.upsert_farm_log(user.id, next_day).await.unwrap();
        assert_ne!(third.id, first.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs Postgres"]
    async fn test_toggle_like_round_trip(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let author = seed_user(&store, "author@farm.io").await;
        let fan = seed_user(&store, "fan@farm.io").await;
        let created = store.create_post(post(author.id, true)).await.unwrap();

        assert!(store.toggle_like(created.id, fan.id).await.unwrap());
        let liked = store.get_post(created.id).await.unwrap().unwrap();
        assert_eq!(liked.likes, vec![fan.id]);

        assert!(!store.toggle_like(created.id, fan.id).await.unwrap());
        let unliked = store.get_post(created.id).await.unwrap().unwrap();
        assert!(unliked.likes.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs Postgres"]
    async fn test_search_knowledge_matches_tags_and_ranks_titles(pool: PgPool) {
        let store = PostgresStore::new(pool);
        for new in [
            entry("Biosecurity", "Coccidiosis spreads in wet litter", "health", &[]),
            entry("Coccidiosis basics", "Signs and treatment", "health", &[]),
            entry("Drinkers", "Clean them daily", "housing", &["coccidiosis", "water"]),
            entry("Brooding", "Keep chicks warm", "housing", &["heat"]),
        ] {
            store.create_knowledge(new).await.unwrap();
        }

        let hits = store.search_knowledge("cocci", None, 20).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Coccidiosis basics");
        assert!(hits.iter().any(|k| k.title == "Drinkers"));

        let housing = store.search_knowledge("COCCI", Some("housing"), 20).await.unwrap();
        assert_eq!(housing.len(), 1);
        assert_eq!(housing[0].title, "Drinkers");

        // LIKE wildcards in the query are matched literally.
        assert!(store.search_knowledge("%", None, 20).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs Postgres"]
    async fn test_admin_stats_counts_approved_post_types(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let author = seed_user(&store, "stats@farm.io").await;
        store.create_post(post(author.id, true)).await.unwrap();
        store.create_post(post(author.id, false)).await.unwrap();

        let stats = store.admin_stats(Utc::now()).await.unwrap();
        assert_eq!(stats.overview.total_posts, 2);
        assert_eq!(stats.overview.pending_posts, 1);
        assert_eq!(
            stats.breakdown.posts_by_type,
            vec![TypeCount { post_type: "question".to_string(), count: 1 }]
        );
    }
}
