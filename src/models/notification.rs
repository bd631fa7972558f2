use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

impl NewNotification {
    pub fn post_liked(author_id: Uuid, post_id: Uuid, liker_name: &str, post_title: &str) -> Self {
        Self {
            user_id: author_id,
            kind: "like".to_string(),
            title: "New like on your post".to_string(),
            message: format!("{} liked \"{}\"", liker_name, post_title),
            link: Some(format!("/posts/{}", post_id)),
        }
    }

    pub fn post_commented(
        author_id: Uuid,
        post_id: Uuid,
        commenter_name: &str,
        post_title: &str,
    ) -> Self {
        Self {
            user_id: author_id,
            kind: "comment".to_string(),
            title: "New comment on your post".to_string(),
            message: format!("{} commented on \"{}\"", commenter_name, post_title),
            link: Some(format!("/posts/{}", post_id)),
        }
    }
}
