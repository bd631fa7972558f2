use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Question,
    Tip,
    Experience,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Question => "question",
            PostType::Tip => "tip",
            PostType::Experience => "experience",
        }
    }
}

impl FromStr for PostType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(PostType::Question),
            "tip" => Ok(PostType::Tip),
            "experience" => Ok(PostType::Experience),
            other => Err(ParseEnumError { kind: "post type", value: other.to_string() }),
        }
    }
}

/// Author as rendered on posts and comments. Fields are optional because the
/// author row may have been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
    pub like_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub author: AuthorRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

impl PostDetail {
    pub fn author_id(&self) -> Option<Uuid> {
        self.author.id
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub post_type: PostType,
    pub is_approved: bool,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub post_type: Option<PostType>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.post_type.is_none()
    }
}
