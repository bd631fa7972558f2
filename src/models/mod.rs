// Domain rows and request/response schemas

pub mod activity;
pub mod knowledge;
pub mod notification;
pub mod post;
pub mod reminder;
pub mod stats;
pub mod user;

pub use activity::{ActivityRequest, FarmLog, FarmLogInput, FeedingSchedule, FeedingScheduleInput};
pub use knowledge::{KnowledgeEntry, KnowledgePatch, NewKnowledgeEntry, StringList};
pub use notification::{NewNotification, Notification};
pub use post::{AuthorRef, CommentView, NewPost, PostDetail, PostPatch, PostSummary, PostType};
pub use reminder::{NewReminder, Reminder};
pub use stats::{AdminStats, CategoryCount, RoleCount, StatsBreakdown, StatsOverview, TypeCount};
pub use user::{Language, NewUser, Role, User, UserPatch};

use std::fmt;

/// Returned when a stored or submitted enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Trims a submitted string, treating blank input as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
