use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub reminder_type: String,
    pub title: String,
    pub description: String,
    pub reminder_date: NaiveDate,
    pub reminder_time: NaiveTime,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub reminder_type: String,
    pub title: String,
    pub description: String,
    pub reminder_date: NaiveDate,
    pub reminder_time: NaiveTime,
}

pub fn default_reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
}
