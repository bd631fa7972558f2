use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedingSchedule {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub time_of_day: NaiveTime,
    pub feed_type: String,
    pub ration_grams: i32,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmLog {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub num_birds: i32,
    pub feed_type: String,
    pub daily_feed_kg: f64,
    pub mortality: i32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FeedingScheduleInput {
    pub time_of_day: NaiveTime,
    pub feed_type: String,
    pub ration_grams: i32,
    pub notes: String,
}

/// Farm log values keyed by (user, log date) on upsert.
#[derive(Debug, Clone)]
pub struct FarmLogInput {
    pub log_date: NaiveDate,
    pub num_birds: i32,
    pub feed_type: String,
    pub daily_feed_kg: f64,
    pub mortality: i32,
    pub notes: String,
}

/// `POST /activity` body, discriminated by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActivityRequest {
    Feeding(FeedingScheduleRequest),
    Farm(FarmLogRequest),
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedingScheduleRequest {
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub feed_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ration_grams: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FarmLogRequest {
    #[serde(default)]
    pub log_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub num_birds: Option<f64>,
    #[serde(default)]
    pub feed_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_feed_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub mortality: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FeedingScheduleRequest {
    pub fn validate(self) -> AppResult<FeedingScheduleInput> {
        let raw = super::non_blank(self.time_of_day)
            .ok_or_else(|| AppError::Validation("timeOfDay is required".to_string()))?;
        Ok(FeedingScheduleInput {
            time_of_day: parse_time(&raw)?,
            feed_type: self.feed_type.unwrap_or_default().trim().to_string(),
            ration_grams: whole_count("rationGrams", self.ration_grams)?,
            notes: self.notes.unwrap_or_default(),
        })
    }
}

impl FarmLogRequest {
    /// `today` is used when no log date was submitted.
    pub fn validate(self, today: NaiveDate) -> AppResult<FarmLogInput> {
        let log_date = match super::non_blank(self.log_date) {
            Some(raw) => parse_date(&raw)?,
            None => today,
        };
        let daily_feed_kg = self.daily_feed_kg.unwrap_or(0.0);
        if !daily_feed_kg.is_finite() || daily_feed_kg < 0.0 {
            return Err(AppError::Validation(
                "dailyFeedKg must be a non-negative number".to_string(),
            ));
        }
        Ok(FarmLogInput {
            log_date,
            num_birds: whole_count("numBirds", self.num_birds)?,
            feed_type: self.feed_type.unwrap_or_default().trim().to_string(),
            daily_feed_kg,
            mortality: whole_count("mortality", self.mortality)?,
            notes: self.notes.unwrap_or_default(),
        })
    }
}

pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    // Accept full ISO timestamps by keeping only the date part.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date: {}", raw)))
}

pub fn parse_time(raw: &str) -> AppResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid time: {}", raw)))
}

fn whole_count(field: &str, value: Option<f64>) -> AppResult<i32> {
    let value = value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > i32::MAX as f64 {
        return Err(AppError::Validation(format!(
            "{} must be a non-negative whole number",
            field
        )));
    }
    Ok(value as i32)
}

/// Form inputs arrive as numbers, numeric strings, or empty strings.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {:?}", s))),
    }
}
