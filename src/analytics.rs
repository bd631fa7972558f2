//! Farm activity analytics.
//!
//! Everything here is a pure function of a user's farm logs and the current
//! date, so handlers pass `today` in explicitly.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{FarmLog, FeedingSchedule};

/// Number of calendar days in the trailing window, today included.
pub const WINDOW_DAYS: u64 = 7;

/// Upper bound on farm log rows loaded for the activity dashboard.
pub const LOG_FETCH_LIMIT: i64 = 60;

/// Number of farm logs rendered as history events.
pub const HISTORY_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayPoint {
    pub date: NaiveDate,
    pub feed_kg: f64,
    pub mortality: i64,
    pub birds: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAnalytics {
    pub days: Vec<DayPoint>,
    #[serde(rename = "totalFeedKg7d")]
    pub total_feed_kg: f64,
    #[serde(rename = "totalMortality7d")]
    pub total_mortality: i64,
    #[serde(rename = "avgFeedKg7d")]
    pub avg_feed_kg: f64,
    pub feed_per_bird_avg: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    pub total_birds: i64,
    pub avg_feed_kg: f64,
    pub last_log_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    pub id: Uuid,
    pub kind: &'static str,
    pub title: String,
    pub date: NaiveDate,
    pub details: String,
}

/// Full `GET /activity` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOverview {
    pub feeding_schedules: Vec<FeedingSchedule>,
    pub farm_logs: Vec<FarmLog>,
    pub aggregates: Aggregates,
    pub analytics: WeeklyAnalytics,
    pub history: Vec<HistoryEvent>,
}

impl ActivityOverview {
    pub fn build(
        feeding_schedules: Vec<FeedingSchedule>,
        farm_logs: Vec<FarmLog>,
        today: NaiveDate,
    ) -> Self {
        Self {
            aggregates: aggregates(&farm_logs),
            analytics: trailing_window(&farm_logs, today),
            history: history(&farm_logs),
            feeding_schedules,
            farm_logs,
        }
    }
}

/// Builds the seven-day series ending at `today`, oldest day first.
///
/// `logs` must be ordered newest first; the feed-per-bird figure divides the
/// window's average daily feed by the bird count of the most recent log.
pub fn trailing_window(logs: &[FarmLog], today: NaiveDate) -> WeeklyAnalytics {
    let by_date: HashMap<NaiveDate, &FarmLog> = logs
        .iter()
        .rev()
        .map(|log| (log.log_date, log))
        .collect();

    let days: Vec<DayPoint> = (0..WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let date = today.checked_sub_days(Days::new(offset)).unwrap_or(today);
            match by_date.get(&date) {
                Some(log) => DayPoint {
                    date,
                    feed_kg: log.daily_feed_kg,
                    mortality: i64::from(log.mortality),
                    birds: i64::from(log.num_birds),
                },
                None => DayPoint { date, feed_kg: 0.0, mortality: 0, birds: 0 },
            }
        })
        .collect();

    let total_feed_kg: f64 = days.iter().map(|d| d.feed_kg).sum();
    let total_mortality: i64 = days.iter().map(|d| d.mortality).sum();
    let avg_feed_kg = total_feed_kg / WINDOW_DAYS as f64;

    let latest_birds = logs.first().map(|l| l.num_birds).unwrap_or(0);
    let feed_per_bird_avg = if latest_birds > 0 {
        round_to(avg_feed_kg / f64::from(latest_birds), 3)
    } else {
        0.0
    };

    WeeklyAnalytics {
        days,
        total_feed_kg,
        total_mortality,
        avg_feed_kg: round_to(avg_feed_kg, 2),
        feed_per_bird_avg,
    }
}

/// Headline numbers over every loaded log (newest first).
pub fn aggregates(logs: &[FarmLog]) -> Aggregates {
    let Some(latest) = logs.first() else {
        return Aggregates::default();
    };
    let total_feed: f64 = logs.iter().map(|l| l.daily_feed_kg).sum();
    Aggregates {
        total_birds: i64::from(latest.num_birds),
        avg_feed_kg: round_to(total_feed / logs.len() as f64, 2),
        last_log_date: Some(latest.log_date),
    }
}

pub fn history(logs: &[FarmLog]) -> Vec<HistoryEvent> {
    logs.iter()
        .take(HISTORY_LEN)
        .map(|log| {
            let mut details = format!(
                "{} birds, {} kg feed, {} mortality",
                log.num_birds, log.daily_feed_kg, log.mortality
            );
            if !log.feed_type.is_empty() {
                details.push_str(&format!(" ({})", log.feed_type));
            }
            HistoryEvent {
                id: log.id,
                kind: "farm",
                title: "Farm log".to_string(),
                date: log.log_date,
                details,
            }
        })
        .collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
