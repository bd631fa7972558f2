use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use super::extract::ValidJson;
use crate::{
    analytics::{ActivityOverview, LOG_FETCH_LIMIT},
    app_state::AppState,
    auth::AuthUser,
    error::AppResult,
    models::{ActivityRequest, FarmLog, FeedingSchedule},
};

#[derive(Serialize)]
#[serde(untagged)]
pub enum ActivityRecord {
    Feeding(FeedingSchedule),
    Farm(FarmLog),
}

pub async fn get_activity_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ActivityOverview>> {
    let (schedules, logs) = futures::try_join!(
        state.store.list_feeding_schedules(auth.user_id),
        state.store.list_farm_logs(auth.user_id, LOG_FETCH_LIMIT),
    )?;

    let today = Utc::now().date_naive();
    Ok(Json(ActivityOverview::build(schedules, logs, today)))
}

pub async fn create_activity_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<ActivityRequest>,
) -> AppResult<(StatusCode, Json<ActivityRecord>)> {
    let record = match req {
        ActivityRequest::Feeding(feeding) => {
            let schedule = state
                .store
                .create_feeding_schedule(auth.user_id, feeding.validate()?)
                .await?;
            ActivityRecord::Feeding(schedule)
        }
        ActivityRequest::Farm(farm) => {
            let input = farm.validate(Utc::now().date_naive())?;
            let log = state.store.upsert_farm_log(auth.user_id, input).await?;
            tracing::debug!(log_id = %log.id, log_date = %log.log_date, "Farm log saved");
            ActivityRecord::Farm(log)
        }
    };

    Ok((StatusCode::CREATED, Json(record)))
}
