use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "AI Farming API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
