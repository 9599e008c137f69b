use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::config::ProfileSummary;
use crate::handlers::AppState;
use crate::snmp::Connector;

pub async fn health<C: Connector>(State(state): State<AppState<C>>) -> (StatusCode, Json<Value>) {
    let config = state.service.config();
    let profiles: Vec<ProfileSummary> = config.profiles.values().map(ProfileSummary::from).collect();

    (StatusCode::OK,
        Json(json!({
        "status": "im ready",
        "UTC_time": chrono::Utc::now().to_rfc2822(),
        "default_profile": config.settings.default_profile,
        "profiles": profiles,
    })))
}
