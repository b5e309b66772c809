use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{Coordinate, RawFix, TimeMs};
use crate::error::AppError;
use crate::game::{FixOutcome, MissionProgress, TrackingStop, TrackingSummary};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub countdown: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub started: bool,
    pub countdown: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Device timestamp; the server clock is used when absent.
    pub timestamp_ms: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LocationErrorRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionsResponse {
    pub distance_km: f64,
    pub missions: Vec<MissionProgress>,
}

/// POST /v1/tracking/start. The body is optional.
pub async fn start_tracking(
    State(state): State<AppState>,
    body: Option<Json<StartRequest>>,
) -> Json<StartResponse> {
    let Json(req) = body.unwrap_or_default();
    let started = state.game.start_tracking(req.countdown);
    Json(StartResponse {
        started,
        countdown: started && req.countdown,
    })
}

pub async fn stop_tracking(State(state): State<AppState>) -> Json<TrackingStop> {
    Json(state.game.stop_tracking())
}

pub async fn post_fix(
    State(state): State<AppState>,
    Json(req): Json<FixRequest>,
) -> Result<Json<FixOutcome>, AppError> {
    if !(-90.0..=90.0).contains(&req.latitude) || !(-180.0..=180.0).contains(&req.longitude) {
        return Err(AppError::BadRequest(
            "latitude must be in [-90, 90] and longitude in [-180, 180]".into(),
        ));
    }
    let timestamp_ms = req
        .timestamp_ms
        .map(TimeMs::new)
        .unwrap_or_else(|| state.game.now());
    let fix = RawFix::new(Coordinate::new(req.latitude, req.longitude), timestamp_ms);
    Ok(Json(state.game.record_fix(fix)?))
}

pub async fn post_location_error(
    State(state): State<AppState>,
    Json(req): Json<LocationErrorRequest>,
) -> Json<TrackingStop> {
    Json(state.game.report_location_error(&req.message))
}

pub async fn get_tracking(State(state): State<AppState>) -> Json<TrackingSummary> {
    Json(state.game.tracking_summary())
}

pub async fn get_missions(State(state): State<AppState>) -> Json<MissionsResponse> {
    Json(MissionsResponse {
        distance_km: state.game.tracking_summary().distance_km,
        missions: state.game.missions(),
    })
}
