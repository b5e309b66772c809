use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::domain::InventoryError;
use crate::game::{DuelError, GameError, MatchmakingError, TrackingError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        let msg = err.to_string();
        match err {
            GameError::Inventory(InventoryError::UnknownItem(_)) => AppError::NotFound(msg),
            GameError::Inventory(InventoryError::Unavailable(_)) => AppError::Conflict(msg),
            GameError::Matchmaking(MatchmakingError::ShieldActive(_)) => AppError::Conflict(msg),
            GameError::Matchmaking(MatchmakingError::NoMatch) => AppError::NotFound(msg),
            GameError::Duel(DuelError::AlreadyActive) => AppError::Conflict(msg),
            GameError::Tracking(TrackingError::NotTracking) => AppError::Conflict(msg),
            GameError::Tracking(TrackingError::LocationUnavailable(_)) => {
                AppError::BadRequest(msg)
            }
            GameError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
