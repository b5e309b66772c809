use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::error::AppError;
use crate::game::{DuelReport, DuelView};

pub async fn get_duel(State(state): State<AppState>) -> Json<DuelView> {
    Json(state.game.duel())
}

/// End the active duel early.
pub async fn stop_duel(State(state): State<AppState>) -> Result<Json<DuelReport>, AppError> {
    state
        .game
        .stop_duel()
        .map(Json)
        .ok_or_else(|| AppError::Conflict("No duel is in progress".into()))
}
