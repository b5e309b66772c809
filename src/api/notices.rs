use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::game::Notice;

#[derive(Debug, Serialize)]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
}

/// Returns queued notices oldest first and clears the queue.
pub async fn drain_notices(State(state): State<AppState>) -> Json<NoticesResponse> {
    Json(NoticesResponse {
        notices: state.game.drain_notices(),
    })
}
