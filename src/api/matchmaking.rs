use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::AppError;
use crate::game::{DuelSession, MatchMode, Opponent, SearchStatus};

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub mode: MatchMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub mode: MatchMode,
    pub resolves_in_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub canceled: bool,
}

#[derive(Debug, Serialize)]
pub struct DeclineResponse {
    pub declined: Option<Opponent>,
}

/// POST /v1/matchmaking/search. Defaults to casual when the body is absent.
pub async fn search(
    State(state): State<AppState>,
    body: Option<Json<SearchRequest>>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let delay = state.game.search_match(req.mode)?;
    Ok(Json(SearchResponse {
        mode: req.mode,
        resolves_in_ms: delay.as_millis() as u64,
    }))
}

pub async fn cancel(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        canceled: state.game.cancel_search(),
    })
}

pub async fn get_status(State(state): State<AppState>) -> Json<SearchStatus> {
    Json(state.game.match_status())
}

pub async fn accept(State(state): State<AppState>) -> Result<Json<DuelSession>, AppError> {
    Ok(Json(state.game.accept_match()?))
}

pub async fn decline(State(state): State<AppState>) -> Json<DeclineResponse> {
    Json(DeclineResponse {
        declined: state.game.decline_match(),
    })
}
