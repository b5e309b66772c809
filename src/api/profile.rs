use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ClanRequest {
    pub clan: String,
}

#[derive(Debug, Serialize)]
pub struct ClanResponse {
    pub clan: Option<String>,
}

pub async fn get_clan(State(state): State<AppState>) -> Result<Json<ClanResponse>, AppError> {
    Ok(Json(ClanResponse {
        clan: state.game.clan().await?,
    }))
}

pub async fn put_clan(
    State(state): State<AppState>,
    Json(req): Json<ClanRequest>,
) -> Result<Json<ClanResponse>, AppError> {
    if req.clan.chars().count() > 64 {
        return Err(AppError::BadRequest("clan must be at most 64 characters".into()));
    }
    let clan = state.game.set_clan(&req.clan).await?;
    Ok(Json(ClanResponse { clan: Some(clan) }))
}
