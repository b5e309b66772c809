use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::{EffectWindow, InventoryItem};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UseItemResponse {
    pub item_id: String,
    pub effect: EffectWindow,
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Serialize)]
pub struct EffectsResponse {
    pub effects: Vec<EffectWindow>,
}

pub async fn get_inventory(State(state): State<AppState>) -> Json<InventoryResponse> {
    Json(InventoryResponse {
        items: state.game.inventory(),
    })
}

pub async fn use_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<UseItemResponse>, AppError> {
    let effect = state.game.use_item(&item_id)?;
    Ok(Json(UseItemResponse {
        item_id,
        effect,
        items: state.game.inventory(),
    }))
}

pub async fn get_effects(State(state): State<AppState>) -> Json<EffectsResponse> {
    Json(EffectsResponse {
        effects: state.game.effects(),
    })
}
