pub mod duel;
pub mod health;
pub mod inventory;
pub mod matchmaking;
pub mod notices;
pub mod profile;
pub mod tracking;

use crate::game::Game;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Game>,
}

impl AppState {
    pub fn new(game: Arc<Game>) -> Self {
        Self { game }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/tracking", get(tracking::get_tracking))
        .route("/v1/tracking/start", post(tracking::start_tracking))
        .route("/v1/tracking/stop", post(tracking::stop_tracking))
        .route("/v1/tracking/fixes", post(tracking::post_fix))
        .route(
            "/v1/tracking/location-error",
            post(tracking::post_location_error),
        )
        .route("/v1/missions", get(tracking::get_missions))
        .route("/v1/inventory", get(inventory::get_inventory))
        .route("/v1/inventory/:item_id/use", post(inventory::use_item))
        .route("/v1/effects", get(inventory::get_effects))
        .route("/v1/matchmaking", get(matchmaking::get_status))
        .route("/v1/matchmaking/search", post(matchmaking::search))
        .route("/v1/matchmaking/cancel", post(matchmaking::cancel))
        .route("/v1/matchmaking/accept", post(matchmaking::accept))
        .route("/v1/matchmaking/decline", post(matchmaking::decline))
        .route("/v1/duel", get(duel::get_duel))
        .route("/v1/duel/stop", post(duel::stop_duel))
        .route("/v1/notices", get(notices::drain_notices))
        .route(
            "/v1/profile/clan",
            get(profile::get_clan).put(profile::put_clan),
        )
        .layer(cors)
        .with_state(state)
}
