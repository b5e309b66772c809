use std::net::SocketAddr;
use std::sync::Arc;
use trailduel::{
    api, config::Config, db::init_db, DisabledSnapper, Game, GoogleRoadsSnapper, RoadSnapper,
    SqliteKeyValueStore, SystemClock,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(SqliteKeyValueStore::new(pool));

    let snapper: Arc<dyn RoadSnapper> = match &config.roads_api_key {
        Some(key) => Arc::new(GoogleRoadsSnapper::new(
            config.roads_api_url.clone(),
            key.clone(),
        )),
        None => {
            tracing::warn!("ROADS_API_KEY not set; routes will not be snapped to roads");
            Arc::new(DisabledSnapper)
        }
    };

    let game = Arc::new(Game::new(
        config.tuning,
        snapper,
        store,
        Arc::new(SystemClock),
    ));

    let app = api::create_router(api::AppState::new(game));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
