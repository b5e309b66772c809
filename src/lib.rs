pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod game;
pub mod schedule;
pub mod snapping;

pub use config::{Config, Tuning};
pub use db::{init_db, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use domain::{Coordinate, EffectKind, RawFix, TimeMs};
pub use error::AppError;
pub use game::Game;
pub use schedule::{Clock, ManualClock, SystemClock};
pub use snapping::{DisabledSnapper, GoogleRoadsSnapper, MockRoadSnapper, RoadSnapper, SnapError};
