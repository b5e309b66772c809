//! Domain types for the fitness game.
//!
//! This module provides:
//! - Primitives: TimeMs, Coordinate, RawFix
//! - Great-circle geometry
//! - Timed effects, the item inventory and distance missions
//! - Calorie and elapsed-time formatting helpers

pub mod effects;
pub mod fitness;
pub mod geo;
pub mod inventory;
pub mod missions;
pub mod primitives;

pub use effects::{EffectKind, EffectTimers, EffectWindow, DEFAULT_EFFECT_DURATION_MS};
pub use inventory::{Inventory, InventoryError, InventoryItem};
pub use missions::{Mission, MissionBoard};
pub use primitives::{Coordinate, RawFix, TimeMs};
