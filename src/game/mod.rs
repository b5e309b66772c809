//! Stateful game components and the [`Game`] that wires them together.
//!
//! Each component keeps its state behind its own mutex and drives its own
//! timers. Components that read the live effects share one
//! [`SharedEffects`] cell.

use std::sync::{Arc, Mutex};

use crate::domain::EffectTimers;

pub mod duel;
pub mod matchmaking;
pub mod notices;
pub mod session;
pub mod tracking;

pub use duel::{DuelEnd, DuelEngine, DuelError, DuelOutcome, DuelPhase, DuelReport, DuelSession};
pub use matchmaking::{
    MatchMode, MatchmakingError, MatchmakingSimulator, Opponent, SearchStatus,
};
pub use notices::{Notice, NoticeBoard, NoticeKind};
pub use session::{DuelView, Game, GameError, MissionProgress, TrackingStop, CLAN_KEY};
pub use tracking::{FixOutcome, FixVerdict, TrackingError, TrackingSession, TrackingSummary};

/// Boost and shield windows, shared by tracking, matchmaking and the inventory.
pub type SharedEffects = Arc<Mutex<EffectTimers>>;
