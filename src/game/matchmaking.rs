//! Simulated matchmaking: a delayed, cancelable pairing with a synthetic opponent.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::notices::{NoticeBoard, NoticeKind};
use super::SharedEffects;
use crate::domain::{EffectKind, TimeMs};
use crate::schedule::{lock, Clock, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Casual,
    Ranked,
}

impl MatchMode {
    /// Synthetic opponents are named after the queue they come from.
    pub fn opponent_name(self) -> &'static str {
        match self {
            MatchMode::Casual => "Henrique",
            MatchMode::Ranked => "Thiago",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Opponent {
    pub id: String,
    pub name: String,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    User,
    ShieldActivated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchStatus {
    Idle,
    #[serde(rename_all = "camelCase")]
    Searching { mode: MatchMode, resolves_in_ms: u64 },
    Matched { opponent: Opponent },
    Canceled { reason: CancelReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchmakingError {
    #[error("Shield active until {0:?}; matchmaking unavailable")]
    ShieldActive(TimeMs),
    #[error("No opponent has been found")]
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchmakingConfig {
    /// Search delay is drawn from `min_delay_ms..max_delay_ms`.
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Opponent level is drawn from `min_level..max_level`.
    pub min_level: u32,
    pub max_level: u32,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2000,
            max_delay_ms: 6000,
            min_level: 8,
            max_level: 18,
        }
    }
}

#[derive(Debug)]
struct SearchState {
    status: SearchStatus,
    search_id: u64,
    pending: TaskHandle,
    resolves_at: Option<tokio::time::Instant>,
    rng: StdRng,
}

#[derive(Debug)]
struct Shared {
    config: MatchmakingConfig,
    effects: SharedEffects,
    clock: Arc<dyn Clock>,
    notices: NoticeBoard,
    state: Mutex<SearchState>,
}

#[derive(Debug, Clone)]
pub struct MatchmakingSimulator {
    shared: Arc<Shared>,
}

impl MatchmakingSimulator {
    pub fn new(
        config: MatchmakingConfig,
        effects: SharedEffects,
        clock: Arc<dyn Clock>,
        notices: NoticeBoard,
    ) -> Self {
        Self::with_rng(config, effects, clock, notices, StdRng::from_entropy())
    }

    pub fn with_rng(
        config: MatchmakingConfig,
        effects: SharedEffects,
        clock: Arc<dyn Clock>,
        notices: NoticeBoard,
        rng: StdRng,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                effects,
                clock,
                notices,
                state: Mutex::new(SearchState {
                    status: SearchStatus::Idle,
                    search_id: 0,
                    pending: TaskHandle::idle(),
                    resolves_at: None,
                    rng,
                }),
            }),
        }
    }

    /// Start searching in `mode`, replacing any search already running.
    /// Returns the delay after which the search resolves.
    pub fn search(&self, mode: MatchMode) -> Result<Duration, MatchmakingError> {
        let now = self.shared.clock.now();
        if let Some(expires_at) = lock(&self.shared.effects).expires_at(EffectKind::Shield, now) {
            return Err(MatchmakingError::ShieldActive(expires_at));
        }

        let mut state = lock(&self.shared.state);
        state.pending.cancel();
        state.search_id += 1;

        let config = self.shared.config;
        let delay_ms = if config.max_delay_ms > config.min_delay_ms {
            state.rng.gen_range(config.min_delay_ms..config.max_delay_ms)
        } else {
            config.min_delay_ms
        };
        let delay = Duration::from_millis(delay_ms);

        let search_id = state.search_id;
        let shared = self.shared.clone();
        state.pending = TaskHandle::after(delay, move || shared.resolve(search_id, mode));
        state.resolves_at = Some(tokio::time::Instant::now() + delay);
        state.status = SearchStatus::Searching {
            mode,
            resolves_in_ms: delay_ms,
        };

        info!("Matchmaking search #{} started ({:?}, {}ms)", search_id, mode, delay_ms);
        Ok(delay)
    }

    /// Abort the running search. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        let mut state = lock(&self.shared.state);
        state.pending.cancel();
        state.resolves_at = None;
        if matches!(state.status, SearchStatus::Searching { .. }) {
            state.search_id += 1;
            state.status = SearchStatus::Canceled {
                reason: CancelReason::User,
            };
            info!("Matchmaking search canceled by user");
            true
        } else {
            false
        }
    }

    pub fn status(&self) -> SearchStatus {
        let state = lock(&self.shared.state);
        match (&state.status, state.resolves_at) {
            (SearchStatus::Searching { mode, .. }, Some(at)) => SearchStatus::Searching {
                mode: *mode,
                resolves_in_ms: at
                    .saturating_duration_since(tokio::time::Instant::now())
                    .as_millis() as u64,
            },
            (status, _) => status.clone(),
        }
    }

    pub fn is_searching(&self) -> bool {
        matches!(lock(&self.shared.state).status, SearchStatus::Searching { .. })
    }

    /// Hand over the found opponent, returning the simulator to idle.
    pub fn take_match(&self) -> Result<Opponent, MatchmakingError> {
        let mut state = lock(&self.shared.state);
        match std::mem::replace(&mut state.status, SearchStatus::Idle) {
            SearchStatus::Matched { opponent } => Ok(opponent),
            other => {
                state.status = other;
                Err(MatchmakingError::NoMatch)
            }
        }
    }

    /// Discard the found opponent, if any.
    pub fn decline(&self) -> Option<Opponent> {
        self.take_match().ok()
    }
}

impl Shared {
    fn resolve(&self, search_id: u64, mode: MatchMode) {
        let now = self.clock.now();
        // The shield may have been switched on while we were waiting.
        let shielded = lock(&self.effects).is_active(EffectKind::Shield, now);

        let mut state = lock(&self.state);
        if state.search_id != search_id || !matches!(state.status, SearchStatus::Searching { .. })
        {
            return;
        }
        state.pending.release();
        state.resolves_at = None;

        if shielded {
            state.status = SearchStatus::Canceled {
                reason: CancelReason::ShieldActivated,
            };
            info!("Matchmaking search #{} canceled: shield activated", search_id);
            self.notices.push(
                NoticeKind::SearchCanceled,
                "Your shield was activated during the search; search canceled.",
                now,
            );
            return;
        }

        let config = self.config;
        let level = if config.max_level > config.min_level {
            state.rng.gen_range(config.min_level..config.max_level)
        } else {
            config.min_level
        };
        let opponent = Opponent {
            id: format!("op_{}", state.rng.gen_range(0..10_000)),
            name: mode.opponent_name().to_string(),
            level,
        };
        info!(
            "Matchmaking search #{} matched {} (level {})",
            search_id, opponent.name, opponent.level
        );
        self.notices.push(
            NoticeKind::MatchFound,
            format!("Opponent found: {} (level {})", opponent.name, opponent.level),
            now,
        );
        state.status = SearchStatus::Matched { opponent };
    }
}
