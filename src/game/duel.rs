//! Walking duel against a synthetic opponent.
//!
//! `Idle -> Active -> Resolved -> Idle`. While active, a one-second tick adds a
//! random step to the opponent's distance and a single timeout forces
//! resolution. Resolution reads the player's live distance from the tracking
//! session's watch cell, reports exactly once, and resets the session fields
//! after a short grace delay.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::matchmaking::Opponent;
use super::notices::{NoticeBoard, NoticeKind};
use crate::schedule::{lock, Clock, TaskHandle};

pub const DEFAULT_DUEL_DURATION_SECONDS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuelConfig {
    pub duration: Duration,
    pub tick: Duration,
    /// How long resolved session fields stay readable.
    pub grace: Duration,
    /// Opponent step per tick is drawn from `min_step_meters..max_step_meters`.
    pub min_step_meters: f64,
    pub max_step_meters: f64,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(DEFAULT_DUEL_DURATION_SECONDS),
            tick: Duration::from_secs(1),
            grace: Duration::from_millis(300),
            min_step_meters: 0.8,
            max_step_meters: 1.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelPhase {
    Idle,
    Active,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelSession {
    pub id: Uuid,
    pub opponent: Opponent,
    pub opponent_distance_meters: f64,
    pub elapsed_seconds: u64,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelOutcome {
    Win,
    Loss,
    Tie,
}

impl DuelOutcome {
    pub fn classify(player_meters: f64, opponent_meters: f64) -> Self {
        if player_meters > opponent_meters {
            DuelOutcome::Win
        } else if player_meters < opponent_meters {
            DuelOutcome::Loss
        } else {
            DuelOutcome::Tie
        }
    }
}

/// How the duel ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelEnd {
    /// The fixed duration elapsed.
    Expired,
    /// The player stopped early (duel stop or tracking stop).
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelReport {
    pub session_id: Uuid,
    pub opponent_name: String,
    pub player_meters: f64,
    pub opponent_meters: f64,
    pub elapsed_seconds: u64,
    pub outcome: DuelOutcome,
    pub end: DuelEnd,
}

impl DuelReport {
    pub fn message(&self) -> String {
        let you = self.player_meters / 1000.0;
        let them = self.opponent_meters / 1000.0;
        match self.end {
            DuelEnd::Expired => match self.outcome {
                DuelOutcome::Win => format!("You won the duel! {:.2} km x {:.2} km", you, them),
                DuelOutcome::Loss => {
                    format!("You lost the duel... {:.2} km x {:.2} km", you, them)
                }
                DuelOutcome::Tie => format!("Tie! {:.2} km x {:.2} km", you, them),
            },
            DuelEnd::Stopped => format!(
                "Duel ended early ({}). You: {:.2} km, {}: {:.2} km",
                match self.outcome {
                    DuelOutcome::Win => "ahead",
                    DuelOutcome::Loss => "behind",
                    DuelOutcome::Tie => "level",
                },
                you,
                self.opponent_name,
                them
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DuelError {
    #[error("A duel is already in progress")]
    AlreadyActive,
}

#[derive(Debug)]
struct DuelState {
    phase: DuelPhase,
    session: Option<DuelSession>,
    last_report: Option<DuelReport>,
    tick: TaskHandle,
    timeout: TaskHandle,
    grace: TaskHandle,
    rng: StdRng,
}

#[derive(Debug)]
struct Shared {
    config: DuelConfig,
    player_distance: watch::Receiver<f64>,
    clock: Arc<dyn Clock>,
    notices: NoticeBoard,
    state: Mutex<DuelState>,
}

#[derive(Debug, Clone)]
pub struct DuelEngine {
    shared: Arc<Shared>,
}

impl DuelEngine {
    pub fn new(
        config: DuelConfig,
        player_distance: watch::Receiver<f64>,
        clock: Arc<dyn Clock>,
        notices: NoticeBoard,
    ) -> Self {
        Self::with_rng(config, player_distance, clock, notices, StdRng::from_entropy())
    }

    pub fn with_rng(
        config: DuelConfig,
        player_distance: watch::Receiver<f64>,
        clock: Arc<dyn Clock>,
        notices: NoticeBoard,
        rng: StdRng,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                player_distance,
                clock,
                notices,
                state: Mutex::new(DuelState {
                    phase: DuelPhase::Idle,
                    session: None,
                    last_report: None,
                    tick: TaskHandle::idle(),
                    timeout: TaskHandle::idle(),
                    grace: TaskHandle::idle(),
                    rng,
                }),
            }),
        }
    }

    /// Start a duel against `opponent`. A duel still in its grace period is
    /// cleared first; an active one is an error.
    pub fn start(&self, opponent: Opponent) -> Result<Uuid, DuelError> {
        let mut state = lock(&self.shared.state);
        if state.phase == DuelPhase::Active {
            return Err(DuelError::AlreadyActive);
        }
        state.tick.cancel();
        state.timeout.cancel();
        state.grace.cancel();

        let id = Uuid::new_v4();
        info!("Duel {} started against {}", id, opponent.name);
        state.session = Some(DuelSession {
            id,
            opponent,
            opponent_distance_meters: 0.0,
            elapsed_seconds: 0,
            active: true,
        });
        state.last_report = None;
        state.phase = DuelPhase::Active;

        let shared = self.shared.clone();
        state.tick = TaskHandle::every(self.shared.config.tick, move || shared.on_tick(id));
        let shared = self.shared.clone();
        state.timeout = TaskHandle::after(self.shared.config.duration, move || {
            shared.on_timeout(id)
        });

        Ok(id)
    }

    /// Early stop. `None` when no duel is active.
    pub fn stop(&self) -> Option<DuelReport> {
        self.resolve(DuelEnd::Stopped)
    }

    /// Resolve the active duel. Safe to call repeatedly: only the first call
    /// while active reports, later calls return `None`.
    pub fn resolve(&self, end: DuelEnd) -> Option<DuelReport> {
        let mut state = lock(&self.shared.state);
        self.shared.resolve_locked(&mut state, end)
    }

    pub fn phase(&self) -> DuelPhase {
        lock(&self.shared.state).phase
    }

    pub fn is_active(&self) -> bool {
        self.phase() == DuelPhase::Active
    }

    pub fn session(&self) -> Option<DuelSession> {
        lock(&self.shared.state).session.clone()
    }

    pub fn last_report(&self) -> Option<DuelReport> {
        lock(&self.shared.state).last_report.clone()
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        let state = lock(&self.shared.state);
        let session = state.session.as_ref().filter(|s| s.active)?;
        Some(
            self.shared
                .config
                .duration
                .as_secs()
                .saturating_sub(session.elapsed_seconds),
        )
    }

    pub fn player_distance(&self) -> f64 {
        *self.shared.player_distance.borrow()
    }
}

impl Shared {
    fn on_tick(&self, id: Uuid) {
        let mut state = lock(&self.state);
        if state.phase != DuelPhase::Active
            || state.session.as_ref().map(|s| s.id) != Some(id)
        {
            return;
        }
        self.advance_opponent(&mut state);
    }

    /// Number of ticks that fit in the duel.
    fn ticks_in_duel(&self) -> u64 {
        let tick_ms = self.config.tick.as_millis();
        if tick_ms == 0 {
            return 0;
        }
        (self.config.duration.as_millis() / tick_ms) as u64
    }

    fn advance_opponent(&self, state: &mut DuelState) {
        let step = if self.config.max_step_meters > self.config.min_step_meters {
            state
                .rng
                .gen_range(self.config.min_step_meters..self.config.max_step_meters)
        } else {
            self.config.min_step_meters
        };
        if let Some(session) = state.session.as_mut() {
            session.opponent_distance_meters += step;
            session.elapsed_seconds += 1;
        }
    }

    fn on_timeout(self: &Arc<Self>, id: Uuid) {
        let mut state = lock(&self.state);
        if state.session.as_ref().map(|s| s.id) != Some(id) {
            return;
        }
        // Running inside the timeout task: detach rather than abort ourselves.
        state.timeout.release();
        // A tick due at the same instant as the timeout still counts.
        if state.phase == DuelPhase::Active {
            let due = self.ticks_in_duel();
            while state
                .session
                .as_ref()
                .is_some_and(|s| s.elapsed_seconds < due)
            {
                self.advance_opponent(&mut state);
            }
        }
        self.resolve_locked(&mut state, DuelEnd::Expired);
    }

    fn resolve_locked(self: &Arc<Self>, state: &mut DuelState, end: DuelEnd) -> Option<DuelReport> {
        if state.phase != DuelPhase::Active {
            return None;
        }
        state.tick.cancel();
        state.timeout.cancel();

        let session = state.session.as_mut()?;
        session.active = false;

        let player_meters = *self.player_distance.borrow();
        let opponent_meters = session.opponent_distance_meters;
        let report = DuelReport {
            session_id: session.id,
            opponent_name: session.opponent.name.clone(),
            player_meters,
            opponent_meters,
            elapsed_seconds: session.elapsed_seconds,
            outcome: DuelOutcome::classify(player_meters, opponent_meters),
            end,
        };
        let id = session.id;

        state.phase = DuelPhase::Resolved;
        state.last_report = Some(report.clone());
        info!(
            "Duel {} resolved ({:?}, {:?}): {:.1} m vs {:.1} m",
            id, end, report.outcome, player_meters, opponent_meters
        );
        self.notices
            .push(NoticeKind::DuelResult, report.message(), self.clock.now());

        let shared = self.clone();
        state.grace = TaskHandle::after(self.config.grace, move || shared.on_grace_elapsed(id));

        Some(report)
    }

    fn on_grace_elapsed(&self, id: Uuid) {
        let mut state = lock(&self.state);
        if state.phase != DuelPhase::Resolved
            || state.session.as_ref().map(|s| s.id) != Some(id)
        {
            return;
        }
        state.grace.release();
        state.session = None;
        state.phase = DuelPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeMs;
    use crate::schedule::ManualClock;

    fn opponent() -> Opponent {
        Opponent {
            id: "op_1".to_string(),
            name: "Henrique".to_string(),
            level: 9,
        }
    }

    fn engine(config: DuelConfig) -> (DuelEngine, watch::Sender<f64>, NoticeBoard) {
        let (tx, rx) = watch::channel(0.0);
        let notices = NoticeBoard::new();
        let engine = DuelEngine::with_rng(
            config,
            rx,
            Arc::new(ManualClock::new(TimeMs::new(0))),
            notices.clone(),
            StdRng::seed_from_u64(42),
        );
        (engine, tx, notices)
    }

    #[test]
    fn test_classify() {
        assert_eq!(DuelOutcome::classify(3000.0, 2500.0), DuelOutcome::Win);
        assert_eq!(DuelOutcome::classify(2500.0, 3000.0), DuelOutcome::Loss);
        assert_eq!(DuelOutcome::classify(2500.0, 2500.0), DuelOutcome::Tie);
    }

    #[test]
    fn test_messages_differ_for_stop_and_expiry() {
        let mut report = DuelReport {
            session_id: Uuid::nil(),
            opponent_name: "Thiago".to_string(),
            player_meters: 3000.0,
            opponent_meters: 2500.0,
            elapsed_seconds: 600,
            outcome: DuelOutcome::Win,
            end: DuelEnd::Expired,
        };
        assert_eq!(report.message(), "You won the duel! 3.00 km x 2.50 km");

        report.end = DuelEnd::Stopped;
        assert_eq!(
            report.message(),
            "Duel ended early (ahead). You: 3.00 km, Thiago: 2.50 km"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_advances_opponent_within_step_bounds() {
        let (engine, _tx, _notices) = engine(DuelConfig::default());
        engine.start(opponent()).unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let session = engine.session().unwrap();
        assert_eq!(session.elapsed_seconds, 10);
        assert!(session.opponent_distance_meters >= 8.0);
        assert!(session.opponent_distance_meters < 17.0);
        assert_eq!(engine.remaining_seconds(), Some(590));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_active_is_rejected() {
        let (engine, _tx, _notices) = engine(DuelConfig::default());
        engine.start(opponent()).unwrap();
        assert_eq!(engine.start(opponent()), Err(DuelError::AlreadyActive));
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_period_then_idle() {
        let (engine, _tx, _notices) = engine(DuelConfig::default());
        engine.start(opponent()).unwrap();
        engine.stop().unwrap();

        assert_eq!(engine.phase(), DuelPhase::Resolved);
        assert!(engine.session().is_some());

        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(engine.phase(), DuelPhase::Idle);
        assert!(engine.session().is_none());
        assert!(engine.last_report().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_during_grace_keeps_new_session() {
        let (engine, _tx, _notices) = engine(DuelConfig::default());
        engine.start(opponent()).unwrap();
        engine.stop().unwrap();
        let second = engine.start(opponent()).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(engine.phase(), DuelPhase::Active);
        assert_eq!(engine.session().map(|s| s.id), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_on_whole_second_counts_final_tick() {
        let config = DuelConfig {
            duration: Duration::from_secs(3),
            min_step_meters: 1.0,
            max_step_meters: 1.0,
            ..DuelConfig::default()
        };
        let (engine, _tx, _notices) = engine(config);
        engine.start(opponent()).unwrap();

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        let report = engine.last_report().unwrap();
        assert_eq!(report.end, DuelEnd::Expired);
        assert_eq!(report.elapsed_seconds, 3);
        assert_eq!(report.opponent_meters, 3.0);
    }
}
