//! The game session: one player, their tracking run, inventory, matchmaking
//! and duel, wired to a shared effect cell and notice board.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::duel::{DuelEnd, DuelEngine, DuelError, DuelPhase, DuelReport, DuelSession};
use super::matchmaking::{
    MatchMode, MatchmakingError, MatchmakingSimulator, Opponent, SearchStatus,
};
use super::notices::{Notice, NoticeBoard, NoticeKind};
use super::tracking::{FixOutcome, TrackingError, TrackingSession, TrackingSummary};
use super::SharedEffects;
use crate::config::Tuning;
use crate::db::{KeyValueStore, StoreError};
use crate::domain::{
    EffectTimers, EffectWindow, Inventory, InventoryError, InventoryItem, Mission, RawFix, TimeMs,
};
use crate::schedule::{lock, Clock};
use crate::snapping::{RoadSnapBatcher, RoadSnapper};

/// Store key holding the player's clan name.
pub const CLAN_KEY: &str = "game_profile_clan";

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Matchmaking(#[from] MatchmakingError),
    #[error(transparent)]
    Duel(#[from] DuelError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionProgress {
    #[serde(flatten)]
    pub mission: Mission,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelView {
    pub phase: DuelPhase,
    pub session: Option<DuelSession>,
    pub remaining_seconds: Option<u64>,
    pub player_meters: f64,
    pub last_report: Option<DuelReport>,
}

/// What stopping a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStop {
    pub stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duel: Option<DuelReport>,
}

#[derive(Debug)]
pub struct Game {
    tuning: Tuning,
    clock: Arc<dyn Clock>,
    effects: SharedEffects,
    notices: NoticeBoard,
    inventory: Mutex<Inventory>,
    tracking: TrackingSession,
    matchmaking: MatchmakingSimulator,
    duel: DuelEngine,
    store: Arc<dyn KeyValueStore>,
}

impl Game {
    pub fn new(
        tuning: Tuning,
        snapper: Arc<dyn RoadSnapper>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::build(tuning, snapper, store, clock, StdRng::from_entropy())
    }

    /// Same as [`Game::new`] with matchmaking and duel randomness seeded.
    pub fn with_seed(
        tuning: Tuning,
        snapper: Arc<dyn RoadSnapper>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Self {
        Self::build(tuning, snapper, store, clock, StdRng::seed_from_u64(seed))
    }

    fn build(
        tuning: Tuning,
        snapper: Arc<dyn RoadSnapper>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        mut rng: StdRng,
    ) -> Self {
        let effects: SharedEffects = Arc::new(Mutex::new(EffectTimers::new()));
        let notices = NoticeBoard::new();
        let batcher = RoadSnapBatcher::new(snapper, tuning.snap_config());

        let tracking = TrackingSession::new(
            tuning.tracking_config(),
            clock.clone(),
            effects.clone(),
            batcher,
            notices.clone(),
        );
        let matchmaking = MatchmakingSimulator::with_rng(
            tuning.matchmaking_config(),
            effects.clone(),
            clock.clone(),
            notices.clone(),
            StdRng::from_rng(&mut rng).unwrap_or_else(|_| StdRng::seed_from_u64(0)),
        );
        let duel = DuelEngine::with_rng(
            tuning.duel_config(),
            tracking.distance_cell(),
            clock.clone(),
            notices.clone(),
            rng,
        );

        Self {
            tuning,
            clock,
            effects,
            notices,
            inventory: Mutex::new(Inventory::starter()),
            tracking,
            matchmaking,
            duel,
            store,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn now(&self) -> TimeMs {
        self.clock.now()
    }

    // ---- tracking ----

    /// Start a run, optionally behind the 3-2-1-GO countdown.
    /// Returns false when already tracking.
    pub fn start_tracking(&self, countdown: bool) -> bool {
        if countdown {
            self.tracking.start_with_countdown()
        } else {
            self.tracking.start()
        }
    }

    /// Stop the run. An active duel ends early with the current distances.
    pub fn stop_tracking(&self) -> TrackingStop {
        TrackingStop {
            stopped: self.tracking.stop(),
            duel: self.duel.resolve(DuelEnd::Stopped),
        }
    }

    pub fn record_fix(&self, fix: RawFix) -> Result<FixOutcome, GameError> {
        Ok(self.tracking.on_fix(fix)?)
    }

    /// The location provider failed: stop tracking and tell the player.
    pub fn report_location_error(&self, message: &str) -> TrackingStop {
        warn!("Location provider error: {}", message);
        let stopped = self.tracking.stop();
        self.notices.push(
            NoticeKind::LocationError,
            TrackingError::LocationUnavailable(message.to_string()).to_string(),
            self.clock.now(),
        );
        TrackingStop {
            stopped,
            duel: self.duel.resolve(DuelEnd::Stopped),
        }
    }

    pub fn tracking_summary(&self) -> TrackingSummary {
        self.tracking.summary()
    }

    // ---- inventory and effects ----

    pub fn inventory(&self) -> Vec<InventoryItem> {
        lock(&self.inventory).items().to_vec()
    }

    /// Consume one unit of `item_id` and switch its effect on for the
    /// configured duration. Reusing an effect restarts its window.
    pub fn use_item(&self, item_id: &str) -> Result<EffectWindow, GameError> {
        let now = self.clock.now();
        let item = match lock(&self.inventory).consume(item_id) {
            Ok(item) => item,
            Err(e) => {
                self.notices
                    .push(NoticeKind::ItemUnavailable, e.to_string(), now);
                return Err(e.into());
            }
        };

        let expires_at_ms =
            lock(&self.effects).activate(item.effect, now, self.tuning.effect_duration_ms);
        info!("Item {} used, {} active until {:?}", item.id, item.effect, expires_at_ms);
        let minutes = self.tuning.effect_duration_ms / 60_000;
        self.notices.push(
            NoticeKind::ItemUsed,
            format!("{} activated for {} minutes", item.name, minutes),
            now,
        );

        Ok(EffectWindow {
            kind: item.effect,
            expires_at_ms,
        })
    }

    pub fn effects(&self) -> Vec<EffectWindow> {
        let now = self.clock.now();
        let mut effects = lock(&self.effects);
        effects.clear_expired(now);
        effects.active_windows(now)
    }

    pub fn missions(&self) -> Vec<MissionProgress> {
        let (missions, km) = self.tracking.missions();
        missions
            .into_iter()
            .map(|mission| MissionProgress {
                percent: mission.percent(km),
                mission,
            })
            .collect()
    }

    // ---- matchmaking ----

    pub fn search_match(&self, mode: MatchMode) -> Result<Duration, GameError> {
        match self.matchmaking.search(mode) {
            Ok(delay) => Ok(delay),
            Err(e) => {
                self.notices
                    .push(NoticeKind::SearchBlocked, e.to_string(), self.clock.now());
                Err(e.into())
            }
        }
    }

    pub fn cancel_search(&self) -> bool {
        self.matchmaking.cancel()
    }

    pub fn match_status(&self) -> SearchStatus {
        self.matchmaking.status()
    }

    /// Accept the found opponent and start the duel against them.
    pub fn accept_match(&self) -> Result<DuelSession, GameError> {
        if self.duel.is_active() {
            return Err(DuelError::AlreadyActive.into());
        }
        let opponent = self.matchmaking.take_match()?;
        self.duel.start(opponent)?;
        self.duel
            .session()
            .ok_or_else(|| GameError::Duel(DuelError::AlreadyActive))
    }

    pub fn decline_match(&self) -> Option<Opponent> {
        self.matchmaking.decline()
    }

    // ---- duel ----

    pub fn duel(&self) -> DuelView {
        DuelView {
            phase: self.duel.phase(),
            session: self.duel.session(),
            remaining_seconds: self.duel.remaining_seconds(),
            player_meters: self.duel.player_distance(),
            last_report: self.duel.last_report(),
        }
    }

    pub fn stop_duel(&self) -> Option<DuelReport> {
        self.duel.stop()
    }

    // ---- notices and profile ----

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub async fn clan(&self) -> Result<Option<String>, GameError> {
        Ok(self.store.get_string(CLAN_KEY).await?)
    }

    pub async fn set_clan(&self, clan: &str) -> Result<String, GameError> {
        let clan = clan.trim().to_string();
        self.store.set_string(CLAN_KEY, &clan).await?;
        self.notices
            .push(NoticeKind::ProfileSaved, "Clan saved!", self.clock.now());
        Ok(clan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKeyValueStore;
    use crate::domain::inventory::{BOOST_ITEM_ID, SHIELD_ITEM_ID};
    use crate::domain::{Coordinate, EffectKind};
    use crate::schedule::ManualClock;
    use crate::snapping::MockRoadSnapper;

    fn game() -> (Game, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(TimeMs::new(0)));
        let game = Game::with_seed(
            Tuning::default(),
            Arc::new(MockRoadSnapper::new()),
            Arc::new(MemoryKeyValueStore::new()),
            clock.clone(),
            7,
        );
        (game, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_use_item_consumes_and_activates() {
        let (game, clock) = game();
        let window = game.use_item(BOOST_ITEM_ID).unwrap();
        assert_eq!(window.kind, EffectKind::Boost);
        assert_eq!(window.expires_at_ms, TimeMs::new(3_600_000));
        assert_eq!(game.effects().len(), 1);

        let err = game.use_item(BOOST_ITEM_ID).unwrap_err();
        assert!(matches!(err, GameError::Inventory(InventoryError::Unavailable(_))));

        let notices = game.drain_notices();
        assert_eq!(notices[0].kind, NoticeKind::ItemUsed);
        assert_eq!(notices[1].kind, NoticeKind::ItemUnavailable);

        clock.advance(3_600_000);
        assert!(game.effects().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_item_rejected_without_mutation() {
        let (game, _) = game();
        let before = game.inventory();
        assert!(matches!(
            game.use_item("potion"),
            Err(GameError::Inventory(InventoryError::UnknownItem(_)))
        ));
        assert_eq!(game.inventory(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shield_blocks_search() {
        let (game, _) = game();
        game.use_item(SHIELD_ITEM_ID).unwrap();
        game.drain_notices();

        assert!(matches!(
            game.search_match(MatchMode::Casual),
            Err(GameError::Matchmaking(MatchmakingError::ShieldActive(_)))
        ));
        let notices = game.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::SearchBlocked);
        assert_eq!(game.match_status(), SearchStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_match_starts_duel() {
        let (game, _) = game();
        assert!(matches!(
            game.accept_match(),
            Err(GameError::Matchmaking(MatchmakingError::NoMatch))
        ));

        game.search_match(MatchMode::Ranked).unwrap();
        tokio::time::sleep(Duration::from_millis(6000)).await;
        let session = game.accept_match().unwrap();
        assert_eq!(session.opponent.name, "Thiago");
        assert_eq!(game.duel().phase, DuelPhase::Active);
        assert_eq!(game.match_status(), SearchStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_tracking_forces_duel_resolution() {
        let (game, _) = game();
        game.start_tracking(false);
        game.record_fix(RawFix::new(Coordinate::new(0.0, 0.0), TimeMs::new(0)))
            .unwrap();

        game.search_match(MatchMode::Casual).unwrap();
        tokio::time::sleep(Duration::from_millis(6000)).await;
        game.accept_match().unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let stop = game.stop_tracking();
        assert!(stop.stopped);
        let report = stop.duel.expect("duel should resolve");
        assert_eq!(report.end, DuelEnd::Stopped);
        assert_eq!(report.elapsed_seconds, 2);
        assert_eq!(game.duel().phase, DuelPhase::Resolved);
        assert_eq!(
            game.stop_tracking(),
            TrackingStop {
                stopped: false,
                duel: None
            }
        );

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(game.duel().phase, DuelPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_error_stops_tracking_and_notifies() {
        let (game, _) = game();
        game.start_tracking(false);
        let stop = game.report_location_error("permission denied");
        assert!(stop.stopped);
        assert!(stop.duel.is_none());
        assert!(!game.tracking.is_tracking());

        let notices = game.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::LocationError);
        assert!(notices[0].message.contains("permission denied"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_error_while_idle_still_notifies() {
        let (game, _) = game();
        let stop = game.report_location_error("Geolocation not supported");
        assert!(!stop.stopped);
        assert!(stop.duel.is_none());

        let notices = game.drain_notices();
        let location_errors: Vec<_> = notices
            .iter()
            .filter(|n| n.kind == NoticeKind::LocationError)
            .collect();
        assert_eq!(location_errors.len(), 1);
        assert!(location_errors[0].message.contains("Geolocation not supported"));
    }

    #[tokio::test]
    async fn test_clan_round_trip() {
        let (game, _) = game();
        assert_eq!(game.clan().await.unwrap(), None);
        assert_eq!(game.set_clan("  Lobos ").await.unwrap(), "Lobos");
        assert_eq!(game.clan().await.unwrap(), Some("Lobos".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missions_report_percent() {
        let (game, _) = game();
        game.start_tracking(false);
        let origin = Coordinate::new(0.0, 0.0);
        game.record_fix(RawFix::new(origin, TimeMs::new(0))).unwrap();
        game.record_fix(RawFix::new(
            crate::domain::geo::destination(origin, 1000.0, 0.0),
            TimeMs::new(100_000),
        ))
        .unwrap();

        let missions = game.missions();
        assert_eq!(missions.len(), 3);
        assert_eq!(missions[0].percent, 50);
        assert_eq!(missions[1].percent, 20);
        assert!(!missions[0].mission.completed);
    }
}
