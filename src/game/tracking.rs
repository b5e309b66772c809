//! A tracking run: raw fixes in, filtered distance, smoothed and snapped
//! routes, elapsed time and mission progress out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use super::notices::{NoticeBoard, NoticeKind};
use super::SharedEffects;
use crate::domain::fitness::{calories, format_elapsed};
use crate::domain::missions::{Mission, MissionBoard};
use crate::domain::{Coordinate, EffectWindow, RawFix};
use crate::engine::{
    road_buffer_polygon, DistanceAccumulator, FilterDecision, FilterThresholds, SampleFilter,
    Smoother,
};
use crate::schedule::{lock, Clock, TaskHandle};
use crate::snapping::RoadSnapBatcher;

pub const COUNTDOWN_LABELS: [&str; 4] = ["3", "2", "1", "GO"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingConfig {
    pub filter: FilterThresholds,
    pub smooth_alpha: f64,
    pub road_half_width_meters: f64,
    pub weight_kg: f64,
    pub countdown_step: Duration,
    pub elapsed_tick: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            filter: FilterThresholds::default(),
            smooth_alpha: crate::engine::smoother::DEFAULT_SMOOTH_ALPHA,
            road_half_width_meters: crate::engine::road_polygon::DEFAULT_ROAD_HALF_WIDTH_METERS,
            weight_kg: 70.0,
            countdown_step: Duration::from_millis(900),
            elapsed_tick: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackingPhase {
    Idle,
    CountingDown { label: String },
    Tracking,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("Tracking is not running")]
    NotTracking,
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
}

/// How a single fix was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixVerdict {
    Accepted,
    Drift,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    pub verdict: FixVerdict,
    pub meters_added: f64,
    pub total_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSummary {
    pub phase: TrackingPhase,
    pub elapsed_seconds: u64,
    pub elapsed: String,
    pub distance_meters: f64,
    pub distance_km: f64,
    pub calories: f64,
    pub current: Option<Coordinate>,
    pub accepted_fixes: u64,
    pub rejected_drift: u64,
    pub rejected_jump: u64,
    pub route: Vec<Coordinate>,
    pub smoothed_route: Vec<Coordinate>,
    pub snapped_route: Vec<Coordinate>,
    pub road_polygon: Vec<Coordinate>,
    pub effects: Vec<EffectWindow>,
}

#[derive(Debug)]
struct TrackingState {
    phase: TrackingPhase,
    run_id: u64,
    filter: SampleFilter,
    smoother: Smoother,
    accumulator: DistanceAccumulator,
    missions: MissionBoard,
    route: Vec<Coordinate>,
    smoothed_route: Vec<Coordinate>,
    current: Option<Coordinate>,
    elapsed_seconds: u64,
    accepted_fixes: u64,
    rejected_drift: u64,
    rejected_jump: u64,
    ticker: TaskHandle,
    countdown: Vec<TaskHandle>,
}

#[derive(Debug)]
struct Shared {
    config: TrackingConfig,
    clock: Arc<dyn Clock>,
    effects: SharedEffects,
    batcher: RoadSnapBatcher,
    notices: NoticeBoard,
    state: Mutex<TrackingState>,
}

#[derive(Debug, Clone)]
pub struct TrackingSession {
    shared: Arc<Shared>,
}

impl TrackingSession {
    pub fn new(
        config: TrackingConfig,
        clock: Arc<dyn Clock>,
        effects: SharedEffects,
        batcher: RoadSnapBatcher,
        notices: NoticeBoard,
    ) -> Self {
        let state = TrackingState {
            phase: TrackingPhase::Idle,
            run_id: 0,
            filter: SampleFilter::new(config.filter),
            smoother: Smoother::new(config.smooth_alpha),
            accumulator: DistanceAccumulator::new(),
            missions: MissionBoard::daily(),
            route: Vec::new(),
            smoothed_route: Vec::new(),
            current: None,
            elapsed_seconds: 0,
            accepted_fixes: 0,
            rejected_drift: 0,
            rejected_jump: 0,
            ticker: TaskHandle::idle(),
            countdown: Vec::new(),
        };
        Self {
            shared: Arc::new(Shared {
                config,
                clock,
                effects,
                batcher,
                notices,
                state: Mutex::new(state),
            }),
        }
    }

    /// Live view of the accumulated distance.
    pub fn distance_cell(&self) -> watch::Receiver<f64> {
        lock(&self.shared.state).accumulator.subscribe()
    }

    /// Start tracking immediately. No-op (returns false) when already tracking.
    pub fn start(&self) -> bool {
        let mut state = lock(&self.shared.state);
        if state.phase == TrackingPhase::Tracking {
            return false;
        }
        cancel_countdown(&mut state);
        self.shared.begin(&mut state);
        true
    }

    /// Show "3", "2", "1", "GO" one step apart, then start tracking.
    /// No-op when already tracking; restarts a countdown already running.
    pub fn start_with_countdown(&self) -> bool {
        let mut state = lock(&self.shared.state);
        if state.phase == TrackingPhase::Tracking {
            return false;
        }
        cancel_countdown(&mut state);
        state.run_id += 1;
        let run_id = state.run_id;
        let step = self.shared.config.countdown_step;

        state.phase = TrackingPhase::CountingDown {
            label: String::new(),
        };
        for (i, &label) in COUNTDOWN_LABELS.iter().enumerate() {
            let shared = self.shared.clone();
            state.countdown.push(TaskHandle::after(step * i as u32, move || {
                let mut state = lock(&shared.state);
                let counting = matches!(state.phase, TrackingPhase::CountingDown { .. });
                if state.run_id == run_id && counting {
                    state.phase = TrackingPhase::CountingDown {
                        label: label.to_string(),
                    };
                }
            }));
        }
        let shared = self.shared.clone();
        let total = step * COUNTDOWN_LABELS.len() as u32;
        state.countdown.push(TaskHandle::after(total, move || {
            let mut state = lock(&shared.state);
            let counting = matches!(state.phase, TrackingPhase::CountingDown { .. });
            if state.run_id != run_id || !counting {
                return;
            }
            // The last countdown handle is this task.
            if let Some(mut this) = state.countdown.pop() {
                this.release();
            }
            cancel_countdown(&mut state);
            shared.begin(&mut state);
        }));
        true
    }

    /// Stop tracking or an in-progress countdown. Returns whether anything stopped.
    pub fn stop(&self) -> bool {
        let mut state = lock(&self.shared.state);
        let was_running = state.phase != TrackingPhase::Idle;
        cancel_countdown(&mut state);
        state.ticker.cancel();
        state.run_id += 1;
        state.phase = TrackingPhase::Idle;
        if was_running {
            info!(
                "Tracking stopped: {:.1} m in {}s",
                state.accumulator.total_meters(),
                state.elapsed_seconds
            );
        }
        was_running
    }

    pub fn is_tracking(&self) -> bool {
        lock(&self.shared.state).phase == TrackingPhase::Tracking
    }

    pub fn phase(&self) -> TrackingPhase {
        lock(&self.shared.state).phase.clone()
    }

    /// Feed one raw fix through filter, accumulator, smoother and batcher.
    pub fn on_fix(&self, fix: RawFix) -> Result<FixOutcome, TrackingError> {
        let mut guard = lock(&self.shared.state);
        let state = &mut *guard;
        if state.phase != TrackingPhase::Tracking {
            return Err(TrackingError::NotTracking);
        }
        state.current = Some(fix.coordinate);

        let decision = state.filter.offer(fix);
        let (verdict, meters_added) = match decision {
            FilterDecision::Drift { distance_meters } => {
                debug!("Fix rejected as drift ({:.2} m)", distance_meters);
                state.rejected_drift += 1;
                (FixVerdict::Drift, 0.0)
            }
            FilterDecision::Jump { speed_m_s } => {
                debug!("Fix rejected as jump ({:.1} m/s)", speed_m_s);
                state.rejected_jump += 1;
                (FixVerdict::Jump, 0.0)
            }
            FilterDecision::Accepted { previous, .. } => {
                state.accepted_fixes += 1;
                let added = match previous {
                    Some(from) => {
                        let now = self.shared.clock.now();
                        let mut effects = lock(&self.shared.effects);
                        effects.clear_expired(now);
                        state
                            .accumulator
                            .on_accepted_segment(from, fix.coordinate, &effects, now)
                    }
                    None => 0.0,
                };
                state.route.push(fix.coordinate);
                let smoothed = state.smoother.push(fix.coordinate);
                state.smoothed_route.push(smoothed);
                self.shared.batcher.enqueue(fix.coordinate);
                (FixVerdict::Accepted, added)
            }
        };

        let total_meters = state.accumulator.total_meters();
        if meters_added > 0.0 {
            let now = self.shared.clock.now();
            for mission in state.missions.update(total_meters / 1000.0) {
                info!("Mission {} completed", mission.id);
                self.shared.notices.push(
                    NoticeKind::MissionCompleted,
                    format!("Mission complete: {}", mission.title),
                    now,
                );
            }
        }

        Ok(FixOutcome {
            verdict,
            meters_added,
            total_meters,
        })
    }

    pub fn total_meters(&self) -> f64 {
        lock(&self.shared.state).accumulator.total_meters()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        lock(&self.shared.state).elapsed_seconds
    }

    pub fn missions(&self) -> (Vec<Mission>, f64) {
        let state = lock(&self.shared.state);
        (
            state.missions.missions().to_vec(),
            state.accumulator.total_meters() / 1000.0,
        )
    }

    pub fn summary(&self) -> TrackingSummary {
        let snapped_route = self.shared.batcher.snapped_route();
        let road_polygon =
            road_buffer_polygon(&snapped_route, self.shared.config.road_half_width_meters);
        let effects = lock(&self.shared.effects).active_windows(self.shared.clock.now());

        let state = lock(&self.shared.state);
        let distance_meters = state.accumulator.total_meters();
        TrackingSummary {
            phase: state.phase.clone(),
            elapsed_seconds: state.elapsed_seconds,
            elapsed: format_elapsed(state.elapsed_seconds),
            distance_meters,
            distance_km: distance_meters / 1000.0,
            calories: calories(self.shared.config.weight_kg, distance_meters),
            current: state.current,
            accepted_fixes: state.accepted_fixes,
            rejected_drift: state.rejected_drift,
            rejected_jump: state.rejected_jump,
            route: state.route.clone(),
            smoothed_route: state.smoothed_route.clone(),
            snapped_route,
            road_polygon,
            effects,
        }
    }
}

fn cancel_countdown(state: &mut TrackingState) {
    for mut handle in state.countdown.drain(..) {
        handle.cancel();
    }
}

impl Shared {
    fn begin(self: &Arc<Self>, state: &mut TrackingState) {
        state.ticker.cancel();
        state.run_id += 1;
        state.filter.reset();
        state.smoother.reset();
        state.accumulator.reset();
        state.route.clear();
        state.smoothed_route.clear();
        state.elapsed_seconds = 0;
        state.accepted_fixes = 0;
        state.rejected_drift = 0;
        state.rejected_jump = 0;
        self.batcher.reset();

        let run_id = state.run_id;
        let shared = self.clone();
        state.ticker = TaskHandle::every(self.config.elapsed_tick, move || {
            let mut state = lock(&shared.state);
            if state.run_id == run_id && state.phase == TrackingPhase::Tracking {
                state.elapsed_seconds += 1;
            }
        });
        state.phase = TrackingPhase::Tracking;
        info!("Tracking started (run {})", run_id);
    }
}
