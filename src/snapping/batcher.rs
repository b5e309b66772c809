//! Batches accepted points for the road-snapping service.
//!
//! Points are queued until either `batch_size` is reached (immediate flush) or
//! `delay` passes without another enqueue (debounced flush). A flush drains the
//! whole queue into one numbered batch; batches are merged into the snapped
//! route strictly in drain order, whatever order their responses arrive in.
//! A failed or empty response merges the raw batch instead.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::RoadSnapper;
use crate::domain::geo::distance_meters;
use crate::domain::Coordinate;
use crate::schedule::{lock, TaskHandle};

pub const DEFAULT_SNAP_BATCH_SIZE: usize = 8;
pub const DEFAULT_SNAP_DELAY_MS: u64 = 700;
pub const DEFAULT_SNAP_DEDUP_METERS: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapConfig {
    pub batch_size: usize,
    pub delay: Duration,
    /// Adjacent route points closer than this collapse into one.
    pub dedup_meters: f64,
    pub interpolate: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_SNAP_BATCH_SIZE,
            delay: Duration::from_millis(DEFAULT_SNAP_DELAY_MS),
            dedup_meters: DEFAULT_SNAP_DEDUP_METERS,
            interpolate: true,
        }
    }
}

/// What `enqueue` did with the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The queue hit the batch size and was drained into a flush.
    Flushing { batch_len: usize },
    /// The debounced flush was (re)scheduled.
    Scheduled { pending: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatcherStats {
    pub batches: u64,
    pub snapped: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Default)]
struct BatcherState {
    queue: Vec<Coordinate>,
    route: Vec<Coordinate>,
    debounce: TaskHandle,
    debounce_token: u64,
    flights: Vec<TaskHandle>,
    next_batch: u64,
    next_merge: u64,
    // Finished batches waiting for an earlier batch to merge first.
    ready: BTreeMap<u64, Vec<Coordinate>>,
    generation: u64,
    stats: BatcherStats,
}

#[derive(Debug)]
struct Shared {
    snapper: Arc<dyn RoadSnapper>,
    config: SnapConfig,
    state: Mutex<BatcherState>,
}

#[derive(Debug)]
struct Batch {
    seq: u64,
    generation: u64,
    points: Vec<Coordinate>,
}

/// Cheap to clone; clones share one queue and route.
#[derive(Debug, Clone)]
pub struct RoadSnapBatcher {
    shared: Arc<Shared>,
}

impl RoadSnapBatcher {
    pub fn new(snapper: Arc<dyn RoadSnapper>, config: SnapConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                snapper,
                config: SnapConfig {
                    batch_size: config.batch_size.max(1),
                    ..config
                },
                state: Mutex::new(BatcherState::default()),
            }),
        }
    }

    pub fn config(&self) -> SnapConfig {
        self.shared.config
    }

    /// Queue `point` for snapping. Must be called from within a tokio runtime.
    pub fn enqueue(&self, point: Coordinate) -> EnqueueOutcome {
        let mut state = lock(&self.shared.state);
        state.queue.push(point);

        if state.queue.len() >= self.shared.config.batch_size {
            state.debounce.cancel();
            state.debounce_token += 1;
            state.flights.retain(TaskHandle::is_pending);

            let batch = drain(&mut state);
            let batch_len = batch.points.len();
            let shared = self.shared.clone();
            state
                .flights
                .push(TaskHandle::spawn(async move { shared.submit(batch).await }));
            return EnqueueOutcome::Flushing { batch_len };
        }

        state.debounce.cancel();
        state.debounce_token += 1;
        let token = state.debounce_token;
        let shared = self.shared.clone();
        let delay = self.shared.config.delay;
        state.debounce = TaskHandle::spawn(async move {
            tokio::time::sleep(delay).await;
            let batch = {
                let mut state = lock(&shared.state);
                if state.debounce_token != token || state.queue.is_empty() {
                    return;
                }
                // This task now carries a drained batch; it must not be
                // aborted by the next enqueue rescheduling the debounce.
                let this = std::mem::take(&mut state.debounce);
                state.flights.retain(TaskHandle::is_pending);
                state.flights.push(this);
                drain(&mut state)
            };
            shared.submit(batch).await;
        });

        EnqueueOutcome::Scheduled {
            pending: state.queue.len(),
        }
    }

    /// Drain whatever is queued right now and wait for it to merge. Returns
    /// the batch size (0 when the queue was empty).
    ///
    /// The submit runs as a flight of its own, so dropping this future does
    /// not lose the batch.
    pub async fn flush(&self) -> usize {
        let (len, merged) = {
            let mut state = lock(&self.shared.state);
            if state.queue.is_empty() {
                return 0;
            }
            state.debounce.cancel();
            state.debounce_token += 1;
            state.flights.retain(TaskHandle::is_pending);

            let batch = drain(&mut state);
            let len = batch.points.len();
            let (done_tx, done_rx) = oneshot::channel();
            let shared = self.shared.clone();
            state.flights.push(TaskHandle::spawn(async move {
                shared.submit(batch).await;
                let _ = done_tx.send(());
            }));
            (len, done_rx)
        };
        // A reset aborts the flight and closes the channel; either way we are done.
        let _ = merged.await;
        len
    }

    /// Discard the queue, the route and any in-flight batches.
    pub fn reset(&self) {
        let mut state = lock(&self.shared.state);
        state.debounce.cancel();
        state.debounce_token += 1;
        for flight in state.flights.iter_mut() {
            flight.cancel();
        }
        state.flights.clear();
        state.queue.clear();
        state.route.clear();
        state.ready.clear();
        state.next_batch = 0;
        state.next_merge = 0;
        state.generation += 1;
        state.stats = BatcherStats::default();
    }

    pub fn snapped_route(&self) -> Vec<Coordinate> {
        lock(&self.shared.state).route.clone()
    }

    /// Points queued and not yet drained.
    pub fn pending(&self) -> usize {
        lock(&self.shared.state).queue.len()
    }

    /// Drained batches not yet merged.
    pub fn outstanding_batches(&self) -> u64 {
        let state = lock(&self.shared.state);
        state.next_batch - state.next_merge
    }

    pub fn stats(&self) -> BatcherStats {
        lock(&self.shared.state).stats
    }
}

fn drain(state: &mut BatcherState) -> Batch {
    let seq = state.next_batch;
    state.next_batch += 1;
    state.stats.batches += 1;
    Batch {
        seq,
        generation: state.generation,
        points: std::mem::take(&mut state.queue),
    }
}

impl Shared {
    async fn submit(&self, batch: Batch) {
        debug!("Submitting snap batch #{} ({} points)", batch.seq, batch.points.len());

        let snapped = match self
            .snapper
            .snap(&batch.points, self.config.interpolate)
            .await
        {
            Ok(points) if !points.is_empty() => Some(points),
            Ok(_) => {
                warn!("Snap batch #{} returned no points, keeping raw batch", batch.seq);
                None
            }
            Err(e) => {
                warn!("Snap batch #{} failed ({}), keeping raw batch", batch.seq, e);
                None
            }
        };

        let mut state = lock(&self.state);
        if state.generation != batch.generation {
            debug!("Dropping snap batch #{} from a previous run", batch.seq);
            return;
        }

        match &snapped {
            Some(_) => state.stats.snapped += 1,
            None => state.stats.fallbacks += 1,
        }
        state
            .ready
            .insert(batch.seq, snapped.unwrap_or(batch.points));

        loop {
            let next = state.next_merge;
            let Some(points) = state.ready.remove(&next) else {
                break;
            };
            append_dedup(&mut state.route, points, self.config.dedup_meters);
            state.next_merge += 1;
        }
    }
}

/// Append `points`, skipping any that lie within `min_gap_meters` of the
/// point before it.
fn append_dedup(route: &mut Vec<Coordinate>, points: Vec<Coordinate>, min_gap_meters: f64) {
    for p in points {
        match route.last() {
            Some(&last) if distance_meters(last, p) < min_gap_meters => {}
            _ => route.push(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::destination;

    #[test]
    fn test_append_dedup_collapses_near_duplicates() {
        let a = Coordinate::new(-23.55, -46.63);
        let near = destination(a, 0.3, 90.0);
        let far = destination(a, 2.0, 90.0);
        let far_dup = destination(far, 0.59, 0.0);

        let mut route = vec![a];
        append_dedup(&mut route, vec![near, far, far_dup, far], 0.6);
        assert_eq!(route, vec![a, far]);
    }

    #[test]
    fn test_append_dedup_keeps_order() {
        let a = Coordinate::new(0.0, 0.0);
        let b = destination(a, 5.0, 0.0);
        let c = destination(b, 5.0, 0.0);
        let mut route = Vec::new();
        append_dedup(&mut route, vec![a, b, c], 0.6);
        assert_eq!(route, vec![a, b, c]);
    }
}
