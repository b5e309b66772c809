//! Mock road snapper for testing without network calls.

use super::{RoadSnapper, SnapError};
use crate::domain::Coordinate;
use crate::schedule::lock;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
struct Scripted {
    delay: Option<Duration>,
    result: Result<Vec<Coordinate>, SnapError>,
}

/// Returns scripted responses in order, then echoes its input once the
/// script runs out. Records every batch it receives.
#[derive(Debug, Default)]
pub struct MockRoadSnapper {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Vec<Coordinate>>>,
    latency: Option<Duration>,
}

impl MockRoadSnapper {
    /// Create a mock that echoes every batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn with_response(self, points: Vec<Coordinate>) -> Self {
        self.push(None, Ok(points))
    }

    /// Queue a successful response that takes `delay` to arrive.
    pub fn with_delayed_response(self, points: Vec<Coordinate>, delay: Duration) -> Self {
        self.push(Some(delay), Ok(points))
    }

    /// Queue a failed response.
    pub fn with_error(self, err: SnapError) -> Self {
        self.push(None, Err(err))
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn push(self, delay: Option<Duration>, result: Result<Vec<Coordinate>, SnapError>) -> Self {
        lock(&self.script).push_back(Scripted { delay, result });
        self
    }

    /// Batches received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<Coordinate>> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RoadSnapper for MockRoadSnapper {
    async fn snap(
        &self,
        points: &[Coordinate],
        _interpolate: bool,
    ) -> Result<Vec<Coordinate>, SnapError> {
        lock(&self.calls).push(points.to_vec());
        let scripted = lock(&self.script).pop_front();

        let delay = scripted.as_ref().and_then(|s| s.delay).or(self.latency);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match scripted {
            Some(s) => s.result,
            None => Ok(points.to_vec()),
        }
    }
}
