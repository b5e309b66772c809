//! Google Roads API "snap to roads" client.

use super::{RoadSnapper, SnapError};
use crate::domain::Coordinate;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Snapper backed by `GET /v1/snapToRoads`.
#[derive(Debug, Clone)]
pub struct GoogleRoadsSnapper {
    client: Client,
    base_url: String,
    api_key: String,
    max_retry: Duration,
}

impl GoogleRoadsSnapper {
    /// Create a new snapper.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            max_retry: Duration::from_secs(3),
        }
    }

    /// Bound the total time spent retrying 429/5xx responses.
    pub fn with_max_retry(mut self, max_retry: Duration) -> Self {
        self.max_retry = max_retry;
        self
    }

    async fn get_snapped(
        &self,
        path: &str,
        interpolate: bool,
    ) -> Result<serde_json::Value, SnapError> {
        let url = format!("{}/v1/snapToRoads", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry),
            ..Default::default()
        };
        let interpolate = if interpolate { "true" } else { "false" };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("path", path),
                    ("interpolate", interpolate),
                    ("key", self.api_key.as_str()),
                ])
                .send()
                .await
                .map_err(|e| backoff::Error::transient(SnapError::NetworkError(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(SnapError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(SnapError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!("Roads API rejected request: {} {}", status, body);
                return Err(backoff::Error::permanent(SnapError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(SnapError::ParseError(e.to_string())))
        })
        .await
    }
}

/// `lat,lng|lat,lng|...`
pub fn build_path_param(points: &[Coordinate]) -> String {
    points
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

fn parse_snapped_points(response: &serde_json::Value) -> Result<Vec<Coordinate>, SnapError> {
    // A missing array means nothing could be snapped.
    let Some(points) = response.get("snappedPoints").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    points
        .iter()
        .map(|sp| {
            let location = sp
                .get("location")
                .ok_or_else(|| SnapError::ParseError("Missing location field".to_string()))?;
            let latitude = location
                .get("latitude")
                .and_then(|v| v.as_f64())
                .ok_or_else(|| SnapError::ParseError("Missing latitude field".to_string()))?;
            let longitude = location
                .get("longitude")
                .and_then(|v| v.as_f64())
                .ok_or_else(|| SnapError::ParseError("Missing longitude field".to_string()))?;
            Ok(Coordinate::new(latitude, longitude))
        })
        .collect()
}

#[async_trait]
impl RoadSnapper for GoogleRoadsSnapper {
    async fn snap(
        &self,
        points: &[Coordinate],
        interpolate: bool,
    ) -> Result<Vec<Coordinate>, SnapError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Snapping {} points to roads", points.len());

        let response = self
            .get_snapped(&build_path_param(points), interpolate)
            .await?;
        parse_snapped_points(&response)
    }
}
