//! Road-snapping seam: the external service that moves raw points onto roads,
//! and the batcher that feeds it.

use crate::domain::Coordinate;
use async_trait::async_trait;
use std::fmt;

pub mod batcher;
pub mod google;
pub mod mock;

pub use batcher::{RoadSnapBatcher, SnapConfig};
pub use google::GoogleRoadsSnapper;
pub use mock::MockRoadSnapper;

/// Road-snapping service.
#[async_trait]
pub trait RoadSnapper: Send + Sync + fmt::Debug {
    /// Snap an ordered path.
    ///
    /// # Arguments
    /// * `points` - Raw coordinates in travel order
    /// * `interpolate` - Ask the service to fill in points along the road geometry
    ///
    /// # Returns
    /// Snapped coordinates in the order the service returned them
    async fn snap(
        &self,
        points: &[Coordinate],
        interpolate: bool,
    ) -> Result<Vec<Coordinate>, SnapError>;
}

/// Error type for road-snapping calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (non-success status)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// Snapping is not configured
    Disabled,
}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SnapError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            SnapError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SnapError::RateLimited => write!(f, "Rate limited"),
            SnapError::Disabled => write!(f, "Road snapping disabled"),
        }
    }
}

impl std::error::Error for SnapError {}

/// Snapper used when no service is configured. Every batch takes the raw fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSnapper;

#[async_trait]
impl RoadSnapper for DisabledSnapper {
    async fn snap(
        &self,
        _points: &[Coordinate],
        _interpolate: bool,
    ) -> Result<Vec<Coordinate>, SnapError> {
        Err(SnapError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_error_display() {
        let err = SnapError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = SnapError::HttpError {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 403: Forbidden");

        assert_eq!(SnapError::RateLimited.to_string(), "Rate limited");
        assert_eq!(SnapError::Disabled.to_string(), "Road snapping disabled");
    }

    #[tokio::test]
    async fn test_disabled_snapper_always_errors() {
        let result = DisabledSnapper
            .snap(&[Coordinate::new(0.0, 0.0)], true)
            .await;
        assert_eq!(result, Err(SnapError::Disabled));
    }
}
