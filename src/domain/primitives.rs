//! Domain primitives: TimeMs, Coordinate, RawFix.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Shift forward by `ms`, saturating at the i64 bounds.
    pub fn plus_ms(&self, ms: i64) -> Self {
        TimeMs(self.0.saturating_add(ms))
    }

    /// Signed milliseconds elapsed from `earlier` to `self`.
    pub fn millis_since(&self, earlier: TimeMs) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A single position reported by the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFix {
    pub coordinate: Coordinate,
    pub timestamp_ms: TimeMs,
}

impl RawFix {
    pub fn new(coordinate: Coordinate, timestamp_ms: TimeMs) -> Self {
        Self {
            coordinate,
            timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timems_ordering() {
        let t1 = TimeMs::new(1000);
        let t2 = TimeMs::new(2000);
        assert!(t1 < t2);
        assert_eq!(t2.millis_since(t1), 1000);
        assert_eq!(t1.millis_since(t2), -1000);
    }

    #[test]
    fn test_timems_plus_saturates() {
        assert_eq!(TimeMs::new(1000).plus_ms(500), TimeMs::new(1500));
        assert_eq!(TimeMs::new(i64::MAX).plus_ms(1), TimeMs::new(i64::MAX));
    }

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::new(-23.55052, -46.633308);
        assert_eq!(c.to_string(), "-23.55052,-46.633308");
    }

    #[test]
    fn test_raw_fix_serialization() {
        let fix = RawFix::new(Coordinate::new(1.5, 2.5), TimeMs::new(42));
        let json = serde_json::to_value(fix).unwrap();
        assert_eq!(json["timestampMs"], 42);
        assert_eq!(json["coordinate"]["latitude"], 1.5);
    }
}
