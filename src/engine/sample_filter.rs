use crate::domain::geo::distance_meters;
use crate::domain::{Coordinate, RawFix};

pub const DEFAULT_MIN_DISTANCE_METERS: f64 = 3.0;
pub const DEFAULT_MAX_SPEED_M_S: f64 = 50.0;

/// Drift and jump thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterThresholds {
    pub min_distance_meters: f64,
    pub max_speed_m_s: f64,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_distance_meters: DEFAULT_MIN_DISTANCE_METERS,
            max_speed_m_s: DEFAULT_MAX_SPEED_M_S,
        }
    }
}

/// Result of offering a fix to the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDecision {
    /// The fix is the new reference. `previous` is the point it replaced
    /// (None on bootstrap) and `distance_meters` the raw hop from it.
    Accepted {
        previous: Option<Coordinate>,
        distance_meters: f64,
    },
    /// Closer than the minimum distance to the reference.
    Drift { distance_meters: f64 },
    /// Implied speed above the maximum.
    Jump { speed_m_s: f64 },
}

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterDecision::Accepted { .. })
    }
}

/// Accepts or rejects raw fixes against the last accepted one.
#[derive(Debug, Clone)]
pub struct SampleFilter {
    thresholds: FilterThresholds,
    last_accepted: Option<RawFix>,
}

impl SampleFilter {
    pub fn new(thresholds: FilterThresholds) -> Self {
        Self {
            thresholds,
            last_accepted: None,
        }
    }

    pub fn thresholds(&self) -> FilterThresholds {
        self.thresholds
    }

    pub fn last_accepted(&self) -> Option<RawFix> {
        self.last_accepted
    }

    /// Forget the reference point so the next fix bootstraps.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }

    /// Decide on `candidate`. Only acceptance mutates state.
    pub fn offer(&mut self, candidate: RawFix) -> FilterDecision {
        let Some(last) = self.last_accepted else {
            self.last_accepted = Some(candidate);
            return FilterDecision::Accepted {
                previous: None,
                distance_meters: 0.0,
            };
        };

        let dist = distance_meters(last.coordinate, candidate.coordinate);
        let delta_seconds = candidate.timestamp_ms.millis_since(last.timestamp_ms) as f64 / 1000.0;
        // Non-increasing timestamps carry no speed information.
        let speed = if delta_seconds > 0.0 {
            dist / delta_seconds
        } else {
            0.0
        };

        if dist < self.thresholds.min_distance_meters {
            return FilterDecision::Drift {
                distance_meters: dist,
            };
        }
        if speed > self.thresholds.max_speed_m_s {
            return FilterDecision::Jump { speed_m_s: speed };
        }

        self.last_accepted = Some(candidate);
        FilterDecision::Accepted {
            previous: Some(last.coordinate),
            distance_meters: dist,
        }
    }
}

impl Default for SampleFilter {
    fn default() -> Self {
        Self::new(FilterThresholds::default())
    }
}
