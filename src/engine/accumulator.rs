use tokio::sync::watch;

use crate::domain::geo::distance_meters;
use crate::domain::{Coordinate, EffectKind, EffectTimers, TimeMs};

/// Multiplier applied while a boost is live.
pub const BOOST_MULTIPLIER: f64 = 2.0;

/// Running total of accepted travel distance.
///
/// The total is published through a `watch` cell so readers on other timers
/// (the duel) always see the latest value rather than a snapshot.
#[derive(Debug)]
pub struct DistanceAccumulator {
    total_meters: f64,
    cell: watch::Sender<f64>,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        let (cell, _) = watch::channel(0.0);
        Self {
            total_meters: 0.0,
            cell,
        }
    }

    /// Add the segment `from -> to`, doubled when a boost is live at `now`.
    /// Returns the meters actually added.
    pub fn on_accepted_segment(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        effects: &EffectTimers,
        now: TimeMs,
    ) -> f64 {
        let raw = distance_meters(from, to);
        let contributed = if effects.is_active(EffectKind::Boost, now) {
            raw * BOOST_MULTIPLIER
        } else {
            raw
        };
        self.total_meters += contributed;
        self.cell.send_replace(self.total_meters);
        contributed
    }

    pub fn total_meters(&self) -> f64 {
        self.total_meters
    }

    /// Only called when tracking (re)starts.
    pub fn reset(&mut self) {
        self.total_meters = 0.0;
        self.cell.send_replace(0.0);
    }

    /// A live view of the total.
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.cell.subscribe()
    }
}

impl Default for DistanceAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::destination;

    fn segments() -> Vec<(Coordinate, Coordinate)> {
        let a = Coordinate::new(-23.55052, -46.633308);
        let b = destination(a, 5.0, 90.0);
        let c = destination(b, 7.0, 90.0);
        vec![(a, b), (b, c)]
    }

    #[test]
    fn test_plain_accumulation() {
        let mut acc = DistanceAccumulator::new();
        let effects = EffectTimers::new();
        for (from, to) in segments() {
            acc.on_accepted_segment(from, to, &effects, TimeMs::new(0));
        }
        assert!((acc.total_meters() - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_boost_doubles_contribution() {
        let mut acc = DistanceAccumulator::new();
        let mut effects = EffectTimers::new();
        effects.activate(EffectKind::Boost, TimeMs::new(0), 3_600_000);

        let mut added = Vec::new();
        for (from, to) in segments() {
            added.push(acc.on_accepted_segment(from, to, &effects, TimeMs::new(1000)));
        }
        assert!((added[0] - 10.0).abs() < 1e-6);
        assert!((acc.total_meters() - 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_expired_boost_does_not_double() {
        let mut acc = DistanceAccumulator::new();
        let mut effects = EffectTimers::new();
        effects.activate(EffectKind::Boost, TimeMs::new(0), 1000);

        let (from, to) = segments()[0];
        acc.on_accepted_segment(from, to, &effects, TimeMs::new(1000));
        assert!((acc.total_meters() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_subscribers_see_latest_total_and_reset() {
        let mut acc = DistanceAccumulator::new();
        let rx = acc.subscribe();
        let effects = EffectTimers::new();
        for (from, to) in segments() {
            acc.on_accepted_segment(from, to, &effects, TimeMs::new(0));
        }
        assert!((*rx.borrow() - 12.0).abs() < 1e-6);

        acc.reset();
        assert_eq!(acc.total_meters(), 0.0);
        assert_eq!(*rx.borrow(), 0.0);
    }
}
