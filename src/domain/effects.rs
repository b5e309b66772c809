//! Time-windowed gameplay effects (boost and shield).

use serde::{Deserialize, Serialize};

use super::TimeMs;

/// Default lifetime of an activated effect: one hour.
pub const DEFAULT_EFFECT_DURATION_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Doubles newly accumulated distance.
    Boost,
    /// Blocks entry into matchmaking.
    Shield,
}

impl EffectKind {
    fn slot(self) -> usize {
        match self {
            EffectKind::Boost => 0,
            EffectKind::Shield => 1,
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectKind::Boost => write!(f, "boost"),
            EffectKind::Shield => write!(f, "shield"),
        }
    }
}

/// A live activation of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectWindow {
    pub kind: EffectKind,
    pub expires_at_ms: TimeMs,
}

/// At most one window per kind. Expiry is wall-clock based: every read treats
/// `now >= expires_at` as absent whether or not `clear_expired` has run.
#[derive(Debug, Clone, Default)]
pub struct EffectTimers {
    windows: [Option<TimeMs>; 2],
}

impl EffectTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `kind` for `duration_ms` from `now`, replacing any previous window.
    pub fn activate(&mut self, kind: EffectKind, now: TimeMs, duration_ms: i64) -> TimeMs {
        let expires_at = now.plus_ms(duration_ms.max(0));
        self.windows[kind.slot()] = Some(expires_at);
        expires_at
    }

    pub fn is_active(&self, kind: EffectKind, now: TimeMs) -> bool {
        self.expires_at(kind, now).is_some()
    }

    /// Expiry of the live window for `kind`, if one is live at `now`.
    pub fn expires_at(&self, kind: EffectKind, now: TimeMs) -> Option<TimeMs> {
        self.windows[kind.slot()].filter(|expires_at| now < *expires_at)
    }

    /// Drop windows that have expired at `now`. Returns the kinds removed.
    pub fn clear_expired(&mut self, now: TimeMs) -> Vec<EffectKind> {
        let mut cleared = Vec::new();
        for kind in [EffectKind::Boost, EffectKind::Shield] {
            let slot = &mut self.windows[kind.slot()];
            if matches!(slot, Some(expires_at) if now >= *expires_at) {
                *slot = None;
                cleared.push(kind);
            }
        }
        cleared
    }

    /// Live windows at `now`, boost first.
    pub fn active_windows(&self, now: TimeMs) -> Vec<EffectWindow> {
        [EffectKind::Boost, EffectKind::Shield]
            .into_iter()
            .filter_map(|kind| {
                self.expires_at(kind, now).map(|expires_at_ms| EffectWindow {
                    kind,
                    expires_at_ms,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_window_boundaries() {
        let mut timers = EffectTimers::new();
        let expires = timers.activate(EffectKind::Boost, TimeMs::new(1000), 3_600_000);
        assert_eq!(expires, TimeMs::new(3_601_000));

        assert!(timers.is_active(EffectKind::Boost, TimeMs::new(1000 + 3_599_999)));
        assert!(!timers.is_active(EffectKind::Boost, TimeMs::new(1000 + 3_600_000)));
        assert!(!timers.is_active(EffectKind::Boost, TimeMs::new(1000 + 3_600_001)));
    }

    #[test]
    fn test_reactivation_overwrites_instead_of_stacking() {
        let mut timers = EffectTimers::new();
        timers.activate(EffectKind::Shield, TimeMs::new(0), 1000);
        timers.activate(EffectKind::Shield, TimeMs::new(500), 1000);
        assert_eq!(
            timers.expires_at(EffectKind::Shield, TimeMs::new(600)),
            Some(TimeMs::new(1500))
        );

        // A shorter reactivation also overwrites.
        timers.activate(EffectKind::Shield, TimeMs::new(600), 100);
        assert!(!timers.is_active(EffectKind::Shield, TimeMs::new(800)));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut timers = EffectTimers::new();
        timers.activate(EffectKind::Boost, TimeMs::new(0), 1000);
        assert!(timers.is_active(EffectKind::Boost, TimeMs::new(10)));
        assert!(!timers.is_active(EffectKind::Shield, TimeMs::new(10)));
    }

    #[test]
    fn test_expired_window_reads_absent_before_cleanup() {
        let mut timers = EffectTimers::new();
        timers.activate(EffectKind::Boost, TimeMs::new(0), 1000);
        assert!(timers.active_windows(TimeMs::new(5000)).is_empty());

        assert_eq!(timers.clear_expired(TimeMs::new(5000)), vec![EffectKind::Boost]);
        assert!(timers.clear_expired(TimeMs::new(5000)).is_empty());
    }
}
