use crate::domain::Coordinate;

pub const DEFAULT_SMOOTH_ALPHA: f64 = 0.6;

/// `alpha * candidate + (1 - alpha) * previous` per axis; the candidate itself
/// when there is no previous point.
pub fn smooth(previous: Option<Coordinate>, candidate: Coordinate, alpha: f64) -> Coordinate {
    match previous {
        None => candidate,
        Some(prev) => Coordinate::new(
            alpha * candidate.latitude + (1.0 - alpha) * prev.latitude,
            alpha * candidate.longitude + (1.0 - alpha) * prev.longitude,
        ),
    }
}

/// Exponential moving average over accepted points. Display only.
#[derive(Debug, Clone)]
pub struct Smoother {
    alpha: f64,
    last: Option<Coordinate>,
}

impl Smoother {
    /// `alpha` is clamped into (0, 1]; higher means less smoothing.
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha.is_finite() && alpha > 0.0 {
            alpha.min(1.0)
        } else {
            DEFAULT_SMOOTH_ALPHA
        };
        Self { alpha, last: None }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn push(&mut self, candidate: Coordinate) -> Coordinate {
        let next = smooth(self.last, candidate, self.alpha);
        self.last = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTH_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_passes_through() {
        let c = Coordinate::new(10.0, 20.0);
        assert_eq!(smooth(None, c, 0.6), c);
    }

    #[test]
    fn test_weighted_average() {
        let out = smooth(
            Some(Coordinate::new(0.0, 0.0)),
            Coordinate::new(10.0, -10.0),
            0.6,
        );
        assert!((out.latitude - 6.0).abs() < 1e-12);
        assert!((out.longitude + 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_one_disables_smoothing() {
        let mut s = Smoother::new(1.0);
        s.push(Coordinate::new(0.0, 0.0));
        assert_eq!(s.push(Coordinate::new(3.0, 4.0)), Coordinate::new(3.0, 4.0));
    }

    #[test]
    fn test_smoother_chains_on_its_own_output() {
        let mut s = Smoother::new(0.5);
        s.push(Coordinate::new(0.0, 0.0));
        s.push(Coordinate::new(4.0, 0.0));
        let third = s.push(Coordinate::new(4.0, 0.0));
        assert!((third.latitude - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_alpha_falls_back() {
        assert_eq!(Smoother::new(0.0).alpha(), DEFAULT_SMOOTH_ALPHA);
        assert_eq!(Smoother::new(f64::NAN).alpha(), DEFAULT_SMOOTH_ALPHA);
        assert_eq!(Smoother::new(3.0).alpha(), 1.0);
    }
}
