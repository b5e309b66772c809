//! Distance goals that latch once reached.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub target_km: f64,
    pub completed: bool,
}

impl Mission {
    pub fn new(id: &str, target_km: f64) -> Self {
        Self {
            id: id.to_string(),
            title: format!("Walk {} km", target_km),
            target_km,
            completed: false,
        }
    }

    /// Progress towards the target, 0..=100.
    pub fn percent(&self, distance_km: f64) -> u32 {
        if self.target_km <= 0.0 {
            return 100;
        }
        let progress = (distance_km / self.target_km).clamp(0.0, 1.0);
        (progress * 100.0).round() as u32
    }
}

#[derive(Debug, Clone)]
pub struct MissionBoard {
    missions: Vec<Mission>,
}

impl MissionBoard {
    pub fn new(missions: Vec<Mission>) -> Self {
        Self { missions }
    }

    /// The daily set: 2, 5 and 7 km.
    pub fn daily() -> Self {
        Self::new(vec![
            Mission::new("m1", 2.0),
            Mission::new("m2", 5.0),
            Mission::new("m3", 7.0),
        ])
    }

    /// Latch every mission whose target `distance_km` reaches. Returns newly completed ones.
    pub fn update(&mut self, distance_km: f64) -> Vec<Mission> {
        let mut newly = Vec::new();
        for m in self.missions.iter_mut().filter(|m| !m.completed) {
            if distance_km >= m.target_km {
                m.completed = true;
                newly.push(m.clone());
            }
        }
        newly
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }
}

impl Default for MissionBoard {
    fn default() -> Self {
        Self::daily()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missions_latch_in_order() {
        let mut board = MissionBoard::daily();
        assert!(board.update(1.9).is_empty());

        let done = board.update(5.2);
        assert_eq!(
            done.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["m1", "m2"]
        );

        // A later, lower reading (new tracking run) does not un-complete.
        assert!(board.update(0.0).is_empty());
        assert!(board.missions()[0].completed);
        assert!(!board.missions()[2].completed);
    }

    #[test]
    fn test_percent_is_clamped() {
        let m = Mission::new("m1", 2.0);
        assert_eq!(m.title, "Walk 2 km");
        assert_eq!(m.percent(0.5), 25);
        assert_eq!(m.percent(9.0), 100);
        assert_eq!(m.percent(-1.0), 0);
    }
}
