//! Display-only fitness readouts.

/// Energy estimate used by the tracker: kcal per kg per km.
pub const KCAL_PER_KG_KM: f64 = 1.036;

pub fn calories(weight_kg: f64, distance_meters: f64) -> f64 {
    weight_kg * (distance_meters / 1000.0) * KCAL_PER_KG_KM
}

/// `HH:MM:SS`, hours not wrapped at 24.
pub fn format_elapsed(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calories() {
        assert!((calories(70.0, 1000.0) - 72.52).abs() < 1e-9);
        assert_eq!(calories(70.0, 0.0), 0.0);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(61), "00:01:01");
        assert_eq!(format_elapsed(3600 * 25 + 59), "25:00:59");
    }
}
