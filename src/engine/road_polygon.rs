use crate::domain::geo::{destination, initial_bearing_degrees};
use crate::domain::Coordinate;

pub const DEFAULT_ROAD_HALF_WIDTH_METERS: f64 = 6.0;

/// Closed outline of a road buffer around `path`: the left edge walked
/// forward followed by the right edge walked backward. Empty for paths
/// shorter than two points.
pub fn road_buffer_polygon(path: &[Coordinate], half_width_meters: f64) -> Vec<Coordinate> {
    if path.len() < 2 {
        return Vec::new();
    }

    let mut left = Vec::with_capacity(path.len());
    let mut right = Vec::with_capacity(path.len());
    for (i, &point) in path.iter().enumerate() {
        let heading = match path.get(i + 1) {
            Some(&next) => initial_bearing_degrees(point, next),
            None => initial_bearing_degrees(path[i - 1], point),
        };
        left.push(destination(point, half_width_meters, heading - 90.0));
        right.push(destination(point, half_width_meters, heading + 90.0));
    }

    right.reverse();
    left.extend(right);
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::distance_meters;

    #[test]
    fn test_short_paths_have_no_polygon() {
        assert!(road_buffer_polygon(&[], 6.0).is_empty());
        assert!(road_buffer_polygon(&[Coordinate::new(0.0, 0.0)], 6.0).is_empty());
    }

    #[test]
    fn test_polygon_edges_sit_half_width_away() {
        let a = Coordinate::new(0.0, 0.0);
        let b = destination(a, 50.0, 0.0);
        let c = destination(b, 50.0, 0.0);
        let polygon = road_buffer_polygon(&[a, b, c], 6.0);
        assert_eq!(polygon.len(), 6);

        // Heading north: left is west, right is east.
        assert!(polygon[0].longitude < 0.0);
        assert!(polygon[5].longitude > 0.0);
        assert!((distance_meters(polygon[0], a) - 6.0).abs() < 1e-6);
        // Right side is reversed, so the last vertex belongs to the first point.
        assert!((distance_meters(polygon[5], a) - 6.0).abs() < 1e-6);
        assert!((distance_meters(polygon[3], c) - 6.0).abs() < 1e-6);
    }
}
