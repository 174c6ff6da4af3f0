use crate::error::{Error, Result};
use nalgebra::Point2;
use serde::Serialize;

/// Nearest point on a polyline to a query point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Projection {
    /// Euclidean distance from the query point to `point` (cm).
    pub distance: f64,
    /// Closest point on the clamped winning segment.
    pub point: Point2<f64>,
    /// Index `i` of the winning segment `[P_i, P_{i+1}]`.
    pub segment_index: usize,
    /// Heading of the whole winning segment, `atan2(dy, dx)` in degrees.
    pub segment_heading_deg: f64,
}

/// Projects `point` onto the polyline `route`.
///
/// Each segment is treated as closed (t clamped to [0, 1]); the segment with
/// the smallest squared distance wins and ties go to the lowest index.
pub fn project(point: &Point2<f64>, route: &[Point2<f64>]) -> Result<Projection> {
    if route.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "projection needs a polyline with at least 2 points, got {}",
            route.len()
        )));
    }

    let mut best: Option<(f64, Point2<f64>, usize)> = None;
    for (i, seg) in route.windows(2).enumerate() {
        let start = seg[0];
        let dir = seg[1] - start;
        let len_sq = dir.norm_squared();
        // degenerate segments collapse onto their start point
        let t = if len_sq > 0.0 {
            ((point - start).dot(&dir) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let nearest = start + dir * t;
        let dist_sq = (point - nearest).norm_squared();
        if best.map_or(true, |(d, _, _)| dist_sq < d) {
            best = Some((dist_sq, nearest, i));
        }
    }

    let (dist_sq, nearest, segment_index) = best.ok_or_else(|| {
        Error::InvalidInput("projection found no segments".to_string())
    })?;
    let dir = route[segment_index + 1] - route[segment_index];
    Ok(Projection {
        distance: dist_sq.sqrt(),
        point: nearest,
        segment_index,
        segment_heading_deg: dir.y.atan2(dir.x).to_degrees(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn horizontal() -> Vec<Point2<f64>> {
        vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]
    }

    #[test]
    fn projects_onto_segment_interior() {
        let p = project(&Point2::new(5.0, 3.0), &horizontal()).unwrap();
        assert_abs_diff_eq!(p.distance, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.point.x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.point.y, 0.0, epsilon = 1e-12);
        assert_eq!(p.segment_index, 0);
        assert_abs_diff_eq!(p.segment_heading_deg, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn clamps_beyond_segment_end() {
        let p = project(&Point2::new(20.0, 0.0), &horizontal()).unwrap();
        assert_eq!(p.point, Point2::new(10.0, 0.0));
        assert_abs_diff_eq!(p.distance, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn chooses_nearest_segment_and_its_heading() {
        // L-shaped route: east then north
        let route = vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
        ];
        let p = project(&Point2::new(110.0, 60.0), &route).unwrap();
        assert_eq!(p.segment_index, 1);
        assert_abs_diff_eq!(p.segment_heading_deg, 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.point.y, 60.0, epsilon = 1e-12);
    }

    #[test]
    fn vertex_ties_go_to_first_segment() {
        let route = vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
        ];
        // equidistant from both segments, nearest point is the shared vertex
        let p = project(&Point2::new(110.0, -10.0), &route).unwrap();
        assert_eq!(p.segment_index, 0);
        assert_eq!(p.point, Point2::new(100.0, 0.0));
        assert_abs_diff_eq!(p.segment_heading_deg, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn westward_segment_heading() {
        let route = vec![Point2::new(10.0, 0.0), Point2::new(0.0, 0.0)];
        let p = project(&Point2::new(5.0, -1.0), &route).unwrap();
        assert_abs_diff_eq!(p.segment_heading_deg, 180.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_short_polyline() {
        let err = project(&Point2::new(0.0, 0.0), &[Point2::new(1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
