use crate::error::{Error, Result};
use geo::{Coord, LineString, SimplifyIdx};
use nalgebra::Point2;
use serde::Serialize;

/// Douglas–Peucker reduction of a route. `points` are taken from the input
/// polyline in traversal order; `source_indices[i]` is the input index of
/// `points[i]`.
#[derive(Clone, Debug, Serialize)]
pub struct SimplifiedRoute {
    pub points: Vec<Point2<f64>>,
    pub source_indices: Vec<usize>,
}

impl SimplifiedRoute {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Simplifies `points` with perpendicular-distance tolerance `tolerance_cm`.
///
/// The first and last input points are always kept. Requires at least two
/// points.
pub fn simplify(points: &[Point2<f64>], tolerance_cm: f64) -> Result<SimplifiedRoute> {
    if points.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "route simplification needs at least 2 points, got {}",
            points.len()
        )));
    }
    if !(tolerance_cm.is_finite() && tolerance_cm >= 0.0) {
        return Err(Error::InvalidInput(format!(
            "simplification tolerance must be finite and non-negative, got {tolerance_cm}"
        )));
    }

    let line: LineString<f64> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    let mut source_indices = line.simplify_idx(&tolerance_cm);

    // A closed route (first == last) can collapse to a single index.
    let last = points.len() - 1;
    if source_indices.first() != Some(&0) {
        source_indices.insert(0, 0);
    }
    if source_indices.last() != Some(&last) {
        source_indices.push(last);
    }

    let points = source_indices.iter().map(|&i| points[i]).collect();
    Ok(SimplifiedRoute {
        points,
        source_indices,
    })
}
