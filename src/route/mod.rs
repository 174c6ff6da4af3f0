//! Route geometry: simplification of the recorded route and projection of
//! grid points onto the simplified polyline.
//!
//! Closely spaced, near-colinear route samples give noisy segment headings,
//! so every projection runs against the Douglas–Peucker reduced route.
//! Projections clamp to segment endpoints; a grid point beyond the end of
//! the route is scored against the last traversed segment.

mod projection;
mod simplify;

pub use projection::{project, Projection};
pub use simplify::{simplify, SimplifiedRoute};

use crate::error::Result;
use log::debug;
use nalgebra::Point2;

/// Raw route plus its simplified polyline. Immutable after construction and
/// safe to share across threads.
#[derive(Clone, Debug)]
pub struct RouteGeometry {
    points: Vec<Point2<f64>>,
    simplified: SimplifiedRoute,
    tolerance_cm: f64,
}

impl RouteGeometry {
    pub fn new(points: Vec<Point2<f64>>, tolerance_cm: f64) -> Result<Self> {
        let simplified = simplify(&points, tolerance_cm)?;
        debug!(
            "route simplified from {} to {} points (tolerance {:.1} cm)",
            points.len(),
            simplified.len(),
            tolerance_cm
        );
        Ok(Self {
            points,
            simplified,
            tolerance_cm,
        })
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn simplified(&self) -> &SimplifiedRoute {
        &self.simplified
    }

    pub fn tolerance_cm(&self) -> f64 {
        self.tolerance_cm
    }

    /// Projects `point` onto the simplified route.
    pub fn project(&self, point: &Point2<f64>) -> Result<Projection> {
        project(point, &self.simplified.points)
    }
}
