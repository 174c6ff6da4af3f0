//! Grid evaluation: scores a matcher against the route at every grid point
//! near enough to it.
//!
//! Each admitted point is projected onto the simplified route, its snapshot
//! is matched, and the estimated heading is compared with the heading of the
//! route segment it projects onto. Per-point work runs in parallel; records
//! keep grid order and the RMSE is accumulated sequentially afterwards.

pub mod csv;
mod stats;

pub use stats::{format_rmse, EvaluationSummary, RmseAccumulator};

use crate::angle::shortest_angle_between;
use crate::backend::DifferenceScale;
use crate::error::{Error, Result};
use crate::image::GrayImageU8;
use crate::matching::Matcher;
use crate::route::RouteGeometry;
use log::{debug, info};
use nalgebra::{distance, Point2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One test location of the grid.
pub trait GridEntry: Sync {
    /// Position in centimetres.
    fn position(&self) -> Point2<f64>;
    fn heading_deg(&self) -> f64;
    fn load_image(&self, width: usize, height: usize) -> Result<GrayImageU8>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParams {
    /// Grid points at or beyond this distance from the route are skipped.
    pub roi_radius_cm: f64,
    /// A stored-snapshot match is "good" when the matched snapshot was taken
    /// within this distance of the grid point.
    pub good_match_radius_cm: f64,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            roi_radius_cm: 400.0,
            good_match_radius_cm: 300.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub grid_position: Point2<f64>,
    pub best_heading_deg: f64,
    /// Signed error of the estimate relative to the route segment heading.
    pub angular_error_deg: f64,
    /// Lowest difference on the 0..1 scale for fixed-range backends, raw
    /// for backends normalized per query (InfoMax decision values).
    pub lowest_difference: f32,
    pub confidence: f32,
    pub snapshot_index: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct EvaluationReport {
    pub records: Vec<EvaluationRecord>,
    pub summary: EvaluationSummary,
}

enum PointOutcome {
    OutsideRoi,
    NoMatch,
    Matched(EvaluationRecord),
}

/// Runs `matcher` over every entry of `grid` within the ROI of `route`.
///
/// Points whose FOV window admits no candidate are counted as unmatched and
/// excluded from the RMSE. Any other failure (image loading, size mismatch)
/// aborts the run.
pub fn evaluate<E: GridEntry>(
    route: &RouteGeometry,
    grid: &[E],
    matcher: &Matcher,
    params: &EvaluationParams,
) -> Result<EvaluationReport> {
    let start = Instant::now();
    let (width, height) = matcher.backend().image_size();

    let outcomes = grid
        .par_iter()
        .map(|entry| evaluate_point(route, entry, matcher, params, width, height))
        .collect::<Result<Vec<_>>>()?;

    let mut rmse = RmseAccumulator::default();
    let mut summary = EvaluationSummary {
        variant: matcher.name(),
        grid_points: grid.len(),
        ..EvaluationSummary::default()
    };
    let mut good = 0usize;
    let mut bad = 0usize;
    let mut records = Vec::new();
    for outcome in outcomes {
        match outcome {
            PointOutcome::OutsideRoi => {}
            PointOutcome::NoMatch => {
                summary.admitted += 1;
                summary.unmatched += 1;
            }
            PointOutcome::Matched(record) => {
                summary.admitted += 1;
                summary.matched += 1;
                rmse.add(record.angular_error_deg);
                if let Some(snapshot) = record
                    .snapshot_index
                    .and_then(|i| route.points().get(i))
                {
                    if distance(snapshot, &record.grid_position) < params.good_match_radius_cm {
                        good += 1;
                    } else {
                        bad += 1;
                    }
                }
                records.push(record);
            }
        }
    }

    summary.rmse_deg = rmse.rmse();
    if matcher.reports_snapshot_index() {
        summary.good_matches = Some(good);
        summary.bad_matches = Some(bad);
    }
    summary.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        "evaluated {} of {} grid points ({} unmatched), RMSE: {}",
        summary.admitted,
        summary.grid_points,
        summary.unmatched,
        summary.rmse_display()
    );
    Ok(EvaluationReport { records, summary })
}

fn evaluate_point<E: GridEntry>(
    route: &RouteGeometry,
    entry: &E,
    matcher: &Matcher,
    params: &EvaluationParams,
    width: usize,
    height: usize,
) -> Result<PointOutcome> {
    let position = entry.position();
    let projection = route.project(&position)?;
    if projection.distance >= params.roi_radius_cm {
        return Ok(PointOutcome::OutsideRoi);
    }

    let image = entry.load_image(width, height)?;
    let result = match matcher.test(
        &image.as_view(),
        entry.heading_deg(),
        projection.segment_heading_deg,
    ) {
        Ok(result) => result,
        Err(err @ Error::NoMatchInFov { .. }) => {
            debug!("grid point ({:.1}, {:.1}): {err}", position.x, position.y);
            return Ok(PointOutcome::NoMatch);
        }
        Err(err) => return Err(err),
    };

    let angular_error_deg =
        shortest_angle_between(result.best_heading_deg, projection.segment_heading_deg);
    let lowest_difference = match matcher.backend().scale() {
        DifferenceScale::Fixed(_) => result.lowest_difference,
        DifferenceScale::RowMaximum => result.raw_lowest_difference,
    };
    debug!(
        "grid point ({:.1}, {:.1}): heading {:.1}, error {:.1}, difference {:.4}",
        position.x, position.y, result.best_heading_deg, angular_error_deg, lowest_difference
    );
    Ok(PointOutcome::Matched(EvaluationRecord {
        grid_position: position,
        best_heading_deg: result.best_heading_deg,
        angular_error_deg,
        lowest_difference,
        confidence: result.confidence,
        snapshot_index: result.snapshot_index,
    }))
}
