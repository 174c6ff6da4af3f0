#![doc = include_str!("../README.md")]

pub mod angle;
pub mod backend;
pub mod config;
pub mod database;
pub mod error;
pub mod evaluation;
pub mod image;
pub mod matching;
pub mod route;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{Error, Result};
pub use crate::evaluation::{evaluate, EvaluationParams, EvaluationReport, GridEntry};
pub use crate::matching::{MatchResult, Matcher, MatcherVariant, SelectionPolicy};
pub use crate::route::RouteGeometry;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use visual_homing::prelude::*;
/// use nalgebra::Point2;
///
/// # fn main() -> visual_homing::Result<()> {
/// let (w, h) = (120usize, 25usize);
/// let snapshot = GrayImageU8::new(w, h, vec![128; w * h]);
///
/// let mut memory = PerfectMemory::new(w, h);
/// memory.train(&snapshot.as_view())?;
/// let matcher = Matcher::new(Box::new(memory), SelectionPolicy::Unconstrained);
///
/// let result = matcher.test(&snapshot.as_view(), 0.0, 0.0)?;
/// println!("heading={:.1} confidence={:.3}", result.best_heading_deg, result.confidence);
///
/// let route = RouteGeometry::new(vec![Point2::new(0.0, 0.0), Point2::new(500.0, 0.0)], 15.0)?;
/// println!("distance={:.1}", route.project(&Point2::new(100.0, 30.0))?.distance);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::backend::{InfoMax, InfoMaxParams, PerfectMemory};
    pub use crate::image::{GrayImageU8, ImageU8};
    pub use crate::{Matcher, MatcherVariant, RouteGeometry, SelectionPolicy};
}
