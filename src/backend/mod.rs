//! Difference backends: engines that score a query panorama against a
//! trained route at every in-silico rotation.
//!
//! - [`PerfectMemory`] stores every route snapshot and returns one row of
//!   mean absolute pixel differences per snapshot (0..255 scale).
//! - [`InfoMax`] learns a single weight matrix from the route and returns a
//!   single row of network decision values (unbounded scale).
//!
//! Column `c` of every row is the query rotated by `c` columns; see
//! [`crate::angle::column_to_angle_deg`] for the column → heading mapping.

mod infomax;
mod perfect_memory;

pub use infomax::{InfoMax, InfoMaxParams};
pub use perfect_memory::PerfectMemory;

use crate::error::Result;
use crate::image::ImageU8;
use nalgebra::DMatrix;

/// Per-rotation differences returned by a backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Differences {
    /// One row per stored snapshot, one column per rotation.
    Matrix(DMatrix<f32>),
    /// A single row, one entry per rotation.
    Row(Vec<f32>),
}

impl Differences {
    pub fn rows(&self) -> usize {
        match self {
            Differences::Matrix(m) => m.nrows(),
            Differences::Row(_) => 1,
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            Differences::Matrix(m) => m.ncols(),
            Differences::Row(r) => r.len(),
        }
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> f32 {
        match self {
            Differences::Matrix(m) => m[(row, column)],
            Differences::Row(r) => r[column],
        }
    }

    /// Whether rows correspond to stored snapshots.
    pub fn has_snapshots(&self) -> bool {
        matches!(self, Differences::Matrix(_))
    }

    pub fn max_value(&self) -> f32 {
        let values: &[f32] = match self {
            Differences::Matrix(m) => m.as_slice(),
            Differences::Row(r) => r,
        };
        values.iter().copied().fold(0.0, f32::max)
    }
}

/// How raw differences map onto [0, 1] before a confidence is derived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DifferenceScale {
    /// Divide by a fixed constant (e.g. 255 for 8-bit pixel differences).
    Fixed(f32),
    /// Divide by the largest difference of the current query.
    RowMaximum,
}

impl DifferenceScale {
    pub fn normalize(&self, raw: f32, differences: &Differences) -> f32 {
        let denom = match *self {
            DifferenceScale::Fixed(s) => s,
            DifferenceScale::RowMaximum => differences.max_value(),
        };
        if denom > 0.0 {
            raw / denom
        } else {
            0.0
        }
    }
}

/// An engine producing rotational differences for a query image.
pub trait DifferenceBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Expected query size `(width, height)`; width is the RIDF length.
    fn image_size(&self) -> (usize, usize);

    fn differences(&self, image: &ImageU8<'_>) -> Result<Differences>;

    fn scale(&self) -> DifferenceScale;

    /// Whether difference rows index individual route snapshots.
    fn stores_snapshots(&self) -> bool {
        false
    }
}

pub(crate) fn check_size(expected: (usize, usize), image: &ImageU8<'_>) -> Result<()> {
    if (image.w, image.h) != expected {
        return Err(crate::error::Error::InvalidInput(format!(
            "image is {}x{}, backend expects {}x{}",
            image.w, image.h, expected.0, expected.1
        )));
    }
    Ok(())
}
