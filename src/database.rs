//! Snapshot databases: a directory of images described by
//! `database_entries.csv`, plus optional `database_metadata.yaml`.
//!
//! Entries store positions in millimetres; they are exposed in centimetres.
//! A database is a grid when its entries carry `Grid X`/`Grid Y` columns.

use crate::error::{Error, Result};
use crate::evaluation::GridEntry;
use crate::image::io::load_grayscale_resized;
use crate::image::GrayImageU8;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENTRIES_FILE: &str = "database_entries.csv";
pub const METADATA_FILE: &str = "database_metadata.yaml";

#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseEntry {
    /// Position in centimetres.
    pub position: Point2<f64>,
    pub heading_deg: f64,
    pub path: PathBuf,
    pub grid_index: Option<[usize; 2]>,
}

impl DatabaseEntry {
    pub fn load(&self, width: usize, height: usize) -> Result<GrayImageU8> {
        load_grayscale_resized(&self.path, width, height).map_err(|message| Error::Image {
            path: self.path.clone(),
            message,
        })
    }
}

impl GridEntry for DatabaseEntry {
    fn position(&self) -> Point2<f64> {
        self.position
    }

    fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    fn load_image(&self, width: usize, height: usize) -> Result<GrayImageU8> {
        self.load(width, height)
    }
}

/// `grid` block of the database metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridMetadata {
    pub size: Vec<f64>,
    #[serde(rename = "separationMM")]
    pub separation_mm: Vec<f64>,
}

impl GridMetadata {
    /// Physical `(x, y)` extent of the grid in centimetres.
    pub fn extent_cm(&self) -> (f64, f64) {
        (
            self.size[0] * self.separation_mm[0] / 10.0,
            self.size[1] * self.separation_mm[1] / 10.0,
        )
    }
}

#[derive(Clone, Debug)]
pub struct ImageDatabase {
    path: PathBuf,
    entries: Vec<DatabaseEntry>,
    grid: Option<GridMetadata>,
}

impl ImageDatabase {
    pub fn open(path: &Path) -> Result<Self> {
        let entries_path = path.join(ENTRIES_FILE);
        let text =
            fs::read_to_string(&entries_path).map_err(|e| Error::io(&entries_path, e))?;
        let entries = parse_entries(&text, path)?;

        let metadata_path = path.join(METADATA_FILE);
        let grid = if metadata_path.exists() {
            let text =
                fs::read_to_string(&metadata_path).map_err(|e| Error::io(&metadata_path, e))?;
            parse_grid_metadata(&text)?
        } else {
            None
        };

        debug!(
            "opened database {} with {} entries",
            path.display(),
            entries.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            entries,
            grid,
        })
    }

    pub fn from_entries(path: impl Into<PathBuf>, entries: Vec<DatabaseEntry>) -> Self {
        Self {
            path: path.into(),
            entries,
            grid: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_grid(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.grid_index.is_some())
    }

    pub fn grid_metadata(&self) -> Option<&GridMetadata> {
        self.grid.as_ref()
    }

    /// Entry positions in traversal order.
    pub fn positions(&self) -> Vec<Point2<f64>> {
        self.entries.iter().map(|e| e.position).collect()
    }

    /// Lazily loads every snapshot at `width × height`.
    pub fn snapshots(
        &self,
        width: usize,
        height: usize,
    ) -> impl Iterator<Item = Result<GrayImageU8>> + '_ {
        self.entries.iter().map(move |e| e.load(width, height))
    }
}

fn parse_entries(text: &str, dir: &Path) -> Result<Vec<DatabaseEntry>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| Error::Database(format!("{ENTRIES_FILE} is empty")))?
        .split(',')
        .map(str::trim)
        .collect();
    let column = |name: &str| header.iter().position(|h| *h == name);
    let required = |name: &str| {
        column(name).ok_or_else(|| Error::Database(format!("missing column '{name}'")))
    };
    let x_col = required("X [mm]")?;
    let y_col = required("Y [mm]")?;
    let heading_col = required("Heading [degrees]")?;
    let file_col = required("Filename")?;
    let grid_cols = column("Grid X").zip(column("Grid Y"));

    let mut entries = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |i: usize| {
            fields.get(i).copied().ok_or_else(|| {
                Error::Database(format!("row {} has only {} fields", line_no + 2, fields.len()))
            })
        };
        let number = |i: usize| -> Result<f64> {
            let raw = field(i)?;
            raw.parse::<f64>().map_err(|e| {
                Error::Database(format!("row {}: cannot parse '{raw}': {e}", line_no + 2))
            })
        };
        let index = |i: usize| -> Result<usize> {
            let raw = field(i)?;
            raw.parse::<usize>().map_err(|e| {
                Error::Database(format!(
                    "row {}: invalid grid index '{raw}': {e}",
                    line_no + 2
                ))
            })
        };
        let grid_index = match grid_cols {
            Some((gx, gy)) => Some([index(gx)?, index(gy)?]),
            None => None,
        };
        entries.push(DatabaseEntry {
            position: Point2::new(number(x_col)? / 10.0, number(y_col)? / 10.0),
            heading_deg: number(heading_col)?,
            path: dir.join(field(file_col)?),
            grid_index,
        });
    }
    Ok(entries)
}

fn parse_grid_metadata(text: &str) -> Result<Option<GridMetadata>> {
    // OpenCV-written files start with a `%YAML:1.0` directive
    let cleaned: String = text
        .lines()
        .filter(|l| !l.trim_start().starts_with('%'))
        .collect::<Vec<_>>()
        .join("\n");
    let value: serde_yml::Value = serde_yml::from_str(&cleaned)
        .map_err(|e| Error::Database(format!("invalid {METADATA_FILE}: {e}")))?;
    let root = value.get("metadata").unwrap_or(&value);
    let Some(grid) = root.get("grid") else {
        return Ok(None);
    };
    let grid: GridMetadata = serde_yml::from_value(grid.clone())
        .map_err(|e| Error::Database(format!("invalid grid metadata: {e}")))?;
    if grid.size.len() < 2 || grid.separation_mm.len() < 2 {
        return Err(Error::Database(format!(
            "grid metadata needs at least 2 dimensions, got size={:?} separationMM={:?}",
            grid.size, grid.separation_mm
        )));
    }
    Ok(Some(grid))
}
