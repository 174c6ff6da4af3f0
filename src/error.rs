use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by route processing, matching and the snapshot database.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// FOV-constrained search found no candidate inside the window.
    #[error("no match within ±{fov_deg}° of reference heading {reference_heading_deg:.1}°")]
    NoMatchInFov {
        fov_deg: f64,
        reference_heading_deg: f64,
    },

    #[error("memory type '{0}' not supported (expected one of: PerfectMemory, PerfectMemoryConstrained, InfoMax, InfoMaxConstrained)")]
    UnknownVariant(String),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load image {}: {message}", path.display())]
    Image { path: PathBuf, message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("InfoMax weights: {0}")]
    Weights(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
