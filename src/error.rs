//! Error taxonomy for grid loading and sweep configuration.
//!
//! Every variant is a configuration error detected before any computation
//! starts. Degenerate geometry and rays leaving the grid are not errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading grids or validating a sweep.
#[derive(Error, Debug)]
pub enum VisibilityError {
    /// Underlying I/O failure on a grid file.
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't open `{0}`: grid files must have extension `.raw`")]
    BadExtension(PathBuf),

    #[error("grid file `{0}` is empty")]
    EmptyFile(PathBuf),

    #[error("grid file `{path}` has {len} bytes, not a multiple of the {element}-byte sample size")]
    MisalignedFile {
        path: PathBuf,
        len: u64,
        element: usize,
    },

    #[error("grid dimensions {width}x{height} are invalid: both must be at least 1")]
    EmptyGrid { width: usize, height: usize },

    #[error("a {width}x{height} grid needs {expected} samples, got {actual}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("radius must be positive")]
    ZeroRadius,

    #[error("angle count must be positive")]
    ZeroAngles,

    #[error("worker count must be positive")]
    ZeroWorkers,

    #[error("worker id {worker_id} is out of range for {worker_count} workers")]
    BadWorker {
        worker_id: usize,
        worker_count: usize,
    },

    #[error("vantage ({x}, {y}) lies outside the {width}x{height} grid")]
    VantageOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("single-origin sweep needs a vantage point")]
    MissingVantage,

    #[error("row range {start}..{end} does not fit a grid of {height} rows")]
    BadRowRange {
        start: usize,
        end: usize,
        height: usize,
    },

    /// Partial results that do not tile the grid exactly once.
    #[error("partial results do not cover rows contiguously: expected row {expected}, got {found}")]
    PartitionGap { expected: usize, found: usize },

    #[error("worker {0} terminated without producing its rows")]
    WorkerFailed(usize),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, VisibilityError>;
