use std::path::PathBuf;

use clap::ValueEnum;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::config::{Parallelism, Strategy, SweepConfig, DEFAULT_NUM_ANGLES, DEFAULT_RADIUS};
use crate::error::VisibilityError;
use crate::grid::HeightGrid;
use crate::raster_io::{infer_square_dimensions, read_heights};
use crate::sweep::SweepRunner;

impl From<VisibilityError> for PyErr {
    fn from(err: VisibilityError) -> PyErr {
        match err {
            VisibilityError::Io { .. } => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

fn parse_strategy(name: &str) -> PyResult<Strategy> {
    <Strategy as ValueEnum>::from_str(name, true).map_err(|_| {
        PyValueError::new_err(format!(
            "unknown strategy `{name}`, expected raycast, bresenham or voxel"
        ))
    })
}

fn build_config(
    grid: &HeightGrid,
    radius: u32,
    num_angles: u32,
    vantage_offset: i32,
    strategy: &str,
    threads: Option<usize>,
) -> PyResult<SweepConfig> {
    Ok(SweepConfig::for_grid(grid)
        .with_radius(radius)
        .with_num_angles(num_angles)
        .with_vantage_offset(vantage_offset)
        .with_strategy(parse_strategy(strategy)?)
        .with_parallelism(Parallelism::Threads { threads }))
}

/// Visible-count map of a 2D int16 height array.
///
/// Each output cell holds how many cells are visible when it is the vantage,
/// itself included.
#[pyfunction]
#[pyo3(signature = (heights, radius=DEFAULT_RADIUS, num_angles=DEFAULT_NUM_ANGLES, vantage_offset=0, strategy="raycast", threads=None))]
pub fn visibility_map(
    py: Python<'_>,
    heights: PyReadonlyArray2<i16>,
    radius: u32,
    num_angles: u32,
    vantage_offset: i32,
    strategy: &str,
    threads: Option<usize>,
) -> PyResult<Py<PyArray2<u32>>> {
    VisibilityRunner::new().visibility_map(
        py,
        heights,
        radius,
        num_angles,
        vantage_offset,
        strategy,
        threads,
    )
}

/// Boolean visibility of every cell from the vantage at `(x, y)`.
#[pyfunction]
#[pyo3(signature = (heights, x, y, radius=DEFAULT_RADIUS, num_angles=DEFAULT_NUM_ANGLES, vantage_offset=0, strategy="raycast"))]
#[allow(clippy::too_many_arguments)]
pub fn point_visibility(
    py: Python<'_>,
    heights: PyReadonlyArray2<i16>,
    x: usize,
    y: usize,
    radius: u32,
    num_angles: u32,
    vantage_offset: i32,
    strategy: &str,
) -> PyResult<Py<PyArray2<bool>>> {
    let grid = HeightGrid::from_array(heights.as_array().to_owned())?;
    let config = build_config(&grid, radius, num_angles, vantage_offset, strategy, None)?
        .with_vantage_point(x, y);
    let bitmap = py.allow_threads(|| crate::sweep::point_visibility(&grid, &config))?;
    Ok(bitmap.into_pyarray(py).unbind())
}

/// Load a `.raw` int16 grid. Square dimensions are inferred when omitted.
#[pyfunction]
#[pyo3(signature = (path, width=None, height=None))]
pub fn read_raw(
    py: Python<'_>,
    path: PathBuf,
    width: Option<usize>,
    height: Option<usize>,
) -> PyResult<Py<PyArray2<i16>>> {
    let samples = read_heights(&path)?;
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (None, None) => infer_square_dimensions(samples.len()).ok_or_else(|| {
            PyValueError::new_err(format!(
                "{} samples is not a square grid, pass width and height",
                samples.len()
            ))
        })?,
        _ => {
            return Err(PyValueError::new_err(
                "width and height must be given together",
            ))
        }
    };
    let grid = HeightGrid::new(width, height, samples)?;
    Ok(grid.into_array().into_pyarray(py).unbind())
}

/// Runs visibility maps with the GIL released so `progress()` can be polled.
#[pyclass]
pub struct VisibilityRunner {
    runner: SweepRunner,
}

impl Default for VisibilityRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[pymethods]
impl VisibilityRunner {
    #[new]
    pub fn new() -> Self {
        Self {
            runner: SweepRunner::new(),
        }
    }

    /// Rows completed so far.
    pub fn progress(&self) -> usize {
        self.runner.progress()
    }

    #[pyo3(signature = (heights, radius=DEFAULT_RADIUS, num_angles=DEFAULT_NUM_ANGLES, vantage_offset=0, strategy="raycast", threads=None))]
    #[allow(clippy::too_many_arguments)]
    pub fn visibility_map(
        &self,
        py: Python<'_>,
        heights: PyReadonlyArray2<i16>,
        radius: u32,
        num_angles: u32,
        vantage_offset: i32,
        strategy: &str,
        threads: Option<usize>,
    ) -> PyResult<Py<PyArray2<u32>>> {
        let grid = HeightGrid::from_array(heights.as_array().to_owned())?;
        let config = build_config(&grid, radius, num_angles, vantage_offset, strategy, threads)?;
        let counts = py.allow_threads(|| self.runner.visibility_map(&grid, &config))?;
        Ok(counts.into_pyarray(py).unbind())
    }
}
