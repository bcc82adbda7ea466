//! Terrain visibility over `i16` height grids.
//!
//! Two outputs: a visible-count map, where every cell is used in turn as the
//! vantage, and a single-origin bitmap. Both are computed by one of three
//! interchangeable strategies (angular ray casting, 2D Bresenham lines, 3D
//! voxel lines) and full-map sweeps run serially, on a rayon pool, or as
//! independent row-range workers gathered in rank order.

pub mod bresenham;
pub mod config;
pub mod directions;
pub mod distributed;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod partition;
pub mod raster_io;
pub mod raycast;
pub mod seen_cache;
pub mod summary;
pub mod sweep;
pub mod visibility;

#[cfg(feature = "python")]
mod python;

pub use config::{Parallelism, Strategy, SweepConfig, DEFAULT_NUM_ANGLES, DEFAULT_RADIUS};
pub use error::{Result, VisibilityError};
pub use grid::HeightGrid;
pub use partition::{RowRange, WorkerContext};
pub use sweep::{compute_row_range, point_visibility, visibility_map, Solver, SweepRunner};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn viewshed(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    register_sweep_module(py_module)?;
    register_io_module(py_module)?;

    py_module.add("DEFAULT_RADIUS", DEFAULT_RADIUS)?;
    py_module.add("DEFAULT_NUM_ANGLES", DEFAULT_NUM_ANGLES)?;
    py_module.add("__doc__", "Terrain visibility (viewshed) algorithms implemented in Rust.")?;

    Ok(())
}

#[cfg(feature = "python")]
fn register_sweep_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "sweep")?;
    submodule.add("__doc__", "Visible-count maps and single-origin visibility.")?;
    submodule.add_function(wrap_pyfunction!(python::visibility_map, &submodule)?)?;
    submodule.add_function(wrap_pyfunction!(python::point_visibility, &submodule)?)?;
    submodule.add_class::<python::VisibilityRunner>()?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_io_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "io")?;
    submodule.add("__doc__", "Headerless .raw grid files.")?;
    submodule.add_function(wrap_pyfunction!(python::read_raw, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}
