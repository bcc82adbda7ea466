//! Coordinator/worker execution of a full-map sweep.
//!
//! Each worker gets a read-only handle on the whole grid and its
//! [`WorkerContext`], computes its contiguous row range with
//! [`compute_row_range`], and hands the block back. The coordinator gathers
//! blocks in rank order. A failed worker fails the whole sweep.

use std::sync::atomic::AtomicUsize;
use std::thread;

use log::debug;
use ndarray::Array2;

use crate::error::{Result, VisibilityError};
use crate::grid::HeightGrid;
use crate::partition::{gather, RowRange, WorkerContext};
use crate::sweep::{compute_row_range, Solver};

fn run_worker(
    ctx: WorkerContext,
    grid: &HeightGrid,
    solver: &dyn Solver,
    vantage_offset: i32,
    progress: Option<&AtomicUsize>,
) -> Result<(RowRange, Array2<u32>)> {
    let rows = ctx.row_range(grid.height());
    debug!(
        "worker {}/{}: rows {}..{}",
        ctx.worker_id, ctx.worker_count, rows.start, rows.end
    );
    let block = compute_row_range(grid, solver, vantage_offset, rows, progress)?;
    Ok((rows, block))
}

/// Sweep the full map on `workers` independent threads and gather the result.
pub fn run_distributed(
    grid: &HeightGrid,
    solver: &dyn Solver,
    vantage_offset: i32,
    workers: usize,
    progress: Option<&AtomicUsize>,
) -> Result<Array2<u32>> {
    let contexts = (0..workers)
        .map(|id| WorkerContext::new(id, workers))
        .collect::<Result<Vec<_>>>()?;
    if contexts.is_empty() {
        return Err(VisibilityError::ZeroWorkers);
    }

    let parts = thread::scope(|scope| {
        let handles: Vec<_> = contexts
            .iter()
            .map(|&ctx| {
                scope.spawn(move || run_worker(ctx, grid, solver, vantage_offset, progress))
            })
            .collect();

        handles
            .into_iter()
            .zip(&contexts)
            .map(|(handle, ctx)| {
                handle
                    .join()
                    .map_err(|_| VisibilityError::WorkerFailed(ctx.worker_id))?
            })
            .collect::<Result<Vec<_>>>()
    })?;

    gather(&parts, grid.width(), grid.height())
}
