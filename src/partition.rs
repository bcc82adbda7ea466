//! Row-range partitioning and rank-ordered gathering for full-map sweeps.

use std::ops::Range;

use ndarray::{concatenate, Array2, ArrayView2, Axis};

use crate::error::{Result, VisibilityError};

/// A contiguous block of grid rows, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn check(&self, height: usize) -> Result<()> {
        if self.start > self.end || self.end > height {
            return Err(VisibilityError::BadRowRange {
                start: self.start,
                end: self.end,
                height,
            });
        }
        Ok(())
    }
}

/// Identity of one worker among `worker_count`, passed explicitly wherever a
/// worker needs to know its share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerContext {
    pub worker_id: usize,
    pub worker_count: usize,
}

impl WorkerContext {
    pub fn new(worker_id: usize, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(VisibilityError::ZeroWorkers);
        }
        if worker_id >= worker_count {
            return Err(VisibilityError::BadWorker {
                worker_id,
                worker_count,
            });
        }
        Ok(Self {
            worker_id,
            worker_count,
        })
    }

    /// Rows owned by this worker. The first `height % worker_count` workers
    /// take one extra row.
    pub fn row_range(&self, height: usize) -> RowRange {
        let rows_per_worker = height / self.worker_count;
        let remainder = height % self.worker_count;
        let i = self.worker_id;
        let start = i * rows_per_worker + i.min(remainder);
        let extra = usize::from(i < remainder);
        RowRange::new(start, start + rows_per_worker + extra)
    }
}

/// Row ranges for every worker, in rank order. Together they tile `0..height`.
pub fn partition_rows(height: usize, workers: usize) -> Result<Vec<RowRange>> {
    (0..workers)
        .map(|id| WorkerContext::new(id, workers).map(|ctx| ctx.row_range(height)))
        .collect::<Result<Vec<_>>>()
        .and_then(|ranges| {
            if ranges.is_empty() {
                Err(VisibilityError::ZeroWorkers)
            } else {
                Ok(ranges)
            }
        })
}

/// Concatenate rank-ordered partial results into the full `height x width` map.
///
/// The parts must start at row 0 and follow each other without gaps or
/// overlaps; anything else is reported instead of being patched over.
pub fn gather(parts: &[(RowRange, Array2<u32>)], width: usize, height: usize) -> Result<Array2<u32>> {
    let mut expected = 0;
    for (range, block) in parts {
        if range.start != expected {
            return Err(VisibilityError::PartitionGap {
                expected,
                found: range.start,
            });
        }
        range.check(height)?;
        if block.dim() != (range.len(), width) {
            return Err(VisibilityError::SizeMismatch {
                width,
                height: range.len(),
                expected: range.len() * width,
                actual: block.len(),
            });
        }
        expected = range.end;
    }
    if expected != height {
        return Err(VisibilityError::PartitionGap {
            expected: height,
            found: expected,
        });
    }

    let views: Vec<ArrayView2<u32>> = parts.iter().map(|(_, block)| block.view()).collect();
    Ok(concatenate(Axis(0), &views)?)
}
