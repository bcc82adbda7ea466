use std::fmt;

use ndarray::Array2;
use ndarray_stats::QuantileExt;

/// Spread of a visible-count map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSummary {
    pub cells: usize,
    pub min: u32,
    pub max: u32,
    pub mean: f64,
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cells, visible count min {} / max {} / mean {:.2}",
            self.cells, self.min, self.max, self.mean
        )
    }
}

/// Min, max and mean of `counts`, `None` for an empty map.
pub fn summarize(counts: &Array2<u32>) -> Option<SweepSummary> {
    let min = *counts.min().ok()?;
    let max = *counts.max().ok()?;
    let mean = counts.mapv(f64::from).mean()?;
    Some(SweepSummary {
        cells: counts.len(),
        min,
        max,
        mean,
    })
}

/// Number of `true` cells in a single-origin bitmap.
pub fn visible_cells(bitmap: &Array2<bool>) -> usize {
    bitmap.iter().filter(|&&visible| visible).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn summary_of_counts() {
        let counts = Array2::from_shape_vec((2, 2), vec![1u32, 5, 3, 7]).unwrap();
        let summary = summarize(&counts).unwrap();
        assert_eq!(summary.cells, 4);
        assert_eq!(summary.min, 1);
        assert_eq!(summary.max, 7);
        assert_relative_eq!(summary.mean, 4.0);
    }

    #[test]
    fn empty_map_has_no_summary() {
        let counts = Array2::<u32>::zeros((0, 3));
        assert_eq!(summarize(&counts), None);
    }

    #[test]
    fn bitmap_count() {
        let bitmap = Array2::from_shape_vec((1, 4), vec![true, false, true, true]).unwrap();
        assert_eq!(visible_cells(&bitmap), 3);
    }
}
