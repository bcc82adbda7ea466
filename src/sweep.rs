//! Sweep orchestration: solvers, full-map and single-origin sweeps, and the
//! runner that reports progress while a sweep is in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use ndarray::Array2;
use rayon::prelude::*;

use crate::config::{Parallelism, SweepConfig};
use crate::directions::RayDirectionSet;
use crate::distributed::run_distributed;
use crate::error::{Result, VisibilityError};
use crate::geometry::IVec2;
use crate::grid::HeightGrid;
use crate::partition::RowRange;
use crate::seen_cache::SeenCache;
use crate::visibility::{line_of_sight, ray_sweep, ray_sweep_count, voxel_line_of_sight, Vantage};

/// A visibility strategy, interchangeable at configuration time.
///
/// Solvers are immutable after construction and shared by reference across
/// workers; all per-vantage scratch is passed in by the caller.
pub trait Solver: Send + Sync {
    fn name(&self) -> &'static str;

    fn radius(&self) -> u32;

    /// Cells visible from `vantage`, itself included.
    fn visible_count(&self, grid: &HeightGrid, vantage: &Vantage, scratch: &mut SeenCache) -> u32;

    /// Per-cell visibility from `vantage`. Cells beyond the radius are `false`.
    fn visibility_bitmap(&self, grid: &HeightGrid, vantage: &Vantage) -> Array2<bool>;
}

/// Angular ray marching with per-ray horizon tracking.
#[derive(Debug, Clone)]
pub struct RayCastSolver {
    directions: RayDirectionSet,
}

impl RayCastSolver {
    pub fn new(radius: u32, num_angles: u32) -> Self {
        Self {
            directions: RayDirectionSet::angular(radius, num_angles),
        }
    }
}

impl Solver for RayCastSolver {
    fn name(&self) -> &'static str {
        "raycast"
    }

    fn radius(&self) -> u32 {
        self.directions.radius()
    }

    fn visible_count(&self, grid: &HeightGrid, vantage: &Vantage, scratch: &mut SeenCache) -> u32 {
        ray_sweep_count(grid, vantage, self.directions.rays(), self.radius(), scratch)
    }

    fn visibility_bitmap(&self, grid: &HeightGrid, vantage: &Vantage) -> Array2<bool> {
        let mut bitmap = Array2::from_elem((grid.height(), grid.width()), false);
        bitmap[[vantage.cell.y as usize, vantage.cell.x as usize]] = true;
        ray_sweep(grid, vantage, self.directions.rays(), self.radius(), |sample| {
            bitmap[[sample.cell.y as usize, sample.cell.x as usize]] = true;
        });
        bitmap
    }
}

/// Point-to-point test applied by [`BresenhamSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTest {
    /// 2D line, intermediate angles against the target's angle.
    Interpolated,
    /// 3D line through elevation space, checked against the terrain.
    Voxel,
}

/// Tests every in-radius cell on its own integer line from the vantage.
#[derive(Debug, Clone)]
pub struct BresenhamSolver {
    targets: RayDirectionSet,
    test: LineTest,
}

impl BresenhamSolver {
    pub fn new(radius: u32, test: LineTest) -> Self {
        Self {
            targets: RayDirectionSet::disk(radius),
            test,
        }
    }

    #[inline]
    fn visible(&self, grid: &HeightGrid, vantage: &Vantage, target: IVec2) -> bool {
        match self.test {
            LineTest::Interpolated => line_of_sight(grid, vantage, target),
            LineTest::Voxel => voxel_line_of_sight(grid, vantage, target),
        }
    }
}

impl Solver for BresenhamSolver {
    fn name(&self) -> &'static str {
        match self.test {
            LineTest::Interpolated => "bresenham",
            LineTest::Voxel => "voxel",
        }
    }

    fn radius(&self) -> u32 {
        self.targets.radius()
    }

    // Disk offsets are distinct, so the seen-cache has nothing to deduplicate.
    fn visible_count(&self, grid: &HeightGrid, vantage: &Vantage, _scratch: &mut SeenCache) -> u32 {
        self.targets
            .offsets()
            .iter()
            .map(|&offset| vantage.cell + offset)
            .filter(|&target| grid.contains(target) && self.visible(grid, vantage, target))
            .count() as u32
    }

    fn visibility_bitmap(&self, grid: &HeightGrid, vantage: &Vantage) -> Array2<bool> {
        let visible: Vec<IVec2> = self
            .targets
            .offsets()
            .par_iter()
            .map(|&offset| vantage.cell + offset)
            .filter(|&target| grid.contains(target) && self.visible(grid, vantage, target))
            .collect();

        let mut bitmap = Array2::from_elem((grid.height(), grid.width()), false);
        for cell in visible {
            bitmap[[cell.y as usize, cell.x as usize]] = true;
        }
        bitmap
    }
}

fn count_row(
    grid: &HeightGrid,
    solver: &dyn Solver,
    vantage_offset: i32,
    y: usize,
    seen: &mut SeenCache,
) -> Vec<u32> {
    (0..grid.width())
        .map(|x| {
            let vantage =
                Vantage::from_sample(IVec2::new(x as i32, y as i32), grid.get(x, y), vantage_offset);
            solver.visible_count(grid, &vantage, seen)
        })
        .collect()
}

/// Visible counts for every vantage in `rows`, as a `rows.len() x width` block.
///
/// This is the unit of work handed to a distribution layer: it reads only the
/// grid and owns its scratch, so disjoint ranges can run anywhere and be
/// concatenated afterwards.
pub fn compute_row_range(
    grid: &HeightGrid,
    solver: &dyn Solver,
    vantage_offset: i32,
    rows: RowRange,
    progress: Option<&AtomicUsize>,
) -> Result<Array2<u32>> {
    rows.check(grid.height())?;
    let mut seen = SeenCache::new(solver.radius());
    let mut counts = Vec::with_capacity(rows.len() * grid.width());
    for y in rows.rows() {
        counts.extend(count_row(grid, solver, vantage_offset, y, &mut seen));
        if let Some(progress) = progress {
            progress.fetch_add(1, Ordering::Relaxed);
        }
    }
    Ok(Array2::from_shape_vec((rows.len(), grid.width()), counts)?)
}

/// All rows on the current rayon pool, one row per task.
fn compute_rows_parallel(
    grid: &HeightGrid,
    solver: &dyn Solver,
    vantage_offset: i32,
    progress: Option<&AtomicUsize>,
) -> Result<Array2<u32>> {
    let radius = solver.radius();
    let rows: Vec<Vec<u32>> = (0..grid.height())
        .into_par_iter()
        .map_init(
            || SeenCache::new(radius),
            |seen, y| {
                let row = count_row(grid, solver, vantage_offset, y, seen);
                if let Some(progress) = progress {
                    progress.fetch_add(1, Ordering::Relaxed);
                }
                row
            },
        )
        .collect();
    Ok(Array2::from_shape_vec(
        (grid.height(), grid.width()),
        rows.concat(),
    )?)
}

/// Runs sweeps and exposes the number of completed rows while they run.
#[derive(Debug, Clone, Default)]
pub struct SweepRunner {
    progress: Arc<AtomicUsize>,
}

impl SweepRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows completed by the current or most recent full-map sweep.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Shared handle to the progress counter, for polling from another thread.
    pub fn progress_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.progress)
    }

    /// Visible-count map: each cell holds the number of cells visible when it
    /// is the vantage.
    pub fn visibility_map(&self, grid: &HeightGrid, config: &SweepConfig) -> Result<Array2<u32>> {
        config.validate_for(grid)?;
        self.progress.store(0, Ordering::Relaxed);
        let solver = config.solver();
        let progress = Some(&*self.progress);

        info!(
            "visibility map: {}x{} grid, radius {}, {} angles, strategy {}, {}",
            grid.width(),
            grid.height(),
            config.radius,
            config.num_angles,
            solver.name(),
            config.parallelism
        );
        let start = Instant::now();

        let counts = match config.parallelism {
            Parallelism::Serial => compute_row_range(
                grid,
                solver.as_ref(),
                config.vantage_offset,
                RowRange::new(0, grid.height()),
                progress,
            )?,
            Parallelism::Threads { threads: None } => {
                compute_rows_parallel(grid, solver.as_ref(), config.vantage_offset, progress)?
            }
            Parallelism::Threads {
                threads: Some(threads),
            } => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
                debug!("built dedicated pool with {threads} threads");
                pool.install(|| {
                    compute_rows_parallel(grid, solver.as_ref(), config.vantage_offset, progress)
                })?
            }
            Parallelism::Distributed { workers } => {
                if workers > grid.height() {
                    warn!(
                        "{workers} workers for {} rows: {} workers will have no rows",
                        grid.height(),
                        workers - grid.height()
                    );
                }
                run_distributed(grid, solver.as_ref(), config.vantage_offset, workers, progress)?
            }
        };

        info!("visibility map finished in {:.2?}", start.elapsed());
        Ok(counts)
    }

    /// Single-origin bitmap from `config.vantage_point`.
    pub fn point_visibility(&self, grid: &HeightGrid, config: &SweepConfig) -> Result<Array2<bool>> {
        config.validate_for(grid)?;
        let (x, y) = config.vantage_point.ok_or(VisibilityError::MissingVantage)?;
        let vantage = Vantage::new(grid, x, y, config.vantage_offset)?;
        let solver = config.solver();

        info!(
            "point visibility from ({x}, {y}): radius {}, strategy {}",
            config.radius,
            solver.name()
        );
        let start = Instant::now();
        let bitmap = solver.visibility_bitmap(grid, &vantage);
        debug!(
            "{} cells visible, finished in {:.2?}",
            bitmap.iter().filter(|&&v| v).count(),
            start.elapsed()
        );
        Ok(bitmap)
    }
}

/// [`SweepRunner::visibility_map`] without progress reporting.
pub fn visibility_map(grid: &HeightGrid, config: &SweepConfig) -> Result<Array2<u32>> {
    SweepRunner::new().visibility_map(grid, config)
}

/// [`SweepRunner::point_visibility`] without progress reporting.
pub fn point_visibility(grid: &HeightGrid, config: &SweepConfig) -> Result<Array2<bool>> {
    SweepRunner::new().point_visibility(grid, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;

    const STRATEGIES: [Strategy; 3] = [Strategy::RayCast, Strategy::Bresenham, Strategy::Voxel];

    /// Rolling terrain: sum of two sine waves plus a constant.
    fn double_sine(width: usize, height: usize) -> HeightGrid {
        HeightGrid::from_fn(width, height, |x, y| {
            let fx = (x as f32 * 0.9).sin() * 4.0;
            let fy = (y as f32 * 0.7).sin() * 3.0;
            (fx + fy).round() as i16 + 7
        })
        .unwrap()
    }

    fn cone() -> HeightGrid {
        HeightGrid::from_fn(5, 5, |x, y| {
            let d = (x as i32 - 2).abs().max((y as i32 - 2).abs());
            (2 - d).max(0) as i16
        })
        .unwrap()
    }

    #[test]
    fn flat_plane_every_strategy_sees_everything() {
        let grid = HeightGrid::flat(5, 5, 0).unwrap();
        for strategy in STRATEGIES {
            let config = SweepConfig::for_grid(&grid)
                .with_radius(5)
                .with_strategy(strategy)
                .with_vantage_point(2, 2);
            let bitmap = point_visibility(&grid, &config).unwrap();
            assert!(bitmap.iter().all(|&v| v), "{strategy}");

            let counts = visibility_map(&grid, &config).unwrap();
            assert_eq!(counts[[2, 2]], 25, "{strategy}");
        }
    }

    #[test]
    fn cone_peak_every_strategy_sees_everything() {
        let grid = cone();
        for strategy in STRATEGIES {
            let config = SweepConfig::for_grid(&grid)
                .with_radius(5)
                .with_strategy(strategy)
                .with_vantage_point(2, 2);
            let bitmap = point_visibility(&grid, &config).unwrap();
            assert_eq!(bitmap.iter().filter(|&&v| v).count(), 25, "{strategy}");
        }
    }

    #[test]
    fn flat_interior_counts_match_disk_size() {
        let grid = HeightGrid::flat(9, 9, 0).unwrap();
        for strategy in [Strategy::Bresenham, Strategy::Voxel] {
            let config = SweepConfig::for_grid(&grid)
                .with_radius(3)
                .with_strategy(strategy)
                .with_parallelism(Parallelism::Serial);
            let counts = visibility_map(&grid, &config).unwrap();
            assert_eq!(counts[[4, 4]], 29);
            // corner vantage sees the in-bounds quarter disk
            assert_eq!(counts[[0, 0]], 11);
        }
    }

    #[test]
    fn every_cell_sees_itself() {
        let grid = double_sine(10, 10);
        for strategy in STRATEGIES {
            let config = SweepConfig::for_grid(&grid)
                .with_radius(6)
                .with_num_angles(90)
                .with_strategy(strategy);
            let counts = visibility_map(&grid, &config).unwrap();
            assert!(counts.iter().all(|&c| c >= 1), "{strategy}");
        }
    }

    #[test]
    fn counts_never_exceed_reachable_cells() {
        let grid = double_sine(12, 9);
        let config = SweepConfig::for_grid(&grid).with_radius(4).with_num_angles(720);
        let counts = visibility_map(&grid, &config).unwrap();
        // a radius-4 disk holds 49 cells
        assert!(counts.iter().all(|&c| c <= 49));
    }

    #[test]
    fn resweep_is_bit_identical() {
        let grid = double_sine(10, 10);
        let config = SweepConfig::for_grid(&grid).with_radius(8).with_num_angles(180);
        let first = visibility_map(&grid, &config).unwrap();
        let second = visibility_map(&grid, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parallelism_does_not_change_results() {
        let grid = double_sine(10, 10);
        for strategy in STRATEGIES {
            let base = SweepConfig::for_grid(&grid)
                .with_radius(7)
                .with_num_angles(120)
                .with_vantage_offset(1)
                .with_strategy(strategy);
            let serial = visibility_map(&grid, &base.clone().with_parallelism(Parallelism::Serial))
                .unwrap();

            let mut modes = vec![
                Parallelism::Threads { threads: None },
                Parallelism::Threads { threads: Some(3) },
            ];
            modes.extend([1, 2, 3, 4, 12].map(|workers| Parallelism::Distributed { workers }));
            for mode in modes {
                let counts = visibility_map(&grid, &base.clone().with_parallelism(mode)).unwrap();
                assert_eq!(counts, serial, "{strategy} {mode}");
            }
        }
    }

    #[test]
    fn row_ranges_concatenate_to_full_map() {
        let grid = double_sine(8, 10);
        let solver = RayCastSolver::new(5, 90);
        let full = compute_row_range(&grid, &solver, 0, RowRange::new(0, 10), None).unwrap();
        let top = compute_row_range(&grid, &solver, 0, RowRange::new(0, 4), None).unwrap();
        let bottom = compute_row_range(&grid, &solver, 0, RowRange::new(4, 10), None).unwrap();
        assert_eq!(top.dim(), (4, 8));
        assert_eq!(full.slice(ndarray::s![0..4, ..]), top);
        assert_eq!(full.slice(ndarray::s![4..10, ..]), bottom);
    }

    #[test]
    fn bad_row_range_is_rejected() {
        let grid = HeightGrid::flat(3, 3, 0).unwrap();
        let solver = RayCastSolver::new(2, 8);
        assert!(matches!(
            compute_row_range(&grid, &solver, 0, RowRange::new(2, 4), None),
            Err(VisibilityError::BadRowRange { start: 2, end: 4, height: 3 })
        ));
    }

    #[test]
    fn raycast_bitmap_agrees_with_count() {
        let grid = double_sine(10, 10);
        let solver = RayCastSolver::new(6, 360);
        let mut seen = SeenCache::new(6);
        for (x, y) in [(0, 0), (4, 5), (9, 2)] {
            let vantage = Vantage::new(&grid, x, y, 0).unwrap();
            let bitmap = solver.visibility_bitmap(&grid, &vantage);
            let count = solver.visible_count(&grid, &vantage, &mut seen);
            assert_eq!(bitmap.iter().filter(|&&v| v).count() as u32, count);
        }
    }

    #[test]
    fn bitmap_is_false_beyond_radius() {
        let grid = HeightGrid::flat(11, 11, 0).unwrap();
        for strategy in STRATEGIES {
            let config = SweepConfig::for_grid(&grid)
                .with_radius(2)
                .with_strategy(strategy)
                .with_vantage_point(5, 5);
            let bitmap = point_visibility(&grid, &config).unwrap();
            assert!(!bitmap[[5, 8]], "{strategy}");
            assert!(!bitmap[[0, 0]], "{strategy}");
            assert!(bitmap[[5, 5]], "{strategy}");
        }
    }

    #[test]
    fn huge_radius_is_capped_to_the_grid() {
        let grid = HeightGrid::flat(3, 3, 0).unwrap();
        for strategy in STRATEGIES {
            let config = SweepConfig::for_grid(&grid)
                .with_radius(1_000_000)
                .with_strategy(strategy)
                .with_parallelism(Parallelism::Serial);
            let counts = visibility_map(&grid, &config).unwrap();
            assert!(counts.iter().all(|&c| c == 9), "{strategy}");
            let bitmap = point_visibility(&grid, &config.with_vantage_point(0, 2)).unwrap();
            assert!(bitmap.iter().all(|&v| v), "{strategy}");
        }
    }

    #[test]
    fn capped_radius_matches_uncapped_counts() {
        let grid = double_sine(6, 5);
        for (test, strategy) in [
            (LineTest::Interpolated, Strategy::Bresenham),
            (LineTest::Voxel, Strategy::Voxel),
        ] {
            let uncapped = BresenhamSolver::new(40, test);
            let expected = compute_row_range(&grid, &uncapped, 0, RowRange::new(0, 5), None).unwrap();
            let config = SweepConfig::for_grid(&grid)
                .with_radius(40)
                .with_strategy(strategy)
                .with_parallelism(Parallelism::Serial);
            assert_eq!(config.solver().radius(), 11);
            assert_eq!(visibility_map(&grid, &config).unwrap(), expected, "{strategy}");
        }
    }

    #[test]
    fn single_origin_needs_a_vantage() {
        let grid = HeightGrid::flat(3, 3, 0).unwrap();
        let config = SweepConfig::for_grid(&grid);
        assert!(matches!(
            point_visibility(&grid, &config),
            Err(VisibilityError::MissingVantage)
        ));
    }

    #[test]
    fn invalid_config_fails_before_work() {
        let grid = HeightGrid::flat(3, 3, 0).unwrap();
        let runner = SweepRunner::new();
        let config = SweepConfig::for_grid(&grid).with_radius(0);
        assert!(matches!(
            runner.visibility_map(&grid, &config),
            Err(VisibilityError::ZeroRadius)
        ));
        assert_eq!(runner.progress(), 0);
    }

    #[test]
    fn runner_counts_completed_rows() {
        let grid = double_sine(6, 7);
        let runner = SweepRunner::new();
        let config = SweepConfig::for_grid(&grid).with_radius(3).with_num_angles(36);
        runner.visibility_map(&grid, &config).unwrap();
        assert_eq!(runner.progress(), 7);
        runner
            .visibility_map(&grid, &config.with_parallelism(Parallelism::Distributed { workers: 3 }))
            .unwrap();
        assert_eq!(runner.progress(), 7);
    }
}
