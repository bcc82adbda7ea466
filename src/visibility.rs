//! Line-of-sight evaluation between a vantage and its surrounding cells.
//!
//! Elevation angles are slopes `(target - eye) / planar_distance`. The eye is
//! the vantage sample plus the vantage offset; targets use their raw sample.
//! A cell is hidden only by a closer cell subtending a strictly steeper angle.

use crate::bresenham::{Line2, Line3};
use crate::error::{Result, VisibilityError};
use crate::geometry::{elevation_angle, I64Vec3, IVec2, Magnitude, Vec2};
use crate::grid::HeightGrid;
use crate::raycast::{RayMarch, RaySample};
use crate::seen_cache::SeenCache;

/// The observer: a grid cell and its eye elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vantage {
    pub cell: IVec2,
    pub elevation: i64,
}

impl Vantage {
    /// Vantage at `(x, y)` with `offset` added to the terrain sample.
    pub fn new(grid: &HeightGrid, x: usize, y: usize, offset: i32) -> Result<Self> {
        if x >= grid.width() || y >= grid.height() {
            return Err(VisibilityError::VantageOutOfBounds {
                x,
                y,
                width: grid.width(),
                height: grid.height(),
            });
        }
        Ok(Self::from_sample(
            IVec2::new(x as i32, y as i32),
            grid.get(x, y),
            offset,
        ))
    }

    #[inline]
    pub(crate) fn from_sample(cell: IVec2, sample: i16, offset: i32) -> Self {
        Self {
            cell,
            elevation: sample as i64 + offset as i64,
        }
    }

    #[inline]
    pub fn eye(&self) -> f32 {
        self.elevation as f32
    }
}

/// Running maximum elevation angle along one ray.
#[derive(Debug, Clone, Copy)]
pub struct Horizon {
    max_angle: f32,
}

impl Default for Horizon {
    fn default() -> Self {
        Self::new()
    }
}

impl Horizon {
    pub fn new() -> Self {
        Self {
            max_angle: f32::NEG_INFINITY,
        }
    }

    /// Feed the next cell's angle; returns whether that cell is visible.
    ///
    /// Equal angles stay visible, only a strictly steeper angle raises the horizon.
    #[inline]
    pub fn observe(&mut self, angle: f32) -> bool {
        let visible = angle >= self.max_angle;
        if angle > self.max_angle {
            self.max_angle = angle;
        }
        visible
    }

    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }
}

/// March every direction from `vantage`, calling `on_visible` for each
/// stepped sample not hidden behind the running horizon of its ray.
///
/// The same cell may be reported by several rays, or twice by one ray.
pub fn ray_sweep(
    grid: &HeightGrid,
    vantage: &Vantage,
    directions: &[Vec2],
    radius: u32,
    mut on_visible: impl FnMut(&RaySample),
) {
    let eye = vantage.eye();
    for &direction in directions {
        let mut horizon = Horizon::new();
        let march = RayMarch::new(vantage.cell, direction, grid.width(), grid.height(), radius);
        for sample in march {
            let Some(height) = grid.at(sample.cell) else {
                break;
            };
            let Some(angle) = elevation_angle(eye, height as f32, sample.distance()) else {
                continue;
            };
            if horizon.observe(angle) {
                on_visible(&sample);
            }
        }
    }
}

/// Distinct cells visible from `vantage`, the vantage itself included.
///
/// `seen` is reset before the sweep and deduplicates cells reached by more
/// than one ray.
pub fn ray_sweep_count(
    grid: &HeightGrid,
    vantage: &Vantage,
    directions: &[Vec2],
    radius: u32,
    seen: &mut SeenCache,
) -> u32 {
    seen.reset();
    let mut count = 1;
    ray_sweep(grid, vantage, directions, radius, |sample| {
        if seen.mark_and_test(sample.offset) == Some(false) {
            count += 1;
        }
    });
    count
}

/// Whether `target` is visible from `vantage` along the 2D integer line.
///
/// Every cell strictly between the two must not subtend a steeper angle than
/// the target itself. Targets outside the grid are never visible.
pub fn line_of_sight(grid: &HeightGrid, vantage: &Vantage, target: IVec2) -> bool {
    let Some(target_height) = grid.at(target) else {
        return false;
    };
    if target == vantage.cell {
        return true;
    }
    let eye = vantage.eye();
    let Some(target_angle) =
        elevation_angle(eye, target_height as f32, (target - vantage.cell).magnitude())
    else {
        return true;
    };

    for cell in Line2::new(vantage.cell, target).skip(1) {
        if cell == target {
            break;
        }
        let Some(height) = grid.at(cell) else {
            return false;
        };
        if let Some(angle) = elevation_angle(eye, height as f32, (cell - vantage.cell).magnitude()) {
            if angle > target_angle {
                return false;
            }
        }
    }
    true
}

/// Whether `target` is visible along the 3D integer line through
/// `(x, y, elevation)` space.
///
/// Only intermediate columns occlude: the target is hidden when a voxel outside
/// the vantage and target columns lies below the terrain of its cell.
pub fn voxel_line_of_sight(grid: &HeightGrid, vantage: &Vantage, target: IVec2) -> bool {
    let Some(target_height) = grid.at(target) else {
        return false;
    };
    if target == vantage.cell {
        return true;
    }
    let start = I64Vec3::new(
        vantage.cell.x as i64,
        vantage.cell.y as i64,
        vantage.elevation,
    );
    let end = I64Vec3::new(target.x as i64, target.y as i64, target_height as i64);

    for voxel in Line3::new(start, end).skip(1) {
        let cell = IVec2::new(voxel.x as i32, voxel.y as i32);
        if cell == vantage.cell || cell == target {
            continue;
        }
        match grid.at(cell) {
            Some(terrain) if voxel.z < terrain as i64 => return false,
            Some(_) => {}
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::RayDirectionSet;

    fn cone() -> HeightGrid {
        HeightGrid::new(
            5,
            5,
            vec![
                0, 0, 0, 0, 0, //
                0, 1, 1, 1, 0, //
                0, 1, 2, 1, 0, //
                0, 1, 1, 1, 0, //
                0, 0, 0, 0, 0,
            ],
        )
        .unwrap()
    }

    fn angular(radius: u32, num_angles: u32) -> Vec<Vec2> {
        RayDirectionSet::angular(radius, num_angles).rays().to_vec()
    }

    fn count_at(grid: &HeightGrid, x: usize, y: usize, radius: u32, angles: u32) -> u32 {
        let vantage = Vantage::new(grid, x, y, 0).unwrap();
        let mut seen = SeenCache::new(radius);
        ray_sweep_count(grid, &vantage, &angular(radius, angles), radius, &mut seen)
    }

    #[test]
    fn horizon_is_monotonic() {
        let mut horizon = Horizon::new();
        assert!(horizon.observe(-1.0));
        assert!(horizon.observe(0.5));
        assert!(!horizon.observe(0.25));
        assert!(horizon.observe(0.5));
        assert!(!horizon.observe(-3.0));
        assert_eq!(horizon.max_angle(), 0.5);
    }

    #[test]
    fn flat_plane_sees_every_cell() {
        let grid = HeightGrid::flat(5, 5, 0).unwrap();
        assert_eq!(count_at(&grid, 2, 2, 5, 360), 25);
    }

    #[test]
    fn cone_peak_sees_every_cell() {
        assert_eq!(count_at(&cone(), 2, 2, 5, 360), 25);
    }

    #[test]
    fn radius_limits_flat_count_to_disk() {
        let grid = HeightGrid::flat(9, 9, 3).unwrap();
        assert_eq!(count_at(&grid, 4, 4, 3, 3600), 29);
    }

    #[test]
    fn ridge_hides_lower_cells_behind_it() {
        let grid = HeightGrid::new(7, 1, vec![0, 0, 5, 1, 1, 1, 9]).unwrap();
        assert_eq!(count_at(&grid, 0, 0, 10, 360), 3);

        let vantage = Vantage::new(&grid, 0, 0, 0).unwrap();
        let mut visible = Vec::new();
        ray_sweep(&grid, &vantage, &angular(10, 360), 10, |s| visible.push(s.cell.x));
        assert!(visible.contains(&2));
        assert!(!visible.contains(&3));
        assert!(!visible.contains(&6));
    }

    #[test]
    fn eye_height_reveals_hidden_cells() {
        let grid = HeightGrid::new(7, 1, vec![0, 0, 5, 1, 1, 1, 9]).unwrap();
        let vantage = Vantage::new(&grid, 0, 0, 20).unwrap();
        let mut seen = SeenCache::new(10);
        let count = ray_sweep_count(&grid, &vantage, &angular(10, 360), 10, &mut seen);
        assert_eq!(count, 7);
    }

    #[test]
    fn count_includes_self_on_isolated_cell() {
        let grid = HeightGrid::flat(1, 1, 100).unwrap();
        assert_eq!(count_at(&grid, 0, 0, 10, 36), 1);
    }

    #[test]
    fn vantage_must_be_in_grid() {
        let grid = HeightGrid::flat(3, 3, 0).unwrap();
        assert!(matches!(
            Vantage::new(&grid, 3, 0, 0),
            Err(VisibilityError::VantageOutOfBounds { x: 3, y: 0, .. })
        ));
    }

    #[test]
    fn line_of_sight_over_flat_and_cone() {
        let flat = HeightGrid::flat(5, 5, 0).unwrap();
        let peak = Vantage::new(&cone(), 2, 2, 0).unwrap();
        let centre = Vantage::new(&flat, 2, 2, 0).unwrap();
        for y in 0..5 {
            for x in 0..5 {
                let target = IVec2::new(x, y);
                assert!(line_of_sight(&flat, &centre, target));
                assert!(line_of_sight(&cone(), &peak, target));
                assert!(voxel_line_of_sight(&flat, &centre, target));
                assert!(voxel_line_of_sight(&cone(), &peak, target));
            }
        }
    }

    #[test]
    fn line_of_sight_ridge() {
        let grid = HeightGrid::new(7, 1, vec![0, 0, 5, 1, 1, 1, 9]).unwrap();
        let vantage = Vantage::new(&grid, 0, 0, 0).unwrap();
        let visible: Vec<bool> = (0..7)
            .map(|x| line_of_sight(&grid, &vantage, IVec2::new(x, 0)))
            .collect();
        assert_eq!(visible, vec![true, true, true, false, false, false, false]);
        assert!(!line_of_sight(&grid, &vantage, IVec2::new(7, 0)));
    }

    #[test]
    fn voxel_line_passes_under_ridge() {
        let grid = HeightGrid::new(7, 1, vec![0, 0, 5, 1, 1, 1, 9]).unwrap();
        let vantage = Vantage::new(&grid, 0, 0, 0).unwrap();
        let visible: Vec<bool> = (0..7)
            .map(|x| voxel_line_of_sight(&grid, &vantage, IVec2::new(x, 0)))
            .collect();
        assert_eq!(visible, vec![true, true, true, false, false, false, false]);
    }

    #[test]
    fn adjacent_cliff_is_visible() {
        let grid = HeightGrid::new(2, 1, vec![0, 5]).unwrap();
        let vantage = Vantage::new(&grid, 0, 0, 0).unwrap();
        let cliff = IVec2::new(1, 0);
        assert!(line_of_sight(&grid, &vantage, cliff));
        assert!(voxel_line_of_sight(&grid, &vantage, cliff));
    }
}
