//! Floating-point ray marching from a cell centre.

use crate::geometry::{cell_center, containing_cell, IVec2, Magnitude, Vec2};

/// One cell visited by a [`RayMarch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySample {
    pub cell: IVec2,
    /// `cell - origin`
    pub offset: IVec2,
    pub distance_sq: i32,
}

impl RaySample {
    /// Planar distance from the vantage cell centre to this cell centre.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.offset.magnitude()
    }
}

/// Walks unit steps along `direction` from the centre of `origin`.
///
/// The origin itself is never yielded. Consecutive samples may fall in the same
/// cell, and different rays from one origin routinely share cells near it.
/// The march ends at the first sample that leaves the grid or lies farther
/// than `radius`, or after `radius` steps. A zero direction yields nothing.
#[derive(Debug, Clone)]
pub struct RayMarch {
    origin: IVec2,
    position: Vec2,
    step: Vec2,
    width: i32,
    height: i32,
    radius_sq: i32,
    steps_left: u32,
}

impl RayMarch {
    pub fn new(origin: IVec2, direction: Vec2, width: usize, height: usize, radius: u32) -> Self {
        let step = direction.normalize_or_zero();
        let steps_left = if step == Vec2::ZERO { 0 } else { radius };
        let r = radius.min(i32::MAX as u32) as i64;
        Self {
            origin,
            position: cell_center(origin),
            step,
            width: width.min(i32::MAX as usize) as i32,
            height: height.min(i32::MAX as usize) as i32,
            radius_sq: (r * r).min(i32::MAX as i64) as i32,
            steps_left,
        }
    }

    #[inline]
    fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }
}

impl Iterator for RayMarch {
    type Item = RaySample;

    fn next(&mut self) -> Option<RaySample> {
        if self.steps_left == 0 {
            return None;
        }
        self.steps_left -= 1;
        self.position += self.step;

        let cell = containing_cell(self.position);
        let offset = cell - self.origin;
        let distance_sq = offset.length_squared();
        if !self.in_bounds(cell) || distance_sq > self.radius_sq {
            self.steps_left = 0;
            return None;
        }
        Some(RaySample {
            cell,
            offset,
            distance_sq,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.steps_left as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(march: RayMarch) -> Vec<IVec2> {
        march.map(|s| s.cell).collect()
    }

    #[test]
    fn axis_ray_walks_the_row() {
        let march = RayMarch::new(IVec2::new(2, 2), Vec2::new(5.0, 0.0), 10, 10, 3);
        assert_eq!(
            cells(march),
            vec![IVec2::new(3, 2), IVec2::new(4, 2), IVec2::new(5, 2)]
        );
    }

    #[test]
    fn stops_at_grid_edge() {
        let march = RayMarch::new(IVec2::new(1, 1), Vec2::new(-1.0, 0.0), 5, 5, 10);
        assert_eq!(cells(march), vec![IVec2::new(0, 1)]);
    }

    #[test]
    fn zero_direction_is_empty() {
        let mut march = RayMarch::new(IVec2::new(1, 1), Vec2::ZERO, 5, 5, 10);
        assert_eq!(march.next(), None);
    }

    #[test]
    fn never_yields_beyond_radius() {
        for i in 0..64 {
            let theta = std::f32::consts::TAU * i as f32 / 64.0;
            let dir = crate::geometry::direction_at(theta) * 7.0;
            for sample in RayMarch::new(IVec2::new(20, 20), dir, 41, 41, 7) {
                assert!(sample.distance_sq <= 49);
                assert_ne!(sample.offset, IVec2::ZERO);
            }
        }
    }

    #[test]
    fn sample_distance_is_planar() {
        let sample = RaySample {
            cell: IVec2::new(3, 4),
            offset: IVec2::new(3, 4),
            distance_sq: 25,
        };
        assert_eq!(sample.distance(), 5.0);
    }
}
