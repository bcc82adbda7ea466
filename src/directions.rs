use std::f32::consts::TAU;

use crate::geometry::{direction_at, IVec2, Vec2};

/// Directions explored from every vantage of a sweep.
///
/// Built once per `(radius, num_angles)` and shared read-only by all workers.
#[derive(Debug, Clone, PartialEq)]
pub enum RayDirectionSet {
    /// `num_angles` evenly spaced rays, each scaled to `radius`.
    Angular {
        directions: Vec<Vec2>,
        radius: u32,
        num_angles: u32,
    },
    /// Every integer offset with `dx² + dy² <= radius²`, origin included.
    Disk { offsets: Vec<IVec2>, radius: u32 },
}

impl RayDirectionSet {
    pub fn angular(radius: u32, num_angles: u32) -> Self {
        let scale = radius as f32;
        let directions = (0..num_angles)
            .map(|i| {
                let theta = TAU * i as f32 / num_angles as f32;
                direction_at(theta) * scale
            })
            .collect();
        Self::Angular {
            directions,
            radius,
            num_angles,
        }
    }

    /// Offsets enumerated row by row, from `dy = -radius` to `dy = radius`.
    pub fn disk(radius: u32) -> Self {
        let r = radius as i32;
        let r_sq = (radius as i64) * (radius as i64);
        let mut offsets = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                let d_sq = (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64);
                if d_sq <= r_sq {
                    offsets.push(IVec2::new(dx, dy));
                }
            }
        }
        Self::Disk { offsets, radius }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Angular { directions, .. } => directions.len(),
            Self::Disk { offsets, .. } => offsets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ray vectors of an angular set, empty for a disk.
    pub fn rays(&self) -> &[Vec2] {
        match self {
            Self::Angular { directions, .. } => directions,
            Self::Disk { .. } => &[],
        }
    }

    /// Target offsets of a disk set, empty for an angular one.
    pub fn offsets(&self) -> &[IVec2] {
        match self {
            Self::Disk { offsets, .. } => offsets,
            Self::Angular { .. } => &[],
        }
    }

    pub fn radius(&self) -> u32 {
        match self {
            Self::Angular { radius, .. } | Self::Disk { radius, .. } => *radius,
        }
    }

}
