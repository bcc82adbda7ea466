//! Geometric primitives shared by the traversal engines.
//!
//! Vector arithmetic comes from `glam`: componentwise operators, scalar ops on
//! either side, `abs`, `length` and `normalize_or_zero`. This module adds the
//! pieces glam leaves out for integer vectors and the grid-specific helpers.

pub use glam::{I64Vec3, IVec2, Vec2};

/// Euclidean magnitude for vector types that glam only gives a squared length.
pub trait Magnitude {
    fn magnitude(&self) -> f32;
}

impl Magnitude for IVec2 {
    #[inline]
    fn magnitude(&self) -> f32 {
        (self.length_squared() as f32).sqrt()
    }
}

impl Magnitude for I64Vec3 {
    #[inline]
    fn magnitude(&self) -> f32 {
        (self.length_squared() as f64).sqrt() as f32
    }
}

impl Magnitude for Vec2 {
    #[inline]
    fn magnitude(&self) -> f32 {
        self.length()
    }
}

/// Continuous position of a cell's centre.
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    cell.as_vec2() + 0.5
}

/// Cell containing a continuous position (the cell whose centre is nearest).
#[inline]
pub fn containing_cell(position: Vec2) -> IVec2 {
    position.floor().as_ivec2()
}

/// Unit vector at `theta` radians, measured from +x towards +y.
#[inline]
pub fn direction_at(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Slope of the sight line from an observer at `from_elevation` to a point
/// `distance` cells away at `to_elevation`.
///
/// Returns `None` at zero distance, which only happens at the vantage itself.
#[inline]
pub fn elevation_angle(from_elevation: f32, to_elevation: f32, distance: f32) -> Option<f32> {
    if distance > 0.0 {
        Some((to_elevation - from_elevation) / distance)
    } else {
        None
    }
}
