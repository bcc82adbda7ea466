use ndarray::Array2;

use crate::geometry::IVec2;

/// Per-vantage scratch marking which offsets have already been counted.
///
/// Covers offsets in `[-radius, radius]` on both axes. One cache belongs to
/// one worker; it is reset between vantages, never shared across them.
#[derive(Debug, Clone)]
pub struct SeenCache {
    radius: i32,
    cells: Array2<bool>,
}

impl SeenCache {
    pub fn new(radius: u32) -> Self {
        let radius = radius.min(i32::MAX as u32 / 2 - 1) as i32;
        let side = (2 * radius + 1) as usize;
        Self {
            radius,
            cells: Array2::from_elem((side, side), false),
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius as u32
    }

    /// Clear every entry. Called once per vantage before its sweep.
    pub fn reset(&mut self) {
        self.cells.fill(false);
    }

    /// Mark `offset` and report whether it was already marked.
    ///
    /// Returns `None` for offsets outside the cache, which are never indexed.
    pub fn mark_and_test(&mut self, offset: IVec2) -> Option<bool> {
        let index = offset + self.radius;
        let side = 2 * self.radius + 1;
        if index.x < 0 || index.y < 0 || index.x >= side || index.y >= side {
            return None;
        }
        let slot = &mut self.cells[[index.y as usize, index.x as usize]];
        let seen = *slot;
        *slot = true;
        Some(seen)
    }

    /// Number of marked offsets.
    pub fn marked(&self) -> usize {
        self.cells.iter().filter(|&&seen| seen).count()
    }
}
