//! Integer line walks in 2D and 3D.
//!
//! Both walks advance one unit along the dominant axis per step (ties go to
//! x, then y) and step a minor axis when its decision variable is positive.
//! Each yields every cell from `start` to `end` inclusive, exactly once.

use crate::geometry::{I64Vec3, IVec2};

#[derive(Debug, Clone)]
struct Stepper<const N: usize> {
    position: [i64; N],
    delta: [i64; N],
    sign: [i64; N],
    decision: [i64; N],
    major: usize,
    remaining: u64,
}

impl<const N: usize> Stepper<N> {
    fn new(start: [i64; N], end: [i64; N]) -> Self {
        let mut delta = [0; N];
        let mut sign = [0; N];
        for axis in 0..N {
            let d = end[axis] - start[axis];
            delta[axis] = d.abs();
            sign[axis] = d.signum();
        }

        let mut major = 0;
        for axis in 1..N {
            if delta[axis] > delta[major] {
                major = axis;
            }
        }

        let mut decision = [0; N];
        for axis in 0..N {
            if axis != major {
                decision[axis] = 2 * delta[axis] - delta[major];
            }
        }

        Self {
            position: start,
            delta,
            sign,
            decision,
            major,
            remaining: delta[major] as u64 + 1,
        }
    }

    fn advance(&mut self) -> Option<[i64; N]> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.position;
        self.remaining -= 1;
        if self.remaining > 0 {
            let major = self.major;
            self.position[major] += self.sign[major];
            for axis in 0..N {
                if axis == major {
                    continue;
                }
                if self.decision[axis] > 0 {
                    self.position[axis] += self.sign[axis];
                    self.decision[axis] -= 2 * self.delta[major];
                }
                self.decision[axis] += 2 * self.delta[axis];
            }
        }
        Some(current)
    }
}

/// Cells on the integer line between two grid cells.
#[derive(Debug, Clone)]
pub struct Line2(Stepper<2>);

impl Line2 {
    pub fn new(start: IVec2, end: IVec2) -> Self {
        Self(Stepper::new(
            [start.x as i64, start.y as i64],
            [end.x as i64, end.y as i64],
        ))
    }
}

impl Iterator for Line2 {
    type Item = IVec2;

    fn next(&mut self) -> Option<IVec2> {
        self.0
            .advance()
            .map(|[x, y]| IVec2::new(x as i32, y as i32))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Line2 {}

/// Voxels on the integer line between two `(x, y, elevation)` points.
#[derive(Debug, Clone)]
pub struct Line3(Stepper<3>);

impl Line3 {
    pub fn new(start: I64Vec3, end: I64Vec3) -> Self {
        Self(Stepper::new(start.to_array(), end.to_array()))
    }
}

impl Iterator for Line3 {
    type Item = I64Vec3;

    fn next(&mut self) -> Option<I64Vec3> {
        self.0.advance().map(I64Vec3::from_array)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Line3 {}
