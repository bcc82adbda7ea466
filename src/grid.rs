//! HeightGrid: dense row-major elevation samples.

use ndarray::{Array2, ArrayView2};

use crate::error::{Result, VisibilityError};
use crate::geometry::IVec2;

/// Elevation raster, indexed by `(x, y)` with `0 <= x < width`, `0 <= y < height`.
///
/// Backed by an `Array2` of shape `(height, width)` in standard layout, so the
/// flattened samples are row-major exactly as they appear in a `.raw` file.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    samples: Array2<i16>,
}

impl HeightGrid {
    /// Build a grid from row-major samples, validating `len == width * height`.
    pub fn new(width: usize, height: usize, samples: Vec<i16>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width * height;
        if samples.len() != expected {
            return Err(VisibilityError::SizeMismatch {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        let samples = Array2::from_shape_vec((height, width), samples)?;
        Ok(Self { samples })
    }

    /// Wrap an existing `(height, width)` array.
    pub fn from_array(samples: Array2<i16>) -> Result<Self> {
        let (height, width) = samples.dim();
        check_dimensions(width, height)?;
        let samples = if samples.is_standard_layout() {
            samples
        } else {
            samples.as_standard_layout().into_owned()
        };
        Ok(Self { samples })
    }

    /// Build a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> i16) -> Result<Self> {
        check_dimensions(width, height)?;
        let samples = Array2::from_shape_fn((height, width), |(y, x)| f(x, y));
        Ok(Self { samples })
    }

    /// Constant-elevation plane.
    pub fn flat(width: usize, height: usize, elevation: i16) -> Result<Self> {
        Self::from_fn(width, height, |_, _| elevation)
    }

    /// Plane rising by `slope_x` per column and `slope_y` per row, zero at the origin.
    pub fn sloped(width: usize, height: usize, slope_x: i16, slope_y: i16) -> Result<Self> {
        Self::from_fn(width, height, |x, y| {
            slope_x.saturating_mul(x as i16).saturating_add(slope_y.saturating_mul(y as i16))
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.samples.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.samples.nrows()
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Elevation at `(x, y)`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> i16 {
        self.samples[[y, x]]
    }

    /// Whether a signed cell coordinate lies inside the grid.
    #[inline]
    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width()
            && (cell.y as usize) < self.height()
    }

    /// Elevation at a signed cell coordinate, `None` outside the grid.
    #[inline]
    pub fn at(&self, cell: IVec2) -> Option<i16> {
        if self.contains(cell) {
            Some(self.samples[[cell.y as usize, cell.x as usize]])
        } else {
            None
        }
    }

    pub fn view(&self) -> ArrayView2<'_, i16> {
        self.samples.view()
    }

    /// Row-major samples, `None` only if the layout invariant was broken.
    pub fn as_slice(&self) -> Option<&[i16]> {
        self.samples.as_slice()
    }

    pub fn into_array(self) -> Array2<i16> {
        self.samples
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(VisibilityError::EmptyGrid { width, height });
    }
    Ok(())
}
