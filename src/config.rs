//! Sweep configuration and its up-front validation.

use std::fmt;

use log::debug;

use crate::error::{Result, VisibilityError};
use crate::grid::HeightGrid;
use crate::sweep::{BresenhamSolver, LineTest, RayCastSolver, Solver};

pub const DEFAULT_RADIUS: u32 = 100;
pub const DEFAULT_NUM_ANGLES: u32 = 360;

/// Which traversal decides visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Strategy {
    /// Angular ray marching with a running horizon per ray.
    #[default]
    #[value(name = "raycast")]
    RayCast,
    /// Every in-radius cell tested along its 2D integer line.
    Bresenham,
    /// Every in-radius cell tested along a 3D line through elevation space.
    Voxel,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::RayCast => "raycast",
            Strategy::Bresenham => "bresenham",
            Strategy::Voxel => "voxel",
        })
    }
}

/// How full-map sweeps spread their rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    Serial,
    /// Rayon work stealing, one row per task. `None` uses the global pool.
    Threads { threads: Option<usize> },
    /// Independent workers over contiguous row ranges, gathered in rank order.
    Distributed { workers: usize },
}

impl Default for Parallelism {
    fn default() -> Self {
        Parallelism::Threads { threads: None }
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parallelism::Serial => f.write_str("serial"),
            Parallelism::Threads { threads: None } => f.write_str("threads"),
            Parallelism::Threads { threads: Some(n) } => write!(f, "threads({n})"),
            Parallelism::Distributed { workers } => write!(f, "distributed({workers})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub width: usize,
    pub height: usize,
    pub radius: u32,
    pub num_angles: u32,
    /// Eye height added to the vantage sample only.
    pub vantage_offset: i32,
    /// Single-origin mode when set.
    pub vantage_point: Option<(usize, usize)>,
    pub strategy: Strategy,
    pub parallelism: Parallelism,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            radius: DEFAULT_RADIUS,
            num_angles: DEFAULT_NUM_ANGLES,
            vantage_offset: 0,
            vantage_point: None,
            strategy: Strategy::default(),
            parallelism: Parallelism::default(),
        }
    }
}

impl SweepConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Config sized to match `grid`.
    pub fn for_grid(grid: &HeightGrid) -> Self {
        Self::new(grid.width(), grid.height())
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_num_angles(mut self, num_angles: u32) -> Self {
        self.num_angles = num_angles;
        self
    }

    pub fn with_vantage_offset(mut self, offset: i32) -> Self {
        self.vantage_offset = offset;
        self
    }

    pub fn with_vantage_point(mut self, x: usize, y: usize) -> Self {
        self.vantage_point = Some((x, y));
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Check every parameter on its own, before any grid is touched.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VisibilityError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.radius == 0 {
            return Err(VisibilityError::ZeroRadius);
        }
        if self.num_angles == 0 {
            return Err(VisibilityError::ZeroAngles);
        }
        match self.parallelism {
            Parallelism::Threads { threads: Some(0) } | Parallelism::Distributed { workers: 0 } => {
                return Err(VisibilityError::ZeroWorkers)
            }
            _ => {}
        }
        if let Some((x, y)) = self.vantage_point {
            if x >= self.width || y >= self.height {
                return Err(VisibilityError::VantageOutOfBounds {
                    x,
                    y,
                    width: self.width,
                    height: self.height,
                });
            }
        }
        Ok(())
    }

    /// [`validate`](Self::validate), then check the grid has the configured extents.
    pub fn validate_for(&self, grid: &HeightGrid) -> Result<()> {
        self.validate()?;
        if grid.width() != self.width || grid.height() != self.height {
            return Err(VisibilityError::SizeMismatch {
                width: self.width,
                height: self.height,
                expected: self.width * self.height,
                actual: grid.len(),
            });
        }
        Ok(())
    }

    /// Radius actually used for traversal and scratch sizing.
    ///
    /// No in-grid offset is longer than `width + height - 2` and no ray stays
    /// in the grid for more steps than that plus one, so capping at
    /// `width + height` leaves every result unchanged.
    pub fn effective_radius(&self) -> u32 {
        let extent = self.width.saturating_add(self.height);
        let extent = u32::try_from(extent).unwrap_or(u32::MAX);
        self.radius.min(extent)
    }

    /// Solver for the configured strategy, with its direction set precomputed.
    pub fn solver(&self) -> Box<dyn Solver> {
        let radius = self.effective_radius();
        if radius < self.radius {
            debug!(
                "radius {} exceeds the {}x{} grid, using {radius}",
                self.radius, self.width, self.height
            );
        }
        match self.strategy {
            Strategy::RayCast => Box::new(RayCastSolver::new(radius, self.num_angles)),
            Strategy::Bresenham => Box::new(BresenhamSolver::new(radius, LineTest::Interpolated)),
            Strategy::Voxel => Box::new(BresenhamSolver::new(radius, LineTest::Voxel)),
        }
    }
}
