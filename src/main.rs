//! Compute a visible-count map (or a single-origin bitmap) for a `.raw` grid.
//!
//! ```bash
//! viewshed terrain.raw counts.raw 1024 1024 100 360 8
//! viewshed terrain.raw seen.raw --vantage 512,512 --strategy bresenham
//! RUST_LOG=debug viewshed terrain.raw counts.raw --mode distributed 4
//! ```
//!
//! Width and height may be omitted for square grids.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};

use viewshed::raster_io::{infer_square_dimensions, read_heights, write_bitmap, write_counts};
use viewshed::summary::{summarize, visible_cells};
use viewshed::{
    HeightGrid, Parallelism, Strategy, SweepConfig, SweepRunner, DEFAULT_NUM_ANGLES,
    DEFAULT_RADIUS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Serial,
    Threads,
    Distributed,
}

#[derive(Parser, Debug)]
#[command(name = "viewshed")]
#[command(about = "Terrain visibility over headerless int16 .raw grids")]
struct Args {
    /// Input height grid (.raw, native-endian i16, row-major)
    input: PathBuf,

    /// Output grid (.raw): u32 counts, or u8 0/1 with --vantage
    output: PathBuf,

    /// Grid width in cells
    #[arg(requires = "height")]
    width: Option<usize>,

    /// Grid height in cells
    height: Option<usize>,

    /// Maximum planar distance from the vantage, in cells
    #[arg(default_value_t = DEFAULT_RADIUS)]
    radius: u32,

    /// Rays per vantage (raycast strategy)
    #[arg(default_value_t = DEFAULT_NUM_ANGLES)]
    num_angles: u32,

    /// Threads (threads mode) or workers (distributed mode)
    workers: Option<usize>,

    /// Eye height added to the vantage elevation
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    vantage_offset: i32,

    /// Single vantage as X,Y; writes a bitmap instead of counts
    #[arg(long, value_parser = parse_point)]
    vantage: Option<(usize, usize)>,

    #[arg(long, value_enum, default_value_t = Strategy::RayCast)]
    strategy: Strategy,

    #[arg(long, value_enum, default_value_t = Mode::Threads)]
    mode: Mode,
}

fn parse_point(s: &str) -> std::result::Result<(usize, usize), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x `{x}`: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y `{y}`: {e}"))?;
    Ok((x, y))
}

fn parallelism(mode: Mode, workers: Option<usize>) -> Parallelism {
    match mode {
        Mode::Serial => Parallelism::Serial,
        Mode::Threads => Parallelism::Threads { threads: workers },
        Mode::Distributed => Parallelism::Distributed {
            workers: workers.unwrap_or_else(|| {
                std::thread::available_parallelism().map_or(1, |n| n.get())
            }),
        },
    }
}

fn run(args: &Args) -> Result<()> {
    let started = Instant::now();

    let samples = read_heights(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let (width, height) = match (args.width, args.height) {
        (Some(w), Some(h)) => (w, h),
        _ => match infer_square_dimensions(samples.len()) {
            Some(dims) => dims,
            None => bail!(
                "{} holds {} samples, which is not a square grid; pass WIDTH and HEIGHT",
                args.input.display(),
                samples.len()
            ),
        },
    };
    let grid = HeightGrid::new(width, height, samples)
        .with_context(|| format!("loading {}", args.input.display()))?;
    info!("loaded {}x{} grid from {}", width, height, args.input.display());

    let mut config = SweepConfig::new(width, height)
        .with_radius(args.radius)
        .with_num_angles(args.num_angles)
        .with_vantage_offset(args.vantage_offset)
        .with_strategy(args.strategy)
        .with_parallelism(parallelism(args.mode, args.workers));
    if let Some((x, y)) = args.vantage {
        config = config.with_vantage_point(x, y);
    }
    config.validate_for(&grid).context("invalid configuration")?;

    let runner = SweepRunner::new();
    if config.vantage_point.is_some() {
        let bitmap = runner.point_visibility(&grid, &config)?;
        info!("{} cells visible", visible_cells(&bitmap));
        write_bitmap(&args.output, &bitmap)
            .with_context(|| format!("writing {}", args.output.display()))?;
    } else {
        let counts = runner.visibility_map(&grid, &config)?;
        if let Some(summary) = summarize(&counts) {
            info!("{summary}");
        }
        write_counts(&args.output, &counts)
            .with_context(|| format!("writing {}", args.output.display()))?;
    }

    info!(
        "wrote {} in {:.2?}",
        args.output.display(),
        started.elapsed()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{e:#}");
        process::exit(1);
    }
}
