//! Headerless `.raw` grid files.
//!
//! Samples are native-endian, row-major, with no header: `i16` for heights,
//! `u32` for visible-count maps and `u8` (0/1) for single-origin bitmaps.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;

use crate::error::{Result, VisibilityError};
use crate::grid::HeightGrid;

const RAW_EXTENSION: &str = "raw";
const SAMPLE_BYTES: usize = std::mem::size_of::<i16>();

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> VisibilityError {
    let path = path.to_path_buf();
    move |source| VisibilityError::Io { path, source }
}

fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(RAW_EXTENSION) => Ok(()),
        _ => Err(VisibilityError::BadExtension(path.to_path_buf())),
    }
}

/// Read every `i16` sample in a `.raw` file.
///
/// Rejects a wrong extension, an unreadable file, an empty file and a byte
/// length that is not a whole number of samples. Nothing is truncated.
pub fn read_heights(path: impl AsRef<Path>) -> Result<Vec<i16>> {
    let path = path.as_ref();
    check_extension(path)?;

    let file = File::open(path).map_err(io_error(path))?;
    let len = file.metadata().map_err(io_error(path))?.len();
    if len == 0 {
        return Err(VisibilityError::EmptyFile(path.to_path_buf()));
    }
    if len % SAMPLE_BYTES as u64 != 0 {
        return Err(VisibilityError::MisalignedFile {
            path: path.to_path_buf(),
            len,
            element: SAMPLE_BYTES,
        });
    }

    let mut samples = vec![0i16; (len as usize) / SAMPLE_BYTES];
    let mut reader = BufReader::new(file);
    reader
        .read_i16_into::<NativeEndian>(&mut samples)
        .map_err(io_error(path))?;
    Ok(samples)
}

/// Read a `.raw` file as a `width x height` grid.
pub fn load_grid(path: impl AsRef<Path>, width: usize, height: usize) -> Result<HeightGrid> {
    let samples = read_heights(path)?;
    HeightGrid::new(width, height, samples)
}

/// Side lengths for a square grid holding `len` samples, if `len` is a perfect square.
pub fn infer_square_dimensions(len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let mut side = (len as f64).sqrt() as usize;
    // sqrt can land one off for large inputs
    while side * side > len {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= len {
        side += 1;
    }
    (side * side == len).then_some((side, side))
}

/// Write samples to a sibling temp file and rename it over `path` once complete.
fn write_atomically<T: Copy>(
    path: &Path,
    samples: impl IntoIterator<Item = T>,
    mut put: impl FnMut(&mut BufWriter<File>, T) -> std::io::Result<()>,
) -> Result<()> {
    check_extension(path)?;
    let tmp = temp_sibling(path);

    let result = (|| {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        for sample in samples {
            put(&mut writer, sample)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(VisibilityError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

pub fn write_heights(path: impl AsRef<Path>, grid: &HeightGrid) -> Result<()> {
    write_atomically(path.as_ref(), grid.view().iter().copied(), |w, v| {
        w.write_i16::<NativeEndian>(v)
    })
}

/// Write a visible-count map as `u32` samples.
pub fn write_counts(path: impl AsRef<Path>, counts: &Array2<u32>) -> Result<()> {
    write_atomically(path.as_ref(), counts.iter().copied(), |w, v| {
        w.write_u32::<NativeEndian>(v)
    })
}

/// Write a single-origin bitmap as one byte per cell, 1 for visible.
pub fn write_bitmap(path: impl AsRef<Path>, bitmap: &Array2<bool>) -> Result<()> {
    write_atomically(path.as_ref(), bitmap.iter().copied(), |w, v| {
        w.write_u8(u8::from(v))
    })
}
