//! Slice-level I/O helpers for demo tools.
//!
//! - `load_slices`: read N same-sized grayscale images into a stack (z = file
//!   order).
//! - `save_slice`: write one z-slice to a grayscale PNG (8- or 16-bit to match
//!   the stack depth).
//! - `write_json_file`: pretty-print a serializable report to disk.
//!
//! Volume file formats and metadata stay out of this crate.

use image::{GrayImage, ImageBuffer, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::stack::{BitDepth, VoxelStack};
use super::traits::VoxelAccess;

/// Load grayscale images as the z-slices of a new 8-bit stack.
pub fn load_slices(paths: &[impl AsRef<Path>]) -> Result<VoxelStack, String> {
    if paths.is_empty() {
        return Err("no slice images given".to_string());
    }
    let mut stack: Option<VoxelStack> = None;
    for (z, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
            .into_luma8();
        let (w, h) = (img.width() as usize, img.height() as usize);
        let stack = stack.get_or_insert_with(|| {
            VoxelStack::empty(w, h, paths.len(), BitDepth::Eight)
        });
        if (w, h) != (stack.width(), stack.height()) {
            return Err(format!(
                "slice {} is {}x{}, expected {}x{}",
                path.display(),
                w,
                h,
                stack.width(),
                stack.height()
            ));
        }
        stack.set_current_z(z);
        for y in 0..h {
            for x in 0..w {
                stack.set_pixel(x, y, img.get_pixel(x as u32, y as u32)[0] as i64);
            }
        }
    }
    Ok(stack.expect("at least one slice loaded"))
}

/// Write the z-slice of a stack to a grayscale PNG.
pub fn save_slice(stack: &VoxelStack, z: usize, path: &Path) -> Result<(), String> {
    if z >= stack.depth() {
        return Err(format!("slice {z} out of range (depth {})", stack.depth()));
    }
    ensure_parent_dir(path)?;
    let (w, h) = (stack.width() as u32, stack.height() as u32);
    match stack.bit_depth() {
        BitDepth::Eight => {
            let img = GrayImage::from_fn(w, h, |x, y| {
                Luma([stack.get_voxel(x as usize, y as usize, z) as u8])
            });
            img.save(path)
                .map_err(|e| format!("Failed to save {}: {e}", path.display()))
        }
        BitDepth::Sixteen => {
            let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(w, h, |x, y| {
                Luma([stack.get_voxel(x as usize, y as usize, z) as u16])
            });
            img.save(path)
                .map_err(|e| format!("Failed to save {}: {e}", path.display()))
        }
    }
}

/// Pretty-print a serializable value to a JSON file.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
