//! Contact-sheet montage of saved frames.
//!
//! The first nine frame images in the output directory (by file name, which
//! is ordinal order) are tiled left to right, top to bottom into a 3x3 grid.
//! Every tile is the size of the first frame; larger frames are cropped by the
//! tile bounds and smaller ones leave black padding.

use crate::error::CoreResult;

use image::{RgbImage, imageops};
use std::path::{Path, PathBuf};

pub const THUMBNAIL_FILE_NAME: &str = "thumbnail_montage.jpg";
const GRID: u32 = 3;

/// Frame images in `dir`, sorted by file name. The montage itself is excluded.
pub fn list_frame_images(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.file_name().is_some_and(|n| n != THUMBNAIL_FILE_NAME)
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    frames.sort();
    Ok(frames)
}

/// Writes `thumbnail_montage.jpg` into `dir`.
///
/// Returns `Ok(None)` and logs a warning when there are no frames to tile.
pub fn generate_thumbnail(dir: &Path) -> CoreResult<Option<PathBuf>> {
    let frames = list_frame_images(dir)?;
    let Some(first) = frames.first() else {
        log::warn!("No frames found to generate thumbnail");
        return Ok(None);
    };

    let (tile_w, tile_h) = image::image_dimensions(first)?;
    let mut montage = RgbImage::new(tile_w * GRID, tile_h * GRID);

    for (index, path) in frames.iter().take((GRID * GRID) as usize).enumerate() {
        let tile = image::open(path)?.into_rgb8();
        let tile = if tile.dimensions() == (tile_w, tile_h) {
            tile
        } else {
            imageops::crop_imm(&tile, 0, 0, tile_w, tile_h).to_image()
        };
        let x = (index as u32 % GRID) * tile_w;
        let y = (index as u32 / GRID) * tile_h;
        imageops::replace(&mut montage, &tile, x as i64, y as i64);
    }

    let output = dir.join(THUMBNAIL_FILE_NAME);
    montage.save(&output)?;
    log::info!("Thumbnail montage generated: {}", output.display());
    Ok(Some(output))
}
