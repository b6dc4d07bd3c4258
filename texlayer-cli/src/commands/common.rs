//! Image helpers shared across CLI commands.

use std::path::Path;

use image::RgbaImage;

use crate::error::CliError;

/// Open and decode an image file as RGBA.
pub fn read_image(path: &Path) -> Result<RgbaImage, CliError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|source| CliError::ImageRead {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `pixels` to `path` as a PNG.
pub fn write_png(pixels: &RgbaImage, path: &Path) -> Result<(), CliError> {
    pixels
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| CliError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })
}

/// Create the output directory and its parents.
pub fn create_output_dir(path: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(path).map_err(|source| CliError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

/// File stem of `path`, or `"texture"` when it has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "texture".to_string())
}
