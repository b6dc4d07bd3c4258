//! An in-memory upload target.

use image::RgbaImage;
use parking_lot::Mutex;

use super::UploadSink;
use crate::geometry::Point;

/// Collects uploads into one atlas image per mipmap level.
///
/// Level `n` of the surface is `width >> n` by `height >> n`. Uploaded
/// pixels that fall outside a level are clipped; uploads for levels the
/// surface does not have are ignored.
#[derive(Debug)]
pub struct MemorySurface {
    levels: Mutex<Vec<RgbaImage>>,
    uploads: Mutex<usize>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32, max_level: u8) -> Self {
        let levels = (0..=max_level)
            .map(|level| RgbaImage::new(width >> level, height >> level))
            .collect();
        Self {
            levels: Mutex::new(levels),
            uploads: Mutex::new(0),
        }
    }

    /// A copy of the atlas at `level`, if the surface has that level.
    pub fn snapshot(&self, level: u8) -> Option<RgbaImage> {
        self.levels.lock().get(level as usize).cloned()
    }

    pub fn level_count(&self) -> usize {
        self.levels.lock().len()
    }

    /// Number of uploads received so far.
    pub fn upload_count(&self) -> usize {
        *self.uploads.lock()
    }
}

impl UploadSink for MemorySurface {
    fn receive(&self, level: u8, point: Point, pixels: &RgbaImage) {
        *self.uploads.lock() += 1;

        let mut levels = self.levels.lock();
        let Some(target) = levels.get_mut(level as usize) else {
            tracing::warn!(level, "upload for a mipmap level the surface does not have");
            return;
        };

        image::imageops::replace(target, pixels, point.x as i64, point.y as i64);
    }
}
