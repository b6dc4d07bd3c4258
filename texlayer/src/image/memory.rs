//! In-memory image buffers.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::RwLock;

use super::{CloseableImage, ImageError, UploadSink};
use crate::color::{Color, ColorBlender};
use crate::geometry::{Point, Rect};

/// Pixel storage shared between an image and its sub views.
struct Storage {
    pixels: RgbaImage,
    closed: bool,
}

/// A [`CloseableImage`] backed by an [`RgbaImage`].
///
/// Sub images are views into the same storage: writes through a view are
/// visible in the parent and vice versa. Closing the root image releases
/// the pixels for every view; closing a view only invalidates that view.
pub struct MemoryImage {
    storage: Arc<RwLock<Storage>>,
    origin: Point,
    width: u32,
    height: u32,
    level: u8,
    sink: Option<Arc<dyn UploadSink>>,
    is_root: bool,
    view_closed: bool,
}

impl MemoryImage {
    /// A transparent image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_rgba(RgbaImage::new(width, height))
    }

    /// Take ownership of existing pixels.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            storage: Arc::new(RwLock::new(Storage {
                pixels,
                closed: false,
            })),
            origin: Point::ORIGIN,
            width,
            height,
            level: 0,
            sink: None,
            is_root: true,
            view_closed: false,
        }
    }

    /// Tag this image with the mipmap level it represents.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Bind the surface that receives this image's uploads.
    pub fn with_sink(mut self, sink: Arc<dyn UploadSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Build the images for mipmap levels `0..=max_level` of `pixels`.
    ///
    /// Each level halves the previous one (rounding down) and is computed
    /// with [`ColorBlender::blend`]. Levels that shrink to zero width or
    /// height are kept as empty images.
    pub fn mipmap_chain(pixels: RgbaImage, max_level: u8) -> Vec<MemoryImage> {
        let mut levels = Vec::with_capacity(max_level as usize + 1);
        let mut previous = pixels;

        for level in 0..=max_level {
            if level > 0 {
                previous = downsample(&previous);
            }
            levels.push(MemoryImage::from_rgba(previous.clone()).with_level(level));
        }

        levels
    }

    /// Copy the visible pixels out of this image.
    pub fn to_rgba(&self) -> Result<RgbaImage, ImageError> {
        let storage = self.read()?;
        Ok(image::imageops::crop_imm(
            &storage.pixels,
            self.origin.x,
            self.origin.y,
            self.width,
            self.height,
        )
        .to_image())
    }

    fn read(&self) -> Result<parking_lot::RwLockReadGuard<'_, Storage>, ImageError> {
        let storage = self.storage.read();
        if self.view_closed || storage.closed {
            return Err(ImageError::Closed);
        }
        Ok(storage)
    }

    fn check_pixel(&self, x: u32, y: u32) -> Result<(), ImageError> {
        if x >= self.width || y >= self.height {
            return Err(ImageError::out_of_bounds(x, y, 1, 1, self));
        }
        Ok(())
    }
}

fn downsample(previous: &RgbaImage) -> RgbaImage {
    let width = previous.width() >> 1;
    let height = previous.height() >> 1;
    RgbaImage::from_fn(width, height, |x, y| {
        let sample = |dx: u32, dy: u32| Color::from(*previous.get_pixel(2 * x + dx, 2 * y + dy));
        ColorBlender::blend(sample(0, 0), sample(1, 0), sample(0, 1), sample(1, 1)).into()
    })
}

impl CloseableImage for MemoryImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color(&self, x: u32, y: u32) -> Result<Color, ImageError> {
        self.check_pixel(x, y)?;
        let storage = self.read()?;
        Ok(Color::from(
            *storage
                .pixels
                .get_pixel(self.origin.x + x, self.origin.y + y),
        ))
    }

    fn set_color(&mut self, x: u32, y: u32, color: Color) -> Result<(), ImageError> {
        self.check_pixel(x, y)?;
        let mut storage = self.storage.write();
        if self.view_closed || storage.closed {
            return Err(ImageError::Closed);
        }
        storage
            .pixels
            .put_pixel(self.origin.x + x, self.origin.y + y, color.into());
        Ok(())
    }

    fn sub_image(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn CloseableImage>, ImageError> {
        if !Rect::new(x, y, width, height).fits_within(self.width, self.height) {
            return Err(ImageError::out_of_bounds(x, y, width, height, self));
        }
        drop(self.read()?);

        Ok(Box::new(MemoryImage {
            storage: Arc::clone(&self.storage),
            origin: Point::new(self.origin.x + x, self.origin.y + y),
            width,
            height,
            level: self.level,
            sink: self.sink.clone(),
            is_root: false,
            view_closed: false,
        }))
    }

    fn upload(&self, x: u32, y: u32) -> Result<(), ImageError> {
        let pixels = self.to_rgba()?;
        match &self.sink {
            Some(sink) => sink.receive(self.level, Point::new(x, y), &pixels),
            None => tracing::trace!(level = self.level, x, y, "upload with no bound surface"),
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.view_closed {
            return;
        }
        self.view_closed = true;
        if self.is_root {
            let mut storage = self.storage.write();
            storage.closed = true;
            storage.pixels = RgbaImage::new(0, 0);
        }
    }

    fn is_closed(&self) -> bool {
        self.view_closed || self.storage.read().closed
    }
}

impl fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImage")
            .field("origin", &self.origin)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("level", &self.level)
            .field("has_sink", &self.sink.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}
