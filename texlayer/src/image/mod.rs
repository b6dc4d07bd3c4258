//! Image buffer capability.
//!
//! The frame engine never touches pixel storage directly; it goes through
//! the [`CloseableImage`] trait so that GPU-backed buffers and test doubles
//! can be swapped in. [`MemoryImage`] is the in-process implementation over
//! an [`image::RgbaImage`], and [`MemorySurface`] is an [`UploadSink`] that
//! collects uploads into per-mipmap atlases.
//!
//! # Example
//!
//! ```
//! use texlayer::color::Color;
//! use texlayer::image::{CloseableImage, MemoryImage};
//!
//! let mut image = MemoryImage::new(4, 4);
//! image.set_color(1, 2, Color::WHITE).unwrap();
//!
//! // Sub images share storage with their parent.
//! let view = image.sub_image(1, 2, 2, 2).unwrap();
//! assert_eq!(view.color(0, 0).unwrap(), Color::WHITE);
//! ```

mod memory;
mod surface;

pub use memory::MemoryImage;
pub use surface::MemorySurface;

use thiserror::Error;

use crate::color::Color;
use crate::geometry::Point;

/// Errors raised by image buffers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// The image (or the image it views) was already closed.
    #[error("image is closed")]
    Closed,

    /// A pixel or region lies outside the image.
    #[error("region at ({x}, {y}) of size {width}×{height} is outside the {image_width}×{image_height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

impl ImageError {
    pub(crate) fn out_of_bounds(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image: &(impl CloseableImage + ?Sized),
    ) -> Self {
        ImageError::OutOfBounds {
            x,
            y,
            width,
            height,
            image_width: image.width(),
            image_height: image.height(),
        }
    }
}

/// A rectangular pixel buffer that can be explicitly released.
///
/// Implementations must be shareable across the transform worker pool, so
/// reads take `&self`. Once closed, every operation except `close`,
/// `width` and `height` fails with [`ImageError::Closed`].
pub trait CloseableImage: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Read the pixel at `(x, y)`.
    fn color(&self, x: u32, y: u32) -> Result<Color, ImageError>;

    /// Overwrite the pixel at `(x, y)`.
    fn set_color(&mut self, x: u32, y: u32, color: Color) -> Result<(), ImageError>;

    /// A view of a sub-region that shares this image's storage.
    fn sub_image(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn CloseableImage>, ImageError>;

    /// Push this buffer's full content to the bound presentation surface
    /// with its top-left corner at `(x, y)`.
    fn upload(&self, x: u32, y: u32) -> Result<(), ImageError>;

    /// Release the buffer. Calling this more than once has no effect.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Receives pixels pushed by [`CloseableImage::upload`].
///
/// This is the seam where a real renderer would issue its sub-image upload
/// call for the given mipmap level.
pub trait UploadSink: Send + Sync {
    fn receive(&self, level: u8, point: Point, pixels: &image::RgbaImage);
}
