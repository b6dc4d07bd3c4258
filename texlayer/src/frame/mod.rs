//! Mipmapped, layered frames.
//!
//! A [`CloseableImageFrame`] owns one image per mipmap level and a layer
//! stack with one layer per texture component. Components change a frame
//! by applying a color transform over an [`Area`] on their own layer; the
//! frame composites the result into the level-0 image and then recomputes
//! every affected pixel of the lower-resolution levels.
//!
//! # Transform pipeline
//!
//! ```text
//! area ──► bounds check ──► compute colors ──► write through ──► propagate
//!                           (parallel above     layer stack       to mipmaps
//!                            the threshold)     (changed points)  1..=n
//! ```
//!
//! Computing happens before any write, so a failing transform leaves the
//! frame untouched.
//!
//! # Example
//!
//! ```
//! use texlayer::color::Color;
//! use texlayer::frame::CloseableImageFrame;
//! use texlayer::geometry::Area;
//! use texlayer::image::{CloseableImage, MemoryImage};
//!
//! let mipmaps = MemoryImage::mipmap_chain(image::RgbaImage::new(8, 8), 2)
//!     .into_iter()
//!     .map(|image| Box::new(image) as Box<dyn CloseableImage>)
//!     .collect();
//! let mut frame = CloseableImageFrame::new(8, 8, mipmaps, 1).unwrap();
//!
//! frame
//!     .apply_transform(|_, _| Ok(Color::WHITE), &Area::rect(0, 0, 2, 2), 0)
//!     .unwrap();
//! assert_eq!(frame.color(1, 1).unwrap(), Color::WHITE);
//! ```

mod executor;
mod layer;
mod sparse;
mod transform;

pub use executor::{TransformExecutor, DEFAULT_PARALLEL_THRESHOLD};
pub use layer::MAX_LAYERS;
pub use transform::DependencyReader;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::color::{Color, ColorBlender};
use crate::geometry::{Area, Point, Rect};
use crate::image::{CloseableImage, ImageError};
use layer::LayerStack;

/// Errors raised by frame construction and frame operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// No mipmap images were supplied.
    #[error("a frame needs at least one mipmap image")]
    EmptyMipmaps,

    /// A mipmap image does not have `frame size >> level` dimensions.
    #[error("mipmap {level} is {actual_width}×{actual_height}, expected {expected_width}×{expected_height}")]
    MipmapSizeMismatch {
        level: usize,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Too many mipmap levels to address with a `u8`.
    #[error("{0} mipmap levels exceed the supported maximum")]
    TooManyMipmaps(usize),

    /// The layer count is outside `1..=128`.
    #[error("layer count {0} is outside 1..={max}", max = MAX_LAYERS)]
    InvalidLayerCount(usize),

    /// A layer index is not below the frame's layer count.
    #[error("layer {layer} does not exist in a frame with {layers} layers")]
    LayerOutOfRange { layer: usize, layers: usize },

    /// A point lies outside the frame.
    #[error("point {point:?} is outside the {width}×{height} frame")]
    PointOutOfBounds { point: Point, width: u32, height: u32 },

    /// An upload region lies outside the frame.
    #[error("region {region:?} is outside the {width}×{height} frame")]
    RegionOutOfBounds { region: Rect, width: u32, height: u32 },

    /// A mipmap level above the frame's current maximum was requested.
    #[error("mipmap level {requested} requested but the frame only has levels up to {current}")]
    MipmapLevelTooHigh { requested: u8, current: u8 },

    /// The frame was already closed.
    #[error("frame is closed")]
    Closed,

    /// The transform worker pool could not be created.
    #[error("failed to create transform worker pool: {0}")]
    WorkerPool(String),

    /// An underlying image operation failed.
    #[error("image error: {0}")]
    Image(#[from] ImageError),
}

/// One texture state across every mipmap level, with a layer stack for
/// composing component writes.
pub struct CloseableImageFrame {
    width: u32,
    height: u32,
    mipmaps: Vec<Box<dyn CloseableImage>>,
    layers: LayerStack,
    executor: Arc<TransformExecutor>,
    closed: bool,
}

impl CloseableImageFrame {
    /// Create a frame from its mipmap images, level 0 first.
    ///
    /// # Errors
    ///
    /// Fails if `mipmaps` is empty, if the image at level `k` is not
    /// `width >> k` by `height >> k`, or if `layers` is outside `1..=128`.
    pub fn new(
        width: u32,
        height: u32,
        mipmaps: Vec<Box<dyn CloseableImage>>,
        layers: usize,
    ) -> Result<Self, FrameError> {
        if mipmaps.is_empty() {
            return Err(FrameError::EmptyMipmaps);
        }
        if mipmaps.len() > u8::MAX as usize {
            return Err(FrameError::TooManyMipmaps(mipmaps.len()));
        }

        for (level, image) in mipmaps.iter().enumerate() {
            // Level count is capped above, but shifting a u32 by 32 or more
            // would overflow.
            let expected_width = width.checked_shr(level as u32).unwrap_or(0);
            let expected_height = height.checked_shr(level as u32).unwrap_or(0);
            if image.width() != expected_width || image.height() != expected_height {
                return Err(FrameError::MipmapSizeMismatch {
                    level,
                    expected_width,
                    expected_height,
                    actual_width: image.width(),
                    actual_height: image.height(),
                });
            }
        }

        let layers = LayerStack::new(width, height, layers)?;

        Ok(Self {
            width,
            height,
            mipmaps,
            layers,
            executor: Arc::new(TransformExecutor::default()),
            closed: false,
        })
    }

    /// Run transforms on the given executor instead of the default one.
    pub fn with_executor(mut self, executor: Arc<TransformExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Highest mipmap level the frame currently keeps.
    pub fn mipmap_level(&self) -> u8 {
        (self.mipmaps.len() - 1) as u8
    }

    /// Number of addressable layers.
    pub fn layers(&self) -> usize {
        self.layers.layer_count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), FrameError> {
        if self.closed {
            return Err(FrameError::Closed);
        }
        Ok(())
    }

    fn check_point(&self, point: Point) -> Result<(), FrameError> {
        if point.x >= self.width || point.y >= self.height {
            return Err(FrameError::PointOutOfBounds {
                point,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// The final color at `(x, y)` on level 0.
    pub fn color(&self, x: u32, y: u32) -> Result<Color, FrameError> {
        self.ensure_open()?;
        self.check_point(Point::new(x, y))?;
        Ok(self.mipmaps[0].color(x, y)?)
    }

    /// The color at `(x, y)` as seen from `layer`, ignoring every layer
    /// above it.
    pub fn layer_color(&self, x: u32, y: u32, layer: usize) -> Result<Color, FrameError> {
        self.ensure_open()?;
        self.check_point(Point::new(x, y))?;
        self.check_layer(layer)?;
        self.layers.read(Some(layer), x, y, self.mipmaps[0].as_ref())
    }

    fn check_layer(&self, layer: usize) -> Result<(), FrameError> {
        if layer >= self.layers() {
            return Err(FrameError::LayerOutOfRange {
                layer,
                layers: self.layers(),
            });
        }
        Ok(())
    }

    /// Upload `region` of every level `0..=mipmap` with its top-left corner
    /// at `point`, shifting point and region for each level.
    ///
    /// Levels where the shifted region has no area are skipped.
    pub fn upload_at(&self, point: Point, mipmap: u8, region: Rect) -> Result<(), FrameError> {
        self.ensure_open()?;
        if mipmap > self.mipmap_level() {
            return Err(FrameError::MipmapLevelTooHigh {
                requested: mipmap,
                current: self.mipmap_level(),
            });
        }
        if !region.fits_within(self.width, self.height) {
            return Err(FrameError::RegionOutOfBounds {
                region,
                width: self.width,
                height: self.height,
            });
        }

        for level in 0..=mipmap {
            let shifted = region.shifted(level);
            if shifted.is_empty() {
                continue;
            }

            let target = point.shifted(level);
            let image = &self.mipmaps[level as usize];
            let view = image.sub_image(shifted.x, shifted.y, shifted.width, shifted.height)?;
            view.upload(target.x, target.y)?;
        }

        Ok(())
    }

    /// Close and drop every mipmap image above `level`.
    pub fn lower_mipmap_level(&mut self, level: u8) -> Result<(), FrameError> {
        self.ensure_open()?;
        let current = self.mipmap_level();
        if level > current {
            return Err(FrameError::MipmapLevelTooHigh {
                requested: level,
                current,
            });
        }
        if level == current {
            return Ok(());
        }

        for mut image in self.mipmaps.drain(level as usize + 1..) {
            image.close();
        }
        tracing::trace!(from = current, to = level, "Lowered frame mipmap level");
        Ok(())
    }

    /// Apply `transform` to every point of `area` on `layer`.
    ///
    /// The transform receives the point and a [`DependencyReader`] over the
    /// layer below `layer`. Areas larger than the executor threshold are
    /// computed in parallel. Nothing is written unless every point of the
    /// area is inside the frame and every transform call succeeds.
    pub fn apply_transform<F>(&mut self, transform: F, area: &Area, layer: usize) -> Result<(), FrameError>
    where
        F: Fn(Point, &DependencyReader<'_>) -> Result<Color, FrameError> + Sync,
    {
        self.ensure_open()?;
        self.check_layer(layer)?;
        for point in area {
            self.check_point(point)?;
        }

        let reader = DependencyReader::new(&self.layers, self.mipmaps[0].as_ref(), layer.checked_sub(1));
        let colors = self
            .executor
            .run(area, |point| Ok((point, transform(point, &reader)?)))?;

        let mut changed = Vec::new();
        for (point, color) in colors {
            if self
                .layers
                .write(layer, point.x, point.y, color, self.mipmaps[0].as_mut())?
            {
                changed.push(point);
            }
        }

        tracing::trace!(
            layer,
            points = area.len(),
            changed = changed.len(),
            overrides = self.layers.override_count(),
            parallel = self.executor.is_parallel(area.len()),
            "Applied transform"
        );

        self.propagate(changed)
    }

    /// Recompute lower-resolution pixels covering changed level-0 points.
    fn propagate(&mut self, changed: Vec<Point>) -> Result<(), FrameError> {
        let mut dirty: BTreeSet<Point> = changed.into_iter().collect();

        for level in 1..self.mipmaps.len() {
            let (higher, lower) = self.mipmaps.split_at_mut(level);
            let previous = &higher[level - 1];
            let image = &mut lower[0];
            if image.width() == 0 || image.height() == 0 {
                break;
            }

            dirty = dirty
                .into_iter()
                .map(|point| point.shifted(1))
                .filter(|point| point.x < image.width() && point.y < image.height())
                .collect();

            for point in &dirty {
                let (left, top) = (point.x * 2, point.y * 2);
                let blended = ColorBlender::blend(
                    previous.color(left, top)?,
                    previous.color(left + 1, top)?,
                    previous.color(left, top + 1)?,
                    previous.color(left + 1, top + 1)?,
                );
                image.set_color(point.x, point.y, blended)?;
            }
        }

        Ok(())
    }

    /// Close every mipmap image. Calling this more than once has no effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for image in &mut self.mipmaps {
            image.close();
        }
    }
}

impl fmt::Debug for CloseableImageFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseableImageFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mipmap_level", &self.mipmap_level())
            .field("layers", &self.layers())
            .field("closed", &self.closed)
            .finish()
    }
}
