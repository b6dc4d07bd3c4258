//! Read access handed to color transforms.

use super::layer::LayerStack;
use super::FrameError;
use crate::color::Color;
use crate::geometry::Point;
use crate::image::CloseableImage;

/// Reads pixels as they look directly beneath the layer being written.
///
/// A transform may depend on any pixel of the frame, but only on the
/// composited state of the layers below its own. It can never observe its
/// own pending output or anything a higher layer wrote.
pub struct DependencyReader<'a> {
    stack: &'a LayerStack,
    image: &'a dyn CloseableImage,
    layer: Option<usize>,
    width: u32,
    height: u32,
}

impl<'a> DependencyReader<'a> {
    pub(crate) fn new(
        stack: &'a LayerStack,
        image: &'a dyn CloseableImage,
        layer: Option<usize>,
    ) -> Self {
        Self {
            stack,
            image,
            layer,
            width: image.width(),
            height: image.height(),
        }
    }

    /// The color at `(x, y)` beneath the target layer.
    pub fn color(&self, x: u32, y: u32) -> Result<Color, FrameError> {
        if x >= self.width || y >= self.height {
            return Err(FrameError::PointOutOfBounds {
                point: Point::new(x, y),
                width: self.width,
                height: self.height,
            });
        }
        self.stack.read(self.layer, x, y, self.image)
    }

    /// Shorthand for [`DependencyReader::color`] at a point.
    pub fn color_at(&self, point: Point) -> Result<Color, FrameError> {
        self.color(point.x, point.y)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
