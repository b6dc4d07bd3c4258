//! The layer stack that composites writes from several components.
//!
//! Each component owns one layer. What a layer "sees" at a pixel is the
//! value written by the highest layer at or below it, or the pixel as it
//! was before any layer touched it. The level-0 image always holds what
//! the top layer sees, so reading the final color never walks the stack.
//!
//! ```text
//!  layer 2 (top) ─┐  image pixel = value of highest writer
//!  layer 1       ─┼─ sparse overrides, read falls through downward
//!  layer 0       ─┘
//!  original       ── pixel before its first write, captured on demand
//! ```

use super::sparse::SparseMatrix;
use super::FrameError;
use crate::color::Color;
use crate::image::CloseableImage;

/// Largest supported number of layers. Writer indices are tracked per
/// pixel in a byte.
pub const MAX_LAYERS: usize = 128;

/// Marker for a pixel no layer has written yet.
const UNTOUCHED: u8 = 0;

#[derive(Debug)]
pub(crate) struct LayerStack {
    width: u32,
    layer_count: usize,
    /// Per pixel: `UNTOUCHED`, or one plus the highest layer that wrote it.
    highest_writer: Vec<u8>,
    /// Own values of every layer except the top, which lives in the image.
    overrides: Vec<SparseMatrix>,
    /// Pixel values from before their first write.
    original: SparseMatrix,
}

impl LayerStack {
    pub(crate) fn new(width: u32, height: u32, layer_count: usize) -> Result<Self, FrameError> {
        if layer_count == 0 || layer_count > MAX_LAYERS {
            return Err(FrameError::InvalidLayerCount(layer_count));
        }

        Ok(Self {
            width,
            layer_count,
            highest_writer: vec![UNTOUCHED; width as usize * height as usize],
            overrides: (0..layer_count - 1)
                .map(|_| SparseMatrix::new(width, height))
                .collect(),
            original: SparseMatrix::new(width, height),
        })
    }

    pub(crate) fn layer_count(&self) -> usize {
        self.layer_count
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// The color seen at `layer`, or below every layer when `None`.
    ///
    /// `image` must be the level-0 image this stack composites into and
    /// `(x, y)` must already be bounds-checked.
    pub(crate) fn read(
        &self,
        layer: Option<usize>,
        x: u32,
        y: u32,
        image: &dyn CloseableImage,
    ) -> Result<Color, FrameError> {
        let highest = self.highest_writer[self.index(x, y)];
        if highest == UNTOUCHED {
            return Ok(image.color(x, y)?);
        }

        let top_writer = (highest - 1) as usize;
        let Some(layer) = layer else {
            return Ok(self.original_color(x, y));
        };
        if layer >= top_writer {
            return Ok(image.color(x, y)?);
        }

        // layer < top_writer <= layer_count - 1, so every layer searched
        // here has an override matrix.
        let own = (0..=layer)
            .rev()
            .find_map(|below| self.overrides[below].get(x, y));
        Ok(own.unwrap_or_else(|| self.original_color(x, y)))
    }

    fn original_color(&self, x: u32, y: u32) -> Color {
        self.original.get(x, y).unwrap_or(Color::TRANSPARENT)
    }

    /// Record `color` at `layer` and return whether the image changed.
    ///
    /// The image only changes when no strictly higher layer has written
    /// this pixel and the new color differs from the current one.
    pub(crate) fn write(
        &mut self,
        layer: usize,
        x: u32,
        y: u32,
        color: Color,
        image: &mut dyn CloseableImage,
    ) -> Result<bool, FrameError> {
        let index = self.index(x, y);
        let highest = self.highest_writer[index];

        if highest == UNTOUCHED {
            let before = image.color(x, y)?;
            self.original.set(x, y, before);
        }

        if layer < self.layer_count - 1 {
            self.overrides[layer].set(x, y, color);
        }

        if highest != UNTOUCHED && layer < (highest - 1) as usize {
            return Ok(false);
        }

        // layer < MAX_LAYERS, so layer + 1 fits in a byte.
        self.highest_writer[index] = (layer + 1) as u8;
        if image.color(x, y)? == color {
            return Ok(false);
        }
        image.set_color(x, y, color)?;
        Ok(true)
    }

    /// Number of stored overrides across all non-top layers.
    pub(crate) fn override_count(&self) -> usize {
        self.overrides.iter().map(SparseMatrix::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::MemoryImage;

    const A: Color = Color::new(255, 0, 0, 255);
    const B: Color = Color::new(0, 255, 0, 255);
    const C: Color = Color::new(0, 0, 255, 255);

    fn stack(layers: usize) -> (LayerStack, MemoryImage) {
        (
            LayerStack::new(4, 4, layers).unwrap(),
            MemoryImage::new(4, 4),
        )
    }

    #[test]
    fn test_layer_count_bounds() {
        assert!(matches!(
            LayerStack::new(1, 1, 0),
            Err(FrameError::InvalidLayerCount(0))
        ));
        assert!(matches!(
            LayerStack::new(1, 1, 129),
            Err(FrameError::InvalidLayerCount(129))
        ));
        assert_eq!(LayerStack::new(1, 1, 128).unwrap().layer_count(), 128);
    }

    #[test]
    fn test_untouched_pixel_reads_image() {
        let (stack, mut image) = stack(3);
        image.set_color(1, 1, C).unwrap();
        for layer in [None, Some(0), Some(1), Some(2)] {
            assert_eq!(stack.read(layer, 1, 1, &image).unwrap(), C);
        }
    }

    #[test]
    fn test_top_write_wins_regardless_of_order() {
        let (mut stack, mut image) = stack(3);
        assert!(stack.write(2, 0, 0, A, &mut image).unwrap());
        assert!(!stack.write(0, 0, 0, B, &mut image).unwrap());
        assert_eq!(image.color(0, 0).unwrap(), A);

        let (mut stack, mut image) = self::stack(3);
        assert!(stack.write(0, 0, 0, B, &mut image).unwrap());
        assert!(stack.write(2, 0, 0, A, &mut image).unwrap());
        assert_eq!(image.color(0, 0).unwrap(), A);
    }

    #[test]
    fn test_lower_layers_do_not_see_higher_writes() {
        let (mut stack, mut image) = stack(3);
        image.set_color(2, 3, C).unwrap();
        stack.write(2, 2, 3, A, &mut image).unwrap();
        stack.write(0, 2, 3, B, &mut image).unwrap();

        assert_eq!(stack.read(None, 2, 3, &image).unwrap(), C);
        assert_eq!(stack.read(Some(0), 2, 3, &image).unwrap(), B);
        assert_eq!(stack.read(Some(1), 2, 3, &image).unwrap(), B);
        assert_eq!(stack.read(Some(2), 2, 3, &image).unwrap(), A);
    }

    #[test]
    fn test_middle_write_hides_bottom_for_layers_above() {
        let (mut stack, mut image) = stack(3);
        stack.write(0, 1, 0, A, &mut image).unwrap();
        stack.write(1, 1, 0, B, &mut image).unwrap();

        assert_eq!(stack.read(Some(0), 1, 0, &image).unwrap(), A);
        assert_eq!(stack.read(Some(1), 1, 0, &image).unwrap(), B);
        assert_eq!(stack.read(Some(2), 1, 0, &image).unwrap(), B);
        assert_eq!(image.color(1, 0).unwrap(), B);
    }

    #[test]
    fn test_rewriting_same_color_is_not_a_change() {
        let (mut stack, mut image) = stack(1);
        assert!(stack.write(0, 3, 3, A, &mut image).unwrap());
        assert!(!stack.write(0, 3, 3, A, &mut image).unwrap());
    }

    #[test]
    fn test_single_layer_keeps_no_overrides() {
        let (mut stack, mut image) = stack(1);
        stack.write(0, 0, 0, A, &mut image).unwrap();
        assert_eq!(stack.override_count(), 0);
        assert_eq!(stack.read(None, 0, 0, &image).unwrap(), Color::TRANSPARENT);
        assert_eq!(stack.read(Some(0), 0, 0, &image).unwrap(), A);
    }
}
