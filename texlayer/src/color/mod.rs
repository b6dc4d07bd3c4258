//! Packed colors and gamma-correct blending.
//!
//! Colors travel through the engine as a single `u32` laid out as
//! `AAAAAAAA RRRRRRRR GGGGGGGG BBBBBBBB` (alpha in the high byte). The
//! [`ColorBlender`] functions operate on that packed form and are used for
//! mipmap downsampling, compositing and frame interpolation.
//!
//! # Example
//!
//! ```
//! use texlayer::color::{Color, ColorBlender};
//!
//! let red = Color::new(255, 0, 0, 255);
//! assert_eq!(ColorBlender::blend(red, red, red, red), red);
//! ```

mod blender;

pub use blender::ColorBlender;

use std::fmt;

/// A packed ARGB color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color(0);

    /// Opaque black.
    pub const BLACK: Color = Color(0xFF00_0000);

    /// Opaque white.
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    /// Create a color from its red, green, blue and alpha channels.
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Color((alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    /// Wrap an already packed ARGB value.
    pub const fn from_argb(argb: u32) -> Self {
        Color(argb)
    }

    /// The packed ARGB value.
    pub const fn argb(self) -> u32 {
        self.0
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Channels in blending order: alpha, red, green, blue.
    pub(crate) const fn channels(self) -> [u8; 4] {
        [self.alpha(), self.red(), self.green(), self.blue()]
    }

    /// Inverse of [`Color::channels`].
    pub(crate) const fn from_channels(channels: [u8; 4]) -> Self {
        Color::new(channels[1], channels[2], channels[3], channels[0])
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:08X})", self.0)
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Color::new(r, g, b, a)
    }
}

impl From<Color> for image::Rgba<u8> {
    fn from(color: Color) -> Self {
        image::Rgba([color.red(), color.green(), color.blue(), color.alpha()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layout() {
        let color = Color::new(0x12, 0x34, 0x56, 0x78);
        assert_eq!(color.argb(), 0x7812_3456);
        assert_eq!(color.alpha(), 0x78);
        assert_eq!(color.red(), 0x12);
        assert_eq!(color.green(), 0x34);
        assert_eq!(color.blue(), 0x56);
    }

    #[test]
    fn test_channels_roundtrip() {
        let color = Color::from_argb(0xDEAD_BEEF);
        assert_eq!(Color::from_channels(color.channels()), color);
    }

    #[test]
    fn test_rgba_pixel_conversion() {
        let pixel = image::Rgba([10, 20, 30, 40]);
        let color = Color::from(pixel);
        assert_eq!(color, Color::new(10, 20, 30, 40));
        assert_eq!(image::Rgba::<u8>::from(color), pixel);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Color::WHITE), "Color(#FFFFFFFF)");
    }
}
