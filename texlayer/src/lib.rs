//! TexLayer - layered, event-driven animated textures
//!
//! This library composes texture frames from independently written
//! components. Each component owns one layer of every frame; writes on a
//! layer are composited under the layers above it, and every change is
//! propagated through the frame's gamma-correct mipmap chain.
//!
//! # Architecture
//!
//! ```text
//! host render loop
//!     │ load / tick / upload / bind / close
//!     ▼
//! EventDrivenTexture ──► components (one per layer, in order)
//!     │                      │ TextureAndFrameView
//!     ▼                      ▼
//! CloseableImageFrame ◄── generate_with / upload / lower_mipmap_level
//!     │ layer stack + mipmaps
//!     ▼
//! CloseableImage ──upload──► UploadSink (GPU texture, atlas, test surface)
//! ```
//!
//! - [`color`]: packed colors and gamma-correct blending
//! - [`geometry`]: points, rectangles and areas
//! - [`image`]: the image buffer capability and an in-memory implementation
//! - [`frame`]: mipmapped, layered frames and parallel transforms
//! - [`base`]: where a texture's frames are uploaded
//! - [`texture`]: the texture lifecycle and component contract
//! - [`component`]: upload, cleanup and animation components
//! - [`config`] and [`logging`]: engine settings and tracing setup

pub mod base;
pub mod color;
pub mod component;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod image;
pub mod logging;
pub mod texture;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
