//! Ready-made texture components.
//!
//! - [`UploadComponent`] pushes frames to every atlas a texture was
//!   stitched into.
//! - [`SingleUploadComponent`] and [`SpriteUploadComponent`] cover textures
//!   with one destination.
//! - [`CleanupComponent`] releases host resources on close.
//! - [`AnimationComponent`] cycles through predefined frames.
//!
//! Components reach the host renderer only through the capabilities in
//! this module: [`TexturePreparer`], [`RenderQueue`] and [`AtlasBinder`].

mod animation;
mod cleanup;
mod render;
mod upload;

pub use animation::{AnimationComponent, AnimationFrame};
pub use cleanup::CleanupComponent;
pub use render::{AtlasBinder, ImmediateRenderQueue, RenderQueue, RenderTask, TexturePreparer};
pub use upload::{SingleUploadComponent, SpriteUploadComponent, UploadComponent};
