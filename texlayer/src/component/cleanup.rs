//! Releasing host resources when a texture closes.

use crate::texture::{TextureAndFrameView, TextureComponent, TextureError};

/// Runs a release action with the texture's numeric handle on close.
pub struct CleanupComponent {
    release: Box<dyn FnMut(u32) + Send>,
}

impl CleanupComponent {
    pub fn new(release: impl FnMut(u32) + Send + 'static) -> Self {
        Self {
            release: Box::new(release),
        }
    }
}

impl TextureComponent for CleanupComponent {
    fn on_close(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        let id = view.texture().id();
        tracing::debug!(id, "Releasing texture resources");
        (self.release)(id);
        Ok(())
    }
}
