//! Capabilities components need from the host renderer.

use std::fmt;
use std::sync::Arc;

use crate::base::TextureLocation;

/// Allocates GPU storage for a texture.
pub trait TexturePreparer: Send + Sync {
    fn prepare(&self, id: u32, mipmap: u8, width: u32, height: u32);
}

impl<F> TexturePreparer for F
where
    F: Fn(u32, u8, u32, u32) + Send + Sync,
{
    fn prepare(&self, id: u32, mipmap: u8, width: u32, height: u32) {
        self(id, mipmap, width, height)
    }
}

/// A deferred unit of render-thread work.
pub type RenderTask = Box<dyn FnOnce() + Send>;

/// Runs work on the render thread.
pub trait RenderQueue: Send + Sync {
    /// Whether the caller already is the render thread.
    fn is_render_thread(&self) -> bool;

    /// Run `task` on the render thread at the host's convenience.
    fn submit(&self, task: RenderTask);
}

/// Queue for hosts where every caller is the render thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateRenderQueue;

impl RenderQueue for ImmediateRenderQueue {
    fn is_render_thread(&self) -> bool {
        true
    }

    fn submit(&self, task: RenderTask) {
        task()
    }
}

/// Binds an atlas before sprite data is uploaded into it.
pub trait AtlasBinder: Send + Sync {
    fn bind(&self, atlas: &TextureLocation);
}

impl<F> AtlasBinder for F
where
    F: Fn(&TextureLocation) + Send + Sync,
{
    fn bind(&self, atlas: &TextureLocation) {
        self(atlas)
    }
}

/// Prepares a texture at most once, on the render thread.
pub(crate) struct PrepareOnce {
    preparer: Arc<dyn TexturePreparer>,
    queue: Arc<dyn RenderQueue>,
    prepared: bool,
}

impl PrepareOnce {
    pub(crate) fn new(preparer: Arc<dyn TexturePreparer>, queue: Arc<dyn RenderQueue>) -> Self {
        Self {
            preparer,
            queue,
            prepared: false,
        }
    }

    pub(crate) fn prepare(&mut self, id: u32, mipmap: u8, width: u32, height: u32) {
        if self.prepared {
            return;
        }
        self.prepared = true;

        if self.queue.is_render_thread() {
            self.preparer.prepare(id, mipmap, width, height);
            return;
        }

        tracing::trace!(id, "Deferring texture preparation to the render thread");
        let preparer = Arc::clone(&self.preparer);
        self.queue
            .submit(Box::new(move || preparer.prepare(id, mipmap, width, height)));
    }
}

impl fmt::Debug for PrepareOnce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrepareOnce")
            .field("prepared", &self.prepared)
            .finish()
    }
}
