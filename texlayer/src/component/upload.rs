//! Components that push frames to their bases.

use std::sync::Arc;

use super::render::{AtlasBinder, PrepareOnce, RenderQueue, TexturePreparer};
use crate::base::{BaseCollection, Sprite, TextureLocation};
use crate::geometry::{Point, Rect};
use crate::texture::{TextureAndFrameView, TextureComponent, TextureError};

/// Uploads the current frame to every base it was stitched into.
///
/// On registration the frames are lowered to the highest mipmap level any
/// base needs and the texture storage is prepared. Each upload event then
/// writes the cropped frame at every position registered for that base.
pub struct UploadComponent {
    bases: BaseCollection,
    prepare: PrepareOnce,
}

impl UploadComponent {
    pub fn new(
        bases: BaseCollection,
        preparer: Arc<dyn TexturePreparer>,
        queue: Arc<dyn RenderQueue>,
    ) -> Self {
        Self {
            bases,
            prepare: PrepareOnce::new(preparer, queue),
        }
    }
}

impl TextureComponent for UploadComponent {
    fn on_registration(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        let level = view.mipmap_level().min(self.bases.max_mipmap());
        view.lower_mipmap_level(level)?;
        self.prepare
            .prepare(view.texture().id(), level, view.width(), view.height());
        Ok(())
    }

    fn on_upload(
        &mut self,
        base: &TextureLocation,
        view: &mut TextureAndFrameView<'_>,
    ) -> Result<(), TextureError> {
        for data in self.bases.base_data(base) {
            let region = data.offsets.crop(view.width(), view.height());
            if region.is_empty() {
                continue;
            }

            let mipmap = data.mipmap_level.min(view.mipmap_level());
            view.upload(data.upload_point, mipmap, region)?;
        }

        tracing::trace!(
            texture = %view.texture().location(),
            base = %base,
            uploads = self.bases.base_data(base).len(),
            "Uploaded frame to base"
        );
        Ok(())
    }
}

/// Uploads the whole frame to the texture's own storage.
pub struct SingleUploadComponent {
    mipmap: u8,
    prepare: PrepareOnce,
}

impl SingleUploadComponent {
    /// A component that uploads mipmap level 0 only.
    pub fn new(preparer: Arc<dyn TexturePreparer>, queue: Arc<dyn RenderQueue>) -> Self {
        Self::with_mipmaps(0, preparer, queue)
    }

    /// A component that keeps and uploads mipmap levels up to `mipmap`.
    pub fn with_mipmaps(
        mipmap: u8,
        preparer: Arc<dyn TexturePreparer>,
        queue: Arc<dyn RenderQueue>,
    ) -> Self {
        Self {
            mipmap,
            prepare: PrepareOnce::new(preparer, queue),
        }
    }
}

impl TextureComponent for SingleUploadComponent {
    fn on_registration(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        let level = view.mipmap_level().min(self.mipmap);
        view.lower_mipmap_level(level)?;
        self.prepare
            .prepare(view.texture().id(), level, view.width(), view.height());
        Ok(())
    }

    fn on_upload(
        &mut self,
        _base: &TextureLocation,
        view: &mut TextureAndFrameView<'_>,
    ) -> Result<(), TextureError> {
        let level = view.mipmap_level();
        view.upload(Point::ORIGIN, level, Rect::sized(view.width(), view.height()))
    }
}

/// Uploads the frame into the atlas holding one sprite.
///
/// The host never binds atlas sprites on its own, so this component binds
/// the atlas itself and asks for an upload on every tick.
pub struct SpriteUploadComponent {
    sprite: Sprite,
    binder: Arc<dyn AtlasBinder>,
    prepare: PrepareOnce,
}

impl SpriteUploadComponent {
    pub fn new(
        sprite: Sprite,
        binder: Arc<dyn AtlasBinder>,
        preparer: Arc<dyn TexturePreparer>,
        queue: Arc<dyn RenderQueue>,
    ) -> Self {
        Self {
            sprite,
            binder,
            prepare: PrepareOnce::new(preparer, queue),
        }
    }
}

impl TextureComponent for SpriteUploadComponent {
    fn on_registration(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        self.prepare
            .prepare(view.texture().id(), 0, view.width(), view.height());
        Ok(())
    }

    fn on_tick(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        view.mark_needs_upload();
        Ok(())
    }

    fn on_upload(
        &mut self,
        _base: &TextureLocation,
        view: &mut TextureAndFrameView<'_>,
    ) -> Result<(), TextureError> {
        let region = self.sprite.offsets.crop(view.width(), view.height());
        if region.is_empty() {
            return Ok(());
        }

        self.binder.bind(&self.sprite.atlas);
        view.upload(self.sprite.upload_point, 0, region)
    }
}
