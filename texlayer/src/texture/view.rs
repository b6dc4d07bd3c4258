//! Scoped access handed to components during one lifecycle event.

use std::collections::HashSet;
use std::fmt;

use super::{TextureError, TextureHandle};
use crate::base::TextureLocation;
use crate::color::Color;
use crate::frame::{CloseableImageFrame, DependencyReader, FrameError};
use crate::geometry::{Area, Point, Rect};

/// Which frame the texture currently presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CurrentFrame {
    Predefined(usize),
    Generated,
}

/// Texture state that views may change.
#[derive(Debug)]
pub(crate) struct FrameState {
    pub(crate) current: CurrentFrame,
    /// Bases that received the current frame since it last changed.
    pub(crate) uploaded: HashSet<TextureLocation>,
    /// Level the predefined frames are lowered to once the listener returns.
    pub(crate) pending_mipmap: Option<u8>,
}

impl FrameState {
    pub(crate) fn new() -> Self {
        Self {
            current: CurrentFrame::Predefined(0),
            uploaded: HashSet::new(),
            pending_mipmap: None,
        }
    }
}

/// Read-only access to a texture's predefined frames.
#[derive(Clone, Copy)]
pub struct PredefinedFrames<'a> {
    frames: &'a [CloseableImageFrame],
}

impl<'a> PredefinedFrames<'a> {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The predefined frame at `index`.
    pub fn get(&self, index: usize) -> Result<&'a CloseableImageFrame, TextureError> {
        self.frames.get(index).ok_or(TextureError::NoSuchFrame {
            index,
            frames: self.frames.len(),
        })
    }

    /// The level-0 color at `(x, y)` of predefined frame `index`.
    pub fn color(&self, index: usize, x: u32, y: u32) -> Result<Color, TextureError> {
        Ok(self.get(index)?.color(x, y)?)
    }
}

impl fmt::Debug for PredefinedFrames<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredefinedFrames")
            .field("len", &self.frames.len())
            .finish()
    }
}

/// A component's window onto its texture for one listener call.
///
/// Every listener receives a fresh view bound to the component's own
/// layer. The view borrows the texture, so it cannot outlive the call:
///
/// ```compile_fail
/// use texlayer::texture::{TextureAndFrameView, TextureComponent, TextureError};
///
/// struct Hoarder<'a> {
///     kept: Option<&'a mut TextureAndFrameView<'a>>,
/// }
///
/// impl<'a> TextureComponent for Hoarder<'a> {
///     fn on_tick(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
///         self.kept = Some(view);
///         Ok(())
///     }
/// }
/// ```
pub struct TextureAndFrameView<'a> {
    pub(crate) texture: &'a TextureHandle,
    pub(crate) predefined: &'a [CloseableImageFrame],
    pub(crate) generated: &'a mut CloseableImageFrame,
    pub(crate) state: &'a mut FrameState,
    pub(crate) layer: usize,
}

impl<'a> TextureAndFrameView<'a> {
    pub fn width(&self) -> u32 {
        self.generated.width()
    }

    pub fn height(&self) -> u32 {
        self.generated.height()
    }

    /// Highest mipmap level every frame of the texture keeps.
    pub fn mipmap_level(&self) -> u8 {
        self.generated.mipmap_level()
    }

    /// The layer this component writes to.
    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn texture(&self) -> &'a TextureHandle {
        self.texture
    }

    pub fn predefined_frames(&self) -> PredefinedFrames<'a> {
        PredefinedFrames {
            frames: self.predefined,
        }
    }

    /// Index of the predefined frame being presented, if any.
    pub fn current_frame(&self) -> Option<usize> {
        match self.state.current {
            CurrentFrame::Predefined(index) => Some(index),
            CurrentFrame::Generated => None,
        }
    }

    /// Present predefined frame `index`.
    ///
    /// Bases are marked for upload again when the frame changes.
    pub fn set_current_frame(&mut self, index: usize) -> Result<(), TextureError> {
        if index >= self.predefined.len() {
            return Err(TextureError::NoSuchFrame {
                index,
                frames: self.predefined.len(),
            });
        }

        let next = CurrentFrame::Predefined(index);
        if self.state.current != next {
            self.state.current = next;
            self.state.uploaded.clear();
        }
        Ok(())
    }

    /// Apply `transform` over `area` of the generated frame on this
    /// component's layer and present the generated frame.
    ///
    /// The transform runs before this call returns. When it fails nothing
    /// changes: the presented frame and the uploaded bases stay as they were.
    pub fn generate_with<F>(&mut self, transform: F, area: &Area) -> Result<(), TextureError>
    where
        F: Fn(Point, &DependencyReader<'_>) -> Result<Color, FrameError> + Sync,
    {
        self.generated.apply_transform(transform, area, self.layer)?;
        self.state.current = CurrentFrame::Generated;
        self.state.uploaded.clear();
        Ok(())
    }

    /// Upload `region` of the current frame at `point` for mipmap levels
    /// `0..=mipmap`.
    pub fn upload(&self, point: Point, mipmap: u8, region: Rect) -> Result<(), TextureError> {
        let current = self.mipmap_level();
        if mipmap > current {
            return Err(FrameError::MipmapLevelTooHigh {
                requested: mipmap,
                current,
            }
            .into());
        }

        let frame = match self.state.current {
            CurrentFrame::Predefined(index) => &self.predefined[index],
            CurrentFrame::Generated => &*self.generated,
        };
        frame.upload_at(point, mipmap, region)?;
        Ok(())
    }

    /// Drop every mipmap level above `level` from all frames.
    ///
    /// The generated frame is lowered now; predefined frames follow as
    /// soon as the listener returns.
    pub fn lower_mipmap_level(&mut self, level: u8) -> Result<(), TextureError> {
        self.generated.lower_mipmap_level(level)?;
        self.state.pending_mipmap = Some(match self.state.pending_mipmap {
            Some(pending) => pending.min(level),
            None => level,
        });
        Ok(())
    }

    /// Force the next upload event for every base to reach components.
    pub fn mark_needs_upload(&mut self) {
        self.state.uploaded.clear();
    }
}

impl fmt::Debug for TextureAndFrameView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureAndFrameView")
            .field("texture", self.texture)
            .field("layer", &self.layer)
            .field("current", &self.state.current)
            .finish()
    }
}
