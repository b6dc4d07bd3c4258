//! Assembly and validation of [`EventDrivenTexture`].

use super::view::FrameState;
use super::{EventDrivenTexture, TextureComponent, TextureError, TextureHandle, TextureState};
use crate::frame::CloseableImageFrame;

/// Collects the parts of a texture in any order and validates them
/// together in [`build`](Self::build).
pub struct EventDrivenTextureBuilder {
    texture: TextureHandle,
    predefined: Vec<CloseableImageFrame>,
    generated: Option<CloseableImageFrame>,
    components: Vec<Box<dyn TextureComponent>>,
}

impl EventDrivenTextureBuilder {
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            predefined: Vec::new(),
            generated: None,
            components: Vec::new(),
        }
    }

    /// Frames the texture can present without generating anything.
    /// Replaces any frames set before.
    pub fn set_predefined_frames(mut self, frames: Vec<CloseableImageFrame>) -> Self {
        self.predefined = frames;
        self
    }

    /// The frame components draw into with `generate_with`.
    pub fn set_generated_frame(mut self, frame: CloseableImageFrame) -> Self {
        self.generated = Some(frame);
        self
    }

    /// Append a component. Its position is its layer index.
    pub fn add(mut self, component: impl TextureComponent + 'static) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// Validate the parts and create the texture.
    ///
    /// # Errors
    ///
    /// - no predefined frames, or no generated frame
    /// - predefined frames that differ in width, height, mipmap level or
    ///   layer count
    /// - a generated frame whose width, height or mipmap level differs
    ///   from the predefined frames
    /// - components present but not one per layer of every frame
    pub fn build(self) -> Result<EventDrivenTexture, TextureError> {
        let first = self
            .predefined
            .first()
            .ok_or(TextureError::MissingPredefinedFrames)?;
        let generated = self.generated.ok_or(TextureError::MissingGeneratedFrame)?;

        let expected = FrameShape::of(first);
        for (index, frame) in self.predefined.iter().enumerate().skip(1) {
            expected.check(&FrameShape::of(frame), &format!("predefined frame {}", index), true)?;
        }
        expected.check(&FrameShape::of(&generated), "generated frame", false)?;

        if !self.components.is_empty() {
            for layers in [expected.layers, generated.layers()] {
                if layers != self.components.len() {
                    return Err(TextureError::ComponentCountMismatch {
                        components: self.components.len(),
                        layers,
                    });
                }
            }
        }

        tracing::debug!(
            texture = %self.texture.location(),
            id = self.texture.id(),
            frames = self.predefined.len(),
            components = self.components.len(),
            width = expected.width,
            height = expected.height,
            mipmap = expected.mipmap,
            "Built event-driven texture"
        );

        Ok(EventDrivenTexture {
            texture: self.texture,
            components: self.components,
            predefined: self.predefined,
            generated,
            frames: FrameState::new(),
            state: TextureState::Unregistered,
            pending_ticks: 0,
        })
    }
}

struct FrameShape {
    width: u32,
    height: u32,
    mipmap: u8,
    layers: usize,
}

impl FrameShape {
    fn of(frame: &CloseableImageFrame) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            mipmap: frame.mipmap_level(),
            layers: frame.layers(),
        }
    }

    fn check(&self, other: &FrameShape, frame: &str, compare_layers: bool) -> Result<(), TextureError> {
        let mut properties = vec![
            ("width", self.width as usize, other.width as usize),
            ("height", self.height as usize, other.height as usize),
            ("mipmap level", self.mipmap as usize, other.mipmap as usize),
        ];
        if compare_layers {
            properties.push(("layer count", self.layers, other.layers));
        }

        match properties
            .into_iter()
            .find(|(_, expected, actual)| expected != actual)
        {
            Some((property, expected, actual)) => Err(TextureError::FrameMismatch {
                frame: frame.to_string(),
                property,
                expected,
                actual,
            }),
            None => Ok(()),
        }
    }
}
