//! Frame animation over a texture's predefined frames.

use crate::color::ColorBlender;
use crate::geometry::Area;
use crate::texture::{TextureAndFrameView, TextureComponent, TextureError};

/// One step of an animation: a predefined frame and how many ticks it lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub index: usize,
    pub time: u32,
}

impl AnimationFrame {
    pub const fn new(index: usize, time: u32) -> Self {
        Self { index, time }
    }
}

/// Cycles a texture through its predefined frames.
///
/// Time advances by the ticks reported before each upload. Without
/// interpolation the component presents whole predefined frames; with it,
/// ticks between two frames generate a blend of both on the component's
/// layer.
#[derive(Debug)]
pub struct AnimationComponent {
    frames: Vec<AnimationFrame>,
    interpolate: bool,
    position: usize,
    ticks_in_frame: u32,
    cycle: u64,
}

impl AnimationComponent {
    /// An animation over `frames` in order.
    ///
    /// # Errors
    ///
    /// Fails when `frames` is empty or a frame lasts zero ticks.
    pub fn new(frames: Vec<AnimationFrame>, interpolate: bool) -> Result<Self, TextureError> {
        if frames.is_empty() {
            return Err(TextureError::InvalidAnimation("no frames".to_string()));
        }
        if let Some(frame) = frames.iter().find(|frame| frame.time == 0) {
            return Err(TextureError::InvalidAnimation(format!(
                "frame {} lasts zero ticks",
                frame.index
            )));
        }

        let cycle = frames.iter().map(|frame| frame.time as u64).sum();
        Ok(Self {
            frames,
            interpolate,
            position: 0,
            ticks_in_frame: 0,
            cycle,
        })
    }

    /// Frames `0..frame_count` shown for `frame_time` ticks each.
    pub fn uniform(frame_count: usize, frame_time: u32, interpolate: bool) -> Result<Self, TextureError> {
        let frames = (0..frame_count)
            .map(|index| AnimationFrame::new(index, frame_time))
            .collect();
        Self::new(frames, interpolate)
    }

    /// The animation step being shown.
    pub fn current(&self) -> AnimationFrame {
        self.frames[self.position]
    }

    /// Ticks spent in the current step so far.
    pub fn ticks_in_frame(&self) -> u32 {
        self.ticks_in_frame
    }

    fn advance(&mut self, ticks: u32) {
        // Whole cycles end where they started.
        let mut remaining = ticks as u64 % self.cycle + self.ticks_in_frame as u64;
        loop {
            let time = self.frames[self.position].time as u64;
            if remaining < time {
                break;
            }
            remaining -= time;
            self.position = (self.position + 1) % self.frames.len();
        }
        self.ticks_in_frame = remaining as u32;
    }

    fn present(&self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        let current = self.current();
        if !self.interpolate || self.ticks_in_frame == 0 {
            return view.set_current_frame(current.index);
        }

        let next = self.frames[(self.position + 1) % self.frames.len()];
        let fraction = self.ticks_in_frame as f32 / current.time as f32;
        let predefined = view.predefined_frames();
        let start = predefined.get(current.index)?;
        let end = predefined.get(next.index)?;

        let area = Area::rect(0, 0, view.width(), view.height());
        view.generate_with(
            move |point, _| {
                Ok(ColorBlender::lerp(
                    start.color(point.x, point.y)?,
                    end.color(point.x, point.y)?,
                    fraction,
                ))
            },
            &area,
        )
    }
}

impl TextureComponent for AnimationComponent {
    fn on_registration(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        let available = view.predefined_frames().len();
        if let Some(frame) = self.frames.iter().find(|frame| frame.index >= available) {
            return Err(TextureError::NoSuchFrame {
                index: frame.index,
                frames: available,
            });
        }
        self.present(view)
    }

    fn on_ticks_elapsed(
        &mut self,
        ticks: u32,
        view: &mut TextureAndFrameView<'_>,
    ) -> Result<(), TextureError> {
        self.advance(ticks);
        tracing::trace!(
            texture = %view.texture().location(),
            frame = self.current().index,
            ticks_in_frame = self.ticks_in_frame,
            "Advanced animation"
        );
        self.present(view)
    }
}
