//! Event-driven textures.
//!
//! An [`EventDrivenTexture`] holds a list of predefined frames, one generated
//! frame and an ordered list of [`TextureComponent`]s. The host drives it
//! through a small lifecycle:
//!
//! ```text
//! unregistered ──load──► registered ──close──► closed
//!                         │    ▲
//!                         └────┘ tick / upload / bind
//! ```
//!
//! Every lifecycle call dispatches to each component in list order on the
//! caller's thread. Component `i` writes to layer `i` of the frames, so
//! components compose without knowing about each other.
//!
//! Uploads are deduplicated per base: once a base received the current
//! frame, further `upload` calls for it reach no component until the
//! frame changes or a component asks for another upload.

mod builder;
mod error;
mod view;

pub use builder::EventDrivenTextureBuilder;
pub use error::TextureError;
pub use view::{PredefinedFrames, TextureAndFrameView};

use std::fmt;

use crate::base::TextureLocation;
use crate::frame::CloseableImageFrame;
use view::FrameState;

/// Identity of a texture: its location and the host's numeric handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    location: TextureLocation,
    id: u32,
}

impl TextureHandle {
    pub fn new(location: TextureLocation, id: u32) -> Self {
        Self { location, id }
    }

    pub fn location(&self) -> &TextureLocation {
        &self.location
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

/// Lifecycle position of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Unregistered,
    Registered,
    Closed,
}

impl fmt::Display for TextureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureState::Unregistered => write!(f, "unregistered"),
            TextureState::Registered => write!(f, "registered"),
            TextureState::Closed => write!(f, "closed"),
        }
    }
}

/// Reacts to texture lifecycle events.
///
/// Every method defaults to doing nothing. An error stops the dispatch of
/// the current event and is returned to the host.
pub trait TextureComponent: Send {
    /// The texture was registered with the host.
    fn on_registration(&mut self, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        Ok(())
    }

    /// Fired on every tick.
    fn on_tick(&mut self, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        Ok(())
    }

    /// Fired before an upload when `ticks` ticks passed since the last one.
    fn on_ticks_elapsed(
        &mut self,
        _ticks: u32,
        _view: &mut TextureAndFrameView<'_>,
    ) -> Result<(), TextureError> {
        Ok(())
    }

    /// The current frame should be uploaded to `base`.
    fn on_upload(
        &mut self,
        _base: &TextureLocation,
        _view: &mut TextureAndFrameView<'_>,
    ) -> Result<(), TextureError> {
        Ok(())
    }

    /// The texture is closing.
    fn on_close(&mut self, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
        Ok(())
    }
}

/// A texture whose content is driven by its components.
pub struct EventDrivenTexture {
    texture: TextureHandle,
    components: Vec<Box<dyn TextureComponent>>,
    predefined: Vec<CloseableImageFrame>,
    generated: CloseableImageFrame,
    frames: FrameState,
    state: TextureState,
    pending_ticks: u32,
}

impl EventDrivenTexture {
    pub fn builder(texture: TextureHandle) -> EventDrivenTextureBuilder {
        EventDrivenTextureBuilder::new(texture)
    }

    pub fn texture(&self) -> &TextureHandle {
        &self.texture
    }

    pub fn state(&self) -> TextureState {
        self.state
    }

    /// Number of components, which is also the frames' layer count when
    /// there are any.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// The frame presented right now.
    pub fn current_frame(&self) -> &CloseableImageFrame {
        match self.frames.current {
            view::CurrentFrame::Predefined(index) => &self.predefined[index],
            view::CurrentFrame::Generated => &self.generated,
        }
    }

    fn require(&self, operation: &'static str, state: TextureState) -> Result<(), TextureError> {
        if self.state != state {
            return Err(TextureError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Register the texture, firing `on_registration`.
    pub fn load(&mut self) -> Result<(), TextureError> {
        self.require("load", TextureState::Unregistered)?;
        self.dispatch("registration", |component, view| component.on_registration(view))?;
        self.state = TextureState::Registered;
        Ok(())
    }

    /// Advance one tick, firing `on_tick`.
    pub fn tick(&mut self) -> Result<(), TextureError> {
        self.require("tick", TextureState::Registered)?;
        self.pending_ticks = self.pending_ticks.saturating_add(1);
        self.dispatch("tick", |component, view| component.on_tick(view))
    }

    /// Upload the current frame to `base`.
    ///
    /// Ticks counted since the previous upload are reported through
    /// `on_ticks_elapsed` first. `on_upload` then fires only when `base`
    /// has not received the current frame yet.
    pub fn upload(&mut self, base: &TextureLocation) -> Result<(), TextureError> {
        self.require("upload", TextureState::Registered)?;

        if self.pending_ticks > 0 {
            // Ticks stay pending until every component has seen them.
            let ticks = self.pending_ticks;
            self.dispatch("ticks elapsed", |component, view| {
                component.on_ticks_elapsed(ticks, view)
            })?;
            self.pending_ticks = 0;
        }

        if self.frames.uploaded.contains(base) {
            tracing::trace!(texture = %self.texture.location, base = %base, "Base already up to date");
            return Ok(());
        }

        self.dispatch("upload", |component, view| component.on_upload(base, view))?;
        self.frames.uploaded.insert(base.clone());
        Ok(())
    }

    /// Upload the current frame to the texture's own location.
    pub fn bind(&mut self) -> Result<(), TextureError> {
        self.require("bind", TextureState::Registered)?;
        let own = self.texture.location.clone();
        self.upload(&own)
    }

    /// Close the texture, firing `on_close` and closing every frame.
    ///
    /// Closing again does nothing. Every component receives `on_close` and
    /// frames are closed even when a component fails; the first component
    /// error is returned.
    pub fn close(&mut self) -> Result<(), TextureError> {
        if self.state == TextureState::Closed {
            return Ok(());
        }

        let result = self.dispatch_all("close", |component, view| component.on_close(view));
        for frame in &mut self.predefined {
            frame.close();
        }
        self.generated.close();
        self.state = TextureState::Closed;

        tracing::debug!(texture = %self.texture.location, "Closed texture");
        result
    }

    /// Fire `event` on every component in order, each with a fresh view on
    /// its own layer. The first failing component stops the dispatch.
    fn dispatch<F>(&mut self, event: &'static str, fire: F) -> Result<(), TextureError>
    where
        F: FnMut(&mut Box<dyn TextureComponent>, &mut TextureAndFrameView<'_>) -> Result<(), TextureError>,
    {
        self.fire_components(event, true, fire)
    }

    /// Like [`dispatch`](Self::dispatch), but every component receives the
    /// event; the first error is returned afterwards.
    fn dispatch_all<F>(&mut self, event: &'static str, fire: F) -> Result<(), TextureError>
    where
        F: FnMut(&mut Box<dyn TextureComponent>, &mut TextureAndFrameView<'_>) -> Result<(), TextureError>,
    {
        self.fire_components(event, false, fire)
    }

    fn fire_components<F>(&mut self, event: &'static str, stop_on_error: bool, mut fire: F) -> Result<(), TextureError>
    where
        F: FnMut(&mut Box<dyn TextureComponent>, &mut TextureAndFrameView<'_>) -> Result<(), TextureError>,
    {
        tracing::debug!(
            texture = %self.texture.location,
            event,
            components = self.components.len(),
            "Dispatching texture event"
        );

        let Self {
            texture,
            components,
            predefined,
            generated,
            frames,
            ..
        } = self;

        let mut first_error = None;
        for (layer, component) in components.iter_mut().enumerate() {
            let result = {
                let mut view = TextureAndFrameView {
                    texture: &*texture,
                    predefined: predefined.as_slice(),
                    generated: &mut *generated,
                    state: &mut *frames,
                    layer,
                };
                fire(component, &mut view)
            };

            // Predefined frames follow a lowered generated frame even when
            // the listener failed afterwards.
            let lowered = match frames.pending_mipmap.take() {
                Some(level) => predefined
                    .iter_mut()
                    .try_for_each(|frame| frame.lower_mipmap_level(level))
                    .map_err(TextureError::from),
                None => Ok(()),
            };
            let result = result.and(lowered);

            if let Err(err) = result {
                tracing::warn!(
                    texture = %texture.location,
                    event,
                    layer,
                    error = %err,
                    "Component failed"
                );
                if stop_on_error {
                    return Err(err);
                }
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for EventDrivenTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDrivenTexture")
            .field("texture", &self.texture)
            .field("state", &self.state)
            .field("frames", &self.predefined.len())
            .field("components", &self.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::frame::FrameError;
    use crate::geometry::{Area, Point, Rect};
    use crate::image::{CloseableImage, MemoryImage};
    use image::{Rgba, RgbaImage};
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records every event it receives, tagged with its name.
    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.log.lock().push(format!("{}:{}", self.name, event));
        }
    }

    impl TextureComponent for Recorder {
        fn on_registration(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            self.push(format!("registration@{}", view.layer()));
            Ok(())
        }

        fn on_tick(&mut self, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            self.push("tick".to_string());
            Ok(())
        }

        fn on_ticks_elapsed(&mut self, ticks: u32, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            self.push(format!("elapsed({})", ticks));
            Ok(())
        }

        fn on_upload(&mut self, base: &TextureLocation, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            self.push(format!("upload({})", base));
            Ok(())
        }

        fn on_close(&mut self, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            self.push("close".to_string());
            Ok(())
        }
    }

    fn frame(fill: [u8; 4], size: u32, mipmap: u8, layers: usize) -> CloseableImageFrame {
        let images = MemoryImage::mipmap_chain(RgbaImage::from_pixel(size, size, Rgba(fill)), mipmap)
            .into_iter()
            .map(|image| Box::new(image) as Box<dyn CloseableImage>)
            .collect();
        CloseableImageFrame::new(size, size, images, layers).unwrap()
    }

    fn handle() -> TextureHandle {
        TextureHandle::new("mod:lamp".parse().unwrap(), 1)
    }

    fn recorded(components: usize) -> (EventDrivenTexture, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let names = ["a", "b", "c"];
        let mut builder = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([0; 4], 4, 0, components)])
            .set_generated_frame(frame([0; 4], 4, 0, components));
        for name in names.into_iter().take(components) {
            builder = builder.add(Recorder {
                name,
                log: Arc::clone(&log),
            });
        }
        (builder.build().unwrap(), log)
    }

    #[test]
    fn test_registration_fires_in_layer_order() {
        let (mut texture, log) = recorded(2);
        texture.load().unwrap();
        assert_eq!(
            log.lock().as_slice(),
            &["a:registration@0".to_string(), "b:registration@1".to_string()]
        );
        assert_eq!(texture.state(), TextureState::Registered);
    }

    #[test]
    fn test_lifecycle_order_is_enforced() {
        let (mut texture, _) = recorded(1);
        let base = texture.texture().location().clone();
        assert!(matches!(
            texture.tick(),
            Err(TextureError::InvalidState { operation: "tick", state: TextureState::Unregistered })
        ));
        assert!(texture.upload(&base).is_err());
        assert!(texture.bind().is_err());

        texture.load().unwrap();
        assert!(texture.load().is_err());

        texture.close().unwrap();
        texture.close().unwrap();
        assert!(matches!(
            texture.tick(),
            Err(TextureError::InvalidState { state: TextureState::Closed, .. })
        ));
    }

    #[test]
    fn test_upload_is_deduplicated_per_base() {
        let (mut texture, log) = recorded(1);
        let own: TextureLocation = "mod:lamp".parse().unwrap();
        let atlas: TextureLocation = "mod:atlas".parse().unwrap();
        texture.load().unwrap();
        log.lock().clear();

        texture.upload(&own).unwrap();
        texture.upload(&own).unwrap();
        texture.upload(&atlas).unwrap();
        texture.bind().unwrap();

        assert_eq!(
            log.lock().as_slice(),
            &["a:upload(mod:lamp)".to_string(), "a:upload(mod:atlas)".to_string()]
        );
    }

    #[test]
    fn test_elapsed_ticks_fire_before_upload() {
        let (mut texture, log) = recorded(1);
        let base = texture.texture().location().clone();
        texture.load().unwrap();
        log.lock().clear();

        texture.tick().unwrap();
        texture.tick().unwrap();
        texture.upload(&base).unwrap();
        texture.upload(&base).unwrap();

        assert_eq!(
            log.lock().as_slice(),
            &[
                "a:tick".to_string(),
                "a:tick".to_string(),
                "a:elapsed(2)".to_string(),
                "a:upload(mod:lamp)".to_string(),
            ]
        );
    }

    #[test]
    fn test_close_closes_frames_once() {
        let (mut texture, log) = recorded(1);
        texture.load().unwrap();
        texture.close().unwrap();
        texture.close().unwrap();

        let closes = log.lock().iter().filter(|event| event.ends_with("close")).count();
        assert_eq!(closes, 1);
        assert!(texture.current_frame().is_closed());
    }

    /// Fails every close.
    struct FailsOnClose;

    impl TextureComponent for FailsOnClose {
        fn on_close(&mut self, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            Err(TextureError::InvalidAnimation("release failed".to_string()))
        }
    }

    #[test]
    fn test_close_reaches_components_after_a_failure() {
        let released = Arc::new(Mutex::new(0));
        let release_count = Arc::clone(&released);
        let mut texture = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([0; 4], 4, 0, 2)])
            .set_generated_frame(frame([0; 4], 4, 0, 2))
            .add(FailsOnClose)
            .add(crate::component::CleanupComponent::new(move |_| *release_count.lock() += 1))
            .build()
            .unwrap();
        texture.load().unwrap();

        assert_eq!(
            texture.close(),
            Err(TextureError::InvalidAnimation("release failed".to_string()))
        );
        assert_eq!(*released.lock(), 1);
        assert_eq!(texture.state(), TextureState::Closed);
        assert!(texture.current_frame().is_closed());

        texture.close().unwrap();
        assert_eq!(*released.lock(), 1);
    }

    /// Fails its first elapsed-ticks report, then records the rest.
    struct FlakyTicks {
        failed: bool,
        log: Log,
    }

    impl TextureComponent for FlakyTicks {
        fn on_ticks_elapsed(&mut self, ticks: u32, _view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            if !self.failed {
                self.failed = true;
                return Err(TextureError::InvalidAnimation("not ready".to_string()));
            }
            self.log.lock().push(format!("elapsed({})", ticks));
            Ok(())
        }
    }

    #[test]
    fn test_elapsed_ticks_survive_failed_upload() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut texture = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([0; 4], 4, 0, 1)])
            .set_generated_frame(frame([0; 4], 4, 0, 1))
            .add(FlakyTicks { failed: false, log: Arc::clone(&log) })
            .build()
            .unwrap();
        let base = texture.texture().location().clone();
        texture.load().unwrap();

        texture.tick().unwrap();
        texture.tick().unwrap();
        assert!(texture.upload(&base).is_err());
        texture.tick().unwrap();
        texture.upload(&base).unwrap();

        assert_eq!(log.lock().as_slice(), &["elapsed(3)".to_string()]);
    }

    /// Draws on its layer every tick and lowers mipmaps on registration.
    struct Painter {
        color: Color,
        lower_to: Option<u8>,
    }

    impl TextureComponent for Painter {
        fn on_registration(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            if let Some(level) = self.lower_to {
                view.lower_mipmap_level(level)?;
                assert_eq!(view.mipmap_level(), level);
            }
            Ok(())
        }

        fn on_tick(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            let color = self.color;
            let area = Area::rect(0, 0, view.width(), view.height());
            view.generate_with(move |_, _| Ok(color), &area)
        }
    }

    #[test]
    fn test_generate_switches_to_generated_frame_and_marks_dirty() {
        let red = Color::new(255, 0, 0, 255);
        let mut texture = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([0, 0, 255, 255], 4, 0, 1)])
            .set_generated_frame(frame([0; 4], 4, 0, 1))
            .add(Painter { color: red, lower_to: None })
            .build()
            .unwrap();
        texture.load().unwrap();
        assert_eq!(texture.current_frame().color(0, 0).unwrap(), Color::new(0, 0, 255, 255));

        let base = texture.texture().location().clone();
        texture.upload(&base).unwrap();
        assert!(texture.frames.uploaded.contains(&base));

        texture.tick().unwrap();
        assert!(texture.frames.uploaded.is_empty());
        assert_eq!(texture.current_frame().color(3, 3).unwrap(), red);
    }

    #[test]
    fn test_lowering_reaches_predefined_frames_after_listener() {
        let mut texture = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([0; 4], 8, 3, 1), frame([0; 4], 8, 3, 1)])
            .set_generated_frame(frame([0; 4], 8, 3, 1))
            .add(Painter {
                color: Color::WHITE,
                lower_to: Some(1),
            })
            .build()
            .unwrap();
        texture.load().unwrap();

        assert!(texture.predefined.iter().all(|frame| frame.mipmap_level() == 1));
        assert_eq!(texture.generated.mipmap_level(), 1);
    }

    /// Fails on tick with a frame error.
    struct Broken;

    impl TextureComponent for Broken {
        fn on_tick(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            view.upload(Point::ORIGIN, 0, Rect::sized(100, 100))
        }
    }

    #[test]
    fn test_component_error_stops_dispatch() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut texture = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([0; 4], 4, 0, 2)])
            .set_generated_frame(frame([0; 4], 4, 0, 2))
            .add(Broken)
            .add(Recorder { name: "after", log: Arc::clone(&log) })
            .build()
            .unwrap();
        texture.load().unwrap();
        log.lock().clear();

        assert!(matches!(
            texture.tick(),
            Err(TextureError::Frame(FrameError::RegionOutOfBounds { .. }))
        ));
        assert!(log.lock().is_empty());
    }

    /// Generates from a neighbor that does not exist.
    struct ReadsPastEdge;

    impl TextureComponent for ReadsPastEdge {
        fn on_tick(&mut self, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            let width = view.width();
            let area = Area::rect(0, 0, view.width(), view.height());
            view.generate_with(move |point, below| below.color(point.x + width, point.y), &area)
        }
    }

    #[test]
    fn test_failed_generation_keeps_presented_frame() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut texture = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([5, 5, 5, 255], 4, 0, 2)])
            .set_generated_frame(frame([0; 4], 4, 0, 2))
            .add(ReadsPastEdge)
            .add(Recorder { name: "a", log: Arc::clone(&log) })
            .build()
            .unwrap();
        let base = texture.texture().location().clone();
        texture.load().unwrap();
        texture.upload(&base).unwrap();
        log.lock().clear();

        assert!(matches!(
            texture.tick(),
            Err(TextureError::Frame(FrameError::PointOutOfBounds { .. }))
        ));
        assert_eq!(texture.current_frame().color(0, 0).unwrap(), Color::new(5, 5, 5, 255));

        texture.upload(&base).unwrap();
        assert!(log.lock().iter().all(|event| !event.starts_with("a:upload")));
    }

    /// Switches between predefined frames by tick parity.
    struct Flipper;

    impl TextureComponent for Flipper {
        fn on_ticks_elapsed(&mut self, ticks: u32, view: &mut TextureAndFrameView<'_>) -> Result<(), TextureError> {
            let next = (view.current_frame().unwrap_or(0) + ticks as usize) % view.predefined_frames().len();
            view.set_current_frame(next)
        }
    }

    #[test]
    fn test_set_current_frame() {
        let mut texture = EventDrivenTexture::builder(handle())
            .set_predefined_frames(vec![frame([1, 1, 1, 255], 2, 0, 1), frame([2, 2, 2, 255], 2, 0, 1)])
            .set_generated_frame(frame([0; 4], 2, 0, 1))
            .add(Flipper)
            .build()
            .unwrap();
        let base = texture.texture().location().clone();
        texture.load().unwrap();
        texture.tick().unwrap();
        texture.upload(&base).unwrap();

        assert_eq!(texture.current_frame().color(0, 0).unwrap(), Color::new(2, 2, 2, 255));
    }
}
