//! Error types for texture building and lifecycle events.

use thiserror::Error;

use super::TextureState;
use crate::frame::FrameError;

/// Errors raised by [`EventDrivenTexture`](super::EventDrivenTexture), its
/// builder and its components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    /// No predefined frames were supplied to the builder.
    #[error("a texture needs at least one predefined frame")]
    MissingPredefinedFrames,

    /// No generated frame was supplied to the builder.
    #[error("a texture needs a generated frame")]
    MissingGeneratedFrame,

    /// A frame does not match the first predefined frame.
    #[error("{frame} has {property} {actual}, expected {expected}")]
    FrameMismatch {
        frame: String,
        property: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Components and frame layers must correspond one to one.
    #[error("{components} components registered for frames with {layers} layers")]
    ComponentCountMismatch { components: usize, layers: usize },

    /// A lifecycle call arrived in a state that does not allow it.
    #[error("cannot {operation} a texture that is {state}")]
    InvalidState {
        operation: &'static str,
        state: TextureState,
    },

    /// A predefined frame index is out of range.
    #[error("predefined frame {index} does not exist, the texture has {frames}")]
    NoSuchFrame { index: usize, frames: usize },

    /// Animation frame timings cannot be used.
    #[error("invalid animation: {0}")]
    InvalidAnimation(String),

    /// A frame operation failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_display() {
        let err = TextureError::InvalidState {
            operation: "tick",
            state: TextureState::Closed,
        };
        assert_eq!(err.to_string(), "cannot tick a texture that is closed");
    }

    #[test]
    fn test_frame_mismatch_display() {
        let err = TextureError::FrameMismatch {
            frame: "predefined frame 2".to_string(),
            property: "width",
            expected: 16,
            actual: 32,
        };
        assert_eq!(err.to_string(), "predefined frame 2 has width 32, expected 16");
    }

    #[test]
    fn test_frame_error_converts() {
        let err: TextureError = FrameError::Closed.into();
        assert_eq!(err, TextureError::Frame(FrameError::Closed));
    }
}
