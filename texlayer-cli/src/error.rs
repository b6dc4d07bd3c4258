//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;
use texlayer::base::BaseError;
use texlayer::config::ConfigError;
use texlayer::frame::FrameError;
use texlayer::logging::LoggingError;
use texlayer::texture::TextureError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be set up.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Arguments that the library would reject.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An input image could not be opened or decoded.
    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An output image could not be written.
    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Location error: {0}")]
    Location(#[from] BaseError),

    #[error("Image buffer error: {0}")]
    Buffer(#[from] texlayer::image::ImageError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = CliError::InvalidInput("frame height must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid input: frame height must be positive");
    }

    #[test]
    fn test_texture_error_converts() {
        let err: CliError = TextureError::MissingGeneratedFrame.into();
        assert!(matches!(err, CliError::Texture(_)));
    }
}
