//! Error types for boxfit
//!
//! Only [`BoxfitError::FontUnavailable`] is meant to escape a render call.
//! Overflow, failed emoji synthesis and malformed markup are absorbed by
//! the pipeline and surface as warnings instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoxfitError>;

/// Main error type for boxfit
#[derive(Debug, Error)]
pub enum BoxfitError {
    #[error("No usable font could be loaded: {0}")]
    FontUnavailable(String),

    #[error("Font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("Shaping failed: {0}")]
    ShapingFailed(#[from] ShapingError),

    #[error("Rendering failed: {0}")]
    RenderingFailed(#[from] RenderError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid font data: {0}")]
    InvalidData(String),

    #[error("Font not supported: {0}")]
    NotSupported(String),
}

/// Shaping errors
#[derive(Debug, Error)]
pub enum ShapingError {
    #[error("Invalid text input")]
    InvalidText,

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Backend error: {0}")]
    BackendError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_load_error_converts_and_keeps_message() {
        let err: BoxfitError = FontLoadError::FileNotFound("/nope.ttf".into()).into();
        assert!(matches!(err, BoxfitError::FontLoad(_)));
        assert_eq!(
            err.to_string(),
            "Font loading failed: Font file not found: /nope.ttf"
        );
    }

    #[test]
    fn font_unavailable_is_its_own_variant() {
        let err = BoxfitError::FontUnavailable("regular".into());
        assert!(err.to_string().contains("regular"));
    }
}
