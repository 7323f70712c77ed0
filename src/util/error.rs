//! Error types for uilocator.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for uilocator operations.
pub type Result<T> = std::result::Result<T, LocateError>;

/// Errors that can occur while registering templates, matching, locating, or waiting.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LocateError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row length in elements.
    #[error("invalid stride {stride} for row length {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer cannot hold the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// An ROI does not fit in the image it was cut from.
    #[error("roi ({x}, {y}, {width}x{height}) out of bounds for {img_width}x{img_height} image")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The matching engine was handed an empty region or template.
    #[error("invalid match input: {reason}")]
    InvalidMatchInput { reason: &'static str },
    /// A template with the same `(group, name)` is already registered.
    #[error("template '{name}' already registered in group '{group}'")]
    DuplicateTemplate { group: String, name: String },
    /// A bare template name resolves to more than one group.
    #[error("template '{name}' is ambiguous; found in groups {groups:?}")]
    AmbiguousTemplate { name: String, groups: Vec<String> },
    /// No catalog entry matches the lookup.
    #[error("template '{name}' not found")]
    TemplateNotFound { name: String, group: Option<String> },
    /// A template file could not be read or decoded.
    #[error("failed to load image {path:?}: {reason}")]
    ImageIo { path: PathBuf, reason: String },
    /// Invalid caller-supplied configuration (for example a malformed wait spec).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A coordinate lies outside the addressable screen.
    #[error("point ({x}, {y}) lies outside the screen bounds")]
    OutOfBounds { x: i32, y: i32 },
    /// A locate request is structurally malformed.
    #[error("invalid locate request: {0}")]
    InvalidRequest(String),
    /// The screen could not be captured.
    #[error("screen capture failed: {0}")]
    Capture(String),
    /// No window matched, or it was not in a usable state.
    #[error("window not found: {0}")]
    WindowNotFound(String),
    /// Window enumeration itself failed.
    #[error("window enumeration failed: {0}")]
    WindowEnumeration(String),
    /// The text-recognition backend failed on an image.
    #[error("text recognition failed: {0}")]
    TextRecognition(String),
    /// A lazily initialized backend could not be acquired.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl LocateError {
    /// Returns true for "not there (yet)" conditions that a locator or poll loop
    /// may treat as absence instead of failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LocateError::TemplateNotFound { .. }
                | LocateError::Capture(_)
                | LocateError::WindowNotFound(_)
                | LocateError::WindowEnumeration(_)
                | LocateError::TextRecognition(_)
                | LocateError::BackendUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LocateError;

    #[test]
    fn not_found_family_is_recoverable() {
        assert!(LocateError::TemplateNotFound {
            name: "ok".into(),
            group: None
        }
        .is_recoverable());
        assert!(LocateError::Capture("no display".into()).is_recoverable());
        assert!(LocateError::WindowNotFound("Notepad".into()).is_recoverable());
    }

    #[test]
    fn configuration_errors_are_fatal() {
        assert!(!LocateError::Configuration("interval > timeout".into()).is_recoverable());
        assert!(!LocateError::OutOfBounds { x: -1, y: 0 }.is_recoverable());
        assert!(!LocateError::AmbiguousTemplate {
            name: "ok".into(),
            groups: vec!["a".into(), "b".into()]
        }
        .is_recoverable());
        assert!(!LocateError::InvalidMatchInput {
            reason: "empty template"
        }
        .is_recoverable());
    }
}
