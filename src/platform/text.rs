//! Text recognition interface and text patterns.

use crate::image::ImageView;
use crate::util::{LocateResult, Rect};

/// How a [`TextPattern`] compares against candidate text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Equal after trimming surrounding whitespace.
    Exact,
    /// Case-insensitive containment.
    #[default]
    Substring,
}

/// Text to look for in window titles or recognized screen text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextPattern {
    pub text: String,
    pub mode: MatchMode,
}

impl TextPattern {
    /// A pattern with the default (substring) mode.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::default(),
        }
    }

    pub fn exact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Exact,
        }
    }

    pub fn substring(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Substring,
        }
    }

    /// Returns true if `candidate` satisfies the pattern.
    pub fn matches(&self, candidate: &str) -> bool {
        match self.mode {
            MatchMode::Exact => candidate.trim() == self.text.trim(),
            MatchMode::Substring => candidate
                .to_lowercase()
                .contains(&self.text.to_lowercase()),
        }
    }
}

/// A piece of recognized text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBox {
    pub text: String,
    /// Bounding box relative to the recognized image.
    pub bbox: Rect,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Optical text recognition backend.
///
/// Backends may return every text box they find; callers filter by the
/// pattern and by confidence themselves.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: ImageView<'_, u8>, pattern: &TextPattern)
        -> LocateResult<Vec<TextBox>>;
}

#[cfg(test)]
mod tests {
    use super::{MatchMode, TextPattern};

    #[test]
    fn exact_ignores_surrounding_whitespace_only() {
        let p = TextPattern::exact("Save");
        assert!(p.matches("  Save "));
        assert!(!p.matches("save"));
        assert!(!p.matches("Save As"));
    }

    #[test]
    fn default_mode_is_case_insensitive_substring() {
        let p = TextPattern::new("save");
        assert_eq!(p.mode, MatchMode::Substring);
        assert!(p.matches("Save As..."));
    }

    #[test]
    fn substring_is_case_insensitive() {
        let p = TextPattern::substring("notepad");
        assert!(p.matches("Untitled - Notepad"));
        assert!(!p.matches("Calculator"));
    }
}
