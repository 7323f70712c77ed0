//! Catalog entries.

use crate::util::Size;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default acceptance threshold for templates registered without one.
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

/// Image file extensions recognized by directory scans (lowercase).
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

/// Returns true if the path has a supported image extension.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// A registered visual reference: where the image lives and how to match it.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    /// Unique key within the group.
    pub name: String,
    /// Source image location.
    pub path: PathBuf,
    /// Namespace, typically a business domain or screen.
    pub group: String,
    /// Default acceptance threshold in `[0, 1]`.
    pub confidence: f32,
    /// Free-form labels for search.
    pub tags: BTreeSet<String>,
    /// Human-readable note.
    pub description: String,
    /// Pixel size, read from the file header when it was available.
    pub size: Option<Size>,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            group: group.into(),
            confidence: DEFAULT_CONFIDENCE,
            tags: BTreeSet::new(),
            description: String::new(),
            size: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Case-insensitive substring match over name, tags, and description.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self.description.to_lowercase().contains(needle)
    }
}
