//! Window enumeration.

use super::text::TextPattern;
use crate::util::{LocateResult, Rect};
use parking_lot::RwLock;
use std::fmt;

/// Visibility state of a top-level window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
    Minimized,
    Hidden,
}

impl WindowState {
    /// Whether the window's contents are on screen.
    pub fn is_visible(self) -> bool {
        matches!(self, WindowState::Normal | WindowState::Maximized)
    }
}

/// Snapshot of a top-level window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowInfo {
    /// Opaque platform handle.
    pub handle: u64,
    pub title: String,
    /// Window class (WM_CLASS on X11, the registered class on Windows); empty
    /// when the platform reports none.
    pub class_name: String,
    /// Outer frame in screen coordinates.
    pub rect: Rect,
    /// Client area in screen coordinates.
    pub client_rect: Rect,
    pub state: WindowState,
}

impl WindowInfo {
    /// A normal window whose client area equals its frame.
    pub fn new(handle: u64, title: impl Into<String>, rect: Rect) -> Self {
        Self {
            handle,
            title: title.into(),
            class_name: String::new(),
            rect,
            client_rect: rect,
            state: WindowState::Normal,
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn with_client_rect(mut self, client_rect: Rect) -> Self {
        self.client_rect = client_rect;
        self
    }

    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = state;
        self
    }
}

/// How a window is picked out of the desktop's window list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WindowSelector {
    /// Title satisfies the pattern.
    Title(TextPattern),
    /// Class name equals this one, ignoring ASCII case.
    Class(String),
}

impl WindowSelector {
    pub fn class(class_name: impl Into<String>) -> Self {
        WindowSelector::Class(class_name.into())
    }

    pub fn matches(&self, window: &WindowInfo) -> bool {
        match self {
            WindowSelector::Title(pattern) => pattern.matches(&window.title),
            WindowSelector::Class(class_name) => {
                !window.class_name.is_empty() && window.class_name.eq_ignore_ascii_case(class_name)
            }
        }
    }
}

impl From<TextPattern> for WindowSelector {
    fn from(pattern: TextPattern) -> Self {
        WindowSelector::Title(pattern)
    }
}

impl fmt::Display for WindowSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowSelector::Title(pattern) => write!(f, "title {:?}", pattern.text),
            WindowSelector::Class(class_name) => write!(f, "class {class_name:?}"),
        }
    }
}

/// Lists top-level windows.
pub trait WindowEnumerator: Send + Sync {
    /// Windows satisfying `selector`, in the platform's listing order.
    fn find_windows(&self, selector: &WindowSelector) -> LocateResult<Vec<WindowInfo>>;
}

/// A fixed, replaceable window list.
#[derive(Default)]
pub struct StaticWindows {
    windows: RwLock<Vec<WindowInfo>>,
}

impl StaticWindows {
    pub fn new(windows: Vec<WindowInfo>) -> Self {
        Self {
            windows: RwLock::new(windows),
        }
    }

    pub fn set_windows(&self, windows: Vec<WindowInfo>) {
        *self.windows.write() = windows;
    }
}

impl WindowEnumerator for StaticWindows {
    fn find_windows(&self, selector: &WindowSelector) -> LocateResult<Vec<WindowInfo>> {
        Ok(self
            .windows
            .read()
            .iter()
            .filter(|w| selector.matches(w))
            .cloned()
            .collect())
    }
}
