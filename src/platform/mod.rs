//! Interfaces to the desktop: screen capture, window enumeration, and text
//! recognition.
//!
//! The locator core only consumes these traits. In-memory implementations
//! (`StaticScreen`, `StaticWindows`) serve fixed data for offline runs and
//! tests. With the `desktop` feature, `DesktopScreen` captures the primary
//! monitor, `DesktopWindows` lists X11 windows through `wmctrl`, and
//! `TesseractRecognizer` reads text with the `tesseract` engine. None of
//! these interfaces mutate window state or inject input.

mod capture;
mod lazy;
mod tesseract;
mod text;
mod window;
mod wmctrl;

pub use capture::{Frame, ScreenCapture, StaticScreen};
#[cfg(feature = "desktop")]
pub use capture::DesktopScreen;
pub use lazy::LazyBackend;
pub use tesseract::parse_tesseract_tsv;
#[cfg(feature = "desktop")]
pub use tesseract::TesseractRecognizer;
pub use text::{MatchMode, TextBox, TextPattern, TextRecognizer};
pub use window::{StaticWindows, WindowEnumerator, WindowInfo, WindowSelector, WindowState};
pub use wmctrl::parse_wmctrl_windows;
#[cfg(feature = "desktop")]
pub use wmctrl::DesktopWindows;
