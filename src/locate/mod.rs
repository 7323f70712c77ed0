//! Element location strategies and their composition.
//!
//! Every strategy answers the same question, "where is this element now?",
//! through the [`Locate`] capability. Expected absences come back as
//! [`LocateOutcome::NotFound`]; only failures are errors.

mod composite;
mod coordinate;
mod request;
mod template;
mod text;
mod window;

pub use composite::{AttemptOutcome, CompositeLocator, CompositeReport, StrategyAttempt};
pub use coordinate::CoordinateLocator;
pub use request::{LocateRequest, ReferencePoint, SearchRegion, Target};
pub use template::TemplateLocator;
pub use text::{TextLocator, DEFAULT_MIN_TEXT_CONFIDENCE};
pub use window::WindowLocator;

use crate::util::{LocateResult, Point};
use std::fmt;

/// The four ways of resolving an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    Coordinate,
    ImageTemplate,
    WindowHandle,
    TextRecognition,
}

impl StrategyKind {
    /// Order tried when the caller does not give one.
    pub const DEFAULT_ORDER: [StrategyKind; 4] = [
        StrategyKind::Coordinate,
        StrategyKind::ImageTemplate,
        StrategyKind::WindowHandle,
        StrategyKind::TextRecognition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Coordinate => "coordinate",
            StrategyKind::ImageTemplate => "image-template",
            StrategyKind::WindowHandle => "window-handle",
            StrategyKind::TextRecognition => "text-recognition",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Found {
    /// Screen point to interact with.
    pub center: Point,
    pub confidence: f32,
    /// Strategy that produced the point.
    pub strategy: StrategyKind,
}

/// Result of one locate call: a concrete point with provenance, or nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocateOutcome {
    Found(Found),
    NotFound,
}

impl LocateOutcome {
    pub fn found(&self) -> Option<&Found> {
        match self {
            LocateOutcome::Found(found) => Some(found),
            LocateOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LocateOutcome::Found(_))
    }
}

/// The locate capability shared by all strategies.
///
/// Implementations hold no per-call mutable state and may be shared across
/// threads.
pub trait Locate: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether this strategy has anything to do for `request`.
    fn supports(&self, request: &LocateRequest) -> bool {
        request.target(self.kind()).is_some()
    }

    fn locate(&self, request: &LocateRequest) -> LocateResult<LocateOutcome>;
}
