//! uilocator finds interactive elements on a desktop screen and waits for
//! them to appear.
//!
//! Four independent strategies resolve an element to a screen point: a fixed
//! coordinate, an image template matched with normalized cross-correlation, a
//! window looked up by title, and text found by a recognition backend. A
//! [`CompositeLocator`] tries them in priority order, and a [`WaitExecutor`]
//! polls any predicate with timeout, backoff and cooperative cancellation.
//!
//! Templates live in a [`TemplateRegistry`] that decodes image files on first
//! use and re-decodes them when they change on disk. Screen capture, window
//! enumeration and text recognition are traits in [`platform`]; the crate
//! never injects input or changes window state.
//!
//! Optional features: `rayon` (row-parallel response surfaces), `tracing`
//! (spans and events), `desktop` (primary-monitor capture).

mod candidate;
pub mod context;
pub mod image;
pub mod kernel;
pub mod locate;
pub mod platform;
pub mod registry;
pub mod search;
pub mod template;
mod trace;
pub mod util;
pub mod wait;

pub use candidate::MatchCandidate;
pub use context::{Context, ContextBuilder, Defaults};
pub use crate::image::{ImageView, OwnedImage};
pub use locate::{
    CompositeLocator, CompositeReport, Found, Locate, LocateOutcome, LocateRequest,
    SearchRegion, StrategyKind, Target,
};
pub use registry::{Template, TemplateRegistry};
pub use search::{MatchConfig, Matcher};
pub use util::{LocateError, LocateResult, Point, Rect, Size};
pub use wait::{
    CancelToken, Clock, ManualClock, SystemClock, WaitExecutor, WaitReport, WaitSpec, WaitState,
};
