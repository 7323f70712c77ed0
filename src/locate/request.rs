//! Strategy-agnostic locate requests.

use super::StrategyKind;
use crate::platform::{TextPattern, WindowEnumerator, WindowSelector};
use crate::util::{LocateError, LocateResult, Point, Rect};

/// Which point of a window's client rectangle a window target resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ReferencePoint {
    #[default]
    Center,
    TopLeft,
    /// Fractional offsets inside the client rectangle, each in `[0, 1]`.
    Relative { x_ratio: f32, y_ratio: f32 },
}

impl ReferencePoint {
    pub fn resolve(&self, rect: &Rect) -> Point {
        match *self {
            ReferencePoint::Center => rect.center(),
            ReferencePoint::TopLeft => rect.origin,
            ReferencePoint::Relative { x_ratio, y_ratio } => rect.relative_point(x_ratio, y_ratio),
        }
    }
}

/// What to look for.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// A literal screen point.
    Point(Point),
    /// A point given as fractions of the screen size.
    Relative { x_ratio: f32, y_ratio: f32 },
    /// A registered template, optionally pinned to a group.
    Template { name: String, group: Option<String> },
    /// A top-level window picked by title or class.
    Window {
        selector: WindowSelector,
        reference: ReferencePoint,
    },
    /// On-screen text.
    Text(TextPattern),
}

impl Target {
    pub fn point(x: i32, y: i32) -> Self {
        Target::Point(Point::new(x, y))
    }

    pub fn template(name: impl Into<String>) -> Self {
        Target::Template {
            name: name.into(),
            group: None,
        }
    }

    pub fn template_in(name: impl Into<String>, group: impl Into<String>) -> Self {
        Target::Template {
            name: name.into(),
            group: Some(group.into()),
        }
    }

    /// A window by title, resolved to its client center.
    pub fn window(pattern: TextPattern) -> Self {
        Target::Window {
            selector: WindowSelector::Title(pattern),
            reference: ReferencePoint::Center,
        }
    }

    /// A window by class name, resolved to its client center.
    pub fn window_class(class_name: impl Into<String>) -> Self {
        Target::Window {
            selector: WindowSelector::class(class_name),
            reference: ReferencePoint::Center,
        }
    }

    pub fn text(pattern: TextPattern) -> Self {
        Target::Text(pattern)
    }

    /// The strategy able to resolve this target.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Target::Point(_) | Target::Relative { .. } => StrategyKind::Coordinate,
            Target::Template { .. } => StrategyKind::ImageTemplate,
            Target::Window { .. } => StrategyKind::WindowHandle,
            Target::Text(_) => StrategyKind::TextRecognition,
        }
    }
}

/// Where image and text strategies look.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SearchRegion {
    #[default]
    FullScreen,
    Rect(Rect),
    /// Client area of the first visible matching window.
    Window(WindowSelector),
}

impl SearchRegion {
    /// Resolves to a screen rectangle, `None` meaning the whole screen.
    pub(crate) fn resolve(
        &self,
        windows: Option<&dyn WindowEnumerator>,
    ) -> LocateResult<Option<Rect>> {
        match self {
            SearchRegion::FullScreen => Ok(None),
            SearchRegion::Rect(rect) => {
                if rect.is_empty() {
                    return Err(LocateError::InvalidMatchInput {
                        reason: "empty search region",
                    });
                }
                Ok(Some(*rect))
            }
            SearchRegion::Window(selector) => {
                let windows = windows.ok_or_else(|| {
                    LocateError::InvalidRequest(
                        "window search region requires a window enumerator".into(),
                    )
                })?;
                windows
                    .find_windows(selector)?
                    .into_iter()
                    .find(|w| w.state.is_visible())
                    .map(|w| Some(w.client_rect))
                    .ok_or_else(|| LocateError::WindowNotFound(selector.to_string()))
            }
        }
    }
}

/// One locate query: alternative targets, a search region and an optional
/// confidence threshold.
///
/// A request carries at most one target per strategy kind; each strategy
/// picks the target it understands. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct LocateRequest {
    targets: Vec<Target>,
    region: SearchRegion,
    min_confidence: Option<f32>,
}

impl LocateRequest {
    pub fn new(target: Target) -> Self {
        Self {
            targets: vec![target],
            region: SearchRegion::FullScreen,
            min_confidence: None,
        }
    }

    /// Adds an alternative target for another strategy.
    pub fn or(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn in_region(mut self, region: SearchRegion) -> Self {
        self.region = region;
        self
    }

    /// Overrides the per-template default confidence.
    pub fn with_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// The target handled by `kind`, if any.
    pub fn target(&self, kind: StrategyKind) -> Option<&Target> {
        self.targets.iter().find(|t| t.kind() == kind)
    }

    pub fn region(&self) -> &SearchRegion {
        &self.region
    }

    pub fn min_confidence(&self) -> Option<f32> {
        self.min_confidence
    }

    /// Scales an explicit rectangle region by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        let mut scaled = self.clone();
        if let SearchRegion::Rect(rect) = &self.region {
            scaled.region = SearchRegion::Rect(rect.scaled(factor));
        }
        scaled
    }

    /// Rejects malformed requests.
    pub fn validate(&self) -> LocateResult<()> {
        if self.targets.is_empty() {
            return Err(LocateError::InvalidRequest("request has no target".into()));
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].iter().any(|t| t.kind() == target.kind()) {
                return Err(LocateError::InvalidRequest(format!(
                    "more than one {} target",
                    target.kind()
                )));
            }
            if let Target::Relative { x_ratio, y_ratio } = target {
                if !(0.0..=1.0).contains(x_ratio) || !(0.0..=1.0).contains(y_ratio) {
                    return Err(LocateError::InvalidRequest(format!(
                        "relative point ({x_ratio}, {y_ratio}) outside [0, 1]"
                    )));
                }
            }
        }
        if let Some(c) = self.min_confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(LocateError::InvalidRequest(format!(
                    "confidence {c} outside [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// The target for `kind`, or an error for strategies called directly
    /// with a request they cannot serve.
    pub(crate) fn require(&self, kind: StrategyKind) -> LocateResult<&Target> {
        self.target(kind).ok_or_else(|| {
            LocateError::InvalidRequest(format!("request has no {kind} target"))
        })
    }
}
