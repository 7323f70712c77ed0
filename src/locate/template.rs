use super::{Found, Locate, LocateOutcome, LocateRequest, StrategyKind, Target};
use crate::candidate::MatchCandidate;
use crate::platform::{ScreenCapture, WindowEnumerator};
use crate::registry::TemplateRegistry;
use crate::search::Matcher;
use crate::trace::trace_debug;
use crate::util::{LocateError, LocateResult};
use std::sync::Arc;

/// Default number of candidates kept per match call.
pub const DEFAULT_MAX_CANDIDATES: usize = 5;

/// Finds registered templates on screen.
///
/// Pixels are borrowed from the registry's cache for the duration of one call
/// and never retained.
pub struct TemplateLocator {
    registry: Arc<TemplateRegistry>,
    screen: Arc<dyn ScreenCapture>,
    windows: Option<Arc<dyn WindowEnumerator>>,
    matcher: Matcher,
    max_candidates: usize,
}

impl TemplateLocator {
    pub fn new(registry: Arc<TemplateRegistry>, screen: Arc<dyn ScreenCapture>) -> Self {
        Self {
            registry,
            screen,
            windows: None,
            matcher: Matcher::new(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    /// Enables window search regions.
    pub fn with_windows(mut self, windows: Arc<dyn WindowEnumerator>) -> Self {
        self.windows = Some(windows);
        self
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// All accepted candidates for the request's template, in screen
    /// coordinates, highest confidence first.
    pub fn find_all(&self, request: &LocateRequest) -> LocateResult<Vec<MatchCandidate>> {
        let Target::Template { name, group } = request.require(self.kind())? else {
            return Err(LocateError::InvalidRequest(
                "image strategy needs a template target".into(),
            ));
        };
        let group = group.as_deref();
        let template = self.registry.template(name, group)?;
        let min_confidence = request.min_confidence().unwrap_or(template.confidence);
        let region = request.region().resolve(self.windows.as_deref())?;
        let pixels = self.registry.get_image(name, group)?;
        let frame = self.screen.capture(region)?;

        let candidates =
            self.matcher
                .match_images(&frame.image, &pixels, min_confidence, self.max_candidates)?;
        trace_debug!(
            "template matched",
            template = name.as_str(),
            candidates = candidates.len()
        );
        Ok(candidates
            .into_iter()
            .map(|c| c.translated(frame.origin.x, frame.origin.y))
            .collect())
    }
}

impl Locate for TemplateLocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ImageTemplate
    }

    fn locate(&self, request: &LocateRequest) -> LocateResult<LocateOutcome> {
        Ok(match self.find_all(request)?.first() {
            Some(best) => LocateOutcome::Found(Found {
                center: best.center(),
                confidence: best.confidence,
                strategy: self.kind(),
            }),
            None => LocateOutcome::NotFound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TemplateLocator;
    use crate::image::io::save_image;
    use crate::image::OwnedImage;
    use crate::locate::{Locate, LocateOutcome, LocateRequest, SearchRegion, Target};
    use crate::platform::StaticScreen;
    use crate::registry::TemplateRegistry;
    use crate::util::{LocateError, Point, Rect};
    use std::sync::Arc;

    fn checker(size: usize) -> OwnedImage {
        let mut data = Vec::with_capacity(size * size * 3);
        for y in 0..size {
            for x in 0..size {
                let v = if (x / 2 + y / 3) % 2 == 0 { 230 } else { 20 };
                data.extend_from_slice(&[v, v / 2, 255 - v]);
            }
        }
        OwnedImage::with_channels(data, size, size, 3).unwrap()
    }

    fn setup() -> (tempfile::TempDir, TemplateLocator) {
        let dir = tempfile::tempdir().unwrap();
        let template = checker(12);
        let path = dir.path().join("icon.png");
        save_image(&template, &path).unwrap();

        let mut screen = OwnedImage::filled(80, 60, &[128, 128, 128]).unwrap();
        screen.blit(template.view(), 50, 30).unwrap();

        let registry = Arc::new(TemplateRegistry::new());
        registry
            .register("icon", path, "toolbar", 0.9, ["ui"])
            .unwrap();
        let locator = TemplateLocator::new(registry, Arc::new(StaticScreen::new(screen)));
        (dir, locator)
    }

    #[test]
    fn finds_template_center_in_screen_coordinates() {
        let (_dir, locator) = setup();
        let out = locator
            .locate(&LocateRequest::new(Target::template("icon")))
            .unwrap();
        let found = out.found().copied().unwrap();
        assert_eq!(found.center, Point::new(56, 36));
        assert!(found.confidence > 0.99);
    }

    #[test]
    fn region_offset_is_applied() {
        let (_dir, locator) = setup();
        let req = LocateRequest::new(Target::template_in("icon", "toolbar"))
            .in_region(SearchRegion::Rect(Rect::new(40, 20, 40, 40)));
        let found = locator.locate(&req).unwrap();
        assert_eq!(found.found().map(|f| f.center), Some(Point::new(56, 36)));
    }

    #[test]
    fn region_without_the_template_is_not_found() {
        let (_dir, locator) = setup();
        let req = LocateRequest::new(Target::template("icon"))
            .in_region(SearchRegion::Rect(Rect::new(0, 0, 40, 30)));
        assert_eq!(locator.locate(&req).unwrap(), LocateOutcome::NotFound);
    }

    #[test]
    fn unknown_template_is_recoverable() {
        let (_dir, locator) = setup();
        let err = locator
            .locate(&LocateRequest::new(Target::template("missing")))
            .unwrap_err();
        assert!(matches!(err, LocateError::TemplateNotFound { .. }));
        assert!(err.is_recoverable());
    }
}
