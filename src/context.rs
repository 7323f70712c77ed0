//! The explicitly constructed context that callers pass down.
//!
//! A [`Context`] owns the template registry, the caller-supplied defaults and
//! the composite locator built over the installed collaborators. Build one at
//! process start and share it by reference.

use crate::candidate::MatchCandidate;
use crate::locate::{
    CompositeLocator, CompositeReport, CoordinateLocator, Found, LocateRequest, StrategyKind,
    TemplateLocator, TextLocator, WindowLocator,
};
use crate::platform::{
    ScreenCapture, TextRecognizer, WindowEnumerator, WindowInfo, WindowSelector,
};
use crate::registry::{TemplateRegistry, DEFAULT_CONFIDENCE};
use crate::search::{MatchConfig, Matcher};
use crate::util::{LocateError, LocateResult, Point, Rect};
use crate::wait::{Clock, SystemClock, WaitExecutor, WaitReport, WaitSpec};
use std::sync::Arc;
use std::time::Duration;

/// Values supplied by the host's configuration. Nothing here is persisted.
#[derive(Clone, Debug)]
pub struct Defaults {
    /// Confidence given to templates registered without one.
    pub confidence: f32,
    /// Match in grayscale.
    pub grayscale: bool,
    /// Candidates kept per match call.
    pub max_candidates: usize,
    /// Factor applied to explicit search rectangles.
    pub dpi_scale: f32,
    pub wait: WaitSpec,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            grayscale: true,
            max_candidates: 5,
            dpi_scale: 1.0,
            wait: WaitSpec::default(),
        }
    }
}

impl Defaults {
    pub fn validate(&self) -> LocateResult<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(LocateError::Configuration(format!(
                "default confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.max_candidates == 0 {
            return Err(LocateError::Configuration(
                "max_candidates must be at least 1".into(),
            ));
        }
        if !self.dpi_scale.is_finite() || self.dpi_scale <= 0.0 {
            return Err(LocateError::Configuration(format!(
                "dpi scale {} must be positive",
                self.dpi_scale
            )));
        }
        self.wait.validate()
    }
}

/// Collects collaborators for a [`Context`].
pub struct ContextBuilder {
    screen: Arc<dyn ScreenCapture>,
    registry: Option<Arc<TemplateRegistry>>,
    windows: Option<Arc<dyn WindowEnumerator>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    defaults: Defaults,
    match_config: Option<MatchConfig>,
}

impl ContextBuilder {
    /// Shares an existing registry instead of creating one from the defaults.
    pub fn registry(mut self, registry: Arc<TemplateRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn windows(mut self, windows: Arc<dyn WindowEnumerator>) -> Self {
        self.windows = Some(windows);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Overrides the matcher settings; `grayscale` still follows the defaults.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = Some(config);
        self
    }

    pub fn build(self) -> LocateResult<Context<SystemClock>> {
        self.build_with_clock(SystemClock::default())
    }

    pub fn build_with_clock<C: Clock>(self, clock: C) -> LocateResult<Context<C>> {
        self.defaults.validate()?;
        let registry = self.registry.unwrap_or_else(|| {
            Arc::new(TemplateRegistry::with_default_confidence(self.defaults.confidence))
        });
        let match_config = MatchConfig {
            grayscale: self.defaults.grayscale,
            ..self.match_config.unwrap_or_default()
        };

        let mut templates = TemplateLocator::new(Arc::clone(&registry), Arc::clone(&self.screen))
            .with_matcher(Matcher::new().with_config(match_config))
            .with_max_candidates(self.defaults.max_candidates);
        let mut composite = CompositeLocator::new()
            .with_strategy(Arc::new(CoordinateLocator::new(Arc::clone(&self.screen))));
        if let Some(windows) = &self.windows {
            templates = templates.with_windows(Arc::clone(windows));
            composite = composite.with_strategy(Arc::new(WindowLocator::new(Arc::clone(windows))));
        }
        if let Some(recognizer) = self.recognizer {
            let mut text = TextLocator::new(recognizer, Arc::clone(&self.screen));
            if let Some(windows) = &self.windows {
                text = text.with_windows(Arc::clone(windows));
            }
            composite = composite.with_strategy(Arc::new(text));
        }
        let templates = Arc::new(templates);
        composite = composite.with_strategy(templates.clone());

        Ok(Context {
            screen: self.screen,
            registry,
            defaults: self.defaults,
            windows: self.windows,
            templates,
            composite,
            executor: WaitExecutor::with_clock(clock),
        })
    }
}

/// Registry, defaults and locators for one automation process.
pub struct Context<C = SystemClock> {
    screen: Arc<dyn ScreenCapture>,
    registry: Arc<TemplateRegistry>,
    defaults: Defaults,
    windows: Option<Arc<dyn WindowEnumerator>>,
    templates: Arc<TemplateLocator>,
    composite: CompositeLocator,
    executor: WaitExecutor<C>,
}

impl Context<SystemClock> {
    pub fn builder(screen: Arc<dyn ScreenCapture>) -> ContextBuilder {
        ContextBuilder {
            screen,
            registry: None,
            windows: None,
            recognizer: None,
            defaults: Defaults::default(),
            match_config: None,
        }
    }
}

impl<C: Clock> Context<C> {
    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn composite(&self) -> &CompositeLocator {
        &self.composite
    }

    pub fn executor(&self) -> &WaitExecutor<C> {
        &self.executor
    }

    /// Locates with the default strategy order.
    pub fn locate(&self, request: &LocateRequest) -> LocateResult<CompositeReport> {
        self.locate_with(request, &StrategyKind::DEFAULT_ORDER)
    }

    pub fn locate_with(
        &self,
        request: &LocateRequest,
        order: &[StrategyKind],
    ) -> LocateResult<CompositeReport> {
        self.composite.locate(&self.normalize(request), order)
    }

    /// Every accepted template candidate in screen coordinates.
    pub fn find_all(&self, request: &LocateRequest) -> LocateResult<Vec<MatchCandidate>> {
        let request = self.normalize(request);
        request.validate()?;
        self.templates.find_all(&request)
    }

    /// Polls until the element is found. `None` uses the default spec.
    pub fn wait_for(
        &self,
        request: &LocateRequest,
        spec: Option<&WaitSpec>,
    ) -> LocateResult<WaitReport<Found>> {
        let request = self.normalize(request);
        request.validate()?;
        let spec = spec.unwrap_or(&self.defaults.wait);
        self.executor.run(spec, || {
            Ok(self
                .composite
                .locate_default(&request)?
                .found()
                .copied())
        })
    }

    /// Polls until the element can no longer be found.
    pub fn wait_until_gone(
        &self,
        request: &LocateRequest,
        spec: Option<&WaitSpec>,
    ) -> LocateResult<WaitReport<()>> {
        let request = self.normalize(request);
        request.validate()?;
        let spec = spec.unwrap_or(&self.defaults.wait);
        self.executor.run(spec, || {
            let report = self.composite.locate_default(&request)?;
            Ok((!report.outcome.is_found()).then_some(()))
        })
    }

    /// Polls until the element has been found continuously for `stable_for`
    /// without moving more than `tolerance` pixels on either axis.
    pub fn wait_stable(
        &self,
        request: &LocateRequest,
        spec: Option<&WaitSpec>,
        stable_for: Duration,
        tolerance: u32,
    ) -> LocateResult<WaitReport<Found>> {
        let request = self.normalize(request);
        request.validate()?;
        let spec = spec.unwrap_or(&self.defaults.wait);
        let mut anchor: Option<(Duration, Point)> = None;
        self.executor.run(spec, || {
            let now = self.executor.clock().now();
            let Some(found) = self.composite.locate_default(&request)?.found().copied() else {
                anchor = None;
                return Ok(None);
            };
            match anchor {
                Some((since, at)) if at.chebyshev(found.center) <= tolerance => {
                    Ok((now.saturating_sub(since) >= stable_for).then_some(found))
                }
                _ => {
                    anchor = Some((now, found.center));
                    Ok(stable_for.is_zero().then_some(found))
                }
            }
        })
    }

    /// Polls until a visible window matching `selector` appears.
    pub fn wait_for_window(
        &self,
        selector: &WindowSelector,
        spec: Option<&WaitSpec>,
    ) -> LocateResult<WaitReport<WindowInfo>> {
        let windows = self.windows.as_ref().ok_or_else(|| {
            LocateError::Configuration("no window enumerator installed".into())
        })?;
        let spec = spec.unwrap_or(&self.defaults.wait);
        self.executor.run(spec, || {
            Ok(windows
                .find_windows(selector)?
                .into_iter()
                .find(|w| w.state.is_visible()))
        })
    }

    /// Polls the pixel at `point` until each of its RGB channels is within
    /// `tolerance` of `rgb`, returning the observed color.
    ///
    /// Gray captures are compared as equal channels. A point off the screen
    /// fails before polling starts.
    pub fn wait_for_pixel(
        &self,
        point: Point,
        rgb: [u8; 3],
        tolerance: u8,
        spec: Option<&WaitSpec>,
    ) -> LocateResult<WaitReport<[u8; 3]>> {
        if !self.screen.screen_bounds()?.contains(point) {
            return Err(LocateError::OutOfBounds {
                x: point.x,
                y: point.y,
            });
        }
        let spec = spec.unwrap_or(&self.defaults.wait);
        let sample = Rect::new(point.x, point.y, 1, 1);
        self.executor.run(spec, || {
            let frame = self.screen.capture(Some(sample))?;
            let view = frame.image.view();
            let observed = match view.pixel(0, 0) {
                Some(&[gray]) => [gray; 3],
                Some(&[r, g, b, ..]) => [r, g, b],
                _ => {
                    return Err(LocateError::Capture(format!(
                        "no color sample at ({}, {})",
                        point.x, point.y
                    )))
                }
            };
            let close = observed
                .iter()
                .zip(rgb.iter())
                .all(|(&have, &want)| have.abs_diff(want) <= tolerance);
            Ok(close.then_some(observed))
        })
    }

    /// Re-runs `action` on recoverable errors.
    pub fn retry<T, F>(&self, max_retries: u32, interval: Duration, action: F) -> LocateResult<T>
    where
        F: FnMut(u32) -> LocateResult<T>,
    {
        self.executor.retry(max_retries, interval, action)
    }

    fn normalize(&self, request: &LocateRequest) -> LocateRequest {
        if self.defaults.dpi_scale == 1.0 {
            request.clone()
        } else {
            request.scaled(self.defaults.dpi_scale)
        }
    }
}
