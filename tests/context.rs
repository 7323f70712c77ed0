//! End-to-end: registry, strategies, composite and waits behind a `Context`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uilocator::image::io::save_image;
use uilocator::platform::{
    Frame, LazyBackend, ScreenCapture, StaticScreen, StaticWindows, TextBox, TextPattern,
    TextRecognizer, WindowInfo, WindowSelector,
};
use uilocator::{
    Clock, Context, Defaults, ImageView, LocateError, LocateRequest, LocateResult, ManualClock,
    OwnedImage, Point, Rect, SearchRegion, StrategyKind, Target, WaitSpec, WaitState,
};

fn icon() -> OwnedImage {
    let mut data = Vec::with_capacity(10 * 10 * 3);
    for y in 0..10usize {
        for x in 0..10usize {
            let v = (((x * 53) ^ (y * 29) ^ (x * y * 7)) & 0xFF) as u8;
            data.extend_from_slice(&[v, 255 - v, v / 2]);
        }
    }
    OwnedImage::with_channels(data, 10, 10, 3).unwrap()
}

fn desktop_with_icon_at(x: usize, y: usize) -> OwnedImage {
    let mut screen = OwnedImage::filled(120, 80, &[240, 240, 240]).unwrap();
    screen.blit(icon().view(), x, y).unwrap();
    screen
}

fn blank_desktop() -> OwnedImage {
    OwnedImage::filled(120, 80, &[240, 240, 240]).unwrap()
}

/// Shows `after` once the virtual clock reaches `switch_at`.
struct TimedScreen {
    clock: ManualClock,
    switch_at: Duration,
    before: StaticScreen,
    after: StaticScreen,
}

impl TimedScreen {
    fn current(&self) -> &StaticScreen {
        if self.clock.now() >= self.switch_at {
            &self.after
        } else {
            &self.before
        }
    }
}

impl ScreenCapture for TimedScreen {
    fn capture(&self, region: Option<Rect>) -> LocateResult<Frame> {
        self.current().capture(region)
    }

    fn screen_bounds(&self) -> LocateResult<Rect> {
        self.current().screen_bounds()
    }
}

fn registry_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let toolbar = dir.path().join("toolbar");
    std::fs::create_dir(&toolbar).unwrap();
    save_image(&icon(), toolbar.join("gear.png")).unwrap();
    dir
}

fn timed_context(
    clock: &ManualClock,
    switch_at: Duration,
    before: OwnedImage,
    after: OwnedImage,
    dir: &tempfile::TempDir,
) -> Context<ManualClock> {
    let screen = TimedScreen {
        clock: clock.clone(),
        switch_at,
        before: StaticScreen::new(before),
        after: StaticScreen::new(after),
    };
    let context = Context::builder(Arc::new(screen))
        .build_with_clock(clock.clone())
        .unwrap();
    assert_eq!(context.registry().scan(dir.path()).registered, 1);
    context
}

fn spec() -> WaitSpec {
    WaitSpec::from_secs(3.0, 0.5).unwrap()
}

#[test]
fn wait_for_sees_element_appear() {
    let dir = registry_dir();
    let clock = ManualClock::new();
    let context = timed_context(
        &clock,
        Duration::from_millis(1200),
        blank_desktop(),
        desktop_with_icon_at(70, 40),
        &dir,
    );

    let report = context
        .wait_for(&LocateRequest::new(Target::template("gear")), Some(&spec()))
        .unwrap();
    assert_eq!(report.state, WaitState::Succeeded);
    assert_eq!(report.attempt_count(), 4);
    let found = report.value.unwrap();
    assert_eq!(found.center, Point::new(75, 45));
    assert_eq!(found.strategy, StrategyKind::ImageTemplate);
}

#[test]
fn wait_for_times_out_when_element_never_shows() {
    let dir = registry_dir();
    let clock = ManualClock::new();
    let context = timed_context(
        &clock,
        Duration::MAX,
        blank_desktop(),
        blank_desktop(),
        &dir,
    );
    let report = context
        .wait_for(&LocateRequest::new(Target::template("gear")), Some(&spec()))
        .unwrap();
    assert_eq!(report.state, WaitState::TimedOut);
    assert_eq!(report.attempt_count(), 7);
}

#[test]
fn unknown_template_is_polled_not_raised() {
    let dir = registry_dir();
    let clock = ManualClock::new();
    let context = timed_context(&clock, Duration::MAX, blank_desktop(), blank_desktop(), &dir);
    let report = context
        .wait_for(&LocateRequest::new(Target::template("nope")), Some(&spec()))
        .unwrap();
    assert_eq!(report.state, WaitState::TimedOut);
}

#[test]
fn wait_until_gone_and_wait_stable() {
    let dir = registry_dir();
    let clock = ManualClock::new();
    let context = timed_context(
        &clock,
        Duration::from_millis(900),
        desktop_with_icon_at(5, 5),
        blank_desktop(),
        &dir,
    );
    let request = LocateRequest::new(Target::template("gear"));
    let gone = context.wait_until_gone(&request, Some(&spec())).unwrap();
    assert_eq!(gone.state, WaitState::Succeeded);
    assert_eq!(gone.attempts.last().copied(), Some(Duration::from_millis(1000)));

    let clock = ManualClock::new();
    let context = timed_context(
        &clock,
        Duration::from_millis(400),
        desktop_with_icon_at(5, 5),
        desktop_with_icon_at(60, 30),
        &dir,
    );
    let stable = context
        .wait_stable(&request, Some(&spec()), Duration::from_millis(1000), 2)
        .unwrap();
    assert_eq!(stable.state, WaitState::Succeeded);
    assert_eq!(stable.value.map(|f| f.center), Some(Point::new(65, 35)));
    assert_eq!(stable.attempts.last().copied(), Some(Duration::from_millis(1500)));
}

#[test]
fn dpi_scale_applies_to_explicit_regions() {
    let dir = registry_dir();
    let screen = Arc::new(StaticScreen::new(desktop_with_icon_at(70, 40)));
    let context = Context::builder(screen)
        .defaults(Defaults {
            dpi_scale: 2.0,
            ..Defaults::default()
        })
        .build()
        .unwrap();
    context.registry().scan(dir.path());

    // Logical region (30, 15, 30, 25) covers physical (60, 30, 60, 50).
    let request = LocateRequest::new(Target::template_in("gear", "toolbar"))
        .in_region(SearchRegion::Rect(Rect::new(30, 15, 30, 25)));
    let report = context.locate(&request).unwrap();
    assert_eq!(report.found().map(|f| f.center), Some(Point::new(75, 45)));

    let candidates = context.find_all(&request).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].top_left, Point::new(70, 40));
}

/// Recognizes a single fixed word.
struct OneWord;

impl TextRecognizer for OneWord {
    fn recognize(
        &self,
        _image: ImageView<'_, u8>,
        _pattern: &TextPattern,
    ) -> LocateResult<Vec<TextBox>> {
        Ok(vec![TextBox {
            text: "Submit".into(),
            bbox: Rect::new(20, 20, 30, 10),
            confidence: 0.93,
        }])
    }
}

#[test]
fn text_strategy_uses_lazy_backend_once() {
    let starts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&starts);
    let backend = LazyBackend::new("ocr", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(OneWord)
    });
    let screen = Arc::new(StaticScreen::new(blank_desktop()));
    let context = Context::builder(screen)
        .recognizer(Arc::new(backend))
        .build()
        .unwrap();

    let request = LocateRequest::new(Target::text(TextPattern::substring("submit")));
    for _ in 0..3 {
        let report = context.locate(&request).unwrap();
        let found = report.found().copied().unwrap();
        assert_eq!(found.center, Point::new(35, 25));
        assert_eq!(found.strategy, StrategyKind::TextRecognition);
    }
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[test]
fn unavailable_backend_is_treated_as_absent() {
    let backend: LazyBackend<OneWord> = LazyBackend::new("ocr", || {
        Err(LocateError::TextRecognition("engine not installed".into()))
    });
    let screen = Arc::new(StaticScreen::new(blank_desktop()));
    let context = Context::builder(screen)
        .recognizer(Arc::new(backend))
        .build()
        .unwrap();
    let request = LocateRequest::new(Target::text(TextPattern::exact("Submit")));
    let report = context.locate(&request).unwrap();
    assert!(report.found().is_none());
}

#[test]
fn wait_for_window_and_retry() {
    let windows = Arc::new(StaticWindows::new(vec![WindowInfo::new(
        42,
        "Settings",
        Rect::new(0, 0, 50, 50),
    )
    .with_class("gnome-control-center.Gnome-control-center")]));
    let screen = Arc::new(StaticScreen::new(blank_desktop()));
    let context = Context::builder(screen)
        .windows(windows)
        .build_with_clock(ManualClock::new())
        .unwrap();

    let report = context
        .wait_for_window(&TextPattern::exact("Settings").into(), Some(&spec()))
        .unwrap();
    assert_eq!(report.value.map(|w| w.handle), Some(42));

    let by_class = context
        .wait_for_window(
            &WindowSelector::class("gnome-control-center.gnome-control-center"),
            Some(&spec()),
        )
        .unwrap();
    assert_eq!(by_class.attempt_count(), 1);
    assert_eq!(by_class.value.map(|w| w.handle), Some(42));

    let missing = context
        .wait_for_window(&TextPattern::exact("About").into(), Some(&spec()))
        .unwrap();
    assert_eq!(missing.state, WaitState::TimedOut);

    let mut calls = 0;
    let value = context
        .retry(2, Duration::from_millis(250), |_| {
            calls += 1;
            if calls < 3 {
                Err(LocateError::WindowNotFound("Settings".into()))
            } else {
                Ok("clicked")
            }
        })
        .unwrap();
    assert_eq!(value, "clicked");
    assert_eq!(context.executor().clock().now(), Duration::from_millis(3500));
}

#[test]
fn wait_for_pixel_sees_color_change() {
    let dir = registry_dir();
    let clock = ManualClock::new();
    let context = timed_context(
        &clock,
        Duration::from_millis(1200),
        blank_desktop(),
        desktop_with_icon_at(70, 40),
        &dir,
    );

    // The icon's top-left pixel is pure green.
    let report = context
        .wait_for_pixel(Point::new(70, 40), [4, 250, 0], 5, Some(&spec()))
        .unwrap();
    assert_eq!(report.state, WaitState::Succeeded);
    assert_eq!(report.value, Some([0, 255, 0]));
    assert_eq!(report.attempt_count(), 4);
    assert_eq!(report.attempts[3], Duration::from_millis(1500));

    let strict = context
        .wait_for_pixel(Point::new(70, 40), [4, 250, 0], 4, Some(&spec()))
        .unwrap();
    assert_eq!(strict.state, WaitState::TimedOut);
}

#[test]
fn wait_for_pixel_off_screen_fails_fast() {
    let screen = Arc::new(StaticScreen::new(blank_desktop()));
    let context = Context::builder(screen.clone())
        .build_with_clock(ManualClock::new())
        .unwrap();
    let err = context
        .wait_for_pixel(Point::new(120, 10), [240, 240, 240], 0, Some(&spec()))
        .unwrap_err();
    assert_eq!(err, LocateError::OutOfBounds { x: 120, y: 10 });
    assert_eq!(screen.capture_count(), 0);
    assert_eq!(context.executor().clock().now(), Duration::ZERO);
}

#[test]
fn zero_max_candidates_is_rejected() {
    let screen = Arc::new(StaticScreen::new(blank_desktop()));
    let result = Context::builder(screen)
        .defaults(Defaults {
            max_candidates: 0,
            ..Defaults::default()
        })
        .build();
    assert!(matches!(result, Err(LocateError::Configuration(_))));
}

#[test]
fn invalid_defaults_are_rejected() {
    let screen = Arc::new(StaticScreen::new(blank_desktop()));
    let result = Context::builder(screen)
        .defaults(Defaults {
            wait: WaitSpec::new(Duration::from_millis(100), Duration::from_secs(1)),
            ..Defaults::default()
        })
        .build();
    assert!(matches!(result, Err(LocateError::Configuration(_))));
}
