use super::{Found, Locate, LocateOutcome, LocateRequest, StrategyKind, Target};
use crate::platform::{ScreenCapture, TextBox, TextRecognizer, WindowEnumerator};
use crate::trace::trace_debug;
use crate::util::{LocateError, LocateResult};
use std::sync::Arc;

/// Recognized boxes below this confidence are ignored unless the request
/// sets its own threshold.
pub const DEFAULT_MIN_TEXT_CONFIDENCE: f32 = 0.5;

/// Finds on-screen text through a [`TextRecognizer`] backend.
///
/// Returns the center of the most confident box whose text satisfies the
/// pattern; ties keep the box the recognizer listed first.
pub struct TextLocator {
    recognizer: Arc<dyn TextRecognizer>,
    screen: Arc<dyn ScreenCapture>,
    windows: Option<Arc<dyn WindowEnumerator>>,
    min_confidence: f32,
}

impl TextLocator {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, screen: Arc<dyn ScreenCapture>) -> Self {
        Self {
            recognizer,
            screen,
            windows: None,
            min_confidence: DEFAULT_MIN_TEXT_CONFIDENCE,
        }
    }

    /// Enables window search regions.
    pub fn with_windows(mut self, windows: Arc<dyn WindowEnumerator>) -> Self {
        self.windows = Some(windows);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

impl Locate for TextLocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextRecognition
    }

    fn locate(&self, request: &LocateRequest) -> LocateResult<LocateOutcome> {
        let Target::Text(pattern) = request.require(self.kind())? else {
            return Err(LocateError::InvalidRequest(
                "text strategy needs a text target".into(),
            ));
        };
        let threshold = request.min_confidence().unwrap_or(self.min_confidence);
        let region = request.region().resolve(self.windows.as_deref())?;
        let frame = self.screen.capture(region)?;
        let boxes = self.recognizer.recognize(frame.image.view(), pattern)?;
        let recognized = boxes.len();

        let best = boxes
            .into_iter()
            .filter(|b| b.confidence >= threshold && pattern.matches(&b.text))
            .fold(None, |best: Option<TextBox>, b| match best {
                Some(current) if current.confidence >= b.confidence => Some(current),
                _ => Some(b),
            });
        trace_debug!(
            "text recognized",
            pattern = pattern.text.as_str(),
            boxes = recognized,
            matched = best.is_some()
        );
        Ok(match best {
            Some(b) => LocateOutcome::Found(Found {
                center: b
                    .bbox
                    .center()
                    .offset(frame.origin.x, frame.origin.y),
                confidence: b.confidence,
                strategy: self.kind(),
            }),
            None => LocateOutcome::NotFound,
        })
    }
}
