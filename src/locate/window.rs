use super::{Found, Locate, LocateOutcome, LocateRequest, StrategyKind, Target};
use crate::platform::WindowEnumerator;
use crate::trace::trace_debug;
use crate::util::{LocateError, LocateResult};
use std::sync::Arc;

/// Resolves a top-level window by title or class to a point on its client
/// area.
///
/// Minimized or hidden windows count as absent; this strategy never restores,
/// activates or moves a window.
pub struct WindowLocator {
    windows: Arc<dyn WindowEnumerator>,
}

impl WindowLocator {
    pub fn new(windows: Arc<dyn WindowEnumerator>) -> Self {
        Self { windows }
    }
}

impl Locate for WindowLocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WindowHandle
    }

    fn locate(&self, request: &LocateRequest) -> LocateResult<LocateOutcome> {
        let Target::Window {
            selector,
            reference,
        } = request.require(self.kind())?
        else {
            return Err(LocateError::InvalidRequest(
                "window strategy needs a window target".into(),
            ));
        };
        let matches = self.windows.find_windows(selector)?;
        let total = matches.len();
        let Some(window) = matches.into_iter().find(|w| w.state.is_visible()) else {
            trace_debug!(
                "no usable window",
                selector = selector.to_string().as_str(),
                matching = total
            );
            return Ok(LocateOutcome::NotFound);
        };
        Ok(LocateOutcome::Found(Found {
            center: reference.resolve(&window.client_rect),
            confidence: 1.0,
            strategy: self.kind(),
        }))
    }
}
