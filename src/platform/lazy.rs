//! Lazily initialized, releasable backends.

use super::text::{TextBox, TextPattern, TextRecognizer};
use crate::image::ImageView;
use crate::util::{LocateError, LocateResult};
use parking_lot::Mutex;
use std::sync::Arc;

enum Slot<T> {
    Empty,
    Ready(Arc<T>),
    Failed(String),
}

type Init<T> = Box<dyn Fn() -> LocateResult<T> + Send + Sync>;

/// Holds a backend that is created on first use.
///
/// Initialization runs at most once per acquisition cycle. A failure is
/// remembered and reported as [`LocateError::BackendUnavailable`] on every
/// later call until [`LazyBackend::release`] resets the slot. Dropping the
/// holder releases the backend once all outstanding handles are gone.
pub struct LazyBackend<T> {
    name: String,
    init: Init<T>,
    slot: Mutex<Slot<T>>,
}

impl<T> LazyBackend<T> {
    pub fn new<F>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> LocateResult<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            init: Box::new(init),
            slot: Mutex::new(Slot::Empty),
        }
    }

    /// Returns the backend, initializing it if needed.
    pub fn acquire(&self) -> LocateResult<Arc<T>> {
        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Ready(backend) => return Ok(Arc::clone(backend)),
            Slot::Failed(reason) => {
                return Err(LocateError::BackendUnavailable(format!(
                    "{}: {reason}",
                    self.name
                )))
            }
            Slot::Empty => {}
        }
        match (self.init)() {
            Ok(backend) => {
                let backend = Arc::new(backend);
                *slot = Slot::Ready(Arc::clone(&backend));
                Ok(backend)
            }
            Err(err) => {
                let reason = err.to_string();
                crate::trace::trace_warn!(
                    "backend initialization failed",
                    backend = self.name.as_str(),
                    reason = reason.as_str()
                );
                *slot = Slot::Failed(reason.clone());
                Err(LocateError::BackendUnavailable(format!(
                    "{}: {reason}",
                    self.name
                )))
            }
        }
    }

    /// Drops the held backend (or the remembered failure).
    pub fn release(&self) {
        *self.slot.lock() = Slot::Empty;
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.slot.lock(), Slot::Ready(_))
    }
}

impl<R: TextRecognizer> TextRecognizer for LazyBackend<R> {
    fn recognize(
        &self,
        image: ImageView<'_, u8>,
        pattern: &TextPattern,
    ) -> LocateResult<Vec<TextBox>> {
        self.acquire()?.recognize(image, pattern)
    }
}
