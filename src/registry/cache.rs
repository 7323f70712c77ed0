//! Decoded-image cache keyed by file path and modification time.
//!
//! Entries are immutable `Arc<OwnedImage>` values swapped in whole under a
//! write lock, so a concurrent reader sees either the previous image or the
//! new one, never a partially decoded buffer. Decoding happens outside the
//! lock; when two threads decode the same `(path, mtime)` the first insert
//! wins and the second thread adopts it.

use crate::image::OwnedImage;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

struct CachedImage {
    modified: SystemTime,
    image: Arc<OwnedImage>,
}

/// Hit, miss, and reload counters since creation or the last clear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that decoded a file with no cached entry.
    pub misses: u64,
    /// Lookups that replaced an entry because the file changed.
    pub reloads: u64,
    /// Decoded images currently held.
    pub entries: usize,
}

#[derive(Default)]
pub(crate) struct ImageCache {
    entries: RwLock<HashMap<PathBuf, CachedImage>>,
    hits: AtomicU64,
    misses: AtomicU64,
    reloads: AtomicU64,
}

/// Outcome of a cache probe.
pub(crate) enum Probe {
    Fresh(Arc<OwnedImage>),
    Stale,
    Missing,
}

impl ImageCache {
    pub(crate) fn probe(&self, path: &Path, modified: SystemTime) -> Probe {
        let entries = self.entries.read();
        match entries.get(path) {
            Some(entry) if entry.modified == modified => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Probe::Fresh(Arc::clone(&entry.image))
            }
            Some(_) => Probe::Stale,
            None => Probe::Missing,
        }
    }

    /// Stores a freshly decoded image and returns the image callers should use.
    pub(crate) fn store(
        &self,
        path: &Path,
        modified: SystemTime,
        image: OwnedImage,
        probe: &Probe,
    ) -> Arc<OwnedImage> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(path) {
            if existing.modified == modified {
                return Arc::clone(&existing.image);
            }
        }
        match probe {
            Probe::Stale => self.reloads.fetch_add(1, Ordering::Relaxed),
            _ => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        let image = Arc::new(image);
        entries.insert(
            path.to_path_buf(),
            CachedImage {
                modified,
                image: Arc::clone(&image),
            },
        );
        image
    }

    pub(crate) fn remove(&self, path: &Path) {
        self.entries.write().remove(path);
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.reloads.store(0, Ordering::Relaxed);
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
            entries: self.entries.read().len(),
        }
    }
}
