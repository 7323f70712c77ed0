//! Template registry: catalog of named reference images plus a decode cache.
//!
//! The catalog maps `(group, name)` to a [`Template`] entry and lives for the
//! process lifetime. Decoded pixels are loaded on first use and re-decoded
//! whenever the source file's modification time changes; see [`cache`] for the
//! consistency rules under concurrent readers.

mod cache;
mod template;

pub use cache::CacheStats;
pub use template::{has_supported_extension, Template, DEFAULT_CONFIDENCE, SUPPORTED_EXTENSIONS};

use crate::image::io::{load_rgb_image, probe_dimensions};
use crate::image::OwnedImage;
use crate::trace::{trace_debug, trace_event, trace_span, trace_warn};
use crate::util::{LocateError, LocateResult, Size};
use cache::{ImageCache, Probe};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

type Key = (String, String);

/// A file skipped during a directory scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a directory scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Templates newly added to the catalog.
    pub registered: usize,
    /// Files that were skipped, with the reason.
    pub warnings: Vec<ScanWarning>,
}

/// Result of checking every catalog entry against the file system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// `(group, name)` of entries whose file exists with a supported extension.
    pub valid: Vec<(String, String)>,
    /// Entries whose file no longer exists.
    pub missing: Vec<(String, String)>,
    /// Entries whose file has an unsupported extension.
    pub invalid: Vec<(String, String)>,
}

/// Catalog totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub templates: usize,
    pub groups: BTreeMap<String, usize>,
    pub extensions: BTreeMap<String, usize>,
    pub cache: CacheStats,
}

/// Catalog of templates with a lazily populated decode cache.
///
/// Shareable across threads behind an `Arc`; all methods take `&self`.
pub struct TemplateRegistry {
    catalog: RwLock<BTreeMap<Key, Template>>,
    cache: ImageCache,
    default_confidence: f32,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Creates an empty registry using [`DEFAULT_CONFIDENCE`] for scanned files.
    pub fn new() -> Self {
        Self::with_default_confidence(DEFAULT_CONFIDENCE)
    }

    /// Creates an empty registry with a custom confidence for scanned files.
    pub fn with_default_confidence(default_confidence: f32) -> Self {
        Self {
            catalog: RwLock::new(BTreeMap::new()),
            cache: ImageCache::default(),
            default_confidence,
        }
    }

    /// Registers a template; no image is decoded yet.
    pub fn register<I, S>(
        &self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        group: impl Into<String>,
        confidence: f32,
        tags: I,
    ) -> LocateResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let template = Template::new(name, path, group)
            .with_confidence(confidence)
            .with_tags(tags);
        self.insert(template)
    }

    /// Registers a fully built catalog entry.
    pub fn insert(&self, mut template: Template) -> LocateResult<()> {
        if template.name.is_empty() || template.group.is_empty() {
            return Err(LocateError::Configuration(
                "template name and group must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&template.confidence) {
            return Err(LocateError::Configuration(format!(
                "template '{}' confidence {} outside [0, 1]",
                template.name, template.confidence
            )));
        }
        if template.size.is_none() {
            template.size = probe_dimensions(&template.path)
                .ok()
                .map(|(w, h)| Size::new(w, h));
        }

        let key = (template.group.clone(), template.name.clone());
        let mut catalog = self.catalog.write();
        if catalog.contains_key(&key) {
            return Err(LocateError::DuplicateTemplate {
                group: key.0,
                name: key.1,
            });
        }
        trace_debug!(
            "template registered",
            group = key.0.as_str(),
            template = key.1.as_str()
        );
        catalog.insert(key, template);
        Ok(())
    }

    /// Removes a catalog entry and any cached pixels for it.
    pub fn unregister(&self, name: &str, group: Option<&str>) -> LocateResult<Template> {
        let key = self.resolve_key(name, group)?;
        let removed = self
            .catalog
            .write()
            .remove(&key)
            .ok_or_else(|| not_found(name, group))?;
        self.cache.remove(&removed.path);
        Ok(removed)
    }

    /// Walks `directory` and registers every image file found.
    ///
    /// The group is the name of the file's immediate parent directory and the
    /// name is the file stem. Unreadable entries, files without a supported
    /// image extension, files whose header cannot be decoded, and names that
    /// are already registered are skipped and reported as warnings.
    pub fn scan(&self, directory: impl AsRef<Path>) -> ScanReport {
        let directory = directory.as_ref();
        let _span = trace_span!("registry_scan").entered();
        let mut report = ScanReport::default();

        for entry in WalkDir::new(directory).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| directory.to_path_buf());
                    report.warn(path, err.to_string());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !has_supported_extension(path) {
                report.warn(path.to_path_buf(), "not a supported image file".into());
                continue;
            }
            let size = match probe_dimensions(path) {
                Ok((w, h)) => Size::new(w, h),
                Err(err) => {
                    report.warn(path.to_path_buf(), err.to_string());
                    continue;
                }
            };
            let (Some(group), Some(name)) = (parent_name(path), file_stem(path)) else {
                report.warn(path.to_path_buf(), "cannot derive group or name".into());
                continue;
            };

            let mut template = Template::new(name, path, group)
                .with_confidence(self.default_confidence);
            template.size = Some(size);
            match self.insert(template) {
                Ok(()) => report.registered += 1,
                Err(err) => report.warn(path.to_path_buf(), err.to_string()),
            }
        }

        for warning in &report.warnings {
            trace_warn!(
                "scan skipped file",
                path = warning.path.display().to_string().as_str(),
                reason = warning.reason.as_str()
            );
        }
        trace_event!(
            "scan finished",
            registered = report.registered,
            warnings = report.warnings.len()
        );
        report
    }

    /// Resolves a template's file path.
    ///
    /// Without a group, the name must be unique across all groups.
    pub fn get_path(&self, name: &str, group: Option<&str>) -> LocateResult<PathBuf> {
        let key = self.resolve_key(name, group)?;
        let catalog = self.catalog.read();
        catalog
            .get(&key)
            .map(|t| t.path.clone())
            .ok_or_else(|| not_found(name, group))
    }

    /// Returns a copy of the catalog entry.
    pub fn template(&self, name: &str, group: Option<&str>) -> LocateResult<Template> {
        let key = self.resolve_key(name, group)?;
        let catalog = self.catalog.read();
        catalog
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(name, group))
    }

    /// Returns the decoded RGB pixels of a template.
    ///
    /// The first call decodes the file; later calls reuse the cached image
    /// until the file's modification time changes.
    pub fn get_image(&self, name: &str, group: Option<&str>) -> LocateResult<Arc<OwnedImage>> {
        let path = self.get_path(name, group)?;
        let modified = match std::fs::metadata(&path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(not_found(name, group));
            }
            Err(err) => {
                return Err(LocateError::ImageIo {
                    path,
                    reason: err.to_string(),
                })
            }
        };

        let probe = self.cache.probe(&path, modified);
        if let Probe::Fresh(image) = probe {
            return Ok(image);
        }
        if matches!(probe, Probe::Stale) {
            trace_debug!("template changed on disk", template = name);
        }
        let decoded = load_rgb_image(&path)?;
        Ok(self.cache.store(&path, modified, decoded, &probe))
    }

    /// Case-insensitive substring search over names, tags, and descriptions,
    /// sorted by name (then group).
    pub fn search(&self, query: &str, group: Option<&str>) -> Vec<Template> {
        let needle = query.to_lowercase();
        let catalog = self.catalog.read();
        let mut hits: Vec<Template> = catalog
            .values()
            .filter(|t| group.map_or(true, |g| t.group == g))
            .filter(|t| t.matches_lowercase(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.group.cmp(&b.group)));
        hits
    }

    /// Entries carrying `tag` (case-insensitive, exact).
    pub fn by_tag(&self, tag: &str) -> Vec<Template> {
        let tag = tag.to_lowercase();
        let catalog = self.catalog.read();
        catalog
            .values()
            .filter(|t| t.tags.iter().any(|candidate| candidate.to_lowercase() == tag))
            .cloned()
            .collect()
    }

    /// Lists entries, optionally restricted to one group, ordered by group then name.
    pub fn list(&self, group: Option<&str>) -> Vec<Template> {
        let catalog = self.catalog.read();
        catalog
            .values()
            .filter(|t| group.map_or(true, |g| t.group == g))
            .cloned()
            .collect()
    }

    /// Sorted, de-duplicated group names.
    pub fn groups(&self) -> Vec<String> {
        let catalog = self.catalog.read();
        catalog
            .keys()
            .map(|(group, _)| group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.catalog.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all decoded pixels; catalog entries remain.
    pub fn clear_cache(&self) {
        self.cache.clear();
        trace_debug!("template cache cleared");
    }

    /// Checks every entry's file against the file system.
    pub fn validate(&self) -> ValidationReport {
        let catalog = self.catalog.read();
        let mut report = ValidationReport::default();
        for (key, template) in catalog.iter() {
            if !template.path.exists() {
                report.missing.push(key.clone());
            } else if !has_supported_extension(&template.path) {
                report.invalid.push(key.clone());
            } else {
                report.valid.push(key.clone());
            }
        }
        report
    }

    /// Catalog and cache totals.
    pub fn statistics(&self) -> RegistryStats {
        let catalog = self.catalog.read();
        let mut stats = RegistryStats {
            templates: catalog.len(),
            cache: self.cache.stats(),
            ..RegistryStats::default()
        };
        for template in catalog.values() {
            *stats.groups.entry(template.group.clone()).or_default() += 1;
            let ext = template
                .path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            *stats.extensions.entry(ext).or_default() += 1;
        }
        stats
    }

    fn resolve_key(&self, name: &str, group: Option<&str>) -> LocateResult<Key> {
        if let Some(group) = group {
            return Ok((group.to_string(), name.to_string()));
        }
        let catalog = self.catalog.read();
        let groups: Vec<String> = catalog
            .keys()
            .filter(|(_, n)| n == name)
            .map(|(g, _)| g.clone())
            .collect();
        match groups.len() {
            0 => Err(not_found(name, None)),
            1 => Ok((groups[0].clone(), name.to_string())),
            _ => Err(LocateError::AmbiguousTemplate {
                name: name.to_string(),
                groups,
            }),
        }
    }
}

impl ScanReport {
    fn warn(&mut self, path: PathBuf, reason: String) {
        self.warnings.push(ScanWarning { path, reason });
    }
}

fn not_found(name: &str, group: Option<&str>) -> LocateError {
    LocateError::TemplateNotFound {
        name: name.to_string(),
        group: group.map(str::to_string),
    }
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()?
        .to_str()
        .map(str::to_string)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::TemplateRegistry;
    use crate::util::LocateError;

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = TemplateRegistry::new();
        registry
            .register("ok", "/tmp/ok.png", "dialog", 0.8, ["confirm"])
            .unwrap();
        let err = registry
            .register("ok", "/tmp/other.png", "dialog", 0.9, Vec::<String>::new())
            .unwrap_err();
        assert_eq!(
            err,
            LocateError::DuplicateTemplate {
                group: "dialog".into(),
                name: "ok".into()
            }
        );
        registry
            .register("ok", "/tmp/ok.png", "toolbar", 0.8, Vec::<String>::new())
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn ungrouped_lookup_is_ambiguous_across_groups() {
        let registry = TemplateRegistry::new();
        registry
            .register("close", "a/close.png", "a", 0.8, Vec::<String>::new())
            .unwrap();
        registry
            .register("close", "b/close.png", "b", 0.8, Vec::<String>::new())
            .unwrap();
        let err = registry.get_path("close", None).unwrap_err();
        assert_eq!(
            err,
            LocateError::AmbiguousTemplate {
                name: "close".into(),
                groups: vec!["a".into(), "b".into()]
            }
        );
        assert_eq!(
            registry.get_path("close", Some("b")).unwrap(),
            std::path::PathBuf::from("b/close.png")
        );
    }

    #[test]
    fn invalid_confidence_is_a_configuration_error() {
        let registry = TemplateRegistry::new();
        let err = registry
            .register("x", "x.png", "g", 1.5, Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, LocateError::Configuration(_)));
    }

    #[test]
    fn unregister_removes_entry() {
        let registry = TemplateRegistry::new();
        registry
            .register("x", "x.png", "g", 0.8, Vec::<String>::new())
            .unwrap();
        let removed = registry.unregister("x", None).unwrap();
        assert_eq!(removed.group, "g");
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get_path("x", None),
            Err(LocateError::TemplateNotFound { .. })
        ));
    }
}
