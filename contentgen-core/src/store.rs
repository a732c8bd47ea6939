//! YAML-backed prompt template store with runtime CRUD.
//!
//! The backing file maps each format name to a `system`/`user` pair:
//!
//! ```yaml
//! telegram:
//!   system: You are an editor of a Telegram channel.
//!   user: "Write a post about: {input_text}"
//! ```
//!
//! Reads are served from an in-memory cache filled on first use. A cache
//! miss reads the file while holding the cache write lock. Every write
//! rewrites the whole file (temp file + rename) and only then replaces the
//! cache, so no reader can pin a set older than the last successful write.
//! Writers inside one process are serialized by a mutex; separate processes
//! writing the same file are not coordinated and the last full write wins.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, error, info};

use crate::error::{GenerationError, Result};

/// Default templates for the built-in formats, shipped with the crate.
pub const DEFAULT_TEMPLATES: &str = include_str!("../prompts/default.yaml");

/// System instruction plus user instruction template for one format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// System instruction, sent verbatim.
    pub system: String,
    /// User instruction with `{input_text}` and optional extra placeholders.
    pub user: String,
}

impl PromptTemplate {
    /// Create a template from its two parts.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Templates keyed by format name, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    entries: Vec<(String, PromptTemplate)>,
}

impl TemplateSet {
    /// Parse the YAML document format. An empty document is an empty set.
    ///
    /// # Errors
    /// Returns [`GenerationError::Configuration`] if the document is not a
    /// mapping of names to `system`/`user` pairs.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(text)
            .map_err(|e| GenerationError::Configuration(format!("invalid template YAML: {e}")))?;

        let mapping = match doc {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(GenerationError::Configuration(
                    "template YAML must be a mapping of format names".into(),
                ));
            }
        };

        let mut set = Self::default();
        for (key, value) in mapping {
            let name = key
                .as_str()
                .ok_or_else(|| GenerationError::Configuration(format!("format name must be a string, got {key:?}")))?
                .to_string();
            let template: PromptTemplate = serde_yaml::from_value(value)
                .map_err(|e| GenerationError::Configuration(format!("invalid template for format '{name}': {e}")))?;
            set.insert(name, template);
        }
        Ok(set)
    }

    /// Render the set back to YAML, keeping document order.
    ///
    /// # Errors
    /// Returns [`GenerationError::Configuration`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        let mut mapping = Mapping::new();
        for (name, template) in &self.entries {
            let value = serde_yaml::to_value(template)
                .map_err(|e| GenerationError::Configuration(e.to_string()))?;
            mapping.insert(Value::String(name.clone()), value);
        }
        serde_yaml::to_string(&mapping).map_err(|e| GenerationError::Configuration(e.to_string()))
    }

    /// Look up a template by format name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Whether a template exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, template: PromptTemplate) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = template,
            None => self.entries.push((name, template)),
        }
    }

    /// Remove a template, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<PromptTemplate> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Format names in document order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Iterate `(name, template)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PromptTemplate)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// File-backed template store shared by every caller in the process.
#[derive(Debug)]
pub struct TemplateStore {
    path: PathBuf,
    cache: RwLock<Option<Arc<TemplateSet>>>,
    write_lock: Mutex<()>,
}

impl TemplateStore {
    /// Create a store over `path`. Nothing is read until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached set, reading the file on first use or after a write.
    ///
    /// # Errors
    /// Returns [`GenerationError::Configuration`] if the file is missing or
    /// malformed.
    pub fn load(&self) -> Result<Arc<TemplateSet>> {
        if let Some(set) = self.cache.read().as_ref() {
            return Ok(Arc::clone(set));
        }

        let mut cache = self.cache.write();
        if let Some(set) = cache.as_ref() {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(self.read_file()?);
        *cache = Some(Arc::clone(&set));
        info!(path = %self.path.display(), formats = set.len(), "prompt templates loaded");
        Ok(set)
    }

    /// Template for `format_name`.
    ///
    /// # Errors
    /// Returns [`GenerationError::NotFound`] listing the known names when the
    /// format has no template, or a load error.
    pub fn get(&self, format_name: &str) -> Result<PromptTemplate> {
        let set = self.load()?;
        set.get(format_name).cloned().ok_or_else(|| GenerationError::NotFound {
            format_name: format_name.to_string(),
            known: set.names(),
        })
    }

    /// Format names in document order.
    ///
    /// # Errors
    /// Returns a load error.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.load()?.names())
    }

    /// Insert or replace the template for `format_name` and persist.
    ///
    /// # Errors
    /// Returns a load error or a persistence error. After a persistence
    /// error the cache stays dropped and the next read sees the file as it
    /// was before this call.
    pub fn put(&self, format_name: &str, system: &str, user: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut set = (*self.load()?).clone();
        set.insert(format_name, PromptTemplate::new(system, user));
        self.commit(set)?;
        info!(format = format_name, "prompt template saved");
        Ok(())
    }

    /// Remove the template for `format_name` and persist.
    ///
    /// # Errors
    /// Returns [`GenerationError::NotFound`] if the format is absent, or a
    /// load or persistence error.
    pub fn delete(&self, format_name: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut set = (*self.load()?).clone();
        if set.remove(format_name).is_none() {
            return Err(GenerationError::NotFound {
                format_name: format_name.to_string(),
                known: set.names(),
            });
        }
        self.commit(set)?;
        info!(format = format_name, "prompt template deleted");
        Ok(())
    }

    /// Drop the cache so the next read goes to disk.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    /// Write [`DEFAULT_TEMPLATES`] to `path` unless a file is already there.
    ///
    /// Returns `true` when the file was created.
    ///
    /// # Errors
    /// Returns [`GenerationError::Configuration`] if the file cannot be written.
    pub fn write_defaults(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        write_atomic(path, DEFAULT_TEMPLATES.as_bytes())?;
        info!(path = %path.display(), "default prompt templates written");
        Ok(true)
    }

    fn read_file(&self) -> Result<TemplateSet> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            error!(path = %self.path.display(), "cannot read prompt templates: {}", e);
            GenerationError::Configuration(format!(
                "cannot read prompt template file {}: {e}",
                self.path.display()
            ))
        })?;
        TemplateSet::from_yaml(&text).map_err(|e| {
            error!(path = %self.path.display(), "malformed prompt templates: {}", e);
            e
        })
    }

    /// Persist `set`, then publish it as the cached set. On failure the
    /// cache is dropped so the next read goes back to disk.
    fn commit(&self, set: TemplateSet) -> Result<()> {
        if let Err(e) = self.persist(&set) {
            self.invalidate();
            return Err(e);
        }
        *self.cache.write() = Some(Arc::new(set));
        Ok(())
    }

    fn persist(&self, set: &TemplateSet) -> Result<()> {
        let yaml = set.to_yaml()?;
        write_atomic(&self.path, yaml.as_bytes()).map_err(|e| {
            error!(path = %self.path.display(), "failed to persist prompt templates: {}", e);
            e
        })?;
        debug!(path = %self.path.display(), formats = set.len(), "prompt templates persisted");
        Ok(())
    }
}

/// Write to a sibling temp file, sync, then rename over the target.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let io_err = |e: std::io::Error| {
        GenerationError::Configuration(format!("cannot write prompt template file {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GenerationError::Configuration(format!("invalid template path {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let write = || -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    };

    write().map_err(|e| {
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            debug!(path = %temp_path.display(), "temp file not removed: {}", cleanup);
        }
        io_err(e)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    const DEFAULT_NAMES: [&str; 12] = [
        "telegram",
        "email",
        "official_letter",
        "newsletter",
        "blog",
        "press_release",
        "announcement",
        "ad_copy",
        "seo_article",
        "video_script",
        "podcast_description",
        "faq",
    ];

    fn store_with_defaults() -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prompts.yaml");
        TemplateStore::write_defaults(&path).expect("write defaults");
        (dir, TemplateStore::new(path))
    }

    #[test]
    fn defaults_cover_builtin_then_bundled_formats() {
        let set = TemplateSet::from_yaml(DEFAULT_TEMPLATES).expect("parse defaults");
        assert_eq!(set.names(), DEFAULT_NAMES);
        for (_, template) in set.iter() {
            assert!(template.user.contains("{input_text}"));
        }
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let store = TemplateStore::new("/nonexistent/contentgen/prompts.yaml");
        assert!(matches!(store.load(), Err(GenerationError::Configuration(_))));
    }

    #[test]
    fn malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prompts.yaml");
        fs::write(&path, "telegram: just a string\n").expect("write");
        let store = TemplateStore::new(path);
        assert!(matches!(store.load(), Err(GenerationError::Configuration(_))));
    }

    #[test]
    fn get_unknown_lists_known_formats() {
        let (_dir, store) = store_with_defaults();
        let err = store.get("tiktok").expect_err("unknown format");
        match &err {
            GenerationError::NotFound { format_name, known } => {
                assert_eq!(format_name, "tiktok");
                assert_eq!(known.len(), DEFAULT_NAMES.len());
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("telegram, email, official_letter, newsletter, blog"));
    }

    #[test]
    fn put_then_get_returns_same_pair() {
        let (_dir, store) = store_with_defaults();
        store.put("tweet", "Be punchy.", "Tweet about {input_text}").expect("put");
        let template = store.get("tweet").expect("get");
        assert_eq!(template, PromptTemplate::new("Be punchy.", "Tweet about {input_text}"));
    }

    #[test]
    fn writes_persist_and_keep_document_order() {
        let (dir, store) = store_with_defaults();
        store.put("tweet", "s", "{input_text}").expect("put new");
        store.put("email", "new system", "{input_text}").expect("replace");

        let reopened = TemplateStore::new(dir.path().join("prompts.yaml"));
        let mut expected = DEFAULT_NAMES.to_vec();
        expected.push("tweet");
        assert_eq!(reopened.list().expect("list"), expected);
        assert_eq!(reopened.get("email").expect("get").system, "new system");
    }

    #[test]
    fn delete_removes_and_missing_delete_fails() {
        let (_dir, store) = store_with_defaults();
        store.put("tweet", "s", "{input_text}").expect("put");
        store.delete("tweet").expect("delete");
        assert!(matches!(store.get("tweet"), Err(GenerationError::NotFound { .. })));
        assert!(matches!(store.delete("tweet"), Err(GenerationError::NotFound { .. })));
    }

    #[test]
    fn failed_persist_leaves_cache_invalidated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prompts.yaml");
        TemplateStore::write_defaults(&path).expect("defaults");
        let store = TemplateStore::new(&path);
        store.load().expect("warm cache");

        // A directory squatting on the temp file name makes the write fail.
        fs::create_dir(dir.path().join(".prompts.yaml.tmp")).expect("block temp path");
        assert!(store.put("tweet", "s", "{input_text}").is_err());
        assert!(!store.list().expect("reload").contains(&"tweet".to_string()));
    }

    #[test]
    fn concurrent_reader_never_hides_a_saved_template() {
        let (_dir, store) = store_with_defaults();
        let store = Arc::new(store);

        for i in 0..100 {
            let stop = Arc::new(AtomicBool::new(false));
            let reader = {
                let store = Arc::clone(&store);
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        store.load().expect("reader load");
                    }
                })
            };

            let name = format!("custom_{i}");
            store.put(&name, "s", "{input_text}").expect("put");
            let visible = store.get(&name).is_ok();
            stop.store(true, Ordering::Relaxed);
            reader.join().expect("reader thread");

            assert!(visible, "{name} not visible after a successful put");
            assert!(store.get(&name).is_ok());
        }
    }

    #[test]
    fn successful_write_replaces_cache_without_reread() {
        let (dir, store) = store_with_defaults();
        store.put("tweet", "s", "{input_text}").expect("put");
        fs::remove_file(dir.path().join("prompts.yaml")).expect("remove backing file");
        assert!(store.get("tweet").is_ok());
    }

    #[test]
    fn write_defaults_does_not_overwrite() {
        let (dir, store) = store_with_defaults();
        store.put("tweet", "s", "{input_text}").expect("put");
        let created = TemplateStore::write_defaults(&dir.path().join("prompts.yaml")).expect("call");
        assert!(!created);
        assert!(store.get("tweet").is_ok());
    }

    #[test]
    fn empty_document_is_empty_set() {
        let set = TemplateSet::from_yaml("").expect("parse");
        assert!(set.is_empty());
        let round = TemplateSet::from_yaml(&set.to_yaml().expect("yaml")).expect("reparse");
        assert!(round.is_empty());
    }
}
