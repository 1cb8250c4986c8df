//! The transliteration engine: current-script state, result cache and
//! change notification around a pluggable [`ConversionBackend`].
//!
//! Every public rendering call returns synchronously. With a deferred
//! backend a cache miss returns the original text at once and queues the
//! real conversion; listeners hear [`EngineEvent::ConversionReady`] when it
//! lands, re-render, and hit the cache. Failures never reach callers: the
//! worst outcome is text shown in its original script.

mod listeners;
mod worker;


pub use listeners::{EngineEvent, ListenerId};

use std::collections::HashSet;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, debug_span, warn};

use crate::backend::{BackendError, ConversionBackend, ConversionRequest, Resolution};
use crate::cache::{CacheKey, CacheStats, ResultCache, DEFAULT_CAPACITY};
use crate::script;
use crate::settings::{Settings, SettingsError};
use crate::table::{self, TransliterationTable};
use listeners::ListenerSet;
use worker::{ConversionWorker, Submission};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown script: {0}")]
    UnknownScript(String),
    #[error("failed to start conversion worker: {0}")]
    Spawn(#[from] io::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Initial current script.
    pub default_script: String,
    /// Assumed source of conversions and fallback of static tables.
    pub source_script: String,
    /// Reject unregistered identifiers in `set_current_script`.
    pub strict_scripts: bool,
    pub cache_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_script: script::DEFAULT_SCRIPT.to_string(),
            source_script: script::SOURCE_SCRIPT.to_string(),
            strict_scripts: false,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// State shared with the background worker.
pub(crate) struct Shared {
    cache: Mutex<ResultCache>,
    /// Keys queued for or undergoing background conversion.
    in_flight: Mutex<HashSet<CacheKey>>,
    listeners: ListenerSet,
}

impl Shared {
    pub(crate) fn new(cache_capacity: usize) -> Self {
        Self {
            cache: Mutex::new(ResultCache::new(cache_capacity)),
            in_flight: Mutex::new(HashSet::new()),
            listeners: ListenerSet::new(),
        }
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, ResultCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn in_flight(&self) -> MutexGuard<'_, HashSet<CacheKey>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_cached(&self, key: &CacheKey) -> bool {
        self.cache().contains(key)
    }
}

/// Run one conversion and remember the result.
///
/// Failures and backend panics are logged and not cached, so the same key
/// is attempted again on the next request. An empty result for non-empty
/// text resolves to the text itself.
pub(crate) fn convert_and_store(
    backend: &dyn ConversionBackend,
    shared: &Shared,
    key: &CacheKey,
) -> Option<String> {
    let request = ConversionRequest::from(key);
    let outcome = catch_unwind(AssertUnwindSafe(|| backend.convert(&request)))
        .unwrap_or_else(|payload| Err(BackendError::Panicked(crate::panic_message(&*payload))));
    match outcome {
        Ok(converted) => {
            let converted = if converted.is_empty() {
                key.text.clone()
            } else {
                converted
            };
            shared.cache().insert(key.clone(), converted.clone());
            debug!(backend = backend.name(), "conversion cached");
            Some(converted)
        }
        Err(err) => {
            warn!(
                backend = backend.name(),
                source = key.source.as_str(),
                target = key.target.as_str(),
                error = %err,
                "conversion failed, keeping original text"
            );
            None
        }
    }
}

enum Fill {
    Inline,
    Background(ConversionWorker),
}

enum Lookup {
    Resolved(String),
    Miss(CacheKey),
}

pub struct TransliterationEngine {
    current_script: RwLock<String>,
    source_script: String,
    strict_scripts: bool,
    backend: Arc<dyn ConversionBackend>,
    shared: Arc<Shared>,
    fill: Fill,
}

impl std::fmt::Debug for TransliterationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransliterationEngine")
            .field("current_script", &self.current_script())
            .field("source_script", &self.source_script)
            .field("backend", &self.backend.name())
            .field("cache", &self.cache_stats())
            .field("listeners", &self.shared.listeners)
            .finish_non_exhaustive()
    }
}

impl TransliterationEngine {
    /// Build an engine around `backend`.
    ///
    /// Deferred backends get a dedicated worker thread; immediate ones
    /// convert on the caller's thread. The source script must always be
    /// registered; the default script only in strict mode.
    pub fn new(
        backend: Arc<dyn ConversionBackend>,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        if !script::is_supported(&options.source_script) {
            return Err(EngineError::UnknownScript(options.source_script));
        }
        if options.strict_scripts && !script::is_supported(&options.default_script) {
            return Err(EngineError::UnknownScript(options.default_script));
        }
        let shared = Arc::new(Shared::new(options.cache_capacity));
        let resolution = backend.resolution();
        let fill = match resolution {
            Resolution::Immediate => Fill::Inline,
            Resolution::Deferred => Fill::Background(ConversionWorker::spawn(
                Arc::clone(&backend),
                Arc::clone(&shared),
            )?),
        };
        debug!(
            backend = backend.name(),
            ?resolution,
            script = options.default_script.as_str(),
            "transliteration engine ready"
        );
        Ok(Self {
            current_script: RwLock::new(options.default_script),
            source_script: options.source_script,
            strict_scripts: options.strict_scripts,
            backend,
            shared,
            fill,
        })
    }

    /// Build the engine and backend described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        let backend = settings.backend.build()?;
        Self::new(backend, settings.engine_options())
    }

    pub fn current_script(&self) -> String {
        self.current_script
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn source_script(&self) -> &str {
        &self.source_script
    }

    /// Switch the active script and tell every listener.
    ///
    /// Lenient engines accept any identifier; unknown scripts simply miss
    /// every table and conversion downstream. Strict engines reject them
    /// and leave the state untouched.
    pub fn set_current_script(&self, identifier: &str) -> Result<(), EngineError> {
        if self.strict_scripts && !script::is_supported(identifier) {
            return Err(EngineError::UnknownScript(identifier.to_string()));
        }
        *self
            .current_script
            .write()
            .unwrap_or_else(PoisonError::into_inner) = identifier.to_string();
        debug!(script = identifier, "current script changed");
        self.shared.listeners.notify(&EngineEvent::ScriptChanged {
            script: identifier.to_string(),
        });
        Ok(())
    }

    /// Render a unit from its precomputed table without touching the cache
    /// or the backend.
    pub fn render_static(
        &self,
        table: Option<&TransliterationTable>,
        target: Option<&str>,
    ) -> String {
        match target {
            Some(target) => table::render(table, target, &self.source_script),
            None => table::render(table, &self.current_script(), &self.source_script),
        }
    }

    fn lookup(&self, text: &str, source: Option<&str>, target: Option<&str>) -> Lookup {
        if text.is_empty() {
            return Lookup::Resolved(String::new());
        }
        let source = source.unwrap_or(self.source_script.as_str());
        let target = match target {
            Some(t) => t.to_string(),
            None => self.current_script(),
        };
        if source == target {
            return Lookup::Resolved(text.to_string());
        }
        let key = CacheKey::new(source, &target, text);
        match self.shared.cache().get(&key) {
            Some(hit) => Lookup::Resolved(hit),
            None => Lookup::Miss(key),
        }
    }

    /// Best-effort conversion that never blocks on a deferred backend.
    ///
    /// `source` defaults to the source script and `target` to the current
    /// script. On a miss with a deferred backend this returns `text`
    /// unchanged and fills the cache in the background.
    pub fn transliterate(&self, text: &str, source: Option<&str>, target: Option<&str>) -> String {
        let _span = debug_span!("transliterate", chars = text.chars().count()).entered();
        let key = match self.lookup(text, source, target) {
            Lookup::Resolved(out) => return out,
            Lookup::Miss(key) => key,
        };
        match &self.fill {
            Fill::Inline => self.resolve(key),
            Fill::Background(worker) => {
                let placeholder = key.text.clone();
                match worker.submit(key) {
                    Submission::Queued => debug!("queued background conversion"),
                    Submission::AlreadyQueued => debug!("conversion already pending"),
                    Submission::Closed => warn!("conversion worker unavailable"),
                }
                placeholder
            }
        }
    }

    /// Conversion on the caller's thread, whatever the backend.
    ///
    /// Blocks for the full backend round trip on a miss. Still degrades to
    /// the original text on failure.
    pub fn transliterate_now(
        &self,
        text: &str,
        source: Option<&str>,
        target: Option<&str>,
    ) -> String {
        match self.lookup(text, source, target) {
            Lookup::Resolved(out) => out,
            Lookup::Miss(key) => self.resolve(key),
        }
    }

    fn resolve(&self, key: CacheKey) -> String {
        convert_and_store(self.backend.as_ref(), &self.shared, &key).unwrap_or(key.text)
    }

    /// Convert `text` into every registered script.
    ///
    /// Meant for building static tables offline, so each entry is resolved
    /// on the caller's thread rather than left as a placeholder.
    pub fn transliterate_to_all_scripts(
        &self,
        text: &str,
        source: Option<&str>,
    ) -> TransliterationTable {
        let source = source.unwrap_or(self.source_script.as_str());
        script::supported_scripts()
            .iter()
            .map(|s| {
                (
                    s.identifier,
                    self.transliterate_now(text, Some(source), Some(s.identifier)),
                )
            })
            .collect()
    }

    pub fn detect_script(&self, text: &str) -> &'static str {
        crate::unicode::detect_script(text)
    }

    /// Register a callback for [`EngineEvent`]s. Callbacks run on whichever
    /// thread triggered the event, including the background worker.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.shared.listeners.add(Arc::new(listener))
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.shared.cache().stats()
    }

    /// Distinct background conversions queued or in flight.
    pub fn pending_conversions(&self) -> usize {
        match &self.fill {
            Fill::Inline => 0,
            Fill::Background(_) => self.shared.in_flight().len(),
        }
    }
}
