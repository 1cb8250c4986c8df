//! Reader state: loaded corpus, navigation position and display options,
//! with the active script delegated to a shared [`TransliterationEngine`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::corpus::{Corpus, CorpusError, CorpusSource, TextKind};
use crate::engine::{EngineError, TransliterationEngine};
use crate::table::TransliterationTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub text_kind: TextKind,
    pub section: String,
    pub verse: Option<u32>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            text_kind: TextKind::Samhita,
            section: "1.1".to_string(),
            verse: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontSize {
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_padam: bool,
    pub show_samhita: bool,
    pub font_size: FontSize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_padam: true,
            show_samhita: true,
            font_size: FontSize::Md,
        }
    }
}

/// Partial update for [`DisplayOptions`]; `None` fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptionsPatch {
    pub show_padam: Option<bool>,
    pub show_samhita: Option<bool>,
    pub font_size: Option<FontSize>,
}

impl DisplayOptions {
    fn apply(&mut self, patch: DisplayOptionsPatch) {
        if let Some(v) = patch.show_padam {
            self.show_padam = v;
        }
        if let Some(v) = patch.show_samhita {
            self.show_samhita = v;
        }
        if let Some(v) = patch.font_size {
            self.font_size = v;
        }
    }
}

pub struct ReaderStore {
    engine: Arc<TransliterationEngine>,
    corpus: Option<Arc<Corpus>>,
    error: Option<String>,
    navigation: NavigationState,
    display: DisplayOptions,
}

impl ReaderStore {
    pub fn new(engine: Arc<TransliterationEngine>) -> Self {
        Self {
            engine,
            corpus: None,
            error: None,
            navigation: NavigationState::default(),
            display: DisplayOptions::default(),
        }
    }

    pub fn engine(&self) -> &Arc<TransliterationEngine> {
        &self.engine
    }

    pub fn corpus(&self) -> Option<&Corpus> {
        self.corpus.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.corpus.is_some()
    }

    /// Message of the last failed `load_corpus`, cleared by the next attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn display_options(&self) -> &DisplayOptions {
        &self.display
    }

    /// Load the corpus from `source`. A failure keeps any corpus loaded
    /// earlier and records the message in [`error`](Self::error).
    pub fn load_corpus(&mut self, source: &CorpusSource) -> Result<(), CorpusError> {
        self.error = None;
        match source.load_corpus() {
            Ok(corpus) => {
                debug!(chapters = corpus.samhita_chapters().len(), "reader corpus loaded");
                self.corpus = Some(corpus);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load corpus");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn available_chapters(&self) -> Vec<String> {
        self.corpus
            .as_ref()
            .map(|c| c.samhita_chapters())
            .unwrap_or_default()
    }

    pub fn set_current_section(&mut self, text_kind: TextKind, section: &str) {
        self.navigation.text_kind = text_kind;
        self.navigation.section = section.to_string();
        self.navigation.verse = None;
    }

    pub fn set_current_verse(&mut self, verse: u32) {
        self.navigation.verse = Some(verse);
    }

    pub fn update_display_options(&mut self, patch: DisplayOptionsPatch) {
        self.display.apply(patch);
    }

    pub fn current_script(&self) -> String {
        self.engine.current_script()
    }

    pub fn set_current_script(&self, identifier: &str) -> Result<(), EngineError> {
        self.engine.set_current_script(identifier)
    }

    /// Render a unit's precomputed table in the current script.
    pub fn render_static(&self, table: Option<&TransliterationTable>) -> String {
        self.engine.render_static(table, None)
    }

    /// `target` defaults to the current script.
    pub fn transliterate(&self, text: &str, source: Option<&str>, target: Option<&str>) -> String {
        self.engine.transliterate(text, source, target)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::backend::{BackendError, EmbeddedConversion};
    use crate::corpus::{DataConfig, Endpoints, SourceKind};
    use crate::engine::EngineOptions;

    const CORPUS: &str = r#"{
        "metadata": {
            "title": "Taittiriya", "description": "",
            "components": {},
            "totals": { "total_texts": 1, "total_files_processed": 1 }
        },
        "samhita": {
            "1.2": { "chapter": "1.2", "source_padam_file": "a", "verse_count": 0,
                     "matched_count": 0, "verses": [] },
            "1.1": { "chapter": "1.1", "source_padam_file": "b", "verse_count": 0,
                     "matched_count": 0, "verses": [] }
        }
    }"#;

    fn store() -> ReaderStore {
        let backend = EmbeddedConversion::from_fn("upper", |req| {
            if req.target == "wx" {
                Err(BackendError::UnsupportedScript(req.target.clone()))
            } else {
                Ok(req.text.to_uppercase())
            }
        });
        let engine = TransliterationEngine::new(Arc::new(backend), EngineOptions::default()).unwrap();
        ReaderStore::new(Arc::new(engine))
    }

    fn source_at(root: &std::path::Path) -> CorpusSource {
        CorpusSource::new(DataConfig {
            kind: SourceKind::Local,
            base_url: root.to_string_lossy().into_owned(),
            endpoints: Endpoints::default(),
        })
    }

    #[test]
    fn test_initial_state() {
        let store = store();
        assert!(!store.is_loaded());
        assert!(store.error().is_none());
        assert_eq!(store.navigation(), &NavigationState::default());
        assert_eq!(store.navigation().section, "1.1");
        assert_eq!(store.display_options().font_size, FontSize::Md);
        assert_eq!(store.current_script(), "devanagari");
        assert!(store.available_chapters().is_empty());
    }

    #[test]
    fn test_load_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Endpoints::default().corpus.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, CORPUS).unwrap();

        let mut store = store();
        store.load_corpus(&source_at(dir.path())).unwrap();
        assert!(store.is_loaded());
        assert_eq!(store.corpus().unwrap().metadata.title, "Taittiriya");
        assert_eq!(store.available_chapters(), vec!["1.1", "1.2"]);
    }

    #[test]
    fn test_load_failure_records_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store();
        assert!(store.load_corpus(&source_at(dir.path())).is_err());
        assert!(!store.is_loaded());
        assert!(store.error().is_some());
    }

    #[test]
    fn test_section_change_clears_verse() {
        let mut store = store();
        store.set_current_verse(7);
        assert_eq!(store.navigation().verse, Some(7));
        store.set_current_section(TextKind::Aranyaka, "4");
        assert_eq!(store.navigation().text_kind, TextKind::Aranyaka);
        assert_eq!(store.navigation().section, "4");
        assert_eq!(store.navigation().verse, None);
    }

    #[test]
    fn test_display_patch_merges() {
        let mut store = store();
        store.update_display_options(DisplayOptionsPatch {
            show_padam: Some(false),
            ..Default::default()
        });
        store.update_display_options(DisplayOptionsPatch {
            font_size: Some(FontSize::Xl),
            ..Default::default()
        });
        assert_eq!(
            store.display_options(),
            &DisplayOptions {
                show_padam: false,
                show_samhita: true,
                font_size: FontSize::Xl,
            }
        );
    }

    #[test]
    fn test_script_follows_engine() {
        let store = store();
        store.set_current_script("tamil").unwrap();
        assert_eq!(store.current_script(), "tamil");
        assert_eq!(store.engine().current_script(), "tamil");

        let table: TransliterationTable =
            [("baraha", "agnim"), ("tamil", "அக்நிம்")].into_iter().collect();
        assert_eq!(store.render_static(Some(&table)), "அக்நிம்");
        assert_eq!(store.transliterate("agnim", None, None), "AGNIM");
        assert_eq!(store.transliterate("agnim", None, Some("wx")), "agnim");
    }
}
