use std::fs;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, debug_span};

use super::{BrahmanaBook, Corpus, SamhitaChapter};

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("invalid corpus JSON: {0}")]
    Json(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Remote,
    Api,
}

impl SourceKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "remote" => Some(Self::Remote),
            "api" => Some(Self::Api),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Corpus,
    Samhita,
    Brahmana,
    Aranyaka,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    pub corpus: String,
    pub samhita: String,
    pub brahmana: String,
    pub aranyaka: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            corpus: "/taittiriya/web_complete/taittiriya_complete_corpus.json".into(),
            samhita: "/taittiriya/web_enhanced/chapters".into(),
            brahmana: "/taittiriya/web_brahmana_aranyaka/brahmana".into(),
            aranyaka: "/taittiriya/web_brahmana_aranyaka/aranyaka".into(),
        }
    }
}

/// Where the static corpus exports live.
///
/// `base_url` is either an `http(s)://` URL or a filesystem directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    pub kind: SourceKind,
    pub base_url: String,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Local,
            base_url: "/data".into(),
            endpoints: Endpoints::default(),
        }
    }
}

impl DataConfig {
    /// Defaults overridden by `LIPI_DATA_SOURCE_TYPE` and `LIPI_DATA_BASE_URL`.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(kind) = var("LIPI_DATA_SOURCE_TYPE").as_deref().and_then(SourceKind::parse) {
            config.kind = kind;
        }
        if let Some(base) = var("LIPI_DATA_BASE_URL").filter(|b| !b.is_empty()) {
            config.base_url = base;
        }
        config
    }

    fn endpoint(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Corpus => &self.endpoints.corpus,
            Endpoint::Samhita => &self.endpoints.samhita,
            Endpoint::Brahmana => &self.endpoints.brahmana,
            Endpoint::Aranyaka => &self.endpoints.aranyaka,
        }
    }

    /// `base_url + endpoint`, followed by `/`-joined path segments if any.
    pub fn data_url(&self, endpoint: Endpoint, segments: &[&str]) -> String {
        let mut url = format!("{}{}", self.base_url, self.endpoint(endpoint));
        if !segments.is_empty() {
            url.push('/');
            url.push_str(&segments.join("/"));
        }
        url
    }
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Loads corpus exports from disk or over HTTP.
///
/// The full corpus is fetched once and shared; book files are fetched on
/// every request.
pub struct CorpusSource {
    config: DataConfig,
    agent: ureq::Agent,
    corpus: Mutex<Option<Arc<Corpus>>>,
}

impl CorpusSource {
    pub fn new(config: DataConfig) -> Self {
        Self {
            config,
            agent: ureq::Agent::new_with_defaults(),
            corpus: Mutex::new(None),
        }
    }

    fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CorpusError> {
        let _span = debug_span!("fetch_json", url).entered();
        let body = if is_http(url) {
            self.agent
                .get(url)
                .call()
                .map_err(|e| CorpusError::Http(format!("{url}: {e}")))?
                .into_body()
                .read_to_string()
                .map_err(|e| CorpusError::Http(format!("{url}: {e}")))?
        } else {
            fs::read_to_string(url)?
        };
        serde_json::from_str(&body).map_err(|e| CorpusError::Json(format!("{url}: {e}")))
    }

    /// Fetch the complete corpus, or return the copy loaded earlier.
    pub fn load_corpus(&self) -> Result<Arc<Corpus>, CorpusError> {
        let mut slot = self.corpus.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(corpus) = slot.as_ref() {
            return Ok(Arc::clone(corpus));
        }
        let corpus: Arc<Corpus> =
            Arc::new(self.fetch_json(&self.config.data_url(Endpoint::Corpus, &[]))?);
        debug!(title = corpus.metadata.title.as_str(), "corpus loaded");
        *slot = Some(Arc::clone(&corpus));
        Ok(corpus)
    }

    pub fn samhita_chapter(&self, chapter: &str) -> Result<Option<SamhitaChapter>, CorpusError> {
        Ok(self.load_corpus()?.samhita_chapter(chapter).cloned())
    }

    /// Chapter keys of the loaded corpus; empty until `load_corpus` succeeds.
    pub fn samhita_chapters(&self) -> Vec<String> {
        self.corpus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.samhita_chapters())
            .unwrap_or_default()
    }

    fn book(&self, endpoint: Endpoint, book: &str) -> Option<BrahmanaBook> {
        let file = format!("book_{book}.json");
        let url = self.config.data_url(endpoint, &[&file]);
        match self.fetch_json(&url) {
            Ok(book) => Some(book),
            Err(err) => {
                debug!(error = %err, "book unavailable");
                None
            }
        }
    }

    /// A Brahmana book, or `None` if it cannot be fetched or parsed.
    pub fn brahmana_book(&self, book: &str) -> Option<BrahmanaBook> {
        self.book(Endpoint::Brahmana, book)
    }

    /// An Aranyaka book, or `None` if it cannot be fetched or parsed.
    pub fn aranyaka_book(&self, book: &str) -> Option<BrahmanaBook> {
        self.book(Endpoint::Aranyaka, book)
    }

    pub fn brahmana_books() -> Vec<String> {
        (1..=3).map(|n| n.to_string()).collect()
    }

    pub fn aranyaka_books() -> Vec<String> {
        (1..=8).map(|n| n.to_string()).collect()
    }
}
