//! Corpus data model as shipped in the static JSON exports.
//!
//! Text units optionally carry a precomputed [`TransliterationTable`]; the
//! engine reads those through `render_static`.

mod source;

pub use source::{CorpusError, CorpusSource, DataConfig, Endpoint, Endpoints, SourceKind};

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::table::TransliterationTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Samhita,
    Brahmana,
    Aranyaka,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub description: String,
    /// Component-specific counters and notes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusTotals {
    pub total_texts: u64,
    pub total_files_processed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusMetadata {
    pub title: String,
    pub description: String,
    pub components: BTreeMap<String, ComponentInfo>,
    pub totals: CorpusTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsing_info: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamhitaVerse {
    pub verse_id: String,
    pub chapter: String,
    #[serde(default)]
    pub padam: Option<String>,
    #[serde(default)]
    pub samhita: Option<String>,
    pub has_samhita_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliterations: Option<TransliterationTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamhitaChapter {
    pub chapter: String,
    pub source_padam_file: String,
    pub verse_count: usize,
    pub matched_count: usize,
    pub verses: Vec<SamhitaVerse>,
}

/// A section of a Brahmana or Aranyaka book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrahmanaSection {
    pub section_id: String,
    pub file_info: String,
    pub text: String,
    pub text_type: TextKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliterations: Option<TransliterationTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrahmanaBook {
    pub text_type: TextKind,
    pub book: String,
    pub section_count: usize,
    pub sections: Vec<BrahmanaSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub metadata: CorpusMetadata,
    #[serde(default)]
    pub samhita: Option<BTreeMap<String, SamhitaChapter>>,
    #[serde(default)]
    pub brahmana: Option<BTreeMap<String, BrahmanaBook>>,
    #[serde(default)]
    pub aranyaka: Option<BTreeMap<String, BrahmanaBook>>,
}

impl Corpus {
    pub fn samhita_chapter(&self, chapter: &str) -> Option<&SamhitaChapter> {
        self.samhita.as_ref()?.get(chapter)
    }

    /// Samhita chapter keys (`"kanda.chapter"`) in reading order.
    pub fn samhita_chapters(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .samhita
            .as_ref()
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_by(|a, b| compare_chapter_keys(a, b));
        keys
    }
}

fn chapter_parts(key: &str) -> (u32, u32) {
    let mut parts = key.split('.').map(|p| p.parse::<u32>().unwrap_or(u32::MAX));
    let kanda = parts.next().unwrap_or(u32::MAX);
    let chapter = parts.next().unwrap_or(0);
    (kanda, chapter)
}

/// Numeric order on `kanda.chapter` keys, so `1.10` follows `1.9`.
/// Unparsable keys sort last, alphabetically among themselves.
pub fn compare_chapter_keys(a: &str, b: &str) -> Ordering {
    chapter_parts(a)
        .cmp(&chapter_parts(b))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) const SAMPLE_CORPUS: &str = r#"{
        "metadata": {
            "title": "Taittiriya",
            "description": "Krishna Yajurveda",
            "components": {
                "samhita": { "description": "Samhita with padam", "chapters": 44 }
            },
            "totals": { "total_texts": 3, "total_files_processed": 2 }
        },
        "samhita": {
            "1.10": {
                "chapter": "1.10", "source_padam_file": "p110.txt",
                "verse_count": 0, "matched_count": 0, "verses": []
            },
            "1.2": {
                "chapter": "1.2", "source_padam_file": "p12.txt",
                "verse_count": 0, "matched_count": 0, "verses": []
            },
            "1.1": {
                "chapter": "1.1", "source_padam_file": "p11.txt",
                "verse_count": 1, "matched_count": 1,
                "verses": [{
                    "verse_id": "1.1.1", "chapter": "1.1",
                    "padam": "iqShE | tvAq |", "samhita": "iqShE tvOrjE tvA",
                    "has_samhita_match": true,
                    "transliterations": { "baraha": "iqShE tvA", "devanagari": "इ॒षे त्वा॒" }
                }]
            },
            "2.1": {
                "chapter": "2.1", "source_padam_file": "p21.txt",
                "verse_count": 0, "matched_count": 0, "verses": []
            }
        }
    }"#;

    #[test]
    fn test_parse_sample_corpus() {
        let corpus: Corpus = serde_json::from_str(SAMPLE_CORPUS).unwrap();
        assert_eq!(corpus.metadata.title, "Taittiriya");
        assert_eq!(
            corpus.metadata.components["samhita"].extra["chapters"],
            serde_json::json!(44)
        );
        assert!(corpus.brahmana.is_none());

        let verse = &corpus.samhita_chapter("1.1").unwrap().verses[0];
        assert!(verse.has_samhita_match);
        let table = verse.transliterations.as_ref().unwrap();
        assert_eq!(table.get("devanagari"), Some("इ॒षे त्वा॒"));
    }

    #[test]
    fn test_chapters_sorted_numerically() {
        let corpus: Corpus = serde_json::from_str(SAMPLE_CORPUS).unwrap();
        assert_eq!(corpus.samhita_chapters(), vec!["1.1", "1.2", "1.10", "2.1"]);
    }

    #[test]
    fn test_unparsable_chapter_keys_sort_last() {
        let mut keys = vec!["appendix", "3.1", "1.4"];
        keys.sort_by(|a, b| compare_chapter_keys(a, b));
        assert_eq!(keys, vec!["1.4", "3.1", "appendix"]);
    }

    #[test]
    fn test_section_without_table() {
        let json = r#"{
            "text_type": "aranyaka", "book": "1", "section_count": 1,
            "sections": [{ "section_id": "1.1", "file_info": "a1.txt",
                           "text": "bhadram karnebhih", "text_type": "aranyaka" }]
        }"#;
        let book: BrahmanaBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.text_type, TextKind::Aranyaka);
        assert!(book.sections[0].transliterations.is_none());
    }
}
