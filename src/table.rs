//! Precomputed per-script renderings shipped alongside corpus text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Script identifier -> already-converted text for one text unit.
///
/// A missing script is normal; readers fall back to the source script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransliterationTable(BTreeMap<String, String>);

impl TransliterationTable {
    pub fn get(&self, script: &str) -> Option<&str> {
        self.0.get(script).map(String::as_str)
    }

    pub fn insert(&mut self, script: impl Into<String>, text: impl Into<String>) {
        self.0.insert(script.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TransliterationTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Pick the rendering for `script` out of a precomputed table.
///
/// Falls back to the `fallback` script's entry, then to an empty string.
/// Empty entries count as missing.
pub fn render(table: Option<&TransliterationTable>, script: &str, fallback: &str) -> String {
    let Some(table) = table else {
        return String::new();
    };
    [script, fallback]
        .into_iter()
        .filter_map(|s| table.get(s))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}
