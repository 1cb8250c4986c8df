//! Registry of the writing systems the engine can render.
//!
//! The set is closed: descriptors are defined once here and never registered
//! at runtime. Order is the display order used by script pickers.

use serde::Serialize;

/// Script shown when nothing else has been selected.
pub const DEFAULT_SCRIPT: &str = "devanagari";

/// Script the corpus is authored in. Static tables fall back to it and
/// conversions assume it when no source is given.
pub const SOURCE_SCRIPT: &str = "baraha";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScriptDescriptor {
    /// Canonical key, unique within the registry.
    pub identifier: &'static str,
    /// Native or conventional name for display.
    pub label: &'static str,
    /// Scheme name understood by the conversion library.
    pub engine_code: &'static str,
}

const fn script(
    identifier: &'static str,
    label: &'static str,
    engine_code: &'static str,
) -> ScriptDescriptor {
    ScriptDescriptor {
        identifier,
        label,
        engine_code,
    }
}

static SUPPORTED_SCRIPTS: &[ScriptDescriptor] = &[
    script("devanagari", "देवनागरी", "Devanagari"),
    script("iast", "IAST", "Iast"),
    script("harvard-kyoto", "Harvard-Kyoto", "HarvardKyoto"),
    script("baraha", "Baraha", "BarahaSouth"),
    script("itrans", "ITRANS", "Itrans"),
    script("tamil", "தமிழ்", "Tamil"),
    script("telugu", "తెలుగు", "Telugu"),
    script("kannada", "ಕನ್ನಡ", "Kannada"),
    script("malayalam", "മലയാളം", "Malayalam"),
    script("gujarati", "ગુજરાતી", "Gujarati"),
    script("slp1", "SLP1", "Slp1"),
    script("velthuis", "Velthuis", "Velthuis"),
    script("wx", "WX", "Wx"),
];

/// All supported scripts in their fixed display order.
pub fn supported_scripts() -> &'static [ScriptDescriptor] {
    SUPPORTED_SCRIPTS
}

/// Find a descriptor by its canonical identifier.
pub fn lookup(identifier: &str) -> Option<&'static ScriptDescriptor> {
    SUPPORTED_SCRIPTS.iter().find(|s| s.identifier == identifier)
}

pub fn is_supported(identifier: &str) -> bool {
    lookup(identifier).is_some()
}

/// Display label for a script.
///
/// Accepts either the identifier or the engine code. Unknown names are
/// returned unchanged so callers can always show something.
pub fn label_for(name: &str) -> &str {
    SUPPORTED_SCRIPTS
        .iter()
        .find(|s| s.identifier == name || s.engine_code == name)
        .map_or(name, |s| s.label)
}
