//! Character-level Unicode classification for Indic scripts.

use crate::script::SOURCE_SCRIPT;

pub fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

pub fn is_tamil(c: char) -> bool {
    ('\u{0B80}'..='\u{0BFF}').contains(&c)
}

pub fn is_telugu(c: char) -> bool {
    ('\u{0C00}'..='\u{0C7F}').contains(&c)
}

pub fn is_kannada(c: char) -> bool {
    ('\u{0C80}'..='\u{0CFF}').contains(&c)
}

pub fn is_malayalam(c: char) -> bool {
    ('\u{0D00}'..='\u{0D7F}').contains(&c)
}

pub fn is_gujarati(c: char) -> bool {
    ('\u{0A80}'..='\u{0AFF}').contains(&c)
}

/// Detection order. A text mixing blocks resolves to the earliest family here,
/// not to the first character in the text.
const DETECTION_ORDER: &[(&str, fn(char) -> bool)] = &[
    ("devanagari", is_devanagari),
    ("tamil", is_tamil),
    ("telugu", is_telugu),
    ("kannada", is_kannada),
    ("malayalam", is_malayalam),
    ("gujarati", is_gujarati),
];

/// Guess which script a text is written in from its code points.
///
/// Romanized or otherwise unrecognised text is assumed to be in the source
/// script.
pub fn detect_script(text: &str) -> &'static str {
    DETECTION_ORDER
        .iter()
        .find(|(_, in_block)| text.chars().any(*in_block))
        .map_or(SOURCE_SCRIPT, |&(id, _)| id)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_char_classification() {
        assert!(is_devanagari('अ'));
        assert!(!is_devanagari('a'));
        assert!(is_tamil('த'));
        assert!(is_telugu('త'));
        assert!(is_kannada('ಕ'));
        assert!(is_malayalam('മ'));
        assert!(is_gujarati('ગ'));
        assert!(!is_gujarati('क'));
    }

    #[test]
    fn test_detect_each_family() {
        assert_eq!(detect_script("अग्निमीळे"), "devanagari");
        assert_eq!(detect_script("தமிழ்"), "tamil");
        assert_eq!(detect_script("తెలుగు"), "telugu");
        assert_eq!(detect_script("ಕನ್ನಡ"), "kannada");
        assert_eq!(detect_script("മലയാളം"), "malayalam");
        assert_eq!(detect_script("ગુજરાતી"), "gujarati");
    }

    #[test]
    fn test_detect_latin_defaults_to_source() {
        assert_eq!(detect_script("agnimILe purOhitam"), "baraha");
        assert_eq!(detect_script("agnimīḷe"), "baraha");
        assert_eq!(detect_script(""), "baraha");
    }

    #[test]
    fn test_detect_mixed_uses_priority_order() {
        // Gujarati first in the text, Devanagari wins by priority.
        assert_eq!(detect_script("ગ क"), "devanagari");
        assert_eq!(detect_script("ಕ த"), "tamil");
    }

    proptest! {
        #[test]
        fn prop_devanagari_block_detected(s in "[\u{0900}-\u{097F}]{1,32}") {
            prop_assert_eq!(detect_script(&s), "devanagari");
        }

        #[test]
        fn prop_ascii_defaults_to_source(s in "[ -~]{0,64}") {
            prop_assert_eq!(detect_script(&s), SOURCE_SCRIPT);
        }
    }
}
