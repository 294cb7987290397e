use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Clean up extracted PDF text.
///
/// Applies unicode normalization, ligature replacement, replacement
/// character removal and whitespace-run shortening. Line structure and
/// trailing spaces are left alone.
pub fn cleanup_text(text: &str) -> String {
    // 1. Unicode NFC normalization.
    let mut result: String = text.nfc().collect();

    // 2. Fix ligatures (ff, fi, fl, ffi, ffl, st).
    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
        ("\u{FB06}", "st"),
    ];
    for (lig, replacement) in &ligatures {
        if result.contains(lig) {
            result = result.replace(lig, replacement);
        }
    }

    // 3. Remove Unicode replacement character.
    result.retain(|c| c != '\u{FFFD}');

    // 4. Shorten runs of 3+ spaces to 2.
    static RE_SPACES: OnceLock<Option<Regex>> = OnceLock::new();
    if let Some(re) = RE_SPACES.get_or_init(|| Regex::new(r" {3,}").ok()) {
        result = re.replace_all(&result, "  ").into_owned();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(cleanup_text("Hello world."), "Hello world.");
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(cleanup_text("\u{FB01}nd"), "find");
    }

    #[test]
    fn test_ligature_ffl() {
        assert_eq!(cleanup_text("a\u{FB04}e"), "affle");
    }

    #[test]
    fn test_replacement_char_removed() {
        assert_eq!(cleanup_text("Hello\u{FFFD}World"), "HelloWorld");
    }

    #[test]
    fn test_excessive_whitespace() {
        assert_eq!(cleanup_text("a     b"), "a  b");
    }

    #[test]
    fn test_trailing_space_and_newlines_kept() {
        assert_eq!(cleanup_text("wrapped \nline\n\n"), "wrapped \nline\n\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(cleanup_text(""), "");
    }

    #[test]
    fn test_nfc_normalization() {
        // e + combining acute should normalize to single char.
        let result = cleanup_text("caf\u{0065}\u{0301}");
        assert_eq!(result, "caf\u{00E9}");
    }
}
