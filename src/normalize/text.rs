//! Paragraph and heading text cleanup.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Cleans extracted text.
///
/// Applies, in order: ligature and typographic quote replacement, NFC
/// normalization, rejoining of words hyphenated across a line break, and
/// whitespace collapsing. Normalizing already-normalized text returns it
/// unchanged.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    hyphen_break: Regex,
    whitespace: Regex,
    replacements: Vec<(char, &'static str)>,
}

impl TextNormalizer {
    /// Create a normalizer.
    pub fn new() -> Self {
        Self {
            // A letter, a hyphen, a line break, then a lowercase continuation.
            hyphen_break: Regex::new(r"(\p{L})-[ \t]*\r?\n\s*(\p{Ll})").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
            replacements: vec![
                ('\u{FB00}', "ff"),
                ('\u{FB01}', "fi"),
                ('\u{FB02}', "fl"),
                ('\u{FB03}', "ffi"),
                ('\u{FB04}', "ffl"),
                ('\u{FB05}', "st"),
                ('\u{FB06}', "st"),
                ('\u{2018}', "'"),
                ('\u{2019}', "'"),
                ('\u{201A}', "'"),
                ('\u{201B}', "'"),
                ('\u{201C}', "\""),
                ('\u{201D}', "\""),
                ('\u{201E}', "\""),
                ('\u{201F}', "\""),
                ('\u{00A0}', " "),
                ('\u{00AD}', ""),
            ],
        }
    }

    /// Normalize a piece of text.
    pub fn normalize(&self, text: &str) -> String {
        let mut plain = String::with_capacity(text.len());
        for c in text.chars() {
            match self.replacements.iter().find(|(from, _)| *from == c) {
                Some((_, to)) => plain.push_str(to),
                None => plain.push(c),
            }
        }

        // Composition runs after removals so marks join their new base.
        let nfc: String = plain.nfc().collect();
        let joined = self.hyphen_break.replace_all(&nfc, "$1$2");
        self.whitespace.replace_all(&joined, " ").trim().to_string()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
