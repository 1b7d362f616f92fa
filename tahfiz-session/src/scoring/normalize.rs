//! Transcript and verse text normalization
//!
//! Recognition transcripts and verse tokens come in two scripts: Arabic
//! (with or without diacritics) and Latin transliteration. Both are reduced
//! to a comparable form before alignment:
//! - Arabic: strip tashkeel and tatweel, unify alef variants, map
//!   teh-marbuta to heh and alef-maqsura to yeh
//! - Latin: case-fold, drop punctuation and hyphens
//!
//! Normalization never fails; unrecognized characters pass through.

/// Arabic combining marks stripped before comparison (tashkeel range plus
/// the superscript alef used in Rahman-style spellings)
fn is_tashkeel(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

/// Normalize one word for comparison
///
/// Handles both scripts in a single pass; a word is its own unit, so
/// whitespace is not expected here.
pub fn normalize_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        if is_tashkeel(c) {
            continue;
        }
        match c {
            // Tatweel (kashida) is purely typographic
            '\u{0640}' => {}
            // Alef variants: madda, hamza above/below, wasla
            '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' => out.push('\u{0627}'),
            // Teh marbuta sounds like heh at a stop
            '\u{0629}' => out.push('\u{0647}'),
            // Alef maqsura is written yeh
            '\u{0649}' => out.push('\u{064A}'),
            c if c.is_alphanumeric() => {
                for lower in c.to_lowercase() {
                    out.push(lower);
                }
            }
            // Punctuation, hyphens, apostrophes: dropped
            _ => {}
        }
    }
    out
}

/// Split free text into normalized words, dropping empty results
///
/// Used on transcripts; verse tokens are already word-segmented and go
/// through `normalize_word` directly.
pub fn normalize_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Normalize a whole line for similarity comparison (words joined by a
/// single space)
pub fn normalize_line(text: &str) -> String {
    normalize_words(text).join(" ")
}
