//! # Text Normalization
//!
//! Turns an arbitrary cell into cleaned text that holds only Hangul
//! syllables, compatibility jamo, Latin letters, ASCII digits and single
//! spaces.
//!
//! ## Steps
//!
//! 1. Unicode NFC normalization (decomposed jamo compose into syllables)
//! 2. Whitespace runs collapse to one ASCII space
//! 3. URLs (`scheme://...`) are removed
//! 4. Every disallowed character is removed
//! 5. Whitespace collapses again and the result is trimmed
//!
//! The output is idempotent: `clean_text(&clean_text(s)) == clean_text(s)`.

use crate::cell::RawCell;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static RE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.\-]*://\S+").unwrap());

/// Cleans any cell value. Missing and non-text cells yield an empty string.
pub fn clean(raw: &RawCell) -> String {
    match raw.coerce() {
        Some(Ok(text)) => clean_text(&text),
        _ => String::new(),
    }
}

/// Cleans a string.
///
/// # Example
///
/// ```
/// use newsprep::normalize::clean_text;
///
/// let cleaned = clean_text("속보!!  https://n.news.naver.com/a/1 국회,\n본회의 개최");
/// assert_eq!(cleaned, "속보 국회 본회의 개최");
/// ```
pub fn clean_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let composed: String = input.nfc().collect();
    let collapsed = RE_WHITESPACE.replace_all(&composed, " ");
    let without_urls = RE_URL.replace_all(&collapsed, "");

    let kept: String = without_urls
        .chars()
        .filter(|&c| is_kept_char(c) || c.is_whitespace())
        .collect();

    RE_WHITESPACE.replace_all(&kept, " ").trim().to_string()
}

/// Returns true for characters that survive cleaning (whitespace aside).
pub fn is_kept_char(c: char) -> bool {
    is_hangul_syllable(c) || is_hangul_jamo(c) || is_latin_letter(c) || c.is_ascii_digit()
}

/// Hangul syllables block (U+AC00–U+D7A3).
#[inline]
pub fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Hangul compatibility jamo consonants and vowels (U+3131–U+3163).
#[inline]
pub fn is_hangul_jamo(c: char) -> bool {
    ('\u{3131}'..='\u{3163}').contains(&c)
}

/// Alphabetic characters in the Latin blocks.
#[inline]
pub fn is_latin_letter(c: char) -> bool {
    let code = c as u32;
    c.is_alphabetic()
        && ((0x0041..=0x024F).contains(&code) // Basic Latin through Latin Extended-B
            || (0x1E00..=0x1EFF).contains(&code)) // Latin Extended Additional
}
