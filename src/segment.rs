// src/segment.rs
//! # Segmenter
//! Cuts a scraped teaser into short headline fragments.
//!
//! The split pattern keeps `!` and `?` attached to the fragment they end,
//! while `:`, `;` and dash separators are stripped afterwards. A teaser that
//! does not split into at least two pieces is dropped entirely.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum number of raw pieces a teaser must split into to be kept.
pub const MIN_PIECES: usize = 2;

// Finds the fragments rather than splitting, since the terminating `!`/`?`
// must stay part of the match.
static RE_PIECE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(.+?([!?;:] +| +[-–] +|[;:] +[-–] +|$))").expect("piece regex")
});
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_ENDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([;:.]$|^[-–+] | [-–]$)").expect("ends regex"));
static RE_HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{L})- (\p{L})").expect("hyphen break regex"));
static RE_LOWER_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Ll}$").expect("lowercase letter regex"));

/// One cleaned headline candidate, tagged with the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub url: String,
}

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

// Single-char titlecase. Digraphs get their titlecase form; letters whose
// uppercase is more than one char (`ß`) are left alone.
fn title_char(c: char) -> char {
    match c {
        'ǆ' => 'ǅ',
        'ǉ' => 'ǈ',
        'ǌ' => 'ǋ',
        'ǳ' => 'ǲ',
        _ => {
            let mut up = c.to_uppercase();
            match (up.next(), up.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        }
    }
}

/// Titlecase the first character if it is a lowercase letter; the rest is untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if RE_LOWER_LETTER.is_match(c.encode_utf8(&mut [0; 4])) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push(title_char(c));
            out.push_str(chars.as_str());
            out
        }
        _ => s.to_string(),
    }
}

/// Clean a single raw piece. Returns `None` if nothing is left.
fn clean_piece(piece: &str) -> Option<String> {
    let line = collapse_ws(piece);
    if line.is_empty() {
        return None;
    }
    let line = RE_ENDS.replace_all(&line, "");
    let line = RE_HYPHEN_BREAK.replace_all(&line, "$1$2");
    let line = capitalize_first(line.trim());
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Segment `text` scraped from `source_url` into headline fragments.
///
/// Never fails: unusable input yields an empty vector.
pub fn segment(text: &str, source_url: &str) -> Vec<Fragment> {
    let text = collapse_ws(text);
    let pieces: Vec<&str> = RE_PIECE.find_iter(&text).map(|m| m.as_str()).collect();
    if pieces.len() < MIN_PIECES {
        return Vec::new();
    }

    pieces
        .into_iter()
        .filter_map(clean_piece)
        .map(|text| Fragment {
            text,
            url: source_url.to_string(),
        })
        .collect()
}
