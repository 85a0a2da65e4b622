//! Text normalization, sentence-boundary, and vector math helpers.

use crate::types::Vector;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// True when `chars[idx]` ends a sentence.
///
/// `is_abbreviation` receives the lowercased word preceding a `.`.
pub(crate) fn is_sentence_boundary(
    chars: &[char],
    idx: usize,
    is_abbreviation: impl Fn(&str) -> bool,
) -> bool {
    match chars[idx] {
        '.' => is_dot_boundary(chars, idx, is_abbreviation),
        '!' | '?' => true,
        _ => false,
    }
}

fn is_dot_boundary(chars: &[char], idx: usize, is_abbreviation: impl Fn(&str) -> bool) -> bool {
    if is_decimal_middle(chars, idx) || is_ticker_middle(chars, idx) {
        return false;
    }
    if idx + 1 < chars.len() && chars[idx + 1] == '.' {
        return false;
    }
    let word = preceding_word(chars, idx);
    !(word.is_empty() || is_abbreviation(&word))
}

fn preceding_word(chars: &[char], idx: usize) -> String {
    let start = chars[..idx]
        .iter()
        .rposition(|ch| !(ch.is_alphanumeric() || *ch == '.'))
        .map(|pos| pos + 1)
        .unwrap_or(0);
    chars[start..idx].iter().collect::<String>().to_lowercase()
}

fn is_decimal_middle(chars: &[char], idx: usize) -> bool {
    idx > 0
        && idx + 1 < chars.len()
        && chars[idx - 1].is_ascii_digit()
        && chars[idx + 1].is_ascii_digit()
}

fn is_ticker_middle(chars: &[char], idx: usize) -> bool {
    idx > 0
        && idx + 1 < chars.len()
        && is_ticker_char(chars[idx - 1])
        && is_ticker_char(chars[idx + 1])
}

fn is_ticker_char(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch.is_ascii_digit()
}

/// Sum of absolute components.
pub fn l1_norm(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v.abs()).sum()
}

/// Euclidean length.
pub fn l2_norm(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// `1 - cos(left, right)`; zero-length inputs are treated as maximally distant.
pub fn cosine_distance(left: &[f64], right: &[f64]) -> f64 {
    let denom = l2_norm(left) * l2_norm(right);
    if denom == 0.0 {
        return 1.0;
    }
    let dot: f64 = left.iter().zip(right).map(|(l, r)| l * r).sum();
    1.0 - dot / denom
}

/// Element-wise `left - right`.
pub fn difference(left: &[f64], right: &[f64]) -> Vector {
    left.iter().zip(right).map(|(l, r)| l - r).collect()
}

/// Deduplication key that rounds every component to `decimals` digits.
///
/// Near-identical vectors collapse onto the same key.
pub fn rounded_key(vector: &[f64], decimals: usize) -> String {
    vector
        .iter()
        .map(|value| {
            let rendered = format!("{value:.decimals$}");
            // -0.0000 and 0.0000 must collide
            if rendered.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
                rendered.trim_start_matches('-').to_string()
            } else {
                rendered
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
