//! Read-only linguistic resources injected into pipes.
//!
//! Each resource is loaded once (usually at process start) and then shared
//! by reference; pipes never reach for global state.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use rust_stemmers::{Algorithm, Stemmer};

use crate::constants::text::DEFAULT_STOPWORDS;
use crate::errors::Result;
use crate::transport::fs::read_text;
use crate::types::{Sentence, Token};
use crate::utils::{is_sentence_boundary, normalize_inline_whitespace};

/// Immutable stop-word set.
#[derive(Clone, Debug)]
pub struct StopWords {
    words: HashSet<String>,
}

impl Default for StopWords {
    /// The bundled English list.
    fn default() -> Self {
        Self::from_text(DEFAULT_STOPWORDS)
    }
}

impl StopWords {
    /// Parse whitespace-separated words.
    pub fn from_text(text: &str) -> Self {
        text.split_whitespace().map(str::to_string).collect()
    }

    /// Load a stop-word file, decoding with `encoding` or auto-detection.
    pub fn from_path(path: impl AsRef<Path>, encoding: Option<&str>) -> Result<Self> {
        let text = read_text(path.as_ref(), encoding)?;
        Ok(Self::from_text(&text))
    }

    /// Case-sensitive membership test.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Number of stopwords.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when the list is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Heuristic sentence-boundary detector.
///
/// Blank lines always end a sentence. Inside a block, `.`, `!`, and `?`
/// end a sentence unless the dot sits inside a decimal number, a ticker
/// (`BRK.B`), an ellipsis, or follows a known abbreviation.
#[derive(Clone, Debug)]
pub struct SentenceSplitter {
    abbreviations: HashSet<String>,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new([
            "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc",
            "ltd", "co", "fig", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
            "sept", "oct", "nov", "dec",
        ])
    }
}

impl SentenceSplitter {
    /// Create a splitter with a custom abbreviation list (matched lowercase, without the trailing dot).
    pub fn new<S: AsRef<str>>(abbreviations: impl IntoIterator<Item = S>) -> Self {
        Self {
            abbreviations: abbreviations
                .into_iter()
                .map(|abbr| abbr.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Split `text` into trimmed, whitespace-normalized sentences.
    pub fn split(&self, text: &str) -> Vec<Sentence> {
        let mut results = Vec::new();
        for block in text.split("\n\n") {
            let normalized = normalize_inline_whitespace(block);
            if normalized.is_empty() {
                continue;
            }
            self.push_block_sentences(&normalized, &mut results);
        }
        results
    }

    fn push_block_sentences(&self, block: &str, results: &mut Vec<Sentence>) {
        let chars: Vec<char> = block.chars().collect();
        let mut buffer = String::new();

        for (idx, ch) in chars.iter().enumerate() {
            buffer.push(*ch);
            if is_sentence_boundary(&chars, idx, |word| self.abbreviations.contains(word)) {
                let trimmed = buffer.trim();
                if !trimmed.is_empty() {
                    results.push(trimmed.to_string());
                }
                buffer.clear();
            }
        }

        let trailing = buffer.trim();
        if !trailing.is_empty() {
            results.push(trailing.to_string());
        }
    }
}

/// English (Porter-family) token stemmer.
pub struct TokenStemmer {
    inner: Stemmer,
}

impl Default for TokenStemmer {
    fn default() -> Self {
        Self {
            inner: Stemmer::create(Algorithm::English),
        }
    }
}

impl TokenStemmer {
    /// Stem of `token`.
    pub fn stem(&self, token: &str) -> Token {
        self.inner.stem(token).into_owned()
    }
}

impl fmt::Debug for TokenStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStemmer")
            .field("algorithm", &"english")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPH: &str = "Call me Ishmael. Some years ago—never mind how long precisely—having little or no money in my purse, and nothing particular to interest me on shore, I thought I would sail about a little and see the watery part of the world. It is a way I have of driving off the spleen and regulating the circulation. Whenever I find myself growing grim about the mouth; whenever it is a damp, drizzly November in my soul; whenever I find myself involuntarily pausing before coffin warehouses, and bringing up the rear of every funeral I meet; and especially whenever my hypos get such an upper hand of me, that it requires a strong moral principle to prevent me from deliberately stepping into the street, and methodically knocking people's hats off—then, I account it high time to get to sea as soon as I can. This is my substitute for pistol and ball. With a philosophical flourish Cato throws himself upon his sword; I quietly take to the ship. There is nothing surprising in this. If they but knew it, almost all men in their degree, some time or other, cherish very nearly the same feelings towards the ocean with me.";

    #[test]
    fn default_stopwords_cover_common_function_words() {
        let stopwords = StopWords::default();
        for word in ["a", "upon", "the", "in", "far", "away"] {
            assert!(stopwords.contains(word), "{word} should be a stop word");
        }
        assert!(!stopwords.contains("galaxy"));
        assert!(!stopwords.contains("Once"));
    }

    #[test]
    fn splitter_finds_eight_sentences_in_opening_paragraph() {
        let sentences = SentenceSplitter::default().split(PARAGRAPH);
        assert_eq!(sentences.len(), 8);
        assert_eq!(sentences[0], "Call me Ishmael.");
        assert_eq!(sentences[4], "This is my substitute for pistol and ball.");
    }

    #[test]
    fn splitter_respects_abbreviations_and_blank_lines() {
        let splitter = SentenceSplitter::default();
        let sentences = splitter.split("Ask Dr. Smith about it\n\nThen leave. Quickly!");
        assert_eq!(
            sentences,
            vec!["Ask Dr. Smith about it", "Then leave.", "Quickly!"]
        );
    }

    #[test]
    fn stemmer_reduces_inflections() {
        let stemmer = TokenStemmer::default();
        let stems: Vec<Token> = ["jumps", "over", "the", "lazy", "dog"]
            .iter()
            .map(|token| stemmer.stem(token))
            .collect();
        assert_eq!(stems, vec!["jump", "over", "the", "lazi", "dog"]);
    }
}
