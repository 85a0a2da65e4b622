use std::path::{Path, PathBuf};

use crate::constants::attrs::{DATA, LABEL, SOURCE};
use crate::constants::combos::{BOW_MIN_COUNT, BOW_MIN_TOKEN_LEN, SENTENCE_MIN_TOKEN_LEN};
use crate::types::AttrName;

/// Where a dataset lives and how its records are named.
#[derive(Clone, Debug)]
pub struct CorpusConfig {
    /// Root that document paths in index files are relative to.
    pub base_dir: PathBuf,
    /// Directory of index files (usually inside `base_dir`).
    pub split_dir: PathBuf,
    /// Attribute holding each document's relative path.
    pub filepath_attr: AttrName,
    /// Attribute holding each document's index label.
    pub label_attr: AttrName,
    /// Attribute that receives document content.
    pub data_attr: AttrName,
    /// Encoding label for index files (`None` auto-detects).
    pub index_encoding: Option<String>,
    /// Encoding label for document files (`None` auto-detects).
    pub content_encoding: Option<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            split_dir: PathBuf::from("."),
            filepath_attr: SOURCE.to_string(),
            label_attr: LABEL.to_string(),
            data_attr: DATA.to_string(),
            index_encoding: None,
            content_encoding: None,
        }
    }
}

impl CorpusConfig {
    /// Corpus rooted at `base_dir` with index files under `split_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, split_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            split_dir: split_dir.into(),
            ..Self::default()
        }
    }

    /// Attribute holding each document's relative path.
    pub fn with_filepath_attr(mut self, attr: impl Into<AttrName>) -> Self {
        self.filepath_attr = attr.into();
        self
    }

    /// Attribute holding each document's index label.
    pub fn with_label_attr(mut self, attr: impl Into<AttrName>) -> Self {
        self.label_attr = attr.into();
        self
    }

    /// Attribute that receives document content.
    pub fn with_data_attr(mut self, attr: impl Into<AttrName>) -> Self {
        self.data_attr = attr.into();
        self
    }

    /// Encoding label for index files.
    pub fn with_index_encoding(mut self, encoding: Option<String>) -> Self {
        self.index_encoding = encoding;
        self
    }

    /// Encoding label for document files.
    pub fn with_content_encoding(mut self, encoding: Option<String>) -> Self {
        self.content_encoding = encoding;
        self
    }

    /// Root directory as a path.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Token filtering for the bag-of-words combo.
#[derive(Clone, Copy, Debug)]
pub struct BowConfig {
    /// Tokens shorter than this many characters are dropped.
    pub min_token_len: usize,
    /// Tokens seen fewer times than this across the corpus are dropped.
    pub min_count: usize,
}

impl Default for BowConfig {
    fn default() -> Self {
        Self {
            min_token_len: BOW_MIN_TOKEN_LEN,
            min_count: BOW_MIN_COUNT,
        }
    }
}

impl BowConfig {
    /// Minimum token length in characters.
    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }

    /// Minimum corpus-wide token count.
    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }
}

/// Token filtering for the sentence combos.
#[derive(Clone, Copy, Debug)]
pub struct SentenceConfig {
    /// Tokens shorter than this many characters are dropped.
    pub min_token_len: usize,
}

impl Default for SentenceConfig {
    fn default() -> Self {
        Self {
            min_token_len: SENTENCE_MIN_TOKEN_LEN,
        }
    }
}

impl SentenceConfig {
    /// Minimum token length in characters.
    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }
}
