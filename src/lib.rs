#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Two-pass aggregation pipes over materialized buffers.
pub mod aggregate;
/// Command-line front end used by the `datautils` binary.
pub mod cli;
/// Named end-to-end pipelines.
pub mod combos;
/// Corpus and combo configuration types.
pub mod config;
/// Centralized constants used across pipes, combos, and vectors.
pub mod constants;
/// Record, value, and buffer types.
pub mod data;
/// First-seen key-to-id table.
pub mod indexer;
/// Output dataset layout.
pub mod output;
/// Single-pass transform pipes.
pub mod pipes;
/// Shared read-only resources (stopwords, sentence splitter, stemmer).
pub mod resources;
/// Record sources.
pub mod source;
/// Stream primitives and method-chaining adapters.
pub mod stream;
/// Input transports used by sources and content pipes.
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text and vector helpers.
pub mod utils;
/// Vector-model boundary and lookup pipes.
pub mod vectors;

mod errors;

pub use aggregate::{
    CombineFeatures, Threshold, VoteCounts, VoteMap, count_cutoff, group_by_attrs, majority_label,
    mean_value, pca_combine_embeddings, threshold,
};
pub use config::{BowConfig, CorpusConfig, SentenceConfig};
pub use data::{Record, RecordBuffer, Value};
pub use errors::{PipeError, Result};
pub use indexer::Indexer;
pub use resources::{SentenceSplitter, StopWords, TokenStemmer};
pub use source::{
    CsvSource, IndexSource, JsonSource, RecordIter, RecordSource, input_csv, input_index,
    input_json,
};
pub use stream::{RecordStreamExt, concat, copied, pass_through, select_attr, select_attr_list};
pub use types::{
    AttrName, BowEntry, FeatureId, GroupKey, ModelKey, PathString, Sentence, Token, Vector,
};
pub use vectors::{EmbeddingTable, TableTrainer, VectorModel, VectorModelTrainer};
