use indexmap::IndexMap;
use tracing::debug;

use super::transform_tokens;
use crate::data::{Record, Value};
use crate::indexer::Indexer;
use crate::resources::{StopWords, TokenStemmer};
use crate::types::{BowEntry, FeatureId};

/// Drop tokens shorter than `min_len` characters, preserving order.
pub fn remove_short_tokens<I>(stream: I, attr: &str, min_len: usize) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    transform_tokens(stream, attr, "remove_short_tokens", move |tokens| {
        let kept: Vec<String> = tokens
            .into_iter()
            .filter(|token| {
                let keep = token.chars().count() >= min_len;
                if !keep {
                    debug!(token = %token, "[datautils:tokens] removing short token");
                }
                keep
            })
            .collect();
        Value::from(kept)
    })
}

/// Drop tokens found in `stopwords` (case-sensitive), preserving order.
pub fn remove_stopwords<'a, I>(
    stream: I,
    attr: &str,
    stopwords: &'a StopWords,
) -> impl Iterator<Item = Record> + use<'a, I>
where
    I: IntoIterator<Item = Record>,
{
    transform_tokens(stream, attr, "remove_stopwords", move |tokens| {
        let kept: Vec<String> = tokens
            .into_iter()
            .filter(|token| {
                let stop = stopwords.contains(token);
                if stop {
                    debug!(token = %token, "[datautils:tokens] removing stopword");
                }
                !stop
            })
            .collect();
        Value::from(kept)
    })
}

/// Replace every token with its stem.
pub fn stem<'a, I>(
    stream: I,
    attr: &str,
    stemmer: &'a TokenStemmer,
) -> impl Iterator<Item = Record> + use<'a, I>
where
    I: IntoIterator<Item = Record>,
{
    transform_tokens(stream, attr, "stem", move |tokens| {
        let stems: Vec<String> = tokens.iter().map(|token| stemmer.stem(token)).collect();
        Value::from(stems)
    })
}

/// Replace the token list at `attr` with `(feature id, count)` pairs.
///
/// Ids come from the shared `indexer`, which gains every unseen token.
/// Counts are per record. Pairs follow each token's first occurrence in the
/// record.
pub fn tokens_to_bow<'a, I>(
    stream: I,
    attr: &str,
    indexer: &'a mut Indexer,
) -> impl Iterator<Item = Record> + use<'a, I>
where
    I: IntoIterator<Item = Record>,
{
    transform_tokens(stream, attr, "tokens_to_bow", move |tokens| {
        Value::Bow(bag_of_words(tokens, indexer))
    })
}

fn bag_of_words(tokens: Vec<String>, indexer: &mut Indexer) -> Vec<BowEntry> {
    let mut counts: IndexMap<FeatureId, usize> = IndexMap::new();
    for token in tokens {
        *counts.entry(indexer.index_of(token)).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}
