//! Lazy record-stream primitives and the chaining extension trait.
//!
//! A stream is any `Iterator<Item = Record>`. Each stage pulls one upstream
//! record on demand; nothing runs ahead of the consumer unless a stage says
//! it materializes (see [`RecordStreamExt::materialize`] and the
//! [`crate::aggregate`] pipes, which take a [`RecordBuffer`]).

use std::path::Path;

use crate::data::{Record, RecordBuffer, Value};
use crate::indexer::Indexer;
use crate::pipes;
use crate::resources::{SentenceSplitter, StopWords, TokenStemmer};
use crate::types::AttrName;

/// Yield every record by identity.
///
/// Stages own the records they receive, so upstream data can never be
/// mutated behind a caller's back. Use [`copied`] to stream from records the
/// caller wants to keep.
pub fn pass_through<I>(stream: I) -> impl Iterator<Item = Record>
where
    I: IntoIterator<Item = Record>,
{
    stream.into_iter()
}

/// Yield a copy of each borrowed record, leaving the originals untouched.
pub fn copied<'a, I>(stream: I) -> impl Iterator<Item = Record> + 'a
where
    I: IntoIterator<Item = &'a Record>,
    I::IntoIter: 'a,
{
    stream.into_iter().cloned()
}

/// Yield from each stream in turn, never interleaving.
pub fn concat<S, I>(streams: S) -> impl Iterator<Item = Record>
where
    S: IntoIterator<Item = I>,
    I: IntoIterator<Item = Record>,
{
    streams.into_iter().flatten()
}

/// Project one attribute per record, substituting `default` when absent.
pub fn select_attr<I>(stream: I, attr: &str, default: Value) -> impl Iterator<Item = Value> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let attr = attr.to_string();
    stream.into_iter().map(move |mut record| {
        record.remove(&attr).unwrap_or_else(|| default.clone())
    })
}

/// Project several attributes per record, in `attrs` order.
pub fn select_attr_list<I>(
    stream: I,
    attrs: &[&str],
    default: Value,
) -> impl Iterator<Item = Vec<Value>> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let attrs: Vec<AttrName> = attrs.iter().map(|attr| attr.to_string()).collect();
    stream.into_iter().map(move |record| {
        attrs
            .iter()
            .map(|attr| record.get(attr).cloned().unwrap_or_else(|| default.clone()))
            .collect()
    })
}

/// Method-chaining adapters over any record stream.
///
/// Every method forwards to the free function of the same name in
/// [`crate::pipes`], so `stream.lower("data").tokenize_default("data")` reads
/// in pipeline order.
pub trait RecordStreamExt: Iterator<Item = Record> + Sized {
    /// Force the whole stream into memory.
    ///
    /// This is the only synchronization point; aggregation pipes require it.
    fn materialize(self) -> RecordBuffer {
        self.collect()
    }

    /// See [`pipes::rename_attr`].
    fn rename_attr(self, attr: &str, new_name: &str) -> impl Iterator<Item = Record> {
        pipes::rename_attr(self, attr, new_name)
    }

    /// See [`pipes::retain_attrs`].
    fn retain_attrs(self, attrs: &[&str]) -> impl Iterator<Item = Record> {
        pipes::retain_attrs(self, attrs)
    }

    /// See [`pipes::combine_attrs`].
    fn combine_attrs(
        self,
        attrs: &[&str],
        dest: &str,
        delimiter: &str,
    ) -> impl Iterator<Item = Record> {
        pipes::combine_attrs(self, attrs, dest, delimiter)
    }

    /// See [`pipes::split_attr`].
    fn split_attr(self, attr: &str, delimiter: &str) -> impl Iterator<Item = Record> {
        pipes::split_attr(self, attr, delimiter)
    }

    /// See [`pipes::flatten`].
    fn flatten_list(self, attr: &str) -> impl Iterator<Item = Record> {
        pipes::flatten(self, attr)
    }

    /// See [`pipes::append_file_content`].
    fn append_file_content(
        self,
        base_dir: &Path,
        filepath_attr: &str,
        dest_attr: &str,
        encoding: Option<&str>,
    ) -> impl Iterator<Item = Record> {
        pipes::append_file_content(self, base_dir, filepath_attr, dest_attr, encoding)
    }

    /// See [`pipes::lower`].
    fn lower(self, attr: &str) -> impl Iterator<Item = Record> {
        pipes::lower(self, attr)
    }

    /// See [`pipes::strip`].
    fn strip(self, attr: &str) -> impl Iterator<Item = Record> {
        pipes::strip(self, attr)
    }

    /// See [`pipes::strip_email_header`].
    fn strip_email_header(self, attr: &str) -> impl Iterator<Item = Record> {
        pipes::strip_email_header(self, attr)
    }

    /// See [`pipes::split_sentences`].
    fn split_sentences(self, attr: &str, splitter: &SentenceSplitter) -> impl Iterator<Item = Record> {
        pipes::split_sentences(self, attr, splitter)
    }

    /// See [`pipes::tokenize_default`].
    fn tokenize_default(self, attr: &str) -> impl Iterator<Item = Record> {
        pipes::tokenize_default(self, attr)
    }

    /// See [`pipes::remove_short_tokens`].
    fn remove_short_tokens(self, attr: &str, min_len: usize) -> impl Iterator<Item = Record> {
        pipes::remove_short_tokens(self, attr, min_len)
    }

    /// See [`pipes::remove_stopwords`].
    fn remove_stopwords(self, attr: &str, stopwords: &StopWords) -> impl Iterator<Item = Record> {
        pipes::remove_stopwords(self, attr, stopwords)
    }

    /// See [`pipes::stem`].
    fn stem(self, attr: &str, stemmer: &TokenStemmer) -> impl Iterator<Item = Record> {
        pipes::stem(self, attr, stemmer)
    }

    /// See [`pipes::tokens_to_bow`].
    fn tokens_to_bow(self, attr: &str, indexer: &mut Indexer) -> impl Iterator<Item = Record> {
        pipes::tokens_to_bow(self, attr, indexer)
    }
}

impl<I: Iterator<Item = Record>> RecordStreamExt for I {}

#[cfg(test)]
mod tests {
    use super::*;

    fn workers() -> Vec<Record> {
        ["1", "1", "2"]
            .into_iter()
            .enumerate()
            .map(|(idx, worker)| {
                Record::new()
                    .with("worker", worker)
                    .with("row", idx as i64)
            })
            .collect()
    }

    #[test]
    fn concat_preserves_per_stream_order_without_interleaving() {
        let rows: Vec<Record> = concat([workers(), workers()]).collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], workers()[0]);
        assert_eq!(rows[3], workers()[0]);
        assert_eq!(rows[5], workers()[2]);
    }

    #[test]
    fn copied_leaves_source_records_untouched() {
        let originals = workers();
        let renamed: Vec<Record> = copied(&originals).rename_attr("worker", "annotator").collect();
        assert!(renamed.iter().all(|record| record.contains("annotator")));
        assert!(originals.iter().all(|record| record.contains("worker")));
    }

    #[test]
    fn select_attr_substitutes_default() {
        let mut rows = workers();
        rows[1].remove("worker");
        let values: Vec<Value> = select_attr(rows, "worker", Value::Null).collect();
        assert_eq!(values, vec![Value::from("1"), Value::Null, Value::from("2")]);
    }

    #[test]
    fn select_attr_list_projects_in_requested_order() {
        let values: Vec<Vec<Value>> =
            select_attr_list(workers(), &["row", "worker", "missing"], Value::Null).collect();
        assert_eq!(
            values[2],
            vec![Value::from(2_i64), Value::from("2"), Value::Null]
        );
    }

    #[test]
    fn pass_through_is_identity() {
        let rows: Vec<Record> = pass_through(workers()).collect();
        assert_eq!(rows, workers());
    }
}
