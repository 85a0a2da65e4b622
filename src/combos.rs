//! Named end-to-end pipelines built from the primitive pipes.

use std::path::Path;

use tracing::info;

use crate::aggregate::{count_cutoff, group_by_attrs};
use crate::config::{BowConfig, CorpusConfig, SentenceConfig};
use crate::constants::attrs::{DATAPATH, JSON_GROUP_BY};
use crate::data::{Record, RecordBuffer, Value};
use crate::errors::Result;
use crate::indexer::Indexer;
use crate::pipes;
use crate::resources::{SentenceSplitter, StopWords, TokenStemmer};
use crate::source::{input_index, input_json};
use crate::stream::RecordStreamExt;

/// Documents referenced by `filepath_attr` become one record per sentence,
/// with `data_attr` holding that sentence's lowercase tokens.
///
/// Stages: read content, strip the email header, split sentences, flatten,
/// lowercase, tokenize, drop tokens shorter than `config.min_token_len`.
pub fn filepath_to_sentences<'a, I>(
    stream: I,
    base_dir: &Path,
    filepath_attr: &str,
    data_attr: &str,
    encoding: Option<&str>,
    splitter: &'a SentenceSplitter,
    config: &SentenceConfig,
) -> impl Iterator<Item = Record> + use<'a, I>
where
    I: IntoIterator<Item = Record>,
{
    let stream = pipes::append_file_content(stream, base_dir, filepath_attr, data_attr, encoding);
    let stream = pipes::strip_email_header(stream, data_attr);
    let stream = pipes::split_sentences(stream, data_attr, splitter);
    let stream = pipes::flatten(stream, data_attr);
    let stream = pipes::lower(stream, data_attr);
    let stream = pipes::tokenize_default(stream, data_attr);
    pipes::remove_short_tokens(stream, data_attr, config.min_token_len)
}

/// Sentence records for every document listed under `corpus.split_dir`.
pub fn index_to_sentences<'a>(
    corpus: &CorpusConfig,
    config: &SentenceConfig,
    splitter: &'a SentenceSplitter,
) -> Result<impl Iterator<Item = Record> + use<'a>> {
    info!(
        split = %corpus.split_dir.display(),
        "[datautils:combos] building sentence stream from index"
    );
    let stream = input_index(
        &corpus.split_dir,
        &corpus.filepath_attr,
        &corpus.label_attr,
        corpus.index_encoding.as_deref(),
    )?;
    Ok(filepath_to_sentences(
        stream,
        &corpus.base_dir,
        &corpus.filepath_attr,
        &corpus.data_attr,
        corpus.content_encoding.as_deref(),
        splitter,
        config,
    ))
}

/// Sentence records for the documents of a JSON annotation file.
///
/// Annotations are first grouped by document (`source`, `datapath`,
/// `label`, `labelobserved`), so each document is read once; the
/// `datapath` attribute locates its content under `corpus.base_dir`.
pub fn json_to_sentences<'a>(
    corpus: &CorpusConfig,
    json_path: &Path,
    config: &SentenceConfig,
    splitter: &'a SentenceSplitter,
) -> Result<impl Iterator<Item = Record> + use<'a>> {
    let annotations: RecordBuffer = input_json(json_path, corpus.index_encoding.as_deref())?.collect();
    let documents = group_by_attrs(annotations, &JSON_GROUP_BY, Value::Null);
    info!(
        annotations = %json_path.display(),
        documents = documents.len(),
        "[datautils:combos] grouped annotations by document"
    );
    Ok(filepath_to_sentences(
        documents,
        &corpus.base_dir,
        DATAPATH,
        &corpus.data_attr,
        corpus.content_encoding.as_deref(),
        splitter,
        config,
    ))
}

/// Bag-of-words records for every document listed under `corpus.split_dir`.
///
/// Stages: read content, lowercase, strip the email header, tokenize, drop
/// short tokens, drop stopwords, stem, then (buffered) drop tokens rarer
/// than `config.min_count` corpus-wide and convert to `(id, count)` pairs
/// through `indexer`. The caller keeps `indexer` for id-to-word lookups.
pub fn index_to_bow(
    corpus: &CorpusConfig,
    config: &BowConfig,
    stopwords: &StopWords,
    stemmer: &TokenStemmer,
    indexer: &mut Indexer,
) -> Result<RecordBuffer> {
    let data = corpus.data_attr.as_str();
    let tokens = input_index(
        &corpus.split_dir,
        &corpus.filepath_attr,
        &corpus.label_attr,
        corpus.index_encoding.as_deref(),
    )?
    .append_file_content(
        &corpus.base_dir,
        &corpus.filepath_attr,
        data,
        corpus.content_encoding.as_deref(),
    )
    .lower(data)
    .strip_email_header(data)
    .tokenize_default(data)
    .remove_short_tokens(data, config.min_token_len)
    .remove_stopwords(data, stopwords)
    .stem(data, stemmer)
    .materialize();

    let documents = tokens.len();
    let filtered = count_cutoff(tokens, data, config.min_count);
    let bow: RecordBuffer = filtered.into_iter().tokens_to_bow(data, indexer).collect();
    info!(
        documents,
        vocabulary = indexer.size(),
        "[datautils:combos] built bag-of-words corpus"
    );
    Ok(bow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    fn dataset() -> (TempDir, CorpusConfig) {
        let temp = tempdir().unwrap();
        let base = temp.path().to_path_buf();
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(
            docs.join("a.txt"),
            "From: someone\nSubject: hi\n\nOnce upon a time. Planet rocket planet!",
        )
        .unwrap();
        fs::write(docs.join("b.txt"), "Header: x\n\nPlanet comet.").unwrap();
        let split = base.join("split");
        fs::create_dir_all(&split).unwrap();
        fs::write(split.join("space"), "docs/a.txt\ndocs/b.txt\ndocs/missing.txt\n").unwrap();
        let corpus = CorpusConfig::new(base, split);
        (temp, corpus)
    }

    fn tokens(record: &Record) -> Vec<String> {
        record.get("data").and_then(Value::to_tokens).unwrap()
    }

    #[test]
    fn index_to_sentences_yields_token_lists_per_sentence() {
        let (_temp, corpus) = dataset();
        let splitter = SentenceSplitter::default();
        let records: Vec<Record> =
            index_to_sentences(&corpus, &SentenceConfig::default(), &splitter)
                .unwrap()
                .collect();
        let sentences: Vec<Vec<String>> = records.iter().map(tokens).collect();
        assert_eq!(
            sentences,
            vec![
                vec!["once", "upon", "a", "time"],
                vec!["planet", "rocket", "planet"],
                vec!["planet", "comet"],
            ]
        );
        assert!(records.iter().all(|record| record.text("label") == Some("space")));
        assert_eq!(records[2].text("source"), Some("docs/b.txt"));
    }

    #[test]
    fn json_to_sentences_reads_each_document_once() {
        let (temp, corpus) = dataset();
        let json: PathBuf = temp.path().join("annotations.json");
        fs::write(
            &json,
            r#"[
                {"source": "s1", "datapath": "docs/b.txt", "label": "yes", "labelobserved": "yes", "annotation": "x"},
                {"source": "s1", "datapath": "docs/b.txt", "label": "yes", "labelobserved": "yes", "annotation": "y"}
            ]"#,
        )
        .unwrap();
        let splitter = SentenceSplitter::default();
        let records: Vec<Record> =
            json_to_sentences(&corpus, &json, &SentenceConfig::default(), &splitter)
                .unwrap()
                .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(tokens(&records[0]), vec!["planet", "comet"]);
        assert_eq!(
            records[0].get("annotation"),
            Some(&Value::from(vec!["x", "y"]))
        );
    }

    #[test]
    fn index_to_bow_filters_rare_words_and_shares_the_indexer() {
        let (_temp, corpus) = dataset();
        let mut indexer = Indexer::new();
        let bow = index_to_bow(
            &corpus,
            &BowConfig::default().with_min_count(2),
            &StopWords::default(),
            &TokenStemmer::default(),
            &mut indexer,
        )
        .unwrap();
        assert_eq!(bow.len(), 2);
        assert_eq!(bow[0].get("data"), Some(&Value::Bow(vec![(0, 2)])));
        assert_eq!(bow[1].get("data"), Some(&Value::Bow(vec![(0, 1)])));
        assert_eq!(indexer.size(), 1);
        assert_eq!(indexer.key_of(0).map(String::as_str), Some("planet"));
    }
}
