use std::error::Error;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum, error::ErrorKind};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{majority_label, threshold};
use crate::combos::{index_to_bow, index_to_sentences, json_to_sentences};
use crate::config::{BowConfig, CorpusConfig, SentenceConfig};
use crate::constants::aggregation::MAJORITY_MIN_COUNT;
use crate::constants::attrs::{ANNOTATION, DATA, LABEL, SOURCE};
use crate::data::{Record, RecordBuffer};
use crate::indexer::Indexer;
use crate::output::{copy_index, write_vector_dataset};
use crate::resources::{SentenceSplitter, StopWords, TokenStemmer};
use crate::source::{CsvSource, RecordIter, RecordSource, input_index, input_json};
use crate::stream::RecordStreamExt;
use crate::types::Vector;
use crate::vectors::{EmbeddingTable, average_word_vectors, document_vectors};

#[derive(Debug, Parser)]
#[command(
    name = "datautils",
    disable_help_subcommand = true,
    about = "Prepare annotated text datasets for vectorization",
    after_help = "Set RUST_LOG (for example RUST_LOG=datautils=debug) to see per-record decisions."
)]
struct DatautilsCli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index split to bag-of-words records plus an id-to-word vocabulary.
    Bow(BowArgs),
    /// Index split or JSON annotations to tokenized sentence records.
    Sentences(SentencesArgs),
    /// Documents to vectors through a stored embedding table.
    Vectorize(VectorizeArgs),
    /// Annotation stream to majority labels, with optional thresholding.
    Annotations(AnnotationsArgs),
}

#[derive(Debug, Args)]
struct CorpusArgs {
    #[arg(long = "base-dir", value_name = "DIR", help = "Root that document paths are relative to")]
    base_dir: PathBuf,
    #[arg(long = "split-dir", value_name = "DIR", help = "Directory of index files")]
    split_dir: Option<PathBuf>,
    #[arg(long = "index-encoding", help = "Encoding label for index files (auto-detected when omitted)")]
    index_encoding: Option<String>,
    #[arg(long = "content-encoding", help = "Encoding label for documents (auto-detected when omitted)")]
    content_encoding: Option<String>,
}

impl CorpusArgs {
    fn to_config(&self) -> Result<CorpusConfig, Box<dyn Error>> {
        let Some(split_dir) = &self.split_dir else {
            return Err("--split-dir is required for this command".into());
        };
        Ok(CorpusConfig::new(&self.base_dir, split_dir)
            .with_index_encoding(self.index_encoding.clone())
            .with_content_encoding(self.content_encoding.clone()))
    }
}

#[derive(Debug, Args)]
struct BowArgs {
    #[command(flatten)]
    corpus: CorpusArgs,
    #[arg(long = "min-count", default_value_t = BowConfig::default().min_count, help = "Drop tokens seen fewer times corpus-wide")]
    min_count: usize,
    #[arg(long = "min-token-len", default_value_t = BowConfig::default().min_token_len, help = "Drop tokens shorter than this")]
    min_token_len: usize,
    #[arg(long, value_name = "PATH", help = "Stopword list, one word per line (built-in list when omitted)")]
    stopwords: Option<PathBuf>,
    #[arg(long, short, value_name = "PATH", help = "Output JSON path (stdout when omitted)")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SentencesArgs {
    #[command(flatten)]
    corpus: CorpusArgs,
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "split_dir",
        help = "JSON annotation file whose documents are read instead of an index split"
    )]
    annotations: Option<PathBuf>,
    #[arg(long = "min-token-len", default_value_t = SentenceConfig::default().min_token_len, help = "Drop tokens shorter than this")]
    min_token_len: usize,
    #[arg(long, short, value_name = "PATH", help = "Output JSON path (stdout when omitted)")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VectorMethod {
    /// Average the vectors of each document's words.
    Words,
    /// Look up each document's own vector by id.
    Documents,
}

#[derive(Debug, Args)]
struct VectorizeArgs {
    #[command(flatten)]
    corpus: CorpusArgs,
    #[arg(long, value_name = "PATH", help = "Embedding table (.json or word2vec text)")]
    model: PathBuf,
    #[arg(long, value_enum, default_value_t = VectorMethod::Words)]
    method: VectorMethod,
    #[arg(long = "out-dir", value_name = "DIR", help = "Root of the output dataset")]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
struct AnnotationsArgs {
    #[arg(long, value_name = "PATH", help = "Annotation file (.csv or .tsv as tables, anything else as JSON)")]
    input: PathBuf,
    #[arg(long, help = "Encoding label for the input (auto-detected when omitted)")]
    encoding: Option<String>,
    #[arg(long, default_value = ANNOTATION, help = "Attribute holding each vote")]
    attr: String,
    #[arg(long = "source-attr", default_value = SOURCE, help = "Attribute identifying the annotated item")]
    source_attr: String,
    #[arg(long = "dest-attr", default_value = LABEL, help = "Attribute receiving the majority value")]
    dest_attr: String,
    #[arg(long = "min-count", default_value_t = MAJORITY_MIN_COUNT, help = "Votes required before a label is attached")]
    min_count: usize,
    #[arg(long, help = "Seed for tie-breaking (random when omitted)")]
    seed: Option<u64>,
    #[arg(long = "threshold-attr", requires_all = ["levels", "names"], help = "Numeric attribute to bucket")]
    threshold_attr: Option<String>,
    #[arg(long = "threshold-dest", help = "Attribute receiving the bucket name (defaults to the threshold attribute)")]
    threshold_dest: Option<String>,
    #[arg(long, value_delimiter = ',', help = "Ascending bucket boundaries, comma-separated")]
    levels: Vec<f64>,
    #[arg(long, value_delimiter = ',', help = "Bucket names, one more than the levels")]
    names: Vec<String>,
    #[arg(long, short, value_name = "PATH", help = "Output JSON path (stdout when omitted)")]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct BowOutput<'a> {
    records: &'a RecordBuffer,
    vocabulary: Vec<&'a String>,
}

/// Entry point for the `datautils` binary.
///
/// `args_iter` excludes the program name. Help and version requests print
/// and return `Ok(())`.
pub fn run<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<DatautilsCli, _>(std::iter::once("datautils".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    match cli.command {
        Command::Bow(args) => run_bow(args),
        Command::Sentences(args) => run_sentences(args),
        Command::Vectorize(args) => run_vectorize(args),
        Command::Annotations(args) => run_annotations(args),
    }
}

fn run_bow(args: BowArgs) -> Result<(), Box<dyn Error>> {
    let corpus = args.corpus.to_config()?;
    let config = BowConfig::default()
        .with_min_count(args.min_count)
        .with_min_token_len(args.min_token_len);
    let stopwords = match &args.stopwords {
        Some(path) => StopWords::from_path(path, None)?,
        None => StopWords::default(),
    };
    let mut indexer = Indexer::new();
    let records = index_to_bow(
        &corpus,
        &config,
        &stopwords,
        &TokenStemmer::default(),
        &mut indexer,
    )?;
    let output = BowOutput {
        records: &records,
        vocabulary: indexer.keys().collect(),
    };
    write_json(args.output.as_deref(), &output)
}

fn run_sentences(args: SentencesArgs) -> Result<(), Box<dyn Error>> {
    let config = SentenceConfig::default().with_min_token_len(args.min_token_len);
    let splitter = SentenceSplitter::default();
    let records: RecordBuffer = match &args.annotations {
        Some(json_path) => {
            let corpus = CorpusConfig::new(&args.corpus.base_dir, &args.corpus.base_dir)
                .with_index_encoding(args.corpus.index_encoding.clone())
                .with_content_encoding(args.corpus.content_encoding.clone());
            json_to_sentences(&corpus, json_path, &config, &splitter)?.materialize()
        }
        None => {
            let corpus = args.corpus.to_config()?;
            index_to_sentences(&corpus, &config, &splitter)?.materialize()
        }
    };
    info!(sentences = records.len(), "[datautils:cli] built sentence records");
    write_json(args.output.as_deref(), &records)
}

fn run_vectorize(args: VectorizeArgs) -> Result<(), Box<dyn Error>> {
    let corpus = args.corpus.to_config()?;
    let model = EmbeddingTable::load(&args.model)?;
    let filepath_attr = corpus.filepath_attr.as_str();
    let documents = input_index(
        &corpus.split_dir,
        filepath_attr,
        &corpus.label_attr,
        corpus.index_encoding.as_deref(),
    )?;
    let records: RecordBuffer = match args.method {
        VectorMethod::Words => {
            let tokens = documents
                .append_file_content(
                    &corpus.base_dir,
                    filepath_attr,
                    DATA,
                    corpus.content_encoding.as_deref(),
                )
                .strip_email_header(DATA)
                .lower(DATA)
                .tokenize_default(DATA)
                .remove_short_tokens(DATA, SentenceConfig::default().min_token_len);
            average_word_vectors(tokens, DATA, &model, " ").collect()
        }
        VectorMethod::Documents => document_vectors(documents, filepath_attr, DATA, &model).collect(),
    };
    let vectors: Vec<(String, Vector)> = records
        .iter()
        .filter_map(|record| vector_entry(record, filepath_attr))
        .collect();
    write_vector_dataset(&args.out_dir, vectors)?;
    copy_index(&corpus.base_dir, &corpus.split_dir, &args.out_dir)?;
    Ok(())
}

fn vector_entry(record: &Record, filepath_attr: &str) -> Option<(String, Vector)> {
    let path = record.text(filepath_attr)?.to_string();
    let vector = record.get(DATA)?.to_vector()?;
    Some((path, vector))
}

fn run_annotations(args: AnnotationsArgs) -> Result<(), Box<dyn Error>> {
    let extension = args
        .input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let stream: RecordIter = match extension.as_deref() {
        Some("csv") => CsvSource::new(&args.input)
            .with_encoding(args.encoding.clone())
            .open()?,
        Some("tsv") => CsvSource::new(&args.input)
            .with_encoding(args.encoding.clone())
            .with_delimiter(b'\t')
            .open()?,
        _ => input_json(&args.input, args.encoding.as_deref())?,
    };
    let labelled = majority_label(
        stream.materialize(),
        &args.attr,
        &args.source_attr,
        &args.dest_attr,
        args.min_count,
        args.seed,
    );
    let records: RecordBuffer = match &args.threshold_attr {
        Some(attr) => {
            let dest = args.threshold_dest.as_deref().unwrap_or(attr);
            let names: Vec<&str> = args.names.iter().map(String::as_str).collect();
            threshold(labelled, attr, dest, args.levels.clone(), &names)?.collect()
        }
        None => labelled,
    };
    write_json(args.output.as_deref(), &records)
}

fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut writer = BufWriter::new(fs::File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!(path = %path.display(), "[datautils:cli] wrote output");
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        DatautilsCli::command().debug_assert();
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(run(["--help".to_string()].into_iter()).is_ok());
    }

    #[test]
    fn annotations_parse_threshold_lists() {
        let cli = parse_cli::<DatautilsCli, _>([
            "datautils",
            "annotations",
            "--input",
            "votes.json",
            "--threshold-attr",
            "score",
            "--levels",
            "0.3,0.6",
            "--names",
            "low,medium,high",
        ])
        .unwrap()
        .unwrap();
        let Command::Annotations(args) = cli.command else {
            panic!("expected annotations command");
        };
        assert_eq!(args.levels, vec![0.3, 0.6]);
        assert_eq!(args.names, vec!["low", "medium", "high"]);
        assert_eq!(args.min_count, 3);
        assert_eq!(args.dest_attr, "label");
    }
}
