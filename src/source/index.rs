use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{RecordIter, RecordSource};
use crate::constants::attrs::{LABEL, SOURCE};
use crate::constants::combos::PROGRESS_EVERY;
use crate::data::Record;
use crate::errors::{PipeError, Result};
use crate::transport::fs::{read_text, walk_files};
use crate::types::{AttrName, PathString};

/// A directory of index files.
///
/// Every file under the split directory (recursively, in sorted order) is
/// an index whose file name is a label, and each non-empty line in it is a
/// document path relative to the dataset base directory.
#[derive(Clone, Debug)]
pub struct IndexSource {
    split_dir: PathBuf,
    filepath_attr: AttrName,
    label_attr: AttrName,
    encoding: Option<String>,
    follow_links: bool,
}

impl IndexSource {
    /// Index source over `split_dir` with default attribute names.
    pub fn new(split_dir: impl Into<PathBuf>) -> Self {
        Self {
            split_dir: split_dir.into(),
            filepath_attr: SOURCE.to_string(),
            label_attr: LABEL.to_string(),
            encoding: None,
            follow_links: true,
        }
    }

    /// Attribute that receives each document path.
    pub fn with_filepath_attr(mut self, attr: impl Into<AttrName>) -> Self {
        self.filepath_attr = attr.into();
        self
    }

    /// Attribute that receives each index file name.
    pub fn with_label_attr(mut self, attr: impl Into<AttrName>) -> Self {
        self.label_attr = attr.into();
        self
    }

    /// Encoding label for index files (`None` auto-detects per file).
    pub fn with_encoding(mut self, encoding: Option<String>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Control whether symlinks are followed while walking.
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// The split directory being walked.
    pub fn split_dir(&self) -> &Path {
        &self.split_dir
    }

    fn read_indexes(&self) -> Result<Vec<(String, Vec<PathString>)>> {
        if !self.split_dir.is_dir() {
            return Err(PipeError::unavailable(
                &self.split_dir,
                "split directory does not exist",
            ));
        }
        let mut indexes = Vec::new();
        for path in walk_files(&self.split_dir, self.follow_links)? {
            let label = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let text = read_text(&path, self.encoding.as_deref())?;
            let entries: Vec<PathString> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            debug!(
                index = %path.display(),
                entries = entries.len(),
                "[datautils:source] read index file"
            );
            indexes.push((label, entries));
        }
        Ok(indexes)
    }
}

impl RecordSource for IndexSource {
    fn id(&self) -> String {
        format!("index:{}", self.split_dir.display())
    }

    fn open(&self) -> Result<RecordIter> {
        let indexes = self.read_indexes()?;
        let filepath_attr = self.filepath_attr.clone();
        let label_attr = self.label_attr.clone();
        let records = indexes
            .into_iter()
            .flat_map(move |(label, entries)| {
                let filepath_attr = filepath_attr.clone();
                let label_attr = label_attr.clone();
                entries.into_iter().map(move |entry| {
                    Record::new()
                        .with(label_attr.as_str(), label.as_str())
                        .with(filepath_attr.as_str(), entry)
                })
            })
            .enumerate()
            .map(|(idx, record)| {
                let seen = idx + 1;
                if seen % PROGRESS_EVERY == 0 {
                    info!(documents = seen, "[datautils:source] processing documents");
                }
                record
            });
        Ok(Box::new(records))
    }
}

/// Stream `{label_attr: <index file name>, filepath_attr: <line>}` records
/// from every index file under `split_dir`.
///
/// Unreadable index files fail the whole source.
pub fn input_index(
    split_dir: impl Into<PathBuf>,
    filepath_attr: &str,
    label_attr: &str,
    encoding: Option<&str>,
) -> Result<RecordIter> {
    IndexSource::new(split_dir)
        .with_filepath_attr(filepath_attr)
        .with_label_attr(label_attr)
        .with_encoding(encoding.map(str::to_string))
        .open()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn index_files_yield_label_and_path_in_sorted_order() {
        let temp = tempdir().unwrap();
        let split = temp.path().join("split");
        fs::create_dir_all(split.join("nested")).unwrap();
        fs::write(split.join("sports"), "docs/b.txt\n\ndocs/c.txt\n").unwrap();
        fs::write(split.join("arts"), "docs/a.txt\n").unwrap();
        fs::write(split.join("nested").join("news"), "  docs/d.txt  \n").unwrap();

        let records: Vec<Record> = input_index(&split, "source", "label", None).unwrap().collect();
        let pairs: Vec<(&str, &str)> = records
            .iter()
            .map(|record| (record.text("label").unwrap(), record.text("source").unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("arts", "docs/a.txt"),
                ("news", "docs/d.txt"),
                ("sports", "docs/b.txt"),
                ("sports", "docs/c.txt"),
            ]
        );
    }

    #[test]
    fn missing_split_dir_is_unavailable() {
        let temp = tempdir().unwrap();
        let err = IndexSource::new(temp.path().join("absent")).open().err().unwrap();
        assert!(matches!(err, PipeError::ResourceUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_index_symlink_is_unavailable() {
        let temp = tempdir().unwrap();
        let split = temp.path().join("split");
        fs::create_dir_all(&split).unwrap();
        fs::write(split.join("arts"), "docs/a.txt\n").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing"), split.join("sports")).unwrap();

        let err = input_index(&split, "source", "label", None).err().unwrap();
        assert!(matches!(err, PipeError::ResourceUnavailable { .. }));
    }
}
