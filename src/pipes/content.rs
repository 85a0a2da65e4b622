use std::path::{Path, PathBuf};

use tracing::warn;

use crate::data::Record;
use crate::transport::fs::read_text;

/// Read `base_dir/<filepath_attr>` into `dest_attr`.
///
/// A record with no path, or whose file is missing or does not decode, is
/// dropped with a warning and the stream continues.
pub fn append_file_content<I>(
    stream: I,
    base_dir: &Path,
    filepath_attr: &str,
    dest_attr: &str,
    encoding: Option<&str>,
) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let base_dir: PathBuf = base_dir.to_path_buf();
    let filepath_attr = filepath_attr.to_string();
    let dest_attr = dest_attr.to_string();
    let encoding = encoding.map(str::to_string);
    stream.into_iter().filter_map(move |mut record| {
        let Some(relative) = record.text(&filepath_attr) else {
            warn!(
                attr = %filepath_attr,
                "[datautils:content] record has no file path; skipping"
            );
            return None;
        };
        let path = base_dir.join(relative);
        match read_text(&path, encoding.as_deref()) {
            Ok(text) => {
                record.insert(dest_attr.as_str(), text);
                Some(record)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "[datautils:content] unable to read file; skipping"
                );
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unreadable_and_pathless_records_are_dropped() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs").join("a.txt"), "alpha body").unwrap();

        let input = vec![
            Record::new().with("source", "docs/a.txt"),
            Record::new().with("source", "docs/missing.txt"),
            Record::new().with("label", "orphan"),
        ];
        let out: Vec<Record> =
            append_file_content(input, temp.path(), "source", "data", Some("utf-8")).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text("data"), Some("alpha body"));
        assert_eq!(out[0].text("source"), Some("docs/a.txt"));
    }
}
