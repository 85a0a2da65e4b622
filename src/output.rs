use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{PipeError, Result};
use crate::transport::fs::copy_tree;
use crate::types::Vector;

/// Write each vector to `out_dir/<relative path>`, one value per line.
///
/// Parent directories are created as needed and existing files are
/// replaced. Returns the number of files written.
pub fn write_vector_dataset<I, P>(out_dir: &Path, vectors: I) -> Result<usize>
where
    I: IntoIterator<Item = (P, Vector)>,
    P: AsRef<Path>,
{
    let mut written = 0usize;
    for (relpath, vector) in vectors {
        let relpath = relpath.as_ref();
        if relpath.is_absolute() {
            return Err(PipeError::Configuration(format!(
                "document path '{}' must be relative",
                relpath.display()
            )));
        }
        let target = out_dir.join(relpath);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(fs::File::create(&target)?);
        for value in &vector {
            writeln!(writer, "{value}")?;
        }
        writer.flush()?;
        written += 1;
    }
    info!(
        out_dir = %out_dir.display(),
        documents = written,
        "[datautils:output] wrote vector dataset"
    );
    Ok(written)
}

/// Copy `split_dir` verbatim to the same relative location under `out_dir`.
///
/// `split_dir` must live inside `base_dir`. Returns the copied split path.
pub fn copy_index(base_dir: &Path, split_dir: &Path, out_dir: &Path) -> Result<PathBuf> {
    let base = base_dir
        .canonicalize()
        .map_err(|err| PipeError::unavailable(base_dir, err))?;
    let split = split_dir
        .canonicalize()
        .map_err(|err| PipeError::unavailable(split_dir, err))?;
    let relpath = split.strip_prefix(&base).map_err(|_| {
        PipeError::Configuration(format!(
            "split directory '{}' is not inside base directory '{}'",
            split_dir.display(),
            base_dir.display()
        ))
    })?;
    let target = out_dir.join(relpath);
    let copied = copy_tree(&split, &target)?;
    info!(
        split = %split_dir.display(),
        target = %target.display(),
        files = copied,
        "[datautils:output] copied index files"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn vectors_land_one_value_per_line_under_relative_paths() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("out");
        let written = write_vector_dataset(
            &out,
            vec![
                ("docs/a.txt", vec![1.0, -0.5]),
                ("docs/deep/b.txt", vec![0.25]),
            ],
        )
        .unwrap();
        assert_eq!(written, 2);
        assert_eq!(fs::read_to_string(out.join("docs/a.txt")).unwrap(), "1\n-0.5\n");
        assert_eq!(fs::read_to_string(out.join("docs/deep/b.txt")).unwrap(), "0.25\n");
    }

    #[test]
    fn absolute_document_paths_are_rejected() {
        let temp = tempdir().unwrap();
        let absolute = temp.path().join("abs.txt");
        let err = write_vector_dataset(temp.path(), vec![(absolute, vec![1.0])]).unwrap_err();
        assert!(matches!(err, PipeError::Configuration(_)));
    }

    #[test]
    fn index_is_copied_to_its_relative_location() {
        let temp = tempdir().unwrap();
        let base = temp.path().join("base");
        let split = base.join("splits").join("train");
        fs::create_dir_all(&split).unwrap();
        fs::write(split.join("sports"), "docs/a.txt\n").unwrap();
        let out = temp.path().join("out");

        let target = copy_index(&base, &split, &out).unwrap();
        assert_eq!(target, out.join("splits").join("train"));
        assert_eq!(fs::read_to_string(target.join("sports")).unwrap(), "docs/a.txt\n");
    }

    #[test]
    fn split_outside_base_is_a_configuration_error() {
        let temp = tempdir().unwrap();
        let base = temp.path().join("base");
        let split = temp.path().join("elsewhere");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&split).unwrap();
        let err = copy_index(&base, &split, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, PipeError::Configuration(_)));
    }
}
