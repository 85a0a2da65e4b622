use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{VectorModel, VectorModelTrainer, doc_label};
use crate::constants::attrs::{DATA, SOURCE};
use crate::data::RecordBuffer;
use crate::errors::{PipeError, Result};
use crate::transport::fs::read_text;
use crate::types::{AttrName, ModelKey, Vector};

/// In-memory key-to-vector model.
///
/// Persists as JSON (`.json`) or the word2vec text format: a
/// `<count> <dimension>` header line, then `<key> <v1> ... <vd>` per line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingTable {
    dimension: usize,
    vectors: IndexMap<ModelKey, Vector>,
}

impl EmbeddingTable {
    /// Empty table of fixed `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: IndexMap::new(),
        }
    }

    /// Insert or replace `key`. The vector must match the table dimension.
    pub fn insert(&mut self, key: impl Into<ModelKey>, vector: Vector) -> Result<()> {
        let key = key.into();
        if vector.len() != self.dimension {
            return Err(PipeError::schema(
                key,
                format!("expected dimension {}, found {}", self.dimension, vector.len()),
            ));
        }
        self.vectors.insert(key, vector);
        Ok(())
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True when the table holds no keys.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &ModelKey> {
        self.vectors.keys()
    }

    /// Load JSON when `path` ends in `.json`, word2vec text otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let text = read_text(path, None)?;
        let table = if is_json {
            Self::parse_json(&text)?
        } else {
            Self::parse_word2vec(&text, path)?
        };
        info!(
            path = %path.display(),
            keys = table.len(),
            dimension = table.dimension,
            "[datautils:vectors] loaded embedding table"
        );
        Ok(table)
    }

    fn parse_json(text: &str) -> Result<Self> {
        let stored: Self = serde_json::from_str(text)?;
        let mut table = Self::new(stored.dimension);
        for (key, vector) in stored.vectors {
            table.insert(key, vector)?;
        }
        Ok(table)
    }

    fn parse_word2vec(text: &str, path: &Path) -> Result<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| PipeError::unavailable(path, "empty word2vec file"))?;
        let dimension = header
            .split_whitespace()
            .nth(1)
            .and_then(|dim| dim.parse::<usize>().ok())
            .ok_or_else(|| PipeError::unavailable(path, format!("bad header '{header}'")))?;
        let mut table = Self::new(dimension);
        for line in lines {
            let mut fields = line.split_whitespace();
            let Some(key) = fields.next() else {
                continue;
            };
            let vector = fields
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vector, _>>()
                .map_err(|err| PipeError::unavailable(path, format!("key '{key}': {err}")))?;
            table.insert(key, vector)?;
        }
        Ok(table)
    }

    /// Write the word2vec text format.
    pub fn save_word2vec(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        writeln!(file, "{} {}", self.vectors.len(), self.dimension)?;
        for (key, vector) in &self.vectors {
            let values: Vec<String> = vector.iter().map(f64::to_string).collect();
            writeln!(file, "{key} {}", values.join(" "))?;
        }
        Ok(())
    }
}

impl VectorModel for EmbeddingTable {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn lookup(&self, key: &str) -> Option<Vector> {
        self.vectors.get(key).cloned()
    }

    /// JSON for `.json` paths, word2vec text otherwise.
    fn save(&self, path: &Path) -> Result<()> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return self.save_word2vec(path);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

/// Settings for [`TableTrainer`].
#[derive(Clone, Debug)]
pub struct TableTrainerConfig {
    /// Attribute holding the document id.
    pub key_attr: AttrName,
    /// Attribute holding a precomputed numeric vector.
    pub vector_attr: AttrName,
    /// Store keys as document labels (`src=<id>`).
    pub document_labels: bool,
}

impl Default for TableTrainerConfig {
    fn default() -> Self {
        Self {
            key_attr: SOURCE.to_string(),
            vector_attr: DATA.to_string(),
            document_labels: true,
        }
    }
}

impl TableTrainerConfig {
    /// Attribute holding the document id.
    pub fn with_key_attr(mut self, attr: impl Into<AttrName>) -> Self {
        self.key_attr = attr.into();
        self
    }

    /// Attribute holding the vector.
    pub fn with_vector_attr(mut self, attr: impl Into<AttrName>) -> Self {
        self.vector_attr = attr.into();
        self
    }

    /// Whether keys are wrapped as document labels.
    pub fn with_document_labels(mut self, enabled: bool) -> Self {
        self.document_labels = enabled;
        self
    }
}

/// Builds an [`EmbeddingTable`] from vectors already present on records.
///
/// This is the no-algorithm backend: it indexes vectors produced elsewhere
/// (for example by a bag-of-words or PCA pipe) so later stages can look them
/// up by document id.
#[derive(Clone, Copy, Debug, Default)]
pub struct TableTrainer;

impl VectorModelTrainer for TableTrainer {
    type Model = EmbeddingTable;
    type Config = TableTrainerConfig;

    fn train(&self, corpus: &RecordBuffer, config: &Self::Config) -> Result<EmbeddingTable> {
        let mut table: Option<EmbeddingTable> = None;
        for record in corpus.iter() {
            let (Some(key), Some(value)) =
                (record.get(&config.key_attr), record.get(&config.vector_attr))
            else {
                continue;
            };
            let vector = value.to_vector().ok_or_else(|| {
                PipeError::schema(config.vector_attr.as_str(), "value is not a numeric vector")
            })?;
            let key = if config.document_labels {
                doc_label(&key.render())
            } else {
                key.render()
            };
            table
                .get_or_insert_with(|| EmbeddingTable::new(vector.len()))
                .insert(key, vector)?;
        }
        table.ok_or_else(|| {
            PipeError::Configuration(format!(
                "no record carries both '{}' and '{}'",
                config.key_attr, config.vector_attr
            ))
        })
    }

    fn load(&self, path: &Path) -> Result<EmbeddingTable> {
        EmbeddingTable::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Record, Value};
    use tempfile::tempdir;

    #[test]
    fn word2vec_text_round_trips_through_disk() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vectors.txt");
        fs::write(&path, "2 3\ngalaxy 0.5 1 -2\nfox 0 0 1.25\n").unwrap();
        let table = EmbeddingTable::load(&path).unwrap();
        assert_eq!(table.dimension(), 3);
        assert_eq!(table.lookup("galaxy"), Some(vec![0.5, 1.0, -2.0]));

        let json = temp.path().join("models").join("table.json");
        table.save(&json).unwrap();
        assert_eq!(TableTrainer.load(&json).unwrap(), table);
    }

    #[test]
    fn ragged_word2vec_rows_are_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vectors.txt");
        fs::write(&path, "1 3\ngalaxy 0.5 1\n").unwrap();
        assert!(matches!(
            EmbeddingTable::load(&path),
            Err(PipeError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn ragged_json_tables_are_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vectors.json");
        fs::write(
            &path,
            r#"{"dimension": 3, "vectors": {"galaxy": [0.5, 1, -2], "fox": [0.25]}}"#,
        )
        .unwrap();
        match EmbeddingTable::load(&path) {
            Err(PipeError::SchemaViolation { attr, .. }) => assert_eq!(attr, "fox"),
            other => panic!("expected a schema violation, got {other:?}"),
        }
    }

    #[test]
    fn trainer_indexes_precomputed_vectors_by_document_label() {
        let corpus: RecordBuffer = vec![
            Record::new()
                .with("source", "docs/a b")
                .with("data", Value::Vector(vec![1.0, 0.0])),
            Record::new().with("source", "docs/c"),
        ]
        .into();
        let table = TableTrainer
            .train(&corpus, &TableTrainerConfig::default())
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("src=docs/a_b"), Some(vec![1.0, 0.0]));
    }
}
