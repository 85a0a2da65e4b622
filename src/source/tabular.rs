use std::path::PathBuf;

use super::{RecordIter, RecordSource};
use crate::data::{Record, Value};
use crate::errors::Result;
use crate::transport::fs::read_text;

/// A JSON file holding a top-level array of objects.
#[derive(Clone, Debug)]
pub struct JsonSource {
    path: PathBuf,
    encoding: Option<String>,
}

impl JsonSource {
    /// JSON source at `path`, auto-detecting its encoding.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: None,
        }
    }

    /// Explicit encoding label (`None` auto-detects).
    pub fn with_encoding(mut self, encoding: Option<String>) -> Self {
        self.encoding = encoding;
        self
    }
}

impl RecordSource for JsonSource {
    fn id(&self) -> String {
        format!("json:{}", self.path.display())
    }

    fn open(&self) -> Result<RecordIter> {
        let text = read_text(&self.path, self.encoding.as_deref())?;
        let records: Vec<Record> = serde_json::from_str(&text)?;
        Ok(Box::new(records.into_iter()))
    }
}

/// A delimited table with a header row; every cell becomes a text value.
#[derive(Clone, Debug)]
pub struct CsvSource {
    path: PathBuf,
    encoding: Option<String>,
    delimiter: u8,
}

impl CsvSource {
    /// Comma-delimited source at `path`, auto-detecting its encoding.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: None,
            delimiter: b',',
        }
    }

    /// Explicit encoding label (`None` auto-detects).
    pub fn with_encoding(mut self, encoding: Option<String>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Field delimiter byte (`b'\t'` for TSV).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl RecordSource for CsvSource {
    fn id(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn open(&self) -> Result<RecordIter> {
        let text = read_text(&self.path, self.encoding.as_deref())?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());
        let headers = reader.headers()?.clone();
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, cell)| (header.to_string(), Value::from(cell)))
                    .collect::<Record>(),
            );
        }
        Ok(Box::new(records.into_iter()))
    }
}

/// Stream the objects of a JSON array file.
pub fn input_json(path: impl Into<PathBuf>, encoding: Option<&str>) -> Result<RecordIter> {
    JsonSource::new(path)
        .with_encoding(encoding.map(str::to_string))
        .open()
}

/// Stream the rows of a comma-delimited file with a header row.
pub fn input_csv(path: impl Into<PathBuf>, encoding: Option<&str>) -> Result<RecordIter> {
    CsvSource::new(path)
        .with_encoding(encoding.map(str::to_string))
        .open()
}
