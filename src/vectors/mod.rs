//! Boundary to external vector models.
//!
//! Embedding algorithms live behind [`VectorModel`] and
//! [`VectorModelTrainer`]; the pipeline only trains, loads, saves, and looks
//! up vectors through them. [`EmbeddingTable`] is the in-crate model: a
//! plain key-to-vector table.

use std::path::Path;

use tracing::warn;

use crate::constants::vectors::DOC_LABEL_PREFIX;
use crate::data::RecordBuffer;
use crate::errors::{PipeError, Result};
use crate::types::{ModelKey, Vector};

mod pipes;
mod table;

pub use pipes::{average_word_vectors, document_vectors};
pub use table::{EmbeddingTable, TableTrainer, TableTrainerConfig};

/// A trained model that maps keys (words, document labels) to vectors.
pub trait VectorModel {
    /// Length of every vector the model returns.
    fn dimension(&self) -> usize;

    /// Vector for `key`, or `None` when the model does not know it.
    fn lookup(&self, key: &str) -> Option<Vector>;

    /// Persist the model so a matching trainer can `load` it.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Produces [`VectorModel`]s from a materialized corpus or from disk.
pub trait VectorModelTrainer {
    /// Model type produced.
    type Model: VectorModel;
    /// Training parameters.
    type Config;

    /// Fit a model on `corpus`. May block for a long time.
    fn train(&self, corpus: &RecordBuffer, config: &Self::Config) -> Result<Self::Model>;

    /// Load a previously saved model.
    fn load(&self, path: &Path) -> Result<Self::Model>;
}

/// Vector for `key`, or a zero vector with a warning on a miss.
pub fn lookup_or_zero<M: VectorModel + ?Sized>(model: &M, key: &str) -> Vector {
    match model.lookup(key) {
        Some(vector) => vector,
        None => {
            let miss = PipeError::LookupMiss {
                key: key.to_string(),
            };
            warn!(error = %miss, "[datautils:vectors] substituting zero vector");
            vec![0.0; model.dimension()]
        }
    }
}

/// Model key for a document id: `src=<id>` with spaces replaced by `_`.
pub fn doc_label(id: &str) -> ModelKey {
    format!("{DOC_LABEL_PREFIX}{}", id.replace(' ', "_"))
}
