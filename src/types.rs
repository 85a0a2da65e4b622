/// Attribute name inside a record.
/// Examples: `data`, `source`, `label`, `data_0`
pub type AttrName = String;
/// A single token produced by tokenization.
/// Examples: `galaxy`, `lazi` (stemmed)
pub type Token = String;
/// Sentence text produced by sentence splitting.
/// Example: `Call me Ishmael.`
pub type Sentence = String;
/// Grouping key used by vote maps, rendered from an attribute value.
/// Examples: `doc1`, `20news/comp.graphics/38464`
pub type GroupKey = String;
/// Dense integer id assigned by an `Indexer`.
/// Examples: `0`, `17`
pub type FeatureId = usize;
/// One sparse bag-of-words entry: `(feature id, count within one record)`.
/// Example: `(3, 4)`
pub type BowEntry = (FeatureId, usize);
/// Dense embedding or feature vector.
/// Example: `[0.12, -0.4, 0.9]`
pub type Vector = Vec<f64>;
/// Relative dataset path as written in index files.
/// Example: `comp.graphics/38464`
pub type PathString = String;
/// Vector-model lookup key (word or document label).
/// Examples: `galaxy`, `src=comp.graphics/38464`
pub type ModelKey = String;
