//! Record sources: index directories, JSON arrays, and delimited tables.
//!
//! Ownership model:
//! - A source value holds only its location and decoding settings.
//! - `open` does the fallible work (walking, decoding, parsing) up front and
//!   returns a plain record stream, so every later stage is infallible.

use crate::data::Record;
use crate::errors::Result;

mod index;
mod tabular;

pub use index::{IndexSource, input_index};
pub use tabular::{CsvSource, JsonSource, input_csv, input_json};

/// Boxed record stream returned by [`RecordSource::open`].
pub type RecordIter = Box<dyn Iterator<Item = Record>>;

/// Anything that can start a record stream.
///
/// For a fixed dataset on disk, `open` must yield the same records in the
/// same order every time.
pub trait RecordSource {
    /// Human-readable identifier used in logs.
    fn id(&self) -> String;

    /// Read and validate the source, returning its records as a stream.
    fn open(&self) -> Result<RecordIter>;
}
