use tracing::warn;

use super::{VectorModel, doc_label, lookup_or_zero};
use crate::data::{Record, Value};
use crate::pipes::transform_attr;
use crate::types::Vector;

/// Replace `attr` with the mean vector of its known words.
///
/// Text is split on `word_delim`; token lists are used as they are. Words
/// are lowercased before lookup and unknown words are skipped. A value with
/// no known words becomes a zero vector.
pub fn average_word_vectors<'a, I, M>(
    stream: I,
    attr: &str,
    model: &'a M,
    word_delim: &str,
) -> impl Iterator<Item = Record> + use<'a, I, M>
where
    I: IntoIterator<Item = Record>,
    M: VectorModel + ?Sized,
{
    let word_delim = word_delim.to_string();
    let attr_name = attr.to_string();
    transform_attr(stream, attr, "average_word_vectors", move |value| {
        let words: Vec<String> = match value {
            Value::Text(text) => text.split(word_delim.as_str()).map(str::to_string).collect(),
            other => other.to_tokens()?,
        };
        let mut sum: Vector = vec![0.0; model.dimension()];
        let mut known = 0usize;
        for word in &words {
            if let Some(vector) = model.lookup(&word.to_lowercase()) {
                for (total, component) in sum.iter_mut().zip(vector) {
                    *total += component;
                }
                known += 1;
            }
        }
        if known == 0 {
            warn!(
                attr = %attr_name,
                words = words.len(),
                "[datautils:vectors] no known words; using zero vector"
            );
        } else {
            for total in &mut sum {
                *total /= known as f64;
            }
        }
        Some(Value::Vector(sum))
    })
}

/// Attach the model's vector for each document to `dest_attr`.
///
/// The document id in `id_attr` is looked up as `src=<id>`. Unknown
/// documents get a zero vector. Records without `id_attr` pass through.
pub fn document_vectors<'a, I, M>(
    stream: I,
    id_attr: &str,
    dest_attr: &str,
    model: &'a M,
) -> impl Iterator<Item = Record> + use<'a, I, M>
where
    I: IntoIterator<Item = Record>,
    M: VectorModel + ?Sized,
{
    let id_attr = id_attr.to_string();
    let dest_attr = dest_attr.to_string();
    stream.into_iter().map(move |mut record| {
        if let Some(id) = record.get(&id_attr).map(Value::render) {
            let vector = lookup_or_zero(model, &doc_label(&id));
            record.insert(dest_attr.as_str(), Value::Vector(vector));
        }
        record
    })
}
