//! Single-pass transform pipes.
//!
//! Every pipe consumes one record at a time and never looks ahead. A record
//! that lacks the target attribute, or holds a value of the wrong shape for
//! the pipe, passes through unchanged. Parameters that can be invalid
//! (regexes) are checked when the pipe is built, so a constructed stream
//! never fails.

use tracing::{debug, trace};

use crate::data::{Record, Value};

mod attrs;
mod content;
mod text;
mod tokens;

pub use attrs::{
    combine_attrs, dictionary_lookup, drop_attr_by_regex, drop_by_regex, map_attr, map_text,
    parse_timestamp, rename_attr, retain_attrs, split_attr, split_items, stringcast,
};
pub use content::append_file_content;
pub use text::{
    flatten, lower, split_sentences, strip, strip_email_header, strip_email_header_with, sub,
    tokenize, tokenize_default,
};
pub use tokens::{remove_short_tokens, remove_stopwords, stem, tokens_to_bow};

/// Replace `attr` with `f(value)` on every record carrying it.
///
/// `f` returns `None` when the value has the wrong shape; the record is then
/// emitted unchanged.
pub(crate) fn transform_attr<I, F>(
    stream: I,
    attr: &str,
    pipe: &'static str,
    mut f: F,
) -> impl Iterator<Item = Record> + use<I, F>
where
    I: IntoIterator<Item = Record>,
    F: FnMut(&Value) -> Option<Value>,
{
    let attr = attr.to_string();
    stream.into_iter().map(move |mut record| {
        let outcome = record.get(&attr).map(&mut f);
        match outcome {
            Some(Some(value)) => {
                record.insert(attr.as_str(), value);
            }
            Some(None) => debug!(
                pipe,
                attr = %attr,
                "[datautils:pipes] value has unexpected shape; passing record through"
            ),
            None => trace!(pipe, attr = %attr, "[datautils:pipes] attribute absent"),
        }
        record
    })
}

/// Text-to-value flavour of [`transform_attr`].
pub(crate) fn transform_text<I, F>(
    stream: I,
    attr: &str,
    pipe: &'static str,
    mut f: F,
) -> impl Iterator<Item = Record> + use<I, F>
where
    I: IntoIterator<Item = Record>,
    F: FnMut(&str) -> Value,
{
    transform_attr(stream, attr, pipe, move |value| value.as_text().map(&mut f))
}

/// Token-list flavour of [`transform_attr`].
pub(crate) fn transform_tokens<I, F>(
    stream: I,
    attr: &str,
    pipe: &'static str,
    mut f: F,
) -> impl Iterator<Item = Record> + use<I, F>
where
    I: IntoIterator<Item = Record>,
    F: FnMut(Vec<String>) -> Value,
{
    transform_attr(stream, attr, pipe, move |value| value.to_tokens().map(&mut f))
}
