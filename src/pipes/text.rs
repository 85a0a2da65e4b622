use std::sync::OnceLock;

use regex::Regex;
use tracing::{trace, warn};

use super::transform_text;
use crate::constants::text::{EMAIL_HEADER_DELIMITERS, TOKEN_SPLIT_REGEX};
use crate::data::{Record, Value};
use crate::errors::Result;
use crate::resources::SentenceSplitter;

/// Lowercase text at `attr`.
pub fn lower<I>(stream: I, attr: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    transform_text(stream, attr, "lower", |text| Value::from(text.to_lowercase()))
}

/// Trim surrounding whitespace from text at `attr`.
pub fn strip<I>(stream: I, attr: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    transform_text(stream, attr, "strip", |text| Value::from(text.trim()))
}

/// Replace every match of `pattern` at `attr` with `replacement` (`$1` style groups).
pub fn sub<I>(
    stream: I,
    attr: &str,
    pattern: &str,
    replacement: &str,
) -> Result<impl Iterator<Item = Record> + use<I>>
where
    I: IntoIterator<Item = Record>,
{
    let regex = Regex::new(pattern)?;
    let replacement = replacement.to_string();
    Ok(transform_text(stream, attr, "sub", move |text| {
        Value::from(regex.replace_all(text, replacement.as_str()).into_owned())
    }))
}

/// Drop everything up to and including the first blank line.
///
/// Text without a blank line is left unchanged.
pub fn strip_email_header<I>(stream: I, attr: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    transform_text(stream, attr, "strip_email_header", |text| {
        let body_start = EMAIL_HEADER_DELIMITERS
            .iter()
            .filter_map(|delim| text.find(delim).map(|pos| (pos, pos + delim.len())))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, end)| end);
        match body_start {
            Some(end) => Value::from(&text[end..]),
            None => Value::from(text),
        }
    })
}

/// [`strip_email_header`] with a custom header delimiter pattern.
pub fn strip_email_header_with<I>(
    stream: I,
    attr: &str,
    header_regex: &str,
) -> Result<impl Iterator<Item = Record> + use<I>>
where
    I: IntoIterator<Item = Record>,
{
    let regex = Regex::new(header_regex)?;
    Ok(transform_text(stream, attr, "strip_email_header", move |text| {
        match regex.find(text) {
            Some(found) => Value::from(&text[found.end()..]),
            None => Value::from(text),
        }
    }))
}

/// Replace text at `attr` with its list of sentences.
pub fn split_sentences<'a, I>(
    stream: I,
    attr: &str,
    splitter: &'a SentenceSplitter,
) -> impl Iterator<Item = Record> + use<'a, I>
where
    I: IntoIterator<Item = Record>,
{
    transform_text(stream, attr, "split_sentences", move |text| {
        Value::from(splitter.split(text))
    })
}

/// Emit one record per element of the list at `attr`, in list order.
///
/// An empty list yields a single record with `attr` set to `""`.
pub fn flatten<I>(stream: I, attr: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let attr = attr.to_string();
    stream.into_iter().flat_map(move |mut record| {
        let items = match record.get_mut(&attr) {
            Some(Value::List(items)) => std::mem::take(items),
            _ => {
                trace!(attr = %attr, "[datautils:pipes] flatten on non-list value");
                return vec![record];
            }
        };
        if items.is_empty() {
            record.insert(attr.as_str(), "");
            return vec![record];
        }
        items
            .into_iter()
            .map(|item| record.transformed(&attr, item))
            .collect()
    })
}

/// Split text at `attr` with `split_regex` into a token list.
///
/// Leading or trailing separators produce empty tokens, which
/// [`super::remove_short_tokens`] with `min_len = 1` removes.
pub fn tokenize<I>(
    stream: I,
    attr: &str,
    split_regex: &str,
) -> Result<impl Iterator<Item = Record> + use<I>>
where
    I: IntoIterator<Item = Record>,
{
    let regex = Regex::new(split_regex)?;
    Ok(transform_text(stream, attr, "tokenize", move |text| {
        split_tokens(&regex, text)
    }))
}

static TOKEN_SPLIT: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

fn default_token_split() -> Option<&'static Regex> {
    TOKEN_SPLIT
        .get_or_init(|| Regex::new(TOKEN_SPLIT_REGEX))
        .as_ref()
        .inspect_err(|err| warn!(error = %err, "[datautils:text] default token pattern rejected"))
        .ok()
}

/// [`tokenize`] on runs of non-ASCII-letters (`[^a-zA-Z]+`).
///
/// The pattern is compiled once per process and shared by every stream.
pub fn tokenize_default<I>(stream: I, attr: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    transform_text(stream, attr, "tokenize", |text| match default_token_split() {
        Some(regex) => split_tokens(regex, text),
        None => Value::from(vec![text]),
    })
}

fn split_tokens(regex: &Regex, text: &str) -> Value {
    Value::from(regex.split(text).collect::<Vec<&str>>())
}
