use std::collections::HashMap;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::warn;

use super::{transform_attr, transform_text};
use crate::constants::text::SPLIT_ATTR_SEPARATOR;
use crate::data::{Record, Value};
use crate::errors::Result;
use crate::types::AttrName;

fn owned_names(attrs: &[&str]) -> Vec<AttrName> {
    attrs.iter().map(|attr| attr.to_string()).collect()
}

/// Anchored (`match`, not `search`) version of `pattern`.
fn anchored(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{pattern})"))?)
}

/// Move the value at `attr` to `new_name`.
pub fn rename_attr<I>(stream: I, attr: &str, new_name: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let attr = attr.to_string();
    let new_name = new_name.to_string();
    stream.into_iter().map(move |mut record| {
        if let Some(value) = record.remove(&attr) {
            record.insert(new_name.as_str(), value);
        }
        record
    })
}

/// Keep only the listed attributes; listed attributes that are absent are ignored.
pub fn retain_attrs<I>(stream: I, attrs: &[&str]) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let attrs = owned_names(attrs);
    stream.into_iter().map(move |mut record| {
        record.retain(|name, _| attrs.iter().any(|attr| attr == name));
        record
    })
}

/// Join the rendered values of `attrs` (in listed order) into `dest`.
///
/// Only present attributes take part in the join. A record carrying none of
/// them passes through unchanged. The source attributes are kept.
pub fn combine_attrs<I>(
    stream: I,
    attrs: &[&str],
    dest: &str,
    delimiter: &str,
) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let attrs = owned_names(attrs);
    let dest = dest.to_string();
    let delimiter = delimiter.to_string();
    stream.into_iter().map(move |mut record| {
        let parts: Vec<String> = attrs
            .iter()
            .filter_map(|attr| record.get(attr).map(Value::render))
            .collect();
        if !parts.is_empty() {
            record.insert(dest.as_str(), parts.join(&delimiter));
        }
        record
    })
}

/// Split text at `attr` on `delimiter` into `attr_0`, `attr_1`, ...
///
/// The original attribute is removed. A single part still yields `attr_0`.
pub fn split_attr<I>(stream: I, attr: &str, delimiter: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let attr = attr.to_string();
    let delimiter = delimiter.to_string();
    stream.into_iter().map(move |mut record| {
        let Some(text) = record.text(&attr).map(str::to_string) else {
            return record;
        };
        record.remove(&attr);
        for (idx, part) in text.split(delimiter.as_str()).enumerate() {
            record.insert(format!("{attr}{SPLIT_ATTR_SEPARATOR}{idx}"), part);
        }
        record
    })
}

/// Move `move_attrs` out into a record of their own.
///
/// Emits the source record without `move_attrs`, then (only if any of them
/// were present) a second record holding just the moved attributes.
pub fn split_items<I>(stream: I, move_attrs: &[&str]) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let move_attrs = owned_names(move_attrs);
    stream.into_iter().flat_map(move |mut record| {
        let mut moved = Record::new();
        for attr in &move_attrs {
            if let Some(value) = record.remove(attr) {
                moved.insert(attr.as_str(), value);
            }
        }
        let mut out = vec![record];
        if !moved.is_empty() {
            out.push(moved);
        }
        out
    })
}

/// Drop whole records whose text at `attr` matches `pattern` from the start.
///
/// With `reverse`, records that do *not* match are dropped instead. Records
/// without a text value at `attr` are always kept.
pub fn drop_by_regex<I>(
    stream: I,
    attr: &str,
    pattern: &str,
    reverse: bool,
) -> Result<impl Iterator<Item = Record> + use<I>>
where
    I: IntoIterator<Item = Record>,
{
    let regex = anchored(pattern)?;
    let attr = attr.to_string();
    Ok(stream.into_iter().filter(move |record| {
        match record.text(&attr) {
            Some(text) => regex.is_match(text) == reverse,
            None => true,
        }
    }))
}

/// Remove the attribute `attr` (not the record) when its text matches `pattern`.
///
/// With `reverse`, the attribute is removed when it does *not* match.
pub fn drop_attr_by_regex<I>(
    stream: I,
    attr: &str,
    pattern: &str,
    reverse: bool,
) -> Result<impl Iterator<Item = Record> + use<I>>
where
    I: IntoIterator<Item = Record>,
{
    let regex = anchored(pattern)?;
    let attr = attr.to_string();
    Ok(stream.into_iter().map(move |mut record| {
        let matched = record.text(&attr).map(|text| regex.is_match(text));
        if matched.is_some_and(|matched| matched != reverse) {
            record.remove(&attr);
        }
        record
    }))
}

/// Apply `f` to the value at `attr`.
pub fn map_attr<I, F>(stream: I, attr: &str, mut f: F) -> impl Iterator<Item = Record> + use<I, F>
where
    I: IntoIterator<Item = Record>,
    F: FnMut(&Value) -> Value,
{
    transform_attr(stream, attr, "map_attr", move |value| Some(f(value)))
}

/// Apply `f` to the text at `attr`; non-text values pass through.
pub fn map_text<I, F>(stream: I, attr: &str, f: F) -> impl Iterator<Item = Record> + use<I, F>
where
    I: IntoIterator<Item = Record>,
    F: FnMut(&str) -> Value,
{
    transform_text(stream, attr, "map_text", f)
}

/// Render numbers and booleans at `attr` as text.
pub fn stringcast<I>(stream: I, attr: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    transform_attr(stream, attr, "stringcast", |value| match value {
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => Some(Value::Text(value.render())),
        Value::Text(_) => Some(value.clone()),
        _ => None,
    })
}

/// Parse the text at `attr` with `format` (UTC) into Unix seconds.
///
/// Values that do not parse are left as they are.
pub fn parse_timestamp<I>(stream: I, attr: &str, format: &str) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let format = format.to_string();
    let attr_name = attr.to_string();
    transform_attr(stream, attr, "parse_timestamp", move |value| {
        let text = value.as_text()?;
        match NaiveDateTime::parse_from_str(text.trim(), &format) {
            Ok(parsed) => Some(Value::Int(parsed.and_utc().timestamp())),
            Err(err) => {
                warn!(
                    attr = %attr_name,
                    value = text,
                    error = %err,
                    "[datautils:pipes] unparseable timestamp left unchanged"
                );
                Some(value.clone())
            }
        }
    })
}

/// Map text at `attr` through `table`.
///
/// A value found in the table is replaced whole. Otherwise, when
/// `word_delim` is given, each delimited word found in the table is
/// replaced and the rest are kept.
pub fn dictionary_lookup<I>(
    stream: I,
    attr: &str,
    table: HashMap<String, String>,
    word_delim: Option<&str>,
) -> impl Iterator<Item = Record> + use<I>
where
    I: IntoIterator<Item = Record>,
{
    let word_delim = word_delim.map(str::to_string);
    transform_text(stream, attr, "dictionary_lookup", move |text| {
        if let Some(mapped) = table.get(text) {
            return Value::from(mapped.as_str());
        }
        let Some(delim) = word_delim.as_deref() else {
            return Value::from(text);
        };
        let words: Vec<&str> = text
            .split(delim)
            .map(|word| table.get(word).map(String::as_str).unwrap_or(word))
            .collect();
        Value::from(words.join(delim))
    })
}
