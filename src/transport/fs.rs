use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{PipeError, Result};

/// Resolve an encoding label (`utf-8`, `latin-1`, ...) to a decoder.
///
/// WHATWG labels are tried first, then common codec spellings such as
/// `latin_1`, `utf8`, or `iso8859_1` after normalizing case and `_`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
    Encoding::for_label(normalized.as_bytes())
        .or_else(|| codec_alias(&normalized).and_then(|alias| Encoding::for_label(alias.as_bytes())))
        .ok_or_else(|| PipeError::Configuration(format!("unknown text encoding '{label}'")))
}

fn codec_alias(normalized: &str) -> Option<&'static str> {
    match normalized {
        "latin-1" | "latin" | "l1" | "iso8859-1" | "iso-8859-1" | "8859" | "cp819" => {
            Some("iso-8859-1")
        }
        "utf8" | "u8" | "utf" | "utf-8-sig" => Some("utf-8"),
        "utf-16-le" | "utf16le" => Some("utf-16le"),
        "utf-16-be" | "utf16be" => Some("utf-16be"),
        "cp1252" | "windows1252" => Some("windows-1252"),
        _ => None,
    }
}

/// Guess the encoding of raw bytes.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// Decode bytes with an explicit encoding label, or auto-detect when `None`.
///
/// An explicit label is honoured as given: a byte-order mark never switches
/// the decoder. Malformed input for the chosen encoding is an error rather
/// than being silently replaced.
pub fn decode_text(bytes: &[u8], encoding: Option<&str>, path: &Path) -> Result<String> {
    let (encoding, text, had_errors) = match encoding {
        Some(label) => {
            let encoding = resolve_encoding(label)?;
            let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
            (encoding, text, had_errors)
        }
        None => {
            let detected = detect_encoding(bytes);
            let (text, used, had_errors) = detected.decode(bytes);
            debug!(
                path = %path.display(),
                encoding = used.name(),
                "[datautils:fs] auto-detected encoding"
            );
            (used, text, had_errors)
        }
    };
    if had_errors {
        return Err(PipeError::unavailable(
            path,
            format!("content is not valid {}", encoding.name()),
        ));
    }
    Ok(match text {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => text,
    })
}

/// Read a whole file as text.
///
/// Missing or unreadable files map to `ResourceUnavailable`.
pub fn read_text(path: &Path, encoding: Option<&str>) -> Result<String> {
    let bytes = fs::read(path).map_err(|err| PipeError::unavailable(path, err))?;
    decode_text(&bytes, encoding, path)
}

/// All regular files under `root`, in sorted (deterministic) walk order.
///
/// Any walk error (unreadable directory, dangling symlink when following
/// links) fails the whole walk with `ResourceUnavailable`.
pub fn walk_files(root: &Path, follow_links: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(follow_links).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            PipeError::unavailable(path, err)
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Recursively copy `from` into `to`, replacing anything already at `to`.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    if to.exists() {
        fs::remove_dir_all(to)?;
    }
    let mut copied = 0usize;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|err| PipeError::unavailable(from, err))?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|err| PipeError::unavailable(entry.path(), err))?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
