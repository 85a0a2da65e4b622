use std::collections::HashMap;

use tracing::debug;

use crate::data::{RecordBuffer, Value};

/// Keep only tokens whose count across the whole buffer is at least `min_count`.
///
/// Materializes: the first pass tallies every token list at `attr`, the
/// second filters each list in place, preserving order.
pub fn count_cutoff(buffer: RecordBuffer, attr: &str, min_count: usize) -> RecordBuffer {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in &buffer {
        if let Some(tokens) = record.get(attr).and_then(Value::as_list) {
            for token in tokens.iter().filter_map(Value::as_text) {
                *counts.entry(token.to_string()).or_insert(0) += 1;
            }
        }
    }

    buffer
        .into_iter()
        .map(|mut record| {
            if let Some(tokens) = record.get(attr).and_then(Value::to_tokens) {
                let kept: Vec<String> = tokens
                    .into_iter()
                    .filter(|token| {
                        let keep = counts.get(token).copied().unwrap_or(0) >= min_count;
                        if !keep {
                            debug!(token = %token, "[datautils:aggregate] removing rare token");
                        }
                        keep
                    })
                    .collect();
                record.insert(attr, kept);
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::pipes::tokenize_default;

    #[test]
    fn cutoff_uses_global_counts_and_preserves_order() {
        let texts = [
            "Once upon a time",
            "in a galaxy far, far, away",
            "Whanne that Aprille with his shoures soote",
            "the quick brown fox",
            "jumps over the lazy dog",
        ];
        let buffer: RecordBuffer = tokenize_default(
            texts.iter().map(|text| Record::new().with("data", *text)),
            "data",
        )
        .collect();
        let out = count_cutoff(buffer, "data", 2);
        let tokens = |idx: usize| out[idx].get("data").and_then(Value::to_tokens).unwrap();
        assert_eq!(tokens(0), vec!["a"]);
        assert_eq!(tokens(1), vec!["a", "far", "far"]);
        assert!(tokens(2).is_empty());
        assert_eq!(tokens(4), vec!["the"]);
    }
}
