use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::votes::{VoteMap, group_key};
use crate::data::{Record, RecordBuffer, Value};
use crate::errors::{PipeError, Result};
use crate::pipes::transform_attr;
use crate::types::GroupKey;

/// Attach the per-source majority value of `attr` as `dest_attr`.
///
/// Materializes: votes are tallied over the whole buffer before any record
/// is emitted. Sources with fewer than `min_count` votes get no label, and
/// records that already carry `dest_attr` keep it. Ties are broken
/// uniformly at random; pass a `seed` for reproducible output, or `None`
/// to draw one from the thread RNG.
pub fn majority_label(
    buffer: RecordBuffer,
    attr: &str,
    source_attr: &str,
    dest_attr: &str,
    min_count: usize,
    seed: Option<u64>,
) -> RecordBuffer {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    debug!(seed, "[datautils:aggregate] majority tie-break seed");

    let votes = VoteMap::build(&buffer, attr, Some(source_attr));
    let mut majority: IndexMap<Option<GroupKey>, Value> = IndexMap::new();
    for (key, counts) in votes.iter() {
        if counts.total() < min_count {
            continue;
        }
        let leaders = counts.leaders();
        if leaders.len() > 1 {
            debug!(
                source = key.unwrap_or_default(),
                options = leaders.len(),
                "[datautils:aggregate] choosing randomly among tied values"
            );
        }
        if let Some(choice) = leaders.choose(&mut rng) {
            majority.insert(key.map(str::to_string), (*choice).clone());
        }
    }

    buffer
        .into_iter()
        .map(|mut record| {
            if !record.contains(dest_attr)
                && let Some(key) = group_key(&record, Some(source_attr))
                && let Some(label) = majority.get(&key)
            {
                record.insert(dest_attr, label.clone());
            }
            record
        })
        .collect()
}

/// Attach the mean of `attr` per source (or over everything when
/// `source_attr` is `None`) as `dest_attr`.
///
/// Materializes. A present value that is not numeric fails the whole pipe
/// with `SchemaViolation`. Records that already carry `dest_attr` keep it.
pub fn mean_value(
    buffer: RecordBuffer,
    attr: &str,
    source_attr: Option<&str>,
    dest_attr: &str,
) -> Result<RecordBuffer> {
    let votes = VoteMap::build(&buffer, attr, source_attr);
    let mut means: IndexMap<Option<GroupKey>, f64> = IndexMap::new();
    for (key, counts) in votes.iter() {
        let mut sum = 0.0;
        for (value, count) in counts.iter() {
            let number = value.as_f64().ok_or_else(|| {
                PipeError::schema(attr, format!("value '{value}' is not numeric"))
            })?;
            sum += number * count as f64;
        }
        if counts.total() > 0 {
            means.insert(key.map(str::to_string), sum / counts.total() as f64);
        }
    }

    Ok(buffer
        .into_iter()
        .map(|mut record| {
            if !record.contains(dest_attr)
                && let Some(key) = group_key(&record, source_attr)
                && let Some(mean) = means.get(&key)
            {
                record.insert(dest_attr, *mean);
            }
            record
        })
        .collect())
}

/// Half-open bucketing of a number into named levels.
///
/// `levels = [0.3, 0.6]`, `names = [low, medium, high]` maps
/// `(-inf, 0.3)` to `low`, `[0.3, 0.6)` to `medium`, `[0.6, inf)` to `high`.
#[derive(Clone, Debug, PartialEq)]
pub struct Threshold {
    levels: Vec<f64>,
    names: Vec<String>,
}

impl Threshold {
    /// Validate and build. Requires `names.len() == levels.len() + 1` and
    /// ascending levels.
    pub fn new<S: Into<String>>(levels: Vec<f64>, names: impl IntoIterator<Item = S>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if levels.len() + 1 != names.len() {
            return Err(PipeError::Configuration(format!(
                "threshold needs {} names for {} levels, got {}",
                levels.len() + 1,
                levels.len(),
                names.len()
            )));
        }
        if levels.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(PipeError::Configuration(
                "threshold levels must be ascending".to_string(),
            ));
        }
        Ok(Self { levels, names })
    }

    /// Name of the first interval containing `value`.
    pub fn bucket(&self, value: f64) -> &str {
        let idx = self
            .levels
            .iter()
            .position(|level| value < *level)
            .unwrap_or(self.levels.len());
        &self.names[idx]
    }
}

/// Write the [`Threshold`] bucket of the number at `attr` into `dest_attr`.
///
/// Does not buffer. Records without a numeric `attr` pass through.
pub fn threshold<I>(
    stream: I,
    attr: &str,
    dest_attr: &str,
    levels: Vec<f64>,
    names: &[&str],
) -> Result<impl Iterator<Item = Record> + use<I>>
where
    I: IntoIterator<Item = Record>,
{
    let buckets = Threshold::new(levels, names.iter().copied())?;
    let attr = attr.to_string();
    let dest_attr = dest_attr.to_string();
    Ok(stream.into_iter().map(move |mut record| {
        let bucket = record
            .get(&attr)
            .and_then(Value::as_f64)
            .map(|value| buckets.bucket(value).to_string());
        match bucket {
            Some(name) => {
                record.insert(dest_attr.as_str(), name);
            }
            None => debug!(attr = %attr, "[datautils:aggregate] no numeric value to threshold"),
        }
        record
    }))
}

/// Replace a numeric value at `attr` by its bucket name in place.
pub fn threshold_in_place<'a, I>(
    stream: I,
    attr: &str,
    buckets: &'a Threshold,
) -> impl Iterator<Item = Record> + use<'a, I>
where
    I: IntoIterator<Item = Record>,
{
    transform_attr(stream, attr, "threshold", move |value| {
        value
            .as_f64()
            .map(|number| Value::from(buckets.bucket(number)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballots(rows: &[(&str, &str)]) -> RecordBuffer {
        rows.iter()
            .map(|(source, vote)| Record::new().with("source", *source).with("annotation", *vote))
            .collect()
    }

    #[test]
    fn majority_requires_min_count() {
        let buffer = ballots(&[
            ("doc1", "yes"),
            ("doc1", "yes"),
            ("doc1", "no"),
            ("doc2", "no"),
            ("doc2", "no"),
        ]);
        let out = majority_label(buffer, "annotation", "source", "label", 3, Some(7));
        for record in out.iter().take(3) {
            assert_eq!(record.text("label"), Some("yes"));
        }
        for record in out.iter().skip(3) {
            assert!(!record.contains("label"));
        }
    }

    #[test]
    fn majority_keeps_existing_labels_and_order() {
        let mut buffer = ballots(&[("doc1", "yes"), ("doc1", "yes"), ("doc1", "no")]);
        buffer[2].insert("label", "gold");
        let out = majority_label(buffer.clone(), "annotation", "source", "label", 3, Some(1));
        assert_eq!(out[2].text("label"), Some("gold"));
        assert_eq!(out[0].text("annotation"), buffer[0].text("annotation"));
    }

    #[test]
    fn seeded_tie_breaks_are_reproducible_and_uniform_over_leaders() {
        let rows = [("doc", "a"), ("doc", "b"), ("doc", "a"), ("doc", "b")];
        let pick = |seed| {
            majority_label(ballots(&rows), "annotation", "source", "label", 3, Some(seed))[0]
                .text("label")
                .map(str::to_string)
                .unwrap()
        };
        assert_eq!(pick(42), pick(42));
        let seen: std::collections::HashSet<String> = (0..64).map(pick).collect();
        assert_eq!(seen.len(), 2, "both tied values should be reachable");
    }

    #[test]
    fn mean_per_source_and_global() {
        let buffer: RecordBuffer = [("a", 1_i64), ("a", 2), ("b", 10)]
            .into_iter()
            .map(|(source, score)| Record::new().with("source", source).with("score", score))
            .collect();
        let per_source = mean_value(buffer.clone(), "score", Some("source"), "mean").unwrap();
        assert_eq!(per_source[0].get("mean"), Some(&Value::Float(1.5)));
        assert_eq!(per_source[2].get("mean"), Some(&Value::Float(10.0)));

        let global = mean_value(buffer, "score", None, "mean").unwrap();
        assert!(global.iter().all(|record| record.get("mean") == Some(&Value::Float(13.0 / 3.0))));
    }

    #[test]
    fn mean_fails_fast_on_non_numeric_values() {
        let buffer: RecordBuffer = vec![Record::new().with("source", "a").with("score", "high")].into();
        let err = mean_value(buffer, "score", Some("source"), "mean").unwrap_err();
        assert!(matches!(err, PipeError::SchemaViolation { .. }));
    }

    #[test]
    fn threshold_uses_half_open_intervals() {
        let input: Vec<Record> = [0.2, 0.3, 0.59, 0.6, 10.0]
            .into_iter()
            .map(|score| Record::new().with("score", score))
            .collect();
        let out: Vec<Record> = threshold(input, "score", "level", vec![0.3, 0.6], &["low", "medium", "high"])
            .unwrap()
            .collect();
        let names: Vec<&str> = out.iter().map(|r| r.text("level").unwrap()).collect();
        assert_eq!(names, vec!["low", "medium", "medium", "high", "high"]);
    }

    #[test]
    fn threshold_rejects_mismatched_names() {
        let err = Threshold::new(vec![0.3, 0.6], ["low", "high"]).unwrap_err();
        assert!(matches!(err, PipeError::Configuration(_)));
    }

    #[test]
    fn threshold_in_place_rewrites_value() {
        let buckets = Threshold::new(vec![0.5], ["no", "yes"]).unwrap();
        let input = vec![Record::new().with("p", 0.7), Record::new().with("p", "n/a")];
        let out: Vec<Record> = threshold_in_place(input, "p", &buckets).collect();
        assert_eq!(out[0].text("p"), Some("yes"));
        assert_eq!(out[1].text("p"), Some("n/a"));
    }
}
