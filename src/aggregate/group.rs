use std::collections::HashSet;

use indexmap::IndexMap;

use crate::data::{Record, RecordBuffer, Value};
use crate::types::AttrName;

/// Merge records sharing the same values for `attrs` into one record per group.
///
/// Materializes. The first record of each group is its representative; for
/// every later member, each non-grouping attribute is collected into a list
/// on the representative. Absent grouping attributes compare as `default`.
/// Groups are emitted in first-seen order.
pub fn group_by_attrs(buffer: RecordBuffer, attrs: &[&str], default: Value) -> RecordBuffer {
    let mut groups: IndexMap<Vec<String>, (Record, HashSet<AttrName>)> = IndexMap::new();
    for record in buffer {
        let key: Vec<String> = attrs
            .iter()
            .map(|attr| record.get(attr).unwrap_or(&default).render())
            .collect();
        match groups.get_mut(&key) {
            None => {
                groups.insert(key, (record, HashSet::new()));
            }
            Some((representative, listed)) => {
                for (attr, value) in record {
                    if attrs.contains(&attr.as_str()) {
                        continue;
                    }
                    append_member_value(representative, listed, attr, value);
                }
            }
        }
    }
    groups.into_values().map(|(record, _)| record).collect()
}

fn append_member_value(
    representative: &mut Record,
    listed: &mut HashSet<AttrName>,
    attr: AttrName,
    value: Value,
) {
    if !listed.contains(&attr) {
        let first = representative.remove(&attr);
        representative.insert(attr.as_str(), Value::List(first.into_iter().collect()));
        listed.insert(attr.clone());
    }
    if let Some(Value::List(values)) = representative.get_mut(&attr) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations() -> RecordBuffer {
        [("1", "yes", "doc1"), ("1", "no", "doc2"), ("1", "yes", "doc3"), ("2", "no", "doc1"), ("2", "no", "doc2")]
            .into_iter()
            .map(|(worker, annotation, instance)| {
                Record::new()
                    .with("worker", worker)
                    .with("annotation", annotation)
                    .with("instance_id", instance)
            })
            .collect()
    }

    #[test]
    fn members_accumulate_into_lists() {
        let out = group_by_attrs(annotations(), &["worker"], Value::Null);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 3);
        assert_eq!(out[0].get("annotation"), Some(&Value::from(vec!["yes", "no", "yes"])));
        assert_eq!(out[1].get("annotation"), Some(&Value::from(vec!["no", "no"])));
        assert_eq!(out[1].text("worker"), Some("2"));
    }

    #[test]
    fn composite_keys_split_groups() {
        let out = group_by_attrs(annotations(), &["worker", "annotation"], Value::Null);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].text("instance_id"), Some("doc2"));
    }
}
