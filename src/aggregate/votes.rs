use indexmap::IndexMap;

use crate::data::{Record, Value};
use crate::types::GroupKey;

/// Multiset of observed values for one group, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoteCounts {
    votes: IndexMap<String, (Value, usize)>,
    total: usize,
}

impl VoteCounts {
    /// Tally one observation. Values are compared by type and content, so
    /// `1` and `"1"` are separate votes.
    pub fn record(&mut self, value: &Value) {
        self.votes
            .entry(vote_key(value))
            .or_insert_with(|| (value.clone(), 0))
            .1 += 1;
        self.total += 1;
    }

    /// Total number of observations.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Observations of `value`.
    pub fn count(&self, value: &Value) -> usize {
        self.votes
            .get(&vote_key(value))
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Every value sharing the maximum count, in first-seen order.
    pub fn leaders(&self) -> Vec<&Value> {
        let max = self.votes.values().map(|(_, count)| *count).max().unwrap_or(0);
        self.votes
            .values()
            .filter(|(_, count)| *count == max && max > 0)
            .map(|(value, _)| value)
            .collect()
    }

    /// Distinct observed values with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, usize)> {
        self.votes.values().map(|(value, count)| (value, *count))
    }
}

fn vote_key(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.render())
}

/// Per-group vote tallies for one attribute.
///
/// Groups are keyed by the rendered value of a source attribute. When no
/// source attribute is given, every record votes in the single `None` group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoteMap {
    groups: IndexMap<Option<GroupKey>, VoteCounts>,
}

impl VoteMap {
    /// Tally `attr` over `records`, grouped by `source_attr`.
    ///
    /// Records lacking `attr` do not vote. With a `source_attr`, records
    /// lacking it do not vote either.
    pub fn build(records: &[Record], attr: &str, source_attr: Option<&str>) -> Self {
        let mut map = Self::default();
        for record in records {
            let Some(value) = record.get(attr) else {
                continue;
            };
            let Some(key) = group_key(record, source_attr) else {
                continue;
            };
            map.groups.entry(key).or_default().record(value);
        }
        map
    }

    /// Tallies for `key` (`None` is the global group).
    pub fn get(&self, key: Option<&str>) -> Option<&VoteCounts> {
        self.groups.get(&key.map(str::to_string))
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &VoteCounts)> {
        self.groups
            .iter()
            .map(|(key, counts)| (key.as_deref(), counts))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no record voted.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Group a record belongs to.
///
/// `Some(None)` is the global group; `None` means the record carries no
/// source and belongs to no group.
pub(crate) fn group_key(record: &Record, source_attr: Option<&str>) -> Option<Option<GroupKey>> {
    match source_attr {
        None => Some(None),
        Some(source_attr) => record.get(source_attr).map(|value| Some(value.render())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes() -> Vec<Record> {
        [("doc1", "yes"), ("doc2", "no"), ("doc1", "no"), ("doc1", "yes"), ("doc2", "no")]
            .into_iter()
            .map(|(source, vote)| Record::new().with("source", source).with("annotation", vote))
            .collect()
    }

    #[test]
    fn votes_are_grouped_by_source_in_first_seen_order() {
        let map = VoteMap::build(&votes(), "annotation", Some("source"));
        let keys: Vec<Option<&str>> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![Some("doc1"), Some("doc2")]);
        let doc1 = map.get(Some("doc1")).unwrap();
        assert_eq!(doc1.total(), 3);
        assert_eq!(doc1.count(&Value::from("yes")), 2);
        assert_eq!(doc1.leaders(), vec![&Value::from("yes")]);
    }

    #[test]
    fn global_group_collects_every_vote() {
        let map = VoteMap::build(&votes(), "annotation", None);
        assert_eq!(map.len(), 1);
        let all = map.get(None).unwrap();
        assert_eq!(all.total(), 5);
        assert_eq!(all.leaders(), vec![&Value::from("no")]);
    }

    #[test]
    fn ties_report_every_leader() {
        let mut counts = VoteCounts::default();
        for vote in ["b", "a", "a", "b", "c"] {
            counts.record(&Value::from(vote));
        }
        assert_eq!(counts.leaders(), vec![&Value::from("b"), &Value::from("a")]);
    }

    #[test]
    fn numbers_and_their_text_tally_separately() {
        let mut counts = VoteCounts::default();
        for vote in [Value::Int(1), Value::from("1"), Value::Int(1), Value::Float(1.0)] {
            counts.record(&vote);
        }
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.count(&Value::Int(1)), 2);
        assert_eq!(counts.count(&Value::from("1")), 1);
        assert_eq!(counts.count(&Value::Float(1.0)), 1);
        assert_eq!(counts.leaders(), vec![&Value::Int(1)]);
    }
}
