//! Sectioning of filtered options by a metadata key.

use std::collections::HashMap;
use std::fmt;

use crate::option::PickOption;

const UNGROUPED_TITLE: &str = "Other";

/// Bucket name. `Ungrouped` holds options lacking the group key and is
/// distinct from a real group that happens to be called "Other".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupName {
    Named(String),
    Ungrouped,
}

impl GroupName {
    pub fn title(&self) -> &str {
        match self {
            GroupName::Named(name) => name,
            GroupName::Ungrouped => UNGROUPED_TITLE,
        }
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Buckets in first-encounter order.
#[derive(Debug, Clone)]
pub struct Groups<'a, V> {
    buckets: Vec<(GroupName, Vec<&'a PickOption<V>>)>,
}

impl<'a, V> Groups<'a, V> {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupName, &[&'a PickOption<V>])> {
        self.buckets
            .iter()
            .map(|(name, options)| (name, options.as_slice()))
    }

    pub fn get(&self, name: &GroupName) -> Option<&[&'a PickOption<V>]> {
        self.buckets
            .iter()
            .find(|(bucket, _)| bucket == name)
            .map(|(_, options)| options.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &GroupName> {
        self.buckets.iter().map(|(name, _)| name)
    }

    /// All options, bucket by bucket.
    pub fn flatten(&self) -> Vec<&'a PickOption<V>> {
        self.buckets
            .iter()
            .flat_map(|(_, options)| options.iter().copied())
            .collect()
    }
}

/// Partition `options` into buckets named by `metadata[key]`.
pub fn group<'a, V>(options: &[&'a PickOption<V>], key: &str) -> Groups<'a, V> {
    let mut buckets: Vec<(GroupName, Vec<&'a PickOption<V>>)> = Vec::new();
    let mut index: HashMap<GroupName, usize> = HashMap::new();

    for &option in options {
        let name = option
            .meta(key)
            .map(|value| GroupName::Named(value.as_text().into_owned()))
            .unwrap_or(GroupName::Ungrouped);

        let slot = *index.entry(name.clone()).or_insert_with(|| {
            buckets.push((name, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(option);
    }

    Groups { buckets }
}

/// `group` when a key is configured, `None` for a flat list.
pub fn group_by<'a, V>(options: &[&'a PickOption<V>], key: Option<&str>) -> Option<Groups<'a, V>> {
    key.map(|key| group(options, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PickOption<&'static str>> {
        vec![
            PickOption::new("A", "a").with_meta("type", "public"),
            PickOption::new("B", "b").with_meta("type", "private"),
            PickOption::new("C", "c"),
        ]
    }

    #[test]
    fn buckets_follow_first_encounter() {
        let options = sample();
        let refs: Vec<_> = options.iter().collect();
        let groups = group(&refs, "type");

        let names: Vec<_> = groups.names().cloned().collect();
        assert_eq!(
            names,
            vec![
                GroupName::Named("public".into()),
                GroupName::Named("private".into()),
                GroupName::Ungrouped,
            ]
        );
        let other = groups.get(&GroupName::Ungrouped).unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].value, "c");
        assert_eq!(GroupName::Ungrouped.to_string(), "Other");
    }

    #[test]
    fn literal_other_is_not_ungrouped() {
        let options = vec![
            PickOption::new("X", "x").with_meta("type", "Other"),
            PickOption::new("Y", "y"),
        ];
        let refs: Vec<_> = options.iter().collect();
        let groups = group(&refs, "type");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&GroupName::Named("Other".into())).unwrap()[0].value, "x");
        assert_eq!(groups.get(&GroupName::Ungrouped).unwrap()[0].value, "y");
    }

    #[test]
    fn partition_preserves_relative_order() {
        let options = vec![
            PickOption::new("1", 1).with_meta("sector", "public"),
            PickOption::new("2", 2).with_meta("sector", "private"),
            PickOption::new("3", 3).with_meta("sector", "public"),
            PickOption::new("4", 4),
            PickOption::new("5", 5).with_meta("sector", "private"),
        ];
        let refs: Vec<_> = options.iter().collect();
        let groups = group(&refs, "sector");

        let flat: Vec<i32> = groups.flatten().iter().map(|o| o.value).collect();
        assert_eq!(flat, vec![1, 3, 2, 5, 4]);
        let total: usize = groups.iter().map(|(_, bucket)| bucket.len()).sum();
        assert_eq!(total, options.len());
    }

    #[test]
    fn no_key_means_flat_list() {
        let options = sample();
        let refs: Vec<_> = options.iter().collect();
        assert!(group_by(&refs, None).is_none());
        assert_eq!(group_by(&refs, Some("type")).unwrap().len(), 3);
    }
}
