use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ordered set of strings, as used for policy actions, resources and
/// principals.
///
/// Serializes as a sorted JSON array. Accepts a bare string or an array on
/// input, since stored policies use both forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringSet(BTreeSet<String>);

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.0.insert(value.into())
    }

    pub fn remove(&mut self, value: &str) -> bool {
        self.0.remove(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn union(&self, other: &StringSet) -> StringSet {
        StringSet(self.0.union(&other.0).cloned().collect())
    }

    /// True when every element of `other` is in `self`.
    pub fn is_superset(&self, other: &StringSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Elements for which `matches(element, value)` holds.
    pub fn func_match<F>(&self, matches: F, value: &str) -> StringSet
    where
        F: Fn(&str, &str) -> bool,
    {
        StringSet(
            self.0
                .iter()
                .filter(|element| matches(element.as_str(), value))
                .cloned()
                .collect(),
        )
    }
}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        StringSet(iter.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StringSet {
    fn from(values: [&str; N]) -> Self {
        values.into_iter().collect()
    }
}

impl Serialize for StringSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for StringSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => StringSet::from_iter([value]),
            OneOrMany::Many(values) => StringSet::from_iter(values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_sorted_array() {
        let set = StringSet::from(["s3:PutObject", "s3:GetObject"]);
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"["s3:GetObject","s3:PutObject"]"#
        );
    }

    #[test]
    fn test_deserializes_string_or_array() {
        let one: StringSet = serde_json::from_str(r#""s3:GetObject""#).unwrap();
        assert_eq!(one, StringSet::from(["s3:GetObject"]));

        let many: StringSet = serde_json::from_str(r#"["b", "a", "b"]"#).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn test_set_operations() {
        let a = StringSet::from(["x", "y"]);
        let b = StringSet::from(["y", "z"]);
        assert_eq!(a.union(&b), StringSet::from(["x", "y", "z"]));
        assert!(a.union(&b).is_superset(&a));
    }
}
