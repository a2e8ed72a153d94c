use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set of normalized tags: lowercase, trimmed, never empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new<I: IntoIterator<Item = S>, S: AsRef<str>>(tags: I) -> TagSet {
        TagSet(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Parses something like "Food, drink,,bar ".
    pub fn parse(raw: &str) -> TagSet {
        TagSet::new(raw.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> TagSet {
        TagSet::new(tags)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Vec<String> {
        tags.0.into_iter().collect()
    }
}

/// |A ∩ B| / |A ∪ B|, or 0 if either set is empty.
pub fn jaccard(a: &TagSet, b: &TagSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.0.intersection(&b.0).count();
    let union = a.len() + b.len() - intersection;
    (intersection as f64) / (union as f64)
}
