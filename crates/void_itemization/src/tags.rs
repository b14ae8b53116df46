//! Gameplay tags

use serde::{Deserialize, Serialize};
use void_core::NamedId;

/// A dotted gameplay tag such as `Item.Weapon.Sword`
pub type Tag = NamedId;

/// An ordered set of tags without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns false if it was already present.
    pub fn add(&mut self, tag: Tag) -> bool {
        if self.has_exact(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Add every tag of another set
    pub fn extend_from(&mut self, other: &TagSet) {
        for tag in &other.tags {
            self.add(tag.clone());
        }
    }

    /// Check for this exact tag
    pub fn has_exact(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check for the tag or any of its children
    pub fn has(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t.is_child_of(tag))
    }

    /// Check if any tag of `other` matches (hierarchically)
    pub fn has_any(&self, other: &TagSet) -> bool {
        other.tags.iter().any(|t| self.has(t))
    }

    /// Check if every tag of `other` matches (hierarchically)
    pub fn has_all(&self, other: &TagSet) -> bool {
        other.tags.iter().all(|t| self.has(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.add(tag);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Tag::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup() {
        let mut set = TagSet::new();
        assert!(set.add(Tag::new("Item.Weapon")));
        assert!(!set.add(Tag::new("Item.Weapon")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_hierarchical_match() {
        let set: TagSet = ["Item.Weapon.Sword", "Item.Quality.Rare"].into_iter().collect();

        assert!(set.has(&Tag::new("Item.Weapon")));
        assert!(!set.has_exact(&Tag::new("Item.Weapon")));
        assert!(set.has_exact(&Tag::new("Item.Weapon.Sword")));

        let query: TagSet = ["Item.Armor", "Item.Quality"].into_iter().collect();
        assert!(set.has_any(&query));
        assert!(!set.has_all(&query));
    }
}
