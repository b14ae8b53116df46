//! String-based identifiers with a precomputed hash

use core::fmt;
use core::hash::{Hash, Hasher};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A string-based identifier for named resources (definitions, tags)
#[derive(Clone)]
pub struct NamedId {
    name: Box<str>,
    hash: u64,
}

impl NamedId {
    /// Create a new named ID
    pub fn new(name: &str) -> Self {
        // Simple FNV-1a hash
        let mut hash = 0xcbf29ce484222325u64;
        for byte in name.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }

        Self {
            name: name.into(),
            hash,
        }
    }

    /// Get the name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the precomputed hash
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Check if the name is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Check whether this id equals `parent` or sits below it in a dotted
    /// hierarchy (`Item.Weapon.Sword` is a child of `Item.Weapon`)
    pub fn is_child_of(&self, parent: &NamedId) -> bool {
        if self.hash == parent.hash && self.name == parent.name {
            return true;
        }
        self.name.len() > parent.name.len()
            && self.name.starts_with(parent.name())
            && self.name.as_bytes()[parent.name.len()] == b'.'
    }
}

impl PartialEq for NamedId {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for NamedId {}

impl Hash for NamedId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for NamedId {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NamedId {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Debug for NamedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedId({:?})", self.name)
    }
}

impl fmt::Display for NamedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for NamedId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NamedId {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl Serialize for NamedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for NamedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}
