use std::collections::BTreeSet;

/// Keys selected before a refresh, reapplied as matching rows come back.
///
/// Keys are stable paths rather than row indices, so a selection survives
/// the collection being rebuilt in a different order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    keys: BTreeSet<String>,
}

impl SelectionSnapshot {
    /// Build a snapshot, ignoring empty keys (rows with no identity).
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot = Self::default();
        for key in keys {
            snapshot.insert(key);
        }
        snapshot
    }

    pub fn contains(&self, key: &str) -> bool {
        !key.is_empty() && self.keys.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !key.is_empty() {
            self.keys.insert(key);
        }
    }

    /// Add every key of `other`.
    pub fn merge(&mut self, other: SelectionSnapshot) {
        self.keys.extend(other.keys);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keys_are_ignored() {
        let snap = SelectionSnapshot::from_keys(["", "a.c", ""]);
        assert_eq!(snap.len(), 1);
        assert!(!snap.contains(""));
        assert!(snap.contains("a.c"));
    }

    #[test]
    fn duplicate_keys_collapse() {
        let snap = SelectionSnapshot::from_keys(["b", "a", "b"]);
        assert_eq!(snap.len(), 2);
        assert!(snap.contains("a") && snap.contains("b"));
    }

    #[test]
    fn merge_unions() {
        let mut a = SelectionSnapshot::from_keys(["trunk/foo.txt"]);
        a.merge(SelectionSnapshot::from_keys(["trunk/bar.txt", "trunk/foo.txt"]));
        assert_eq!(a.len(), 2);
        a.insert("");
        assert_eq!(a.len(), 2);
    }
}
