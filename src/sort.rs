use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::entry::Entry;

/// Field a sibling ordering is keyed on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum SortKey {
    /// Base name, case-insensitive.
    #[default]
    NameCi,
    /// Base name, byte order.
    Name,
    /// Inode number.
    Ino,
    /// Size in bytes.
    Size,
    /// Allocated blocks.
    Blocks,
    /// Hard link count.
    Links,
    /// Modification time.
    Mtime,
    /// Access time.
    Atime,
    /// Status-change time.
    Ctime,
}

/// A sort order over sibling entries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub struct SortSpec {
    /// Key the order is computed from.
    pub key: SortKey,
    /// Reverse the key comparison. Ties stay `Equal`, so a stable sort
    /// keeps the incoming sibling order for equal keys in both
    /// directions.
    pub reverse: bool,
}

impl SortSpec {
    /// Ascending order on `key`.
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            reverse: false,
        }
    }

    /// Descending order on `key`.
    pub fn descending(key: SortKey) -> Self {
        Self { key, reverse: true }
    }

    /// Compares two siblings under this spec. Meant for
    /// `sort_by`-style stable sorts.
    pub fn cmp(&self, a: &Entry, b: &Entry) -> Ordering {
        let ord = self.key_cmp(a, b);
        if self.reverse { ord.reverse() } else { ord }
    }

    fn key_cmp(&self, a: &Entry, b: &Entry) -> Ordering {
        match self.key {
            SortKey::NameCi => a
                .name()
                .to_lowercase()
                .cmp(&b.name().to_lowercase()),
            SortKey::Name => a.name().cmp(b.name()),
            SortKey::Ino => a.stat().ino.cmp(&b.stat().ino),
            SortKey::Size => a.stat().size.cmp(&b.stat().size),
            SortKey::Blocks => a.stat().blocks.cmp(&b.stat().blocks),
            SortKey::Links => a.stat().nlink.cmp(&b.stat().nlink),
            SortKey::Mtime => a.stat().mtime.cmp(&b.stat().mtime),
            SortKey::Atime => a.stat().atime.cmp(&b.stat().atime),
            SortKey::Ctime => a.stat().ctime.cmp(&b.stat().ctime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::file_fixture;

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn default_order_is_case_insensitive_name() {
        let mut entries = vec![
            file_fixture("Zeta", 1),
            file_fixture("alpha", 1),
            file_fixture("Beta", 1),
        ];
        let spec = SortSpec::default();
        entries.sort_by(|a, b| spec.cmp(a, b));
        assert_eq!(names(&entries), ["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn byte_order_differs_from_case_insensitive() {
        let mut entries = vec![file_fixture("alpha", 1), file_fixture("Beta", 1)];
        let spec = SortSpec::ascending(SortKey::Name);
        entries.sort_by(|a, b| spec.cmp(a, b));
        assert_eq!(names(&entries), ["Beta", "alpha"]);
    }

    #[test]
    fn size_descending() {
        let mut entries = vec![
            file_fixture("small", 1),
            file_fixture("big", 100),
            file_fixture("mid", 10),
        ];
        let spec = SortSpec::descending(SortKey::Size);
        entries.sort_by(|a, b| spec.cmp(a, b));
        assert_eq!(names(&entries), ["big", "mid", "small"]);
    }

    #[test]
    fn reverse_keeps_ties_in_incoming_order() {
        // Same size everywhere; a stable sort must not move anything,
        // reversed or not.
        let entries = vec![
            file_fixture("c", 5),
            file_fixture("a", 5),
            file_fixture("b", 5),
        ];
        for spec in [
            SortSpec::ascending(SortKey::Size),
            SortSpec::descending(SortKey::Size),
        ] {
            let mut sorted = entries.clone();
            sorted.sort_by(|a, b| spec.cmp(a, b));
            assert_eq!(names(&sorted), names(&entries));
        }
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut entries = vec![
            file_fixture("b", 2),
            file_fixture("a", 3),
            file_fixture("c", 1),
        ];
        let spec = SortSpec::ascending(SortKey::NameCi);
        entries.sort_by(|a, b| spec.cmp(a, b));
        let once = names(&entries).join(",");
        entries.sort_by(|a, b| spec.cmp(a, b));
        assert_eq!(names(&entries).join(","), once);
    }
}
