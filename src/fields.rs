use bitflags::bitflags;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::entry::Entry;
use crate::git::GitStatus;
use crate::stat::EntryKind;
use crate::text::Align;
use crate::utils;

bitflags! {
    /// Metadata columns a view prints. Bit positions define the
    /// canonical column order; iteration always yields that order no
    /// matter how the set was assembled.
    #[derive(Debug, Clone, Copy, PartialEq, Hash, Eq)]
    pub struct ViewFields: u16 {
        /// Inode number.
        const INO = 1 << 0;
        /// Allocated 512-byte blocks.
        const BLOCKS = 1 << 1;
        /// Type and permission bits, `ls -l` style.
        const PERMS = 1 << 2;
        /// Hard link count.
        const LINKS = 1 << 3;
        /// Owner name.
        const USER = 1 << 4;
        /// Group name.
        const GROUP = 1 << 5;
        /// Humanized size.
        const SIZE = 1 << 6;
        /// Modification time.
        const MODIFIED = 1 << 7;
        /// Access time.
        const ACCESSED = 1 << 8;
        /// Creation time, where the platform has one.
        const CREATED = 1 << 9;
        /// Git staging/worktree cell.
        const GIT = 1 << 10;
        /// Content digest.
        const MD5 = 1 << 11;
        /// Base name; always shown.
        const NAME = 1 << 12;
    }
}

// bitflags' serde feature ships delegation helpers, not impls; the
// wire form is the flags string ("PERMS | NAME") for human-readable
// formats and the raw bits otherwise.
impl Serialize for ViewFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for ViewFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bitflags::serde::deserialize(deserializer)
    }
}

impl Default for ViewFields {
    fn default() -> Self {
        ViewFields::PERMS
            | ViewFields::SIZE
            | ViewFields::MODIFIED
            | ViewFields::GIT
            | ViewFields::NAME
    }
}

const COLUMNS: [(ViewFields, &str, Align); 13] = [
    (ViewFields::INO, "INO", Align::Right),
    (ViewFields::BLOCKS, "BLOCKS", Align::Right),
    (ViewFields::PERMS, "PERMS", Align::Left),
    (ViewFields::LINKS, "LINKS", Align::Right),
    (ViewFields::USER, "USER", Align::Left),
    (ViewFields::GROUP, "GROUP", Align::Left),
    (ViewFields::SIZE, "SIZE", Align::Right),
    (ViewFields::MODIFIED, "MODIFIED", Align::Left),
    (ViewFields::ACCESSED, "ACCESSED", Align::Left),
    (ViewFields::CREATED, "CREATED", Align::Left),
    (ViewFields::GIT, "GIT", Align::Center),
    (ViewFields::MD5, "MD5", Align::Left),
    (ViewFields::NAME, "NAME", Align::Left),
];

impl ViewFields {
    /// The set with the standing invariant applied: NAME is always
    /// part of a view.
    pub fn normalize(self) -> Self {
        self | ViewFields::NAME
    }

    /// Active columns in canonical order.
    pub(crate) fn columns(self) -> Vec<ViewFields> {
        self.normalize().iter().collect()
    }

    /// Header label of a single column.
    pub(crate) fn title(self) -> &'static str {
        COLUMNS
            .iter()
            .find(|(flag, _, _)| *flag == self)
            .map(|(_, title, _)| *title)
            .unwrap_or("")
    }

    /// Alignment of a single column.
    pub(crate) fn align(self) -> Align {
        COLUMNS
            .iter()
            .find(|(flag, _, _)| *flag == self)
            .map(|(_, _, align)| *align)
            .unwrap_or(Align::Left)
    }

    /// Formats the cell of a single column for one entry. Values that
    /// do not apply (directory sizes without force-recurse, absent
    /// digests) render as `-`.
    pub(crate) fn cell(self, entry: &Entry, git: &GitStatus, force_recurse: bool) -> String {
        let stat = entry.stat();
        if self == ViewFields::INO {
            stat.ino.to_string()
        } else if self == ViewFields::BLOCKS {
            stat.blocks.to_string()
        } else if self == ViewFields::PERMS {
            perm_string(stat.kind, stat.mode)
        } else if self == ViewFields::LINKS {
            stat.nlink.to_string()
        } else if self == ViewFields::USER {
            stat.user.clone()
        } else if self == ViewFields::GROUP {
            stat.group.clone()
        } else if self == ViewFields::SIZE {
            match entry.display_size(force_recurse) {
                Some(size) => utils::humanize_size(size),
                None => "-".to_string(),
            }
        } else if self == ViewFields::MODIFIED {
            utils::format_time_compact(stat.mtime)
        } else if self == ViewFields::ACCESSED {
            utils::format_time_compact(stat.atime)
        } else if self == ViewFields::CREATED {
            match stat.created {
                Some(t) => utils::format_time_compact(t),
                None => "-".to_string(),
            }
        } else if self == ViewFields::GIT {
            git.xy_for(entry.relpath(), entry.is_dir()).cell()
        } else if self == ViewFields::MD5 {
            stat.md5.clone().unwrap_or_else(|| "-".to_string())
        } else if self == ViewFields::NAME {
            match entry.link_target() {
                Some(target) => format!("{} -> {}", entry.name(), target.display()),
                None => entry.name().to_string(),
            }
        } else {
            String::new()
        }
    }
}

/// `ls -l` style type and permission string, e.g. `drwxr-xr-x`.
pub(crate) fn perm_string(kind: EntryKind, mode: u32) -> String {
    let type_ch = match kind {
        EntryKind::Dir => 'd',
        EntryKind::Symlink => 'l',
        EntryKind::Block => 'b',
        EntryKind::Char => 'c',
        EntryKind::Fifo => 'p',
        EntryKind::Socket => 's',
        EntryKind::File => '-',
        EntryKind::Unknown => '?',
    };
    let mut s = String::with_capacity(10);
    s.push(type_ch);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}
