use std::collections::BTreeMap;
use std::path::Path as StdPath;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::Error;
#[cfg(test)]
use crate::stat::EntryKind;
use crate::stat::EntryStat;

/// A regular file, symlink, device, FIFO or socket in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub struct FileNode {
    /// Base name.
    pub name: String,
    /// Path relative to the snapshot root, `/`-joined; never starts
    /// with a separator.
    pub relpath: String,
    /// Absolute path on the host filesystem.
    pub path: PathBuf,
    /// Metadata captured at build time.
    pub stat: EntryStat,
    /// Symlink target as stored in the link, unresolved. `None` for
    /// anything that is not a symlink.
    pub link_target: Option<PathBuf>,
}

/// A directory and the children that passed the skip policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub struct DirNode {
    /// Base name; the snapshot root keeps its on-disk name.
    pub name: String,
    /// Path relative to the snapshot root; empty for the root itself.
    pub relpath: String,
    /// Absolute path on the host filesystem.
    pub path: PathBuf,
    /// Metadata captured at build time.
    pub stat: EntryStat,
    /// Children by base name. Written exactly once by the builder;
    /// read-only afterwards.
    pub children: BTreeMap<String, Entry>,
    /// Listing errors scoped to this directory (permission denied and
    /// friends). Surfaced by renderers where the directory is printed,
    /// never escalated to abort a build or render.
    pub errors: Vec<Error>,
    /// Pre-order relative paths of every descended-into directory at
    /// or below this one, own path first. Populated in a second pass
    /// once the tree is complete.
    pub dir_relpaths: Vec<String>,
    /// Cached child-name order from a presort pass; `None` until one
    /// runs.
    #[serde(skip)]
    pub(crate) arranged: Option<Vec<String>>,
}

/// One node of the snapshot tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum Entry {
    /// Anything that is not a directory.
    File(FileNode),
    /// A directory.
    Dir(DirNode),
}

impl Entry {
    /// Base name of the entry.
    pub fn name(&self) -> &str {
        match self {
            Entry::File(f) => &f.name,
            Entry::Dir(d) => &d.name,
        }
    }

    /// Path relative to the snapshot root.
    pub fn relpath(&self) -> &str {
        match self {
            Entry::File(f) => &f.relpath,
            Entry::Dir(d) => &d.relpath,
        }
    }

    /// Absolute path on the host filesystem.
    pub fn path(&self) -> &StdPath {
        match self {
            Entry::File(f) => &f.path,
            Entry::Dir(d) => &d.path,
        }
    }

    /// Metadata captured at build time.
    pub fn stat(&self) -> &EntryStat {
        match self {
            Entry::File(f) => &f.stat,
            Entry::Dir(d) => &d.stat,
        }
    }

    /// True for the directory variant.
    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Dir(_))
    }

    /// The directory node, if this is one.
    pub fn as_dir(&self) -> Option<&DirNode> {
        match self {
            Entry::Dir(d) => Some(d),
            Entry::File(_) => None,
        }
    }

    pub(crate) fn as_dir_mut(&mut self) -> Option<&mut DirNode> {
        match self {
            Entry::Dir(d) => Some(d),
            Entry::File(_) => None,
        }
    }

    /// Symlink target, if the entry is a symlink.
    pub fn link_target(&self) -> Option<&StdPath> {
        match self {
            Entry::File(f) => f.link_target.as_deref(),
            Entry::Dir(_) => None,
        }
    }

    /// Size used for displays: file size, or the subtree total for
    /// directories.
    pub fn display_size(&self, force_recurse: bool) -> Option<u64> {
        match self {
            Entry::File(f) => Some(f.stat.size),
            Entry::Dir(d) if force_recurse => Some(d.subtree_size()),
            Entry::Dir(_) => None,
        }
    }
}

impl DirNode {
    /// Sum of the sizes of every file anywhere below this directory.
    pub fn subtree_size(&self) -> u64 {
        self.children
            .values()
            .map(|child| match child {
                Entry::File(f) => f.stat.size,
                Entry::Dir(d) => d.subtree_size(),
            })
            .sum()
    }

    /// Direct-children counts as `(directories, files)`.
    pub fn child_counts(&self) -> (u64, u64) {
        let dirs = self.children.values().filter(|c| c.is_dir()).count() as u64;
        (dirs, self.children.len() as u64 - dirs)
    }

    /// Sum of direct-children file sizes, the per-directory summary
    /// figure.
    pub fn direct_size(&self) -> u64 {
        self.children
            .values()
            .filter_map(|c| match c {
                Entry::File(f) => Some(f.stat.size),
                Entry::Dir(_) => None,
            })
            .sum()
    }
}

#[cfg(test)]
pub(crate) fn file_fixture(name: &str, size: u64) -> Entry {
    Entry::File(FileNode {
        name: name.to_string(),
        relpath: name.to_string(),
        path: PathBuf::from(format!("/fixture/{name}")),
        stat: EntryStat::fixture(EntryKind::File, size),
        link_target: None,
    })
}

#[cfg(test)]
pub(crate) fn dir_fixture(name: &str) -> Entry {
    Entry::Dir(DirNode {
        name: name.to_string(),
        relpath: name.to_string(),
        path: PathBuf::from(format!("/fixture/{name}")),
        stat: EntryStat::fixture(EntryKind::Dir, 0),
        children: BTreeMap::new(),
        errors: Vec::new(),
        dir_relpaths: Vec::new(),
        arranged: None,
    })
}
