use derivative::Derivative;
use serde::Deserialize;
use serde::Serialize;

use crate::fields::ViewFields;
use crate::skip::SkipSet;
use crate::sort::SortSpec;

/// Partition applied to a directory's children before sorting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum Grouping {
    /// No partition; one sorted run over all children.
    #[default]
    None,
    /// Directories first, then files, each partition sorted
    /// independently.
    DirsFirst,
    /// Files first, then directories.
    FilesFirst,
}

/// Renderer a snapshot is printed with.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum Layout {
    /// Flat per-directory listing with a field header row.
    #[default]
    List,
    /// Box-drawing tree of names only.
    Tree,
    /// Tree with the metadata columns of List in front of each row.
    ListTree,
    /// One block per depth level.
    Level,
    /// Bordered fixed-width table.
    Table,
    /// `ls -F` style suffix-classified grid.
    Classify,
}

/// Build and render options of a snapshot.
///
/// The default snapshot recurses without bound, skips dotfiles, sorts
/// case-insensitively and prints the List layout with permission,
/// size, mtime, git and name columns.
#[derive(Debug, Clone, Serialize, Deserialize, Derivative, PartialEq, Eq)]
#[derivative(Default)]
pub struct VfsOptions {
    /// Recursion depth: negative means unbounded, zero lists only the
    /// root's immediate children, a positive N descends N levels.
    #[derivative(Default(value = "-1"))]
    pub depth: i32,
    /// Keep recursing past `depth` while building so directory
    /// subtree sizes cover everything; displays still honor `depth`.
    pub force_recurse: bool,
    /// Digest regular files at build time; implied whenever `fields`
    /// carries the MD5 column. Off by default; reading every file is
    /// far more expensive than stat alone.
    pub with_md5: bool,
    /// Partition applied before sorting.
    pub grouping: Grouping,
    /// Sibling sort order.
    pub sort: SortSpec,
    /// Exclusion rules applied during the build.
    pub skip: SkipSet,
    /// Metadata columns views print; NAME is implied.
    pub fields: ViewFields,
    /// Renderer used by [`crate::Vfs::render`].
    pub layout: Layout,
}

impl VfsOptions {
    /// Whether a display may step into a child sitting at
    /// `child_level` below the root. The builder applies the same rule
    /// unless force-recurse overrides it.
    pub(crate) fn display_descend(&self, child_level: i32) -> bool {
        self.depth < 0 || child_level <= self.depth
    }

    /// Whether the build digests regular files: the explicit knob, or
    /// a field set that prints the MD5 column.
    pub(crate) fn wants_md5(&self) -> bool {
        self.with_md5 || self.fields.contains(ViewFields::MD5)
    }
}
