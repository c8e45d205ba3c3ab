use crate::entry::DirNode;
use crate::entry::Entry;
use crate::options::Grouping;
use crate::options::VfsOptions;

/// Computes the display order of a directory's children under the
/// given options: partition by grouping, stable-sort each partition
/// with the active sort, concatenate. The children map itself is
/// never touched; the result borrows from it.
///
/// A cached order left behind by a presort pass is honored verbatim.
pub(crate) fn arrange<'a>(dir: &'a DirNode, opts: &VfsOptions) -> Vec<&'a Entry> {
    if let Some(order) = &dir.arranged {
        return order
            .iter()
            .filter_map(|name| dir.children.get(name))
            .collect();
    }
    arrange_uncached(dir, opts)
}

pub(crate) fn arrange_uncached<'a>(dir: &'a DirNode, opts: &VfsOptions) -> Vec<&'a Entry> {
    let sort = |mut part: Vec<&'a Entry>| {
        part.sort_by(|a, b| opts.sort.cmp(a, b));
        part
    };
    match opts.grouping {
        Grouping::None => sort(dir.children.values().collect()),
        Grouping::DirsFirst | Grouping::FilesFirst => {
            let (dirs, files): (Vec<&Entry>, Vec<&Entry>) =
                dir.children.values().partition(|e| e.is_dir());
            let (mut first, second) = if opts.grouping == Grouping::DirsFirst {
                (sort(dirs), sort(files))
            } else {
                (sort(files), sort(dirs))
            };
            first.extend(second);
            first
        }
    }
}

/// Paged reader over one directory's children in display order.
///
/// The order is fixed at construction; `read` hands out consecutive
/// pages of it. Two readers built from the same directory and options
/// observe identical orders.
pub struct DirReader<'a> {
    ordered: Vec<&'a Entry>,
    cursor: usize,
}

impl<'a> DirReader<'a> {
    /// Builds a reader over `dir` honoring grouping and sort from
    /// `opts`.
    pub fn new(dir: &'a DirNode, opts: &VfsOptions) -> Self {
        Self {
            ordered: arrange(dir, opts),
            cursor: 0,
        }
    }

    /// Next page of at most `limit` entries; `None` drains everything
    /// remaining. Returns an empty slice once exhausted.
    pub fn read(&mut self, limit: Option<usize>) -> &[&'a Entry] {
        let start = self.cursor;
        let end = match limit {
            Some(n) => (start + n).min(self.ordered.len()),
            None => self.ordered.len(),
        };
        self.cursor = end;
        &self.ordered[start..end]
    }

    /// Rewinds the cursor to the first entry.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Entries not yet handed out.
    pub fn remaining(&self) -> usize {
        self.ordered.len() - self.cursor
    }

    /// Total entries in display order.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True when the directory has no retained children.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
