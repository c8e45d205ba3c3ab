use std::collections::BTreeMap;
use std::path::Path as StdPath;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tokio::fs;

use crate::color::RenderOptions;
use crate::entry::DirNode;
use crate::entry::Entry;
use crate::errors::Error;
use crate::git::GitStatus;
use crate::options::Layout;
use crate::options::VfsOptions;
use crate::reader;
use crate::stat::EntryStat;
use crate::view;
use crate::walk::Walker;

/// Directory count below which a parallel presort is not worth the
/// thread overhead.
const PRESORT_THRESHOLD: usize = 32;

/// An immutable snapshot of a directory subtree.
///
/// Built once from a root path and options, rendered any number of
/// times without touching the filesystem again. The git overlay is
/// collected once at build time and shared by every entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vfs {
    root_path: PathBuf,
    root: DirNode,
    git: GitStatus,
    opts: VfsOptions,
}

impl Vfs {
    /// Builds a snapshot of `root` under `opts`.
    ///
    /// A missing root is [`Error::NotFound`]; a root that is not a
    /// directory is [`Error::NotADirectory`]. Everything below the
    /// root degrades instead of failing: unreadable subdirectories
    /// record their error in the tree, a repository-less root turns
    /// the git overlay off.
    pub async fn build<P: AsRef<StdPath>>(root: P, opts: VfsOptions) -> Result<Self, Error> {
        let root = root.as_ref();
        let root_path = fs::canonicalize(root).await.map_err(|_| Error::NotFound {
            what: root.to_string_lossy().to_string(),
        })?;
        let metadata = fs::metadata(&root_path).await.map_err(|e| Error::Stat {
            what: root_path.to_string_lossy().to_string(),
            how: e.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory {
                what: root_path.to_string_lossy().to_string(),
            });
        }
        log::debug!("building snapshot of {}", root_path.display());

        let git = GitStatus::detect(&root_path).await;
        let walker = Walker::new(&opts);
        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.to_string_lossy().into_owned());
        let mut tree = DirNode {
            name,
            relpath: String::new(),
            path: root_path.clone(),
            stat: EntryStat::lstat(&root_path, walker.owners(), false).await?,
            children: BTreeMap::new(),
            errors: Vec::new(),
            dir_relpaths: Vec::new(),
            arranged: None,
        };
        walker.fill(&mut tree, 0).await;
        index_dirs(&mut tree, 0, &opts);
        Ok(Self {
            root_path,
            root: tree,
            git,
            opts,
        })
    }

    /// Absolute root the snapshot was built from.
    pub fn root_path(&self) -> &StdPath {
        &self.root_path
    }

    /// The root directory node.
    pub fn root(&self) -> &DirNode {
        &self.root
    }

    /// Options the snapshot was built with.
    pub fn options(&self) -> &VfsOptions {
        &self.opts
    }

    /// The shared git overlay.
    pub fn git(&self) -> &GitStatus {
        &self.git
    }

    #[cfg(test)]
    pub(crate) fn set_git(&mut self, git: GitStatus) {
        self.git = git;
    }

    /// Looks up a directory by relative path; the empty path is the
    /// root.
    pub fn dir_at(&self, relpath: &str) -> Option<&DirNode> {
        let mut cur = &self.root;
        if relpath.is_empty() {
            return Some(cur);
        }
        for part in relpath.split('/') {
            cur = match cur.children.get(part) {
                Some(Entry::Dir(d)) => d,
                _ => return None,
            };
        }
        Some(cur)
    }

    pub(crate) fn dir_at_mut(&mut self, relpath: &str) -> Option<&mut DirNode> {
        let mut cur = &mut self.root;
        if relpath.is_empty() {
            return Some(cur);
        }
        for part in relpath.split('/') {
            cur = match cur.children.get_mut(part) {
                Some(Entry::Dir(d)) => d,
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Directories a display walks, in pre-order. A force-recursed
    /// build indexes everything it visited, so the display depth
    /// bound is re-imposed here.
    pub(crate) fn visible_dirs(&self) -> Vec<&DirNode> {
        self.root
            .dir_relpaths
            .iter()
            .filter(|rp| self.dir_is_visible(rp))
            .filter_map(|rp| self.dir_at(rp))
            .collect()
    }

    fn dir_is_visible(&self, relpath: &str) -> bool {
        if !self.opts.force_recurse || self.opts.depth < 0 {
            return true;
        }
        tree_depth(relpath) <= self.opts.depth
    }

    /// Precomputes every directory's display order so later renders
    /// skip the per-directory sort.
    ///
    /// Orders for disjoint directories are independent, so they are
    /// computed on scoped worker threads over contiguous slices of
    /// the directory index; the tree itself stays read-only until the
    /// sequential apply at the end.
    pub fn presort(&mut self) {
        let relpaths = self.root.dir_relpaths.clone();
        let count = relpaths.len();
        if count == 0 {
            return;
        }
        let mut orders: Vec<Option<Vec<String>>> = vec![None; count];

        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if count < PRESORT_THRESHOLD || threads <= 1 {
            for (slot, rp) in orders.iter_mut().zip(relpaths.iter()) {
                *slot = self.order_of(rp);
            }
        } else {
            let batch = count.div_ceil(threads).max(1);
            let this = &*self;
            std::thread::scope(|scope| {
                for (out, chunk) in orders.chunks_mut(batch).zip(relpaths.chunks(batch)) {
                    scope.spawn(move || {
                        for (slot, rp) in out.iter_mut().zip(chunk.iter()) {
                            *slot = this.order_of(rp);
                        }
                    });
                }
            });
        }

        for (rp, order) in relpaths.iter().zip(orders) {
            if let Some(dir) = self.dir_at_mut(rp) {
                dir.arranged = order;
            }
        }
    }

    fn order_of(&self, relpath: &str) -> Option<Vec<String>> {
        let dir = self.dir_at(relpath)?;
        Some(
            reader::arrange_uncached(dir, &self.opts)
                .iter()
                .map(|e| e.name().to_string())
                .collect(),
        )
    }

    /// Renders with the layout from the build options, detecting the
    /// terminal width.
    pub fn render(&self) -> String {
        self.render_with(&RenderOptions::detect())
    }

    /// Renders with default render options: 80 columns, no color.
    pub fn render_to_string(&self) -> String {
        self.render_with(&RenderOptions::default())
    }

    /// Renders with explicit render options.
    pub fn render_with(&self, render: &RenderOptions) -> String {
        match self.opts.layout {
            Layout::List => view::list::render(self, render),
            Layout::Tree => view::tree::render(self, render, false),
            Layout::ListTree => view::tree::render(self, render, true),
            Layout::Level => view::level::render(self, render),
            Layout::Table => view::table::render(self, render),
            Layout::Classify => view::classify::render(self, render),
        }
    }

    /// Renders into any sink. Renderers never print on their own; the
    /// destination is always the caller's.
    pub fn render_to(
        &self,
        out: &mut dyn std::io::Write,
        render: &RenderOptions,
    ) -> std::io::Result<()> {
        out.write_all(self.render_with(render).as_bytes())
    }
}

/// Number of path components below the root; the root itself is 0.
fn tree_depth(relpath: &str) -> i32 {
    if relpath.is_empty() {
        0
    } else {
        relpath.split('/').count() as i32
    }
}

/// Second build phase: populates `dir_relpaths` bottom-up so every
/// directory carries the pre-order index of the directories below it,
/// own path first. Only directories the walk descended into are
/// indexed; a leaf left unexpanded at the depth bound drives no
/// display section of its own.
fn index_dirs(dir: &mut DirNode, level: i32, opts: &VfsOptions) {
    let mut list = vec![dir.relpath.clone()];
    for child in dir.children.values_mut() {
        if let Entry::Dir(node) = child {
            let child_level = level + 1;
            if opts.force_recurse || opts.display_descend(child_level) {
                index_dirs(node, child_level, opts);
                list.extend(node.dir_relpaths.iter().cloned());
            }
        }
    }
    dir.dir_relpaths = list;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Grouping;
    use crate::reader::DirReader;
    use crate::sort::SortKey;
    use crate::sort::SortSpec;
    use crate::test_utils::TestRoot;

    #[tokio::test]
    async fn missing_root_is_not_found() {
        let err = Vfs::build("/viewfs-no-such-root", VfsOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn file_root_is_not_a_directory() {
        let root = TestRoot::new().await.unwrap();
        let file = root.path().join("file1.txt");
        let err = Vfs::build(&file, VfsOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn index_is_pre_order_with_the_root_first() {
        let root = TestRoot::new().await.unwrap();
        let vfs = Vfs::build(root.path(), VfsOptions::default())
            .await
            .unwrap();
        assert_eq!(
            vfs.root().dir_relpaths,
            ["", "dir1", "dir1/dir2", "dir1/dir2/dir_empty1", "dir3"]
        );
        let sub = vfs.dir_at("dir1").unwrap();
        assert_eq!(sub.dir_relpaths, ["dir1", "dir1/dir2", "dir1/dir2/dir_empty1"]);
    }

    #[tokio::test]
    async fn depth_zero_indexes_only_the_root() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.depth = 0;
        let vfs = Vfs::build(root.path(), opts).await.unwrap();
        assert_eq!(vfs.root().dir_relpaths, [""]);
        // The boundary directories are still listed as entries.
        assert!(vfs.root().children.contains_key("dir1"));
    }

    #[tokio::test]
    async fn force_recurse_indexes_everything_but_displays_to_depth() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.depth = 0;
        opts.force_recurse = true;
        let vfs = Vfs::build(root.path(), opts).await.unwrap();
        assert_eq!(
            vfs.root().dir_relpaths,
            ["", "dir1", "dir1/dir2", "dir1/dir2/dir_empty1", "dir3"]
        );
        let visible: Vec<&str> = vfs
            .visible_dirs()
            .iter()
            .map(|d| d.relpath.as_str())
            .collect();
        assert_eq!(visible, [""]);
    }

    #[tokio::test]
    async fn dir_at_resolves_nested_paths() {
        let root = TestRoot::new().await.unwrap();
        let vfs = Vfs::build(root.path(), VfsOptions::default())
            .await
            .unwrap();
        assert!(vfs.dir_at("").is_some());
        assert_eq!(vfs.dir_at("dir1/dir2").unwrap().name, "dir2");
        assert!(vfs.dir_at("dir1/nope").is_none());
        assert!(vfs.dir_at("file1.txt").is_none());
    }

    #[tokio::test]
    async fn presort_matches_the_on_demand_order() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.grouping = Grouping::DirsFirst;
        let mut vfs = Vfs::build(root.path(), opts).await.unwrap();

        let fresh: Vec<Vec<String>> = vfs
            .visible_dirs()
            .iter()
            .map(|d| {
                reader::arrange_uncached(d, vfs.options())
                    .iter()
                    .map(|e| e.name().to_string())
                    .collect()
            })
            .collect();

        vfs.presort();
        for (dir, want) in vfs.visible_dirs().iter().zip(fresh) {
            let mut reader = DirReader::new(dir, vfs.options());
            let got: Vec<String> = reader
                .read(None)
                .iter()
                .map(|e| e.name().to_string())
                .collect();
            assert_eq!(got, want, "order differs under {}", dir.relpath);
        }
    }

    #[tokio::test]
    async fn presort_over_many_directories_matches_the_on_demand_order() {
        let root = TestRoot::bare().await.unwrap();
        for i in 0..40 {
            root.create_file(&format!("d{i:02}/big.txt"), "aaaa").unwrap();
            root.create_file(&format!("d{i:02}/small.txt"), "a").unwrap();
        }
        let mut opts = VfsOptions::default();
        opts.grouping = Grouping::FilesFirst;
        opts.sort = SortSpec::descending(SortKey::Size);
        let mut vfs = Vfs::build(root.path(), opts).await.unwrap();
        // Enough directories to spread the work over scoped threads.
        assert!(vfs.root().dir_relpaths.len() > PRESORT_THRESHOLD);

        let fresh: Vec<Vec<String>> = vfs
            .visible_dirs()
            .iter()
            .map(|d| {
                reader::arrange_uncached(d, vfs.options())
                    .iter()
                    .map(|e| e.name().to_string())
                    .collect()
            })
            .collect();

        vfs.presort();
        for (dir, want) in vfs.visible_dirs().iter().zip(fresh) {
            let mut reader = DirReader::new(dir, vfs.options());
            let got: Vec<String> = reader
                .read(None)
                .iter()
                .map(|e| e.name().to_string())
                .collect();
            assert_eq!(got, want, "order differs under {}", dir.relpath);
            if !dir.relpath.is_empty() {
                assert_eq!(got, ["big.txt", "small.txt"]);
            }
        }
    }

    #[tokio::test]
    async fn snapshot_serde_round_trip() {
        let root = TestRoot::new().await.unwrap();
        let vfs = Vfs::build(root.path(), VfsOptions::default())
            .await
            .unwrap();
        let json = serde_json::to_string(&vfs).unwrap();
        let back: Vfs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vfs);
    }

    #[tokio::test]
    async fn build_canonicalizes_the_root() {
        let root = TestRoot::new().await.unwrap();
        let dotted = root.path().join("dir1").join("..");
        let vfs = Vfs::build(&dotted, VfsOptions::default()).await.unwrap();
        assert!(vfs.root_path().is_absolute());
        assert_eq!(vfs.root_path(), root.path().canonicalize().unwrap());
        assert!(vfs.root().stat.is_dir());
    }

    fn collect_relpaths(dir: &DirNode, out: &mut Vec<String>) {
        for child in dir.children.values() {
            out.push(child.relpath().to_string());
            if let Some(node) = child.as_dir() {
                collect_relpaths(node, out);
            }
        }
    }

    #[tokio::test]
    async fn snapshot_matches_an_independent_walk() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.skip = crate::skip::SkipSet::empty();
        let vfs = Vfs::build(root.path(), opts).await.unwrap();
        let mut tree = Vec::new();
        collect_relpaths(vfs.root(), &mut tree);
        tree.sort();
        let disk = root.on_disk_relpaths().await.unwrap();
        assert_eq!(
            crate::test_utils::diff(&disk.join("\n"), &tree.join("\n")),
            None
        );
    }
}
