use std::collections::BTreeMap;

use async_recursion::async_recursion;
use futures_lite::StreamExt;

use crate::entry::DirNode;
use crate::entry::Entry;
use crate::entry::FileNode;
use crate::errors::Error;
use crate::options::VfsOptions;
use crate::owner::OwnerCache;
use crate::stat::EntryKind;
use crate::stat::EntryStat;

/// Depth-first builder of the snapshot tree. One walker serves one
/// build; it owns the owner-name cache shared by every stat of that
/// build.
pub(crate) struct Walker<'a> {
    opts: &'a VfsOptions,
    owners: OwnerCache,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(opts: &'a VfsOptions) -> Self {
        Self {
            opts,
            owners: OwnerCache::new(),
        }
    }

    pub(crate) fn owners(&self) -> &OwnerCache {
        &self.owners
    }

    /// Lists `dir`, stats and attaches every retained child, and
    /// recurses per the depth rule. Failures to list or stat are
    /// recorded on the directory that produced them and never abort
    /// the walk.
    #[async_recursion]
    pub(crate) async fn fill(&self, dir: &mut DirNode, level: i32) {
        log::trace!("listing {}", dir.path.display());
        let mut entries = match async_fs::read_dir(&dir.path).await {
            Ok(entries) => entries,
            Err(e) => {
                dir.errors.push(Error::Read {
                    what: dir.path.to_string_lossy().to_string(),
                    how: e.to_string(),
                });
                return;
            }
        };
        while let Some(entry) = entries.next().await {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    dir.errors.push(Error::Read {
                        what: dir.path.to_string_lossy().to_string(),
                        how: e.to_string(),
                    });
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let stat = match EntryStat::lstat(&path, &self.owners, self.opts.wants_md5()).await {
                Ok(stat) => stat,
                Err(e) => {
                    dir.errors.push(e);
                    continue;
                }
            };
            if self.opts.skip.is_skipped(&name, stat.is_dir()) {
                continue;
            }
            let relpath = if dir.relpath.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", dir.relpath, name)
            };
            let child = if stat.is_dir() {
                let mut node = DirNode {
                    name: name.clone(),
                    relpath,
                    path,
                    stat,
                    children: BTreeMap::new(),
                    errors: Vec::new(),
                    dir_relpaths: Vec::new(),
                    arranged: None,
                };
                if self.opts.force_recurse {
                    // Recursion ignores depth here; displays re-impose
                    // it so subtree sizes stay complete.
                    self.fill(&mut node, 0).await;
                } else if self.descend(level + 1) {
                    self.fill(&mut node, level + 1).await;
                }
                Entry::Dir(node)
            } else {
                let link_target = if stat.kind == EntryKind::Symlink {
                    tokio::fs::read_link(&path).await.ok()
                } else {
                    None
                };
                Entry::File(FileNode {
                    name: name.clone(),
                    relpath,
                    path,
                    stat,
                    link_target,
                })
            };
            dir.children.insert(name, child);
        }
    }

    fn descend(&self, child_level: i32) -> bool {
        self.opts.display_descend(child_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ViewFields;
    use crate::test_utils::TestRoot;

    fn empty_root(root: &TestRoot) -> DirNode {
        DirNode {
            name: "root".to_string(),
            relpath: String::new(),
            path: root.path().to_path_buf(),
            stat: EntryStat::fixture(EntryKind::Dir, 0),
            children: BTreeMap::new(),
            errors: Vec::new(),
            dir_relpaths: Vec::new(),
            arranged: None,
        }
    }

    #[tokio::test]
    async fn unbounded_walk_retains_the_whole_tree() {
        let root = TestRoot::new().await.unwrap();
        let opts = VfsOptions::default();
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        assert!(dir.errors.is_empty());
        let sub = dir.children.get("dir1").unwrap().as_dir().unwrap();
        let nested = sub.children.get("dir2").unwrap().as_dir().unwrap();
        assert!(nested.children.contains_key("file4.txt"));
        assert!(nested.children.contains_key("dir_empty1"));
    }

    #[tokio::test]
    async fn depth_zero_lists_but_does_not_descend() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.depth = 0;
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        let sub = dir.children.get("dir1").unwrap().as_dir().unwrap();
        assert!(sub.children.is_empty());
    }

    #[tokio::test]
    async fn depth_one_descends_one_level() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.depth = 1;
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        let sub = dir.children.get("dir1").unwrap().as_dir().unwrap();
        assert!(sub.children.contains_key("file3.txt"));
        let nested = sub.children.get("dir2").unwrap().as_dir().unwrap();
        assert!(nested.children.is_empty());
    }

    #[tokio::test]
    async fn force_recurse_ignores_depth() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.depth = 0;
        opts.force_recurse = true;
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        let sub = dir.children.get("dir1").unwrap().as_dir().unwrap();
        let nested = sub.children.get("dir2").unwrap().as_dir().unwrap();
        assert!(nested.children.contains_key("file4.txt"));
    }

    #[tokio::test]
    async fn requesting_the_md5_column_digests_at_build() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.fields |= ViewFields::MD5;
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        let file = dir.children.get("file1.txt").unwrap();
        assert!(file.stat().md5.is_some());
        // Directories never carry one.
        assert!(dir.children.get("dir1").unwrap().stat().md5.is_none());
    }

    #[tokio::test]
    async fn skipped_names_are_absent_but_traversal_continues() {
        let root = TestRoot::new().await.unwrap();
        root.create_file(".hidden", "x").unwrap();
        root.create_file("dir1/.also-hidden", "x").unwrap();
        let opts = VfsOptions::default();
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        assert!(!dir.children.contains_key(".hidden"));
        let sub = dir.children.get("dir1").unwrap().as_dir().unwrap();
        assert!(!sub.children.contains_key(".also-hidden"));
        assert!(sub.children.contains_key("file3.txt"));
    }

    #[tokio::test]
    async fn regex_skip_leaves_directories_traversable() {
        let root = TestRoot::new().await.unwrap();
        let mut opts = VfsOptions::default();
        opts.skip.keep_matching(r"\.txt$").unwrap();
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        // Directories survive the keep-only-.txt rule.
        let sub = dir.children.get("dir1").unwrap().as_dir().unwrap();
        assert!(sub.children.contains_key("file3.txt"));
    }

    #[tokio::test]
    async fn relpaths_are_slash_joined_from_the_root() {
        let root = TestRoot::new().await.unwrap();
        let opts = VfsOptions::default();
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        let sub = dir.children.get("dir1").unwrap().as_dir().unwrap();
        let nested = sub.children.get("dir2").unwrap().as_dir().unwrap();
        assert_eq!(nested.relpath, "dir1/dir2");
        assert_eq!(
            nested.children.get("file4.txt").unwrap().relpath(),
            "dir1/dir2/file4.txt"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_directory_records_an_error_and_walk_continues() {
        use std::os::unix::fs::PermissionsExt;
        let root = TestRoot::new().await.unwrap();
        let locked = root.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let opts = VfsOptions::default();
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        if nix::unistd::Uid::effective().is_root() {
            // Root ignores permission bits; nothing to assert.
            return;
        }
        let locked_node = dir.children.get("locked").unwrap().as_dir().unwrap();
        assert!(matches!(locked_node.errors[0], Error::Read { .. }));
        assert!(dir.children.contains_key("file1.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_keep_their_target() {
        let root = TestRoot::new().await.unwrap();
        let link = root.path().join("link-to-file1");
        std::os::unix::fs::symlink(root.path().join("file1.txt"), &link).unwrap();
        let opts = VfsOptions::default();
        let walker = Walker::new(&opts);
        let mut dir = empty_root(&root);
        walker.fill(&mut dir, 0).await;
        let entry = dir.children.get("link-to-file1").unwrap();
        assert_eq!(entry.stat().kind, EntryKind::Symlink);
        assert!(entry.link_target().is_some());
    }
}
