use std::fs;
use std::fs::create_dir_all;
use std::path::Path as StdPath;

use async_walkdir::WalkDir;
use futures_lite::StreamExt;
use similar::ChangeTag;
use similar::TextDiff;
use tempdir::TempDir;

use crate::errors::Error;

// File paths and optional contents to create in the temporary test
// root.
pub(crate) static TEMP_FILES: &[(&str, &str, bool)] = &[
    ("file1.txt", "", false),
    ("file2.txt", "", false),
    ("dir1", "", true),
    ("dir1/file3.txt", "", false),
    ("dir1/dir2", "", true),
    ("dir1/dir2/file4.txt", "", false),
    ("dir1/dir2/dir_empty1", "", true),
    ("dir3", "", true),
    ("dir3/file6.txt", "", false),
];

/// Utility structure for managing a temporary test directory and its
/// files.
#[derive(Debug)]
pub struct TestRoot {
    root: TempDir,
}

impl TestRoot {
    /// Creates a root seeded with the standard fixture tree, then
    /// verifies the seeds against an independent walk.
    pub async fn new() -> Result<Self, Error> {
        let ret = Self::bare().await?;
        for (relative_path, contents, is_dir) in TEMP_FILES {
            if *is_dir {
                create_dir_all(ret.path().join(relative_path)).map_err(|e| Error::Write {
                    what: format!("directory {relative_path}"),
                    how: e.to_string(),
                })?;
            } else {
                ret.create_file(relative_path, contents)
                    .map_err(|e| Error::Write {
                        what: format!("file {relative_path}"),
                        how: e.to_string(),
                    })?;
            }
        }
        let listed = ret.on_disk_relpaths().await?;
        for (relative_path, _, _) in TEMP_FILES {
            if !listed.iter().any(|p| p == relative_path) {
                return Err(Error::Write {
                    what: format!("fixture entry {relative_path}"),
                    how: "missing from the on-disk walk".to_string(),
                });
            }
        }
        Ok(ret)
    }

    /// Creates an empty root for tests that lay out their own tree.
    pub async fn bare() -> Result<Self, Error> {
        let root = TempDir::new("viewfs").map_err(|e| Error::Write {
            what: "temporary directory".to_string(),
            how: e.to_string(),
        })?;
        Ok(Self { root })
    }

    /// Absolute path of the root.
    pub fn path(&self) -> &StdPath {
        self.root.path()
    }

    /// Creates a file with the specified relative path and contents,
    /// making any missing parent directories.
    pub fn create_file(&self, relative_path: &str, contents: &str) -> std::io::Result<()> {
        let full = self.path().join(relative_path);
        if let Some(parent) = full.parent() {
            create_dir_all(parent)?;
        }
        fs::write(full, contents)
    }

    /// Sorted relative paths of everything under the root, listed
    /// with a walker that shares no code with the snapshot builder.
    pub async fn on_disk_relpaths(&self) -> Result<Vec<String>, Error> {
        let mut entries = WalkDir::new(self.path());
        let mut out = Vec::new();
        loop {
            match entries.next().await {
                Some(Ok(entry)) => {
                    let path = entry.path();
                    let rel = path.strip_prefix(self.path()).map_err(|e| Error::Read {
                        what: path.display().to_string(),
                        how: e.to_string(),
                    })?;
                    out.push(rel.to_string_lossy().into_owned());
                }
                Some(Err(e)) => {
                    return Err(Error::Read {
                        what: "reading directory entry".to_string(),
                        how: e.to_string(),
                    });
                }
                None => break,
            }
        }
        out.sort();
        Ok(out)
    }
}

/// Line diff of `expected` against `actual`; `None` when they are
/// identical.
pub fn diff(expected: &str, actual: &str) -> Option<String> {
    let diff = TextDiff::from_lines(expected, actual);
    let mut changes = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => continue,
        };
        changes.push_str(&format!("{sign}{change}"));
    }
    if changes.is_empty() { None } else { Some(changes) }
}
