//! Git status overlay: one porcelain query per snapshot, parsed into a
//! path → XY map and aggregated up to directories. Everything here
//! degrades to a neutral "no git" state instead of failing the build.

use std::collections::HashMap;
use std::path::Path as StdPath;

use serde::Deserialize;
use serde::Serialize;
use tokio::process::Command;

use crate::errors::Error;

/// One character of a porcelain `XY` status pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum StatusCode {
    /// Clean in this column (porcelain space).
    Unmodified,
    /// `M`.
    Modified,
    /// `T`.
    TypeChanged,
    /// `A`.
    Added,
    /// `D`.
    Deleted,
    /// `R`.
    Renamed,
    /// `C`.
    Copied,
    /// `U` (unmerged).
    Unmerged,
    /// `?`; never substituted with any other code.
    Untracked,
    /// `!`; distinct from `Untracked`.
    Ignored,
    /// Directory aggregation sentinel: descendants disagree.
    Changed,
}

impl StatusCode {
    fn from_porcelain(c: char) -> Self {
        match c {
            'M' => StatusCode::Modified,
            'T' => StatusCode::TypeChanged,
            'A' => StatusCode::Added,
            'D' => StatusCode::Deleted,
            'R' => StatusCode::Renamed,
            'C' => StatusCode::Copied,
            'U' => StatusCode::Unmerged,
            '?' => StatusCode::Untracked,
            '!' => StatusCode::Ignored,
            _ => StatusCode::Unmodified,
        }
    }

    /// Single display character; `Unmodified` renders `-`, the
    /// aggregation sentinel renders `*`.
    pub fn as_char(self) -> char {
        match self {
            StatusCode::Unmodified => '-',
            StatusCode::Modified => 'M',
            StatusCode::TypeChanged => 'T',
            StatusCode::Added => 'A',
            StatusCode::Deleted => 'D',
            StatusCode::Renamed => 'R',
            StatusCode::Copied => 'C',
            StatusCode::Unmerged => 'U',
            StatusCode::Untracked => '?',
            StatusCode::Ignored => '!',
            StatusCode::Changed => '*',
        }
    }
}

/// Staging and worktree status for one repository-relative path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub struct XY {
    /// Index (staging) column.
    pub staging: StatusCode,
    /// Worktree column.
    pub worktree: StatusCode,
    /// Original path for renames and copies.
    pub extra: Option<String>,
}

impl XY {
    fn neutral() -> Self {
        XY {
            staging: StatusCode::Unmodified,
            worktree: StatusCode::Unmodified,
            extra: None,
        }
    }

    /// Two-character display cell, e.g. `-M` or `??`.
    pub fn cell(&self) -> String {
        let mut s = String::with_capacity(2);
        s.push(self.staging.as_char());
        s.push(self.worktree.as_char());
        s
    }
}

/// Result of the one-shot `git status -s -b --porcelain --ignored`
/// query for a snapshot root. Immutable once detected; shared by
/// every entry of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitStatus {
    no_git: bool,
    branch: String,
    prefix: String,
    entries: HashMap<String, XY>,
}

impl GitStatus {
    /// Runs the status query for `root`. Any failure (no repository,
    /// no git binary, non-zero exit) yields the disabled overlay; the
    /// build pipeline never treats that as an error.
    pub async fn detect(root: &StdPath) -> GitStatus {
        match Self::try_detect(root).await {
            Ok(status) => status,
            Err(e) => {
                log::warn!("git status unavailable for {}: {e}", root.display());
                Self::disabled()
            }
        }
    }

    /// The overlay used when there is no repository: every lookup is
    /// neutral.
    pub fn disabled() -> GitStatus {
        GitStatus {
            no_git: true,
            branch: String::new(),
            prefix: String::new(),
            entries: HashMap::new(),
        }
    }

    /// Builds an overlay from pre-captured porcelain text, with the
    /// snapshot root at the repository root. Renders can be driven
    /// from a fixture string without a repository on disk.
    pub(crate) fn from_porcelain(text: &str) -> GitStatus {
        let (branch, entries) = parse_porcelain(text);
        GitStatus {
            no_git: false,
            branch,
            prefix: String::new(),
            entries,
        }
    }

    async fn try_detect(root: &StdPath) -> Result<GitStatus, Error> {
        let output = Command::new("git")
            .arg("-C")
            .arg(root)
            .args(["status", "-s", "-b", "--porcelain", "--ignored"])
            .output()
            .await
            .map_err(|e| Error::Read {
                what: "git status".into(),
                how: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::Read {
                what: "git status".into(),
                how: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let (branch, entries) = parse_porcelain(&text);
        // Porcelain paths are repo-root-relative; remember where the
        // snapshot root sits inside the repository so relative lookups
        // line up.
        let prefix = show_prefix(root).await.unwrap_or_default();
        Ok(GitStatus {
            no_git: false,
            branch,
            prefix,
            entries,
        })
    }

    /// True when the root is not inside a repository (or git failed).
    pub fn no_git(&self) -> bool {
        self.no_git
    }

    /// Branch named by the `## ` header line; empty for detached heads
    /// without one.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Status pair for a snapshot-relative path; directories aggregate
    /// their descendants.
    pub fn xy_for(&self, relpath: &str, is_dir: bool) -> XY {
        if is_dir {
            self.dir_xy(relpath)
        } else {
            self.file_xy(relpath)
        }
    }

    fn repo_path(&self, relpath: &str) -> String {
        format!("{}{relpath}", self.prefix)
    }

    fn file_xy(&self, relpath: &str) -> XY {
        if self.no_git {
            return XY::neutral();
        }
        self.entries
            .get(&self.repo_path(relpath))
            .cloned()
            .unwrap_or_else(XY::neutral)
    }

    fn dir_xy(&self, relpath: &str) -> XY {
        if self.no_git {
            return XY::neutral();
        }
        // The show-prefix value carries its own trailing slash, so the
        // root lookup under a prefix must not gain a second one.
        let mut pattern = self.repo_path(relpath);
        if !pattern.is_empty() && !pattern.ends_with('/') {
            pattern.push('/');
        }
        let matching: Vec<&XY> = self
            .entries
            .iter()
            .filter(|(path, _)| path.starts_with(&pattern))
            .map(|(_, xy)| xy)
            .collect();
        XY {
            staging: fold_codes(matching.iter().map(|xy| xy.staging)),
            worktree: fold_codes(matching.iter().map(|xy| xy.worktree)),
            extra: None,
        }
    }
}

/// Collapses descendant codes: the common code when all agree, the
/// `Changed` sentinel when they disagree, neutral when there are none.
fn fold_codes(codes: impl Iterator<Item = StatusCode>) -> StatusCode {
    let mut folded = None;
    for code in codes {
        match folded {
            None => folded = Some(code),
            Some(prev) if prev == code => {}
            Some(_) => return StatusCode::Changed,
        }
    }
    folded.unwrap_or(StatusCode::Unmodified)
}

/// Parses `git status -s -b --porcelain --ignored` output into the
/// branch name and a path → XY map.
fn parse_porcelain(text: &str) -> (String, HashMap<String, XY>) {
    let mut branch = String::new();
    let mut seen_branch = false;
    let mut entries = HashMap::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !seen_branch && line.starts_with("## ") {
            seen_branch = true;
            let rest = &line[3..];
            branch = rest.split("...").next().unwrap_or(rest).to_string();
            continue;
        }
        if line.len() < 4 || !line.is_char_boundary(3) {
            continue;
        }
        let bytes = line.as_bytes();
        let staging = StatusCode::from_porcelain(bytes[0] as char);
        let worktree = StatusCode::from_porcelain(bytes[1] as char);
        let raw_path = &line[3..];
        let (path, extra) = match raw_path.split_once(" -> ") {
            Some((from, to)) => (to, Some(unquote(from).to_string())),
            None => (raw_path, None),
        };
        entries.insert(
            unquote(path).to_string(),
            XY {
                staging,
                worktree,
                extra,
            },
        );
    }
    (branch, entries)
}

fn unquote(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}

async fn show_prefix(root: &StdPath) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["rev-parse", "--show-prefix"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
