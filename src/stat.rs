use std::fs::Metadata;
use std::path::Path as StdPath;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;
use tokio::fs;

use crate::digest;
use crate::errors::Error;
use crate::owner::OwnerCache;

/// Kind of filesystem object an entry refers to. Symlinks are reported
/// as themselves, never as their target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum EntryKind {
    /// A directory.
    Dir,
    /// A regular file.
    File,
    /// A symbolic link (metadata describes the link, not the target).
    Symlink,
    /// A block device.
    Block,
    /// A character device.
    Char,
    /// A FIFO / named pipe.
    Fifo,
    /// A Unix domain socket.
    Socket,
    /// Anything the OS reports that none of the above match.
    Unknown,
}

/// Normalized metadata of one filesystem entry, as captured at build
/// time. Fields the platform cannot provide degrade to zero / `None`
/// rather than failing the read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub struct EntryStat {
    /// What the entry is.
    pub kind: EntryKind,
    /// Raw mode bits (`st_mode` on Unix, 0 elsewhere).
    pub mode: u32,
    /// Size in bytes; for symlinks, the size of the link itself.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last access time.
    pub atime: SystemTime,
    /// Last status change time (`st_ctime`); mtime where unavailable.
    pub ctime: SystemTime,
    /// Creation time; `None` where the platform cannot report one.
    pub created: Option<SystemTime>,
    /// Inode number (0 off Unix).
    pub ino: u64,
    /// Device number (0 off Unix).
    pub dev: u64,
    /// Hard link count (0 off Unix).
    pub nlink: u64,
    /// Allocated 512-byte blocks (0 off Unix).
    pub blocks: u64,
    /// Numeric owner id.
    pub uid: u32,
    /// Numeric group id.
    pub gid: u32,
    /// Owner name resolved at build time; numeric fallback.
    pub user: String,
    /// Group name resolved at build time; numeric fallback.
    pub group: String,
    /// Extended attribute names. `None` means unknown/unsupported,
    /// `Some(empty)` means the entry is known to have none.
    pub xattrs: Option<Vec<String>>,
    /// Content digest, present only when requested at build time.
    pub md5: Option<String>,
}

impl EntryStat {
    /// Stats `path` without following symlinks and normalizes the
    /// result. Owner and group names come from `owners`; the digest is
    /// computed only for regular files and only when `want_md5` is
    /// set.
    pub(crate) async fn lstat(
        path: &StdPath,
        owners: &OwnerCache,
        want_md5: bool,
    ) -> Result<Self, Error> {
        let metadata = fs::symlink_metadata(path).await.map_err(|e| Error::Stat {
            what: path.to_string_lossy().to_string(),
            how: e.to_string(),
        })?;
        let mut stat = Self::from_metadata(&metadata, owners);
        stat.xattrs = read_xattrs(path);
        if want_md5 && stat.kind == EntryKind::File {
            match digest::md5_of_file(path).await {
                Ok(digest) => stat.md5 = Some(digest),
                Err(e) => log::debug!("digest unavailable for {}: {e}", path.display()),
            }
        }
        Ok(stat)
    }

    /// Builds an `EntryStat` from already-fetched metadata. Extended
    /// attributes and digest stay unset.
    pub(crate) fn from_metadata(metadata: &Metadata, owners: &OwnerCache) -> Self {
        let kind = kind_of(metadata);
        let os = OsFields::of(metadata);
        let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        EntryStat {
            kind,
            mode: os.mode,
            size: metadata.len(),
            mtime,
            atime: metadata.accessed().unwrap_or(SystemTime::UNIX_EPOCH),
            ctime: os.ctime.unwrap_or(mtime),
            created: metadata.created().ok(),
            ino: os.ino,
            dev: os.dev,
            nlink: os.nlink,
            blocks: os.blocks,
            uid: os.uid,
            gid: os.gid,
            user: os.user_name(owners),
            group: os.group_name(owners),
            xattrs: None,
            md5: None,
        }
    }

    /// True for directories.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    #[cfg(test)]
    pub(crate) fn fixture(kind: EntryKind, size: u64) -> Self {
        EntryStat {
            kind,
            mode: if kind == EntryKind::Dir { 0o40755 } else { 0o100644 },
            size,
            mtime: SystemTime::UNIX_EPOCH,
            atime: SystemTime::UNIX_EPOCH,
            ctime: SystemTime::UNIX_EPOCH,
            created: None,
            ino: 0,
            dev: 0,
            nlink: 1,
            blocks: size.div_ceil(512),
            uid: 1000,
            gid: 1000,
            user: "user".to_string(),
            group: "group".to_string(),
            xattrs: None,
            md5: None,
        }
    }
}

struct OsFields {
    mode: u32,
    ino: u64,
    dev: u64,
    nlink: u64,
    blocks: u64,
    uid: u32,
    gid: u32,
    ctime: Option<SystemTime>,
}

#[cfg(unix)]
impl OsFields {
    fn of(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            mode: metadata.mode(),
            ino: metadata.ino(),
            dev: metadata.dev(),
            nlink: metadata.nlink(),
            blocks: metadata.blocks(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            ctime: Some(ctime_of(metadata)),
        }
    }

    fn user_name(&self, owners: &OwnerCache) -> String {
        owners.user(self.uid)
    }

    fn group_name(&self, owners: &OwnerCache) -> String {
        owners.group(self.gid)
    }
}

#[cfg(not(unix))]
impl OsFields {
    fn of(_metadata: &Metadata) -> Self {
        Self {
            mode: 0,
            ino: 0,
            dev: 0,
            nlink: 0,
            blocks: 0,
            uid: 0,
            gid: 0,
            ctime: None,
        }
    }

    fn user_name(&self, _owners: &OwnerCache) -> String {
        "-".to_string()
    }

    fn group_name(&self, _owners: &OwnerCache) -> String {
        "-".to_string()
    }
}

#[cfg(unix)]
fn ctime_of(metadata: &Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt;
    use std::time::Duration;
    let secs = metadata.ctime();
    let nsec = metadata.ctime_nsec().clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        SystemTime::UNIX_EPOCH + Duration::new(secs as u64, nsec)
    } else {
        SystemTime::UNIX_EPOCH - Duration::new(secs.unsigned_abs(), 0)
    }
}

fn kind_of(metadata: &Metadata) -> EntryKind {
    let ft = metadata.file_type();
    if ft.is_dir() {
        return EntryKind::Dir;
    }
    if ft.is_symlink() {
        return EntryKind::Symlink;
    }
    if ft.is_file() {
        return EntryKind::File;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if ft.is_fifo() {
            return EntryKind::Fifo;
        }
        if ft.is_socket() {
            return EntryKind::Socket;
        }
        if ft.is_block_device() {
            return EntryKind::Block;
        }
        if ft.is_char_device() {
            return EntryKind::Char;
        }
    }
    EntryKind::Unknown
}

#[cfg(unix)]
fn read_xattrs(path: &StdPath) -> Option<Vec<String>> {
    match xattr::list(path) {
        Ok(names) => Some(
            names
                .map(|name| name.to_string_lossy().into_owned())
                .collect(),
        ),
        Err(_) => None,
    }
}

#[cfg(not(unix))]
fn read_xattrs(_path: &StdPath) -> Option<Vec<String>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lstat_of_regular_file() {
        let path = std::env::temp_dir().join("viewfs-stat-test.txt");
        std::fs::write(&path, "0123456789").unwrap();
        let owners = OwnerCache::new();
        let stat = EntryStat::lstat(&path, &owners, false).await.unwrap();
        assert_eq!(stat.kind, EntryKind::File);
        assert_eq!(stat.size, 10);
        assert!(stat.md5.is_none());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn lstat_computes_digest_on_request() {
        let path = std::env::temp_dir().join("viewfs-stat-digest.txt");
        std::fs::write(&path, "0123456789").unwrap();
        let owners = OwnerCache::new();
        let stat = EntryStat::lstat(&path, &owners, true).await.unwrap();
        assert_eq!(stat.md5.as_deref(), Some("781e5e245d69b566979b86e28d23f2c7"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn lstat_of_missing_path_is_a_stat_error() {
        let owners = OwnerCache::new();
        let err = EntryStat::lstat(StdPath::new("/viewfs-no-such-path"), &owners, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Stat { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lstat_reports_symlinks_as_themselves() {
        let dir = std::env::temp_dir();
        let target = dir.join("viewfs-stat-target.txt");
        let link = dir.join("viewfs-stat-link");
        std::fs::write(&target, "x").unwrap();
        let _ = std::fs::remove_file(&link);
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let owners = OwnerCache::new();
        let stat = EntryStat::lstat(&link, &owners, false).await.unwrap();
        assert_eq!(stat.kind, EntryKind::Symlink);
        let _ = std::fs::remove_file(&link);
        let _ = std::fs::remove_file(&target);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unix_fields_are_populated() {
        let path = std::env::temp_dir().join("viewfs-stat-unix.txt");
        std::fs::write(&path, "x").unwrap();
        let owners = OwnerCache::new();
        let stat = EntryStat::lstat(&path, &owners, false).await.unwrap();
        assert!(stat.ino != 0);
        assert!(stat.nlink >= 1);
        assert!(!stat.user.is_empty());
        assert!(!stat.group.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
