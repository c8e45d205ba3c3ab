//! Read-only, in-memory snapshot of a directory tree, rendered to a
//! terminal in several layouts.
//!
//! A snapshot is built once (async, walking the filesystem) and then
//! rendered any number of times without touching the disk again. The
//! build collects per-entry metadata, a git status overlay and the
//! listing errors it ran into; rendering lays the tree out as a flat
//! list, a tree, a list with tree edges, per-level groups, bordered
//! tables or an `ls -F` style grid, all measured in terminal display
//! columns.
//!
//! ```rust
//! # tokio_test::block_on(async {
//! # use viewfs::Vfs;
//! # use viewfs::VfsOptions;
//! let mut opts = VfsOptions::default();
//! opts.depth = 0;
//! let vfs = Vfs::build("./src", opts).await.unwrap();
//! let listing = vfs.render_to_string();
//! assert!(listing.contains("lib.rs"));
//! println!("{listing}");
//! # })
//! ```
//!
//! The output might look like
//! ```text
//! PERMS       SIZE  MODIFIED          GIT  NAME
//! -rw-r--r--  1.2k  2025-11-20 00:35  --   lib.rs
//! -rw-r--r--  8.0k  2025-11-20 00:35  -M   vfs.rs
//! drwxr-xr-x     -  2025-11-20 00:35  --   view
//! 1 directory, 2 files, size 9.2k
//!
//! Total: 1 directory, 2 files, size 9.2k
//! ```
//!
//! Snapshots serialize with `serde`, so a built tree can be shipped
//! elsewhere and rendered there.

mod color;
mod digest;
mod entry;
mod errors;
mod fields;
mod git;
mod options;
mod owner;
mod reader;
mod skip;
mod sort;
mod stat;
pub mod text;
pub mod utils;
mod vfs;
mod view;
mod walk;

pub use color::RenderOptions;
pub use entry::DirNode;
pub use entry::Entry;
pub use entry::FileNode;
pub use errors::Error;
pub use fields::ViewFields;
pub use git::GitStatus;
pub use git::StatusCode;
pub use git::XY;
pub use options::Grouping;
pub use options::Layout;
pub use options::VfsOptions;
pub use reader::DirReader;
pub use skip::SkipRule;
pub use skip::SkipSet;
pub use sort::SortKey;
pub use sort::SortSpec;
pub use stat::EntryKind;
pub use stat::EntryStat;
pub use vfs::Vfs;

#[cfg(feature = "test_utils")]
pub(crate) mod test_utils;
#[cfg(feature = "test_utils")]
pub use test_utils::TestRoot;
