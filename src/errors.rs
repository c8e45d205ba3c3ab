use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Represents all possible errors in the viewfs crate.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub enum Error {
    /// Error indicating the snapshot root does not exist.
    #[error("Not found: {what}")]
    NotFound {
        /// The path that could not be found.
        what: String,
    },

    /// Error indicating the snapshot root is not a directory.
    #[error("Not a directory: {what}")]
    NotADirectory {
        /// The offending path.
        what: String,
    },

    /// Error indicating a failure to stat a single entry during the
    /// walk. Recorded on the owning directory; never aborts the build.
    #[error("Failed to stat {what}: {how}")]
    Stat {
        /// The entry that failed to be examined.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// Error indicating a failure to read data.
    #[error("Failed to read {what}: {how}")]
    Read {
        /// The item that failed to be read.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// Error indicating a failure to write rendered output.
    #[error("Failed to write {what}: {how}")]
    Write {
        /// The item that failed to be written.
        what: String,
        /// The reason for the failure.
        how: String,
    },

    /// Error indicating an invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
