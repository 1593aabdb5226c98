//! Virtual File System trait.

use chrono::{DateTime, Utc};

use super::read::Encoding;
use crate::diagnostic::{NodeKind, VfsError};

/// Metadata for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// File or directory.
    pub kind: NodeKind,
    /// Content length in bytes (0 for directories).
    pub size: usize,
    /// Last modification.
    pub modified: DateTime<Utc>,
}

impl Stat {
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Synchronous hierarchical file store.
///
/// Every method takes `&self`; implementations use interior mutability so
/// that the host bridge and the session can share one instance. Relative
/// paths resolve against [`current_directory`](Self::current_directory).
///
/// # Example
///
/// ```ignore
/// use playground_host::resource::file::{Encoding, MemoryFs, VirtualFileSystem, mkdirp};
///
/// let fs = MemoryFs::new();
/// mkdirp(&fs, "/node_modules/left-pad")?;
/// fs.write_file("/node_modules/left-pad/index.d.ts", "export {};", Encoding::Utf8)?;
/// assert_eq!(fs.readdir("/node_modules")?, vec!["left-pad"]);
/// ```
pub trait VirtualFileSystem {
    /// Metadata of the node at `path`.
    fn stat(&self, path: &str) -> Result<Stat, VfsError>;

    /// Text content of the file at `path`.
    fn read_file(&self, path: &str, encoding: Encoding) -> Result<String, VfsError>;

    /// Create or overwrite the file at `path`. The parent must exist.
    fn write_file(&self, path: &str, content: &str, encoding: Encoding) -> Result<(), VfsError>;

    /// Create a single directory. The parent must exist.
    fn mkdir(&self, path: &str) -> Result<(), VfsError>;

    /// Child names of the directory at `path`, ordered by name.
    ///
    /// A missing path lists as empty.
    fn readdir(&self, path: &str) -> Result<Vec<String>, VfsError>;

    /// Directory that relative paths resolve against.
    fn current_directory(&self) -> &str;
}
