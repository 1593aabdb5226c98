//! Recursive directory creation.

use super::path;
use super::vfs::VirtualFileSystem;
use crate::diagnostic::{NodeKind, VfsError};

/// Ensure `dir` and all of its ancestors exist as directories.
///
/// Ancestors are probed from the leaf upward, stopping at the first one that
/// already exists, then created top-down. Calling it again is a no-op.
/// A segment that exists as a file fails with `TypeConflict`.
pub fn mkdirp(fs: &dyn VirtualFileSystem, dir: &str) -> Result<(), VfsError> {
    let target = path::normalize(fs.current_directory(), dir)?;

    let mut missing = Vec::new();
    let mut cursor = Some(target.as_str());
    while let Some(current) = cursor {
        match fs.stat(current) {
            Ok(stat) if stat.is_directory() => break,
            Ok(_) => return Err(VfsError::conflict(current, NodeKind::Directory)),
            Err(e) if e.is_not_found() => missing.push(current),
            Err(e) => return Err(e),
        }
        cursor = path::parent(current);
    }

    for current in missing.into_iter().rev() {
        match fs.mkdir(current) {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
