//! In-memory filesystem implementation.
//!
//! The whole tree lives behind one `RwLock`; directories own their
//! children, so the tree can never contain cycles or shared nodes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::path;
use super::read::{decode, encode, Encoding};
use super::vfs::{Stat, VirtualFileSystem};
use crate::diagnostic::{NodeKind, VfsError};

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Node {
    File {
        content: Vec<u8>,
        modified: DateTime<Utc>,
    },
    Directory {
        children: BTreeMap<String, Node>,
        modified: DateTime<Utc>,
    },
}

impl Node {
    fn directory() -> Self {
        Self::Directory {
            children: BTreeMap::new(),
            modified: Utc::now(),
        }
    }

    fn stat(&self) -> Stat {
        match self {
            Self::File { content, modified } => Stat {
                kind: NodeKind::File,
                size: content.len(),
                modified: *modified,
            },
            Self::Directory { modified, .. } => Stat {
                kind: NodeKind::Directory,
                size: 0,
                modified: *modified,
            },
        }
    }
}

/// Walk from `root` to the node at normalized `target`.
///
/// Fails with `TypeConflict` naming the offending file when a non-final
/// segment is a file, and with `NotFound` when a segment is missing.
fn lookup<'n>(root: &'n Node, target: &str) -> Result<&'n Node, VfsError> {
    let mut node = root;
    let mut walked = String::new();
    for segment in path::segments(target) {
        node = match node {
            Node::Directory { children, .. } => children
                .get(segment)
                .ok_or_else(|| VfsError::not_found(target))?,
            Node::File { .. } => {
                return Err(VfsError::conflict(walked, NodeKind::Directory));
            }
        };
        walked.push('/');
        walked.push_str(segment);
    }
    Ok(node)
}

fn lookup_mut<'n>(root: &'n mut Node, target: &str) -> Result<&'n mut Node, VfsError> {
    let mut node = root;
    let mut walked = String::new();
    for segment in path::segments(target) {
        node = match node {
            Node::Directory { children, .. } => children
                .get_mut(segment)
                .ok_or_else(|| VfsError::not_found(target))?,
            Node::File { .. } => {
                return Err(VfsError::conflict(walked, NodeKind::Directory));
            }
        };
        walked.push('/');
        walked.push_str(segment);
    }
    Ok(node)
}

/// Resolve the parent directory of `target` for a mutation.
///
/// Returns the parent's children map, the parent's modification stamp and
/// the leaf name.
fn parent_dir<'n, 'p>(
    root: &'n mut Node,
    target: &'p str,
) -> Result<(&'n mut BTreeMap<String, Node>, &'n mut DateTime<Utc>, &'p str), VfsError> {
    let (Some(parent), Some(name)) = (path::parent(target), path::file_name(target)) else {
        return Err(VfsError::already_exists(target));
    };
    match lookup_mut(root, parent)? {
        Node::Directory { children, modified } => Ok((children, modified, name)),
        Node::File { .. } => Err(VfsError::conflict(parent, NodeKind::Directory)),
    }
}

/// Traversal through a file means the path cannot exist.
fn absent_on_conflict(err: VfsError, target: &str) -> VfsError {
    match err {
        VfsError::TypeConflict { .. } => VfsError::not_found(target),
        other => other,
    }
}

/// In-memory filesystem.
///
/// Thread-safe via internal `RwLock`. All data is lost when dropped.
#[derive(Debug)]
pub struct MemoryFs {
    root: RwLock<Node>,
    cwd: String,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create an empty filesystem containing only `/`, with `/` as the
    /// working directory.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::directory()),
            cwd: "/".into(),
        }
    }

    /// Create a filesystem whose working directory is `cwd`.
    ///
    /// The directory itself is not created; see [`super::mkdirp`].
    pub fn with_cwd(cwd: &str) -> Result<Self, VfsError> {
        let cwd = path::normalize("/", cwd)?;
        Ok(Self {
            root: RwLock::new(Node::directory()),
            cwd: path::as_directory(&cwd),
        })
    }

    fn resolve(&self, raw: &str) -> Result<String, VfsError> {
        path::normalize(&self.cwd, raw)
    }
}

impl VirtualFileSystem for MemoryFs {
    fn stat(&self, raw: &str) -> Result<Stat, VfsError> {
        let target = self.resolve(raw)?;
        let root = self.root.read();
        lookup(&root, &target)
            .map(Node::stat)
            .map_err(|e| absent_on_conflict(e, &target))
    }

    fn read_file(&self, raw: &str, encoding: Encoding) -> Result<String, VfsError> {
        let target = self.resolve(raw)?;
        let root = self.root.read();
        match lookup(&root, &target).map_err(|e| absent_on_conflict(e, &target))? {
            Node::File { content, .. } => decode(&target, content, encoding),
            Node::Directory { .. } => Err(VfsError::not_found(target)),
        }
    }

    fn write_file(&self, raw: &str, content: &str, encoding: Encoding) -> Result<(), VfsError> {
        let target = self.resolve(raw)?;
        if target == "/" {
            return Err(VfsError::conflict(target, NodeKind::File));
        }
        let bytes = encode(&target, content, encoding)?;

        let mut root = self.root.write();
        let (children, parent_modified, name) = parent_dir(&mut root, &target)?;
        let now = Utc::now();
        match children.get_mut(name) {
            Some(Node::Directory { .. }) => return Err(VfsError::conflict(target, NodeKind::File)),
            Some(Node::File { content, modified }) => {
                *content = bytes;
                *modified = now;
            }
            None => {
                children.insert(
                    name.to_owned(),
                    Node::File {
                        content: bytes,
                        modified: now,
                    },
                );
                *parent_modified = now;
            }
        }
        Ok(())
    }

    fn mkdir(&self, raw: &str) -> Result<(), VfsError> {
        let target = self.resolve(raw)?;
        let mut root = self.root.write();
        let (children, parent_modified, name) = parent_dir(&mut root, &target)?;
        if children.contains_key(name) {
            return Err(VfsError::already_exists(target));
        }
        children.insert(name.to_owned(), Node::directory());
        *parent_modified = Utc::now();
        Ok(())
    }

    fn readdir(&self, raw: &str) -> Result<Vec<String>, VfsError> {
        let target = self.resolve(raw)?;
        let root = self.root.read();
        match lookup(&root, &target) {
            Ok(Node::Directory { children, .. }) => Ok(children.keys().cloned().collect()),
            Ok(Node::File { .. }) => Err(VfsError::conflict(target, NodeKind::Directory)),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(VfsError::TypeConflict { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn current_directory(&self) -> &str {
        &self.cwd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::file::mkdirp;

    #[test]
    fn test_write_then_read() {
        let fs = MemoryFs::new();
        fs.write_file("/a.ts", "let a = 1;", Encoding::Utf8).unwrap();
        assert_eq!(fs.read_file("/a.ts", Encoding::Utf8).unwrap(), "let a = 1;");

        fs.write_file("a.ts", "let b = 2;", Encoding::Utf8).unwrap();
        assert_eq!(fs.read_file("/./a.ts", Encoding::Utf8).unwrap(), "let b = 2;");
    }

    #[test]
    fn test_write_then_read_keeps_bom() {
        let fs = MemoryFs::new();
        let text = "\u{feff}export {};";
        fs.write_file("/a.ts", text, Encoding::Utf8).unwrap();
        assert_eq!(fs.read_file("/a.ts", Encoding::Utf8).unwrap(), text);
        assert_eq!(fs.stat("/a.ts").unwrap().size, text.len());
    }

    #[test]
    fn test_write_requires_parent() {
        let fs = MemoryFs::new();
        let err = fs.write_file("/missing/a.ts", "", Encoding::Utf8).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_through_file_conflicts() {
        let fs = MemoryFs::new();
        fs.write_file("/a", "", Encoding::Utf8).unwrap();
        let err = fs.write_file("/a/b.ts", "", Encoding::Utf8).unwrap_err();
        assert_eq!(err, VfsError::conflict("/a", NodeKind::Directory));
    }

    #[test]
    fn test_write_over_directory_conflicts() {
        let fs = MemoryFs::new();
        fs.mkdir("/dir").unwrap();
        let err = fs.write_file("/dir", "", Encoding::Utf8).unwrap_err();
        assert_eq!(err, VfsError::conflict("/dir", NodeKind::File));
        assert!(fs.write_file("/", "", Encoding::Utf8).is_err());
    }

    #[test]
    fn test_read_directory_is_not_found() {
        let fs = MemoryFs::new();
        fs.mkdir("/dir").unwrap();
        assert!(fs.read_file("/dir", Encoding::Utf8).unwrap_err().is_not_found());
        assert!(fs.read_file("/nope", Encoding::Utf8).unwrap_err().is_not_found());
    }

    #[test]
    fn test_mkdir_strict() {
        let fs = MemoryFs::new();
        fs.mkdir("/a").unwrap();
        assert!(fs.mkdir("/a").unwrap_err().is_already_exists());
        assert!(fs.mkdir("/").unwrap_err().is_already_exists());
        assert!(fs.mkdir("/x/y").unwrap_err().is_not_found());

        fs.write_file("/f", "", Encoding::Utf8).unwrap();
        assert!(matches!(fs.mkdir("/f/g"), Err(VfsError::TypeConflict { .. })));
    }

    #[test]
    fn test_stat() {
        let fs = MemoryFs::new();
        fs.write_file("/a.ts", "abc", Encoding::Utf8).unwrap();

        let stat = fs.stat("/a.ts").unwrap();
        assert!(stat.is_file());
        assert_eq!(stat.size, 3);
        assert!(fs.stat("/").unwrap().is_directory());
        assert!(fs.stat("/a.ts/b").unwrap_err().is_not_found());
        assert!(fs.stat("/zzz").unwrap_err().is_not_found());
    }

    #[test]
    fn test_readdir_ordered() {
        let fs = MemoryFs::new();
        for name in ["/c", "/a", "/b"] {
            fs.write_file(name, "", Encoding::Utf8).unwrap();
        }
        fs.mkdir("/d").unwrap();
        assert_eq!(fs.readdir("/").unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_readdir_missing_and_file() {
        let fs = MemoryFs::new();
        assert!(fs.readdir("/node_modules").unwrap().is_empty());

        fs.write_file("/f", "", Encoding::Utf8).unwrap();
        assert!(matches!(fs.readdir("/f"), Err(VfsError::TypeConflict { .. })));
        assert!(fs.readdir("/f/g").unwrap().is_empty());
    }

    #[test]
    fn test_case_sensitive_names() {
        let fs = MemoryFs::new();
        fs.write_file("/A.ts", "upper", Encoding::Utf8).unwrap();
        fs.write_file("/a.ts", "lower", Encoding::Utf8).unwrap();
        assert_eq!(fs.read_file("/A.ts", Encoding::Utf8).unwrap(), "upper");
        assert_eq!(fs.readdir("/").unwrap().len(), 2);
    }

    #[test]
    fn test_with_cwd_resolves_relative() {
        let fs = MemoryFs::with_cwd("/work").unwrap();
        assert_eq!(fs.current_directory(), "/work/");
        mkdirp(&fs, "/work").unwrap();
        fs.write_file("main.ts", "x", Encoding::Utf8).unwrap();
        assert!(fs.stat("/work/main.ts").unwrap().is_file());
    }

    #[test]
    fn test_invalid_path() {
        let fs = MemoryFs::new();
        assert!(matches!(fs.stat(""), Err(VfsError::InvalidPath { .. })));
        assert!(matches!(
            fs.write_file("/a\0", "", Encoding::Utf8),
            Err(VfsError::InvalidPath { .. })
        ));
    }
}
