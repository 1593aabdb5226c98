//! POSIX-style path utilities for the in-memory filesystem.
//!
//! Paths inside the filesystem are always absolute, `/`-separated and
//! normalized (no `.`/`..` segments, no repeated or trailing slashes).

use crate::diagnostic::VfsError;

/// Normalize `path` to absolute form, resolving it against `cwd` when relative.
///
/// `.` segments are dropped, `..` pops a segment (staying at `/` when there
/// is nothing to pop) and repeated slashes collapse. Empty paths and paths
/// containing NUL are rejected.
pub fn normalize(cwd: &str, path: &str) -> Result<String, VfsError> {
    if path.is_empty() || path.contains('\0') {
        return Err(VfsError::InvalidPath { path: path.into() });
    }

    let mut parts: Vec<&str> = Vec::new();
    let joined = (!path.starts_with('/')).then_some(cwd);
    for segment in joined
        .into_iter()
        .chain(std::iter::once(path))
        .flat_map(|p| p.split('/'))
    {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }

    let mut result = String::with_capacity(path.len() + 1);
    for part in &parts {
        result.push('/');
        result.push_str(part);
    }
    if result.is_empty() {
        result.push('/');
    }
    Ok(result)
}

/// Segments of a normalized absolute path (`/` yields none).
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Parent of a normalized absolute path, `None` for `/`.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of a path, `None` for `/`.
pub fn file_name(path: &str) -> Option<&str> {
    segments(path).last()
}

/// Join `name` onto `base` with exactly one separator.
pub fn join(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if name.is_empty() {
        return if base.is_empty() { "/".into() } else { base.into() };
    }
    format!("{base}/{name}")
}

/// Ensure a directory path ends with `/`, as expected when prefixing file names.
pub fn as_directory(path: &str) -> String {
    if path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{path}/")
    }
}
