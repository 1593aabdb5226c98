//! Default library bootstrapping.
//!
//! The compiler expects its bundled library declarations (`lib.d.ts` and
//! friends) next to the program. They are fetched from the library mirror
//! once per distinct options configuration, following
//! `/// <reference lib="..." />` directives, and installed under `libs/`.

use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use rustc_hash::FxHashSet;
use url::Url;

use super::file::{mkdirp, path, Encoding, VirtualFileSystem};
use super::transport::Transport;
use crate::diagnostic::{FetchError, VfsError};
use crate::host::{default_lib_file_name, lib_entry_file_name, CompilerOptions, ScriptTarget};

/// Identity of a library configuration: libraries are installed once per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryKey {
    pub target: ScriptTarget,
    pub lib: Vec<String>,
    pub no_lib: bool,
}

impl From<&CompilerOptions> for LibraryKey {
    fn from(options: &CompilerOptions) -> Self {
        Self {
            target: options.target,
            lib: options.lib.clone(),
            no_lib: options.no_lib,
        }
    }
}

/// Library file name → declaration text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultLibraryMap {
    files: BTreeMap<String, String>,
}

impl DefaultLibraryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(file_name.into(), text.into());
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names in order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Write every file under `location`, creating it first.
    ///
    /// Returns the absolute paths written.
    pub fn install(
        &self,
        fs: &dyn VirtualFileSystem,
        location: &str,
    ) -> Result<Vec<String>, VfsError> {
        let location = path::normalize(fs.current_directory(), location)?;
        mkdirp(fs, &location)?;

        let mut written = Vec::with_capacity(self.files.len());
        for (name, text) in &self.files {
            let target = path::join(&location, name);
            fs.write_file(&target, text, Encoding::Utf8)?;
            written.push(target);
        }
        tracing::debug!(location = %location, count = written.len(), "installed default libraries");
        Ok(written)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DefaultLibraryMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            files: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Library names referenced by `/// <reference lib="..." />` directives.
pub fn referenced_libs(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("///") && line.contains("<reference"))
        .filter_map(lib_attribute)
        .map(str::to_owned)
        .collect()
}

/// Value of a standalone `lib="..."` attribute (not `no-default-lib=`).
fn lib_attribute(line: &str) -> Option<&str> {
    let mut search = 0;
    while let Some(found) = line[search..].find("lib=") {
        let at = search + found;
        search = at + "lib=".len();
        let standalone = line[..at].chars().next_back().is_some_and(char::is_whitespace);
        if !standalone {
            continue;
        }
        let rest = &line[search..];
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let rest = &rest[1..];
        let end = rest.find(quote)?;
        return Some(&rest[..end]);
    }
    None
}

/// Root library files for `options`.
pub fn root_lib_files(options: &CompilerOptions) -> Vec<String> {
    if options.no_lib {
        Vec::new()
    } else if options.lib.is_empty() {
        vec![default_lib_file_name(options).to_owned()]
    } else {
        options.lib.iter().map(|e| lib_entry_file_name(e)).collect()
    }
}

/// Fetches default library files from the library mirror.
pub struct LibraryLoader {
    transport: Rc<dyn Transport>,
    base: Url,
}

impl std::fmt::Debug for LibraryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryLoader")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl LibraryLoader {
    /// Create a loader for `base`, which must end with `/`.
    pub fn new(transport: Rc<dyn Transport>, base: Url) -> Self {
        Self { transport, base }
    }

    fn file_url(&self, file_name: &str) -> Result<Url, FetchError> {
        self.base
            .join(file_name)
            .map_err(|_| FetchError::InvalidReference {
                reference: file_name.into(),
            })
    }

    /// Fetch the library files `options` needs, following references.
    pub async fn load(&self, options: &CompilerOptions) -> Result<DefaultLibraryMap, FetchError> {
        let mut map = DefaultLibraryMap::new();
        let mut queued: FxHashSet<String> = FxHashSet::default();
        let mut pending: VecDeque<String> = VecDeque::new();
        for name in root_lib_files(options) {
            if queued.insert(name.clone()) {
                pending.push_back(name);
            }
        }

        while let Some(name) = pending.pop_front() {
            if name.contains('/') || name.contains("..") {
                return Err(FetchError::InvalidReference { reference: name });
            }
            let url = self.file_url(&name)?;
            tracing::debug!(library = %name, url = %url, "fetching library");
            let text = self.transport.get(&url).await?.error_for_status(&url)?.body;

            for referenced in referenced_libs(&text) {
                let file_name = lib_entry_file_name(&referenced);
                if queued.insert(file_name.clone()) {
                    pending.push_back(file_name);
                }
            }
            map.insert(name, text);
        }
        Ok(map)
    }
}
