//! Operating-system facade over the virtual filesystem.
//!
//! The compiler pipeline expects a synchronous "system" object: file reads,
//! existence probes, directory listings, a working directory and a way to
//! print and exit. [`HostBridge`] answers all of these from a
//! [`VirtualFileSystem`] without touching the real machine.

use parking_lot::Mutex;

use super::cancel::CancellationToken;
use super::read_dir::{read_directory, DirectoryFilter};
use crate::diagnostic::VfsError;
use crate::resource::file::{path, Encoding, VirtualFileSystem};

/// Synchronous system facade backed by a virtual filesystem.
///
/// # Example
///
/// ```ignore
/// let fs = MemoryFs::new();
/// let bridge = HostBridge::new(&fs);
///
/// assert!(!bridge.file_exists("/index.ts"));
/// bridge.write_file("/index.ts", "export {};")?;
/// assert!(bridge.file_exists("/index.ts"));
/// assert_eq!(bridge.get_directories("/"), vec!["index.ts"]);
/// ```
pub struct HostBridge<'a> {
    fs: &'a dyn VirtualFileSystem,
    cancellation: CancellationToken,
    output: Mutex<Vec<String>>,
}

impl std::fmt::Debug for HostBridge<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("cwd", &self.fs.current_directory())
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl<'a> HostBridge<'a> {
    /// Line terminator used for generated text.
    pub const NEW_LINE: &'static str = "\n";

    /// File names are compared exactly.
    pub const USE_CASE_SENSITIVE_FILE_NAMES: bool = true;

    pub fn new(fs: &'a dyn VirtualFileSystem) -> Self {
        Self {
            fs,
            cancellation: CancellationToken::new(),
            output: Mutex::new(Vec::new()),
        }
    }

    /// Share an existing token instead of a fresh one.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The filesystem behind this bridge.
    pub fn fs(&self) -> &'a dyn VirtualFileSystem {
        self.fs
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Command-line arguments; there are none in a hosted session.
    pub fn args(&self) -> &[String] {
        &[]
    }

    pub fn read_file(&self, path: &str) -> Result<String, VfsError> {
        self.fs.read_file(path, Encoding::Utf8)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<(), VfsError> {
        self.fs.write_file(path, content, Encoding::Utf8)
    }

    /// Whether a file exists at `path`. Never fails.
    pub fn file_exists(&self, path: &str) -> bool {
        self.fs.stat(path).is_ok_and(|s| s.is_file())
    }

    /// Whether a directory exists at `path`. Never fails.
    pub fn directory_exists(&self, path: &str) -> bool {
        self.fs.stat(path).is_ok_and(|s| s.is_directory())
    }

    /// Create one directory level; an existing entry counts as success.
    pub fn create_directory(&self, path: &str) -> Result<(), VfsError> {
        if self.directory_exists(path) {
            return Ok(());
        }
        match self.fs.mkdir(path) {
            Err(e) if e.is_already_exists() => Ok(()),
            other => other,
        }
    }

    /// Entry names under `path`, or empty on any failure.
    pub fn get_directories(&self, path: &str) -> Vec<String> {
        self.fs.readdir(path).unwrap_or_default()
    }

    /// Recursively list files under `path`. Never fails.
    pub fn read_directory(&self, path: &str, filter: &DirectoryFilter) -> Vec<String> {
        read_directory(self.fs, path, filter)
    }

    pub fn get_current_directory(&self) -> &str {
        self.fs.current_directory()
    }

    /// There is no executable; the working directory stands in for it.
    pub fn get_executing_file_path(&self) -> &str {
        self.get_current_directory()
    }

    /// Normalize `path` against the working directory.
    ///
    /// Paths that cannot be normalized are returned unchanged.
    pub fn resolve_path(&self, raw: &str) -> String {
        path::normalize(self.get_current_directory(), raw).unwrap_or_else(|_| raw.to_owned())
    }

    /// Print `text`: captured for [`output`](Self::output) and logged.
    pub fn write(&self, text: &str) {
        tracing::info!(target: "playground_host::system", "{text}");
        self.output.lock().push(text.to_owned());
    }

    /// Everything written so far, concatenated.
    pub fn output(&self) -> String {
        self.output.lock().concat()
    }

    /// Drain the captured output.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock())
    }

    pub fn write_output_is_tty(&self) -> bool {
        false
    }

    /// Request termination. Nothing is killed: the code is recorded on the
    /// cancellation token and the emit step stops at the next unit.
    pub fn exit(&self, code: i32) {
        tracing::debug!(code, "exit requested");
        self.cancellation.cancel(code);
    }
}
