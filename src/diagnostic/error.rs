//! Error types for the filesystem, fetch, transform and compile layers.

use thiserror::Error;

use super::info::Diagnostics;

/// Kind of a filesystem node, used in conflict reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A regular file holding content.
    File,
    /// A directory holding named children.
    Directory,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

/// Error raised by virtual filesystem operations.
///
/// `NotFound` stays internal to the existence probes of the host bridge,
/// `AlreadyExists` is tolerated wherever creation is idempotent, and
/// `TypeConflict` always propagates since it means a file/directory mix-up
/// in the tree being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// The path (or one of its ancestors) does not exist.
    #[error("ENOENT: no such file or directory, '{path}'")]
    NotFound {
        /// Normalized path that was looked up.
        path: String,
    },

    /// Something already exists at the path.
    #[error("EEXIST: file already exists, '{path}'")]
    AlreadyExists {
        /// Normalized path that was created.
        path: String,
    },

    /// A path segment has the wrong node kind.
    #[error("type conflict at '{path}': expected a {expected}")]
    TypeConflict {
        /// Path of the conflicting segment.
        path: String,
        /// The kind the operation required.
        expected: NodeKind,
    },

    /// The path cannot be interpreted.
    #[error("invalid path: {path:?}")]
    InvalidPath {
        /// The raw path as given.
        path: String,
    },

    /// Content could not be decoded from or encoded into the requested encoding.
    #[error("cannot use {encoding} encoding for '{path}'")]
    Encoding {
        /// Path of the file.
        path: String,
        /// Name of the encoding.
        encoding: &'static str,
    },
}

impl VfsError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub(crate) fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    pub(crate) fn conflict(path: impl Into<String>, expected: NodeKind) -> Self {
        Self::TypeConflict {
            path: path.into(),
            expected,
        }
    }

    /// Returns `true` for [`VfsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`VfsError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Failure while retrieving a package or library from the remote mirror.
///
/// Cloneable so a session can keep the failure and report it again on
/// every action that depends on the package.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Transport-level message.
        message: String,
    },

    /// The mirror answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The package manifest is not valid JSON.
    #[error("malformed manifest for package '{package}': {message}")]
    Manifest {
        /// Package name.
        package: String,
        /// Parser message.
        message: String,
    },

    /// The manifest does not declare a type-definition entry.
    #[error("package '{package}' does not declare a \"types\" entry")]
    MissingTypes {
        /// Package name.
        package: String,
    },

    /// The package name or declared entry cannot be mapped to a URL or path.
    #[error("invalid package reference '{reference}'")]
    InvalidReference {
        /// The offending name or path.
        reference: String,
    },

    /// The fetched content could not be written into the filesystem.
    #[error("cannot store fetched content: {0}")]
    Vfs(#[from] VfsError),
}

/// Failure raised by the pre-emit transformation hook.
///
/// Unlike a missing source file, this always signals a defect and is
/// surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The transformer rejected a unit.
    #[error("transform failed in '{file_name}': {message}")]
    Failed {
        /// Unit being transformed.
        file_name: String,
        /// Transformer message.
        message: String,
    },

    /// The hook was invoked more than once for the same unit in one emit.
    #[error("transform invoked more than once for '{file_name}'")]
    Repeated {
        /// Unit that was transformed twice.
        file_name: String,
    },

    /// The host requested an exit while emitting.
    #[error("emit cancelled with exit code {code}")]
    Cancelled {
        /// Exit code passed to the host.
        code: i32,
    },
}

impl TransformError {
    /// Create a [`TransformError::Failed`].
    pub fn failed(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            file_name: file_name.into(),
            message: message.into(),
        }
    }
}

/// Error type for a compile-and-transform cycle.
///
/// # Example
///
/// ```ignore
/// match plugin.run(&backend, &editor, &factory).await {
///     Ok(result) => show(&result.output),
///     Err(CompileError::Fetch(e)) => show_error(&format!("dependency unavailable: {e}")),
///     Err(CompileError::Compilation { diagnostics }) => {
///         for diag in diagnostics.errors() {
///             eprintln!("{}", diag.message);
///         }
///     }
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum CompileError {
    /// The program reported errors and produced no output.
    #[error("{diagnostics}")]
    Compilation {
        /// Diagnostics reported by the program.
        diagnostics: Diagnostics,
    },

    /// A package or library the action depends on could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The pre-emit transformation failed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// A filesystem operation failed.
    #[error(transparent)]
    Vfs(#[from] VfsError),

    /// A newer invocation started while this one was waiting.
    #[error("invocation {generation} was superseded by a newer one")]
    Superseded {
        /// Generation of the stale invocation.
        generation: u64,
    },

    /// The entry file is not part of the built program.
    #[error("entry file '{path}' is not part of the program")]
    MissingEntry {
        /// Entry path.
        path: String,
    },

    /// The compile options need default libraries the invocation did not prepare.
    #[error("default libraries for target '{target}' were not prepared for this invocation")]
    LibrariesNotPrepared {
        /// Target of the requested options.
        target: &'static str,
    },
}

impl CompileError {
    /// Check if this error carries error-level diagnostics or is a hard failure.
    pub fn has_fatal_errors(&self) -> bool {
        match self {
            Self::Compilation { diagnostics } => diagnostics.has_errors(),
            _ => true,
        }
    }

    /// Get the diagnostics if this is a compilation error.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Compilation { diagnostics } => Some(diagnostics),
            _ => None,
        }
    }
}
