//! Prelude module for convenient imports.
//!
//! ```ignore
//! use playground_host::prelude::*;
//! ```

// Session & compilation
pub use crate::process::{
    emit_with_transform, CompileResult, Compiler, EditorState, EmitOutput, EmittedFile, Plugin,
    PluginConfig,
};
pub use crate::session::{PackageState, Prepared, Session};

// Collaborator contracts
pub use crate::process::{
    CompilerBackend, CustomTransformers, EmitResult, Program, Transformer, TransformerFactory,
};

// Host
pub use crate::host::{
    CancellationToken, CompilerHost, CompilerOptions, HostBridge, ModuleResolver, ResolutionMode,
    ResolvedModule, ScriptTarget, SourceFile, VfsCompilerHost,
};

// VFS
pub use crate::resource::file::{mkdirp, Encoding, MemoryFs, Stat, VirtualFileSystem};

// Remote
pub use crate::resource::library::{DefaultLibraryMap, LibraryLoader};
pub use crate::resource::package::{PackageFetcher, RemotePackageDescriptor};
#[cfg(feature = "http")]
pub use crate::resource::transport::HttpTransport;
pub use crate::resource::transport::{Response, Transport};

// Config & diagnostics
pub use crate::config::{Config, ConfigBuilder};
pub use crate::diagnostic::{
    CompileError, Diagnostic, DiagnosticOptions, DiagnosticSummary, Diagnostics, DisplayStyle,
    FetchError, Severity, TransformError, VfsError,
};
