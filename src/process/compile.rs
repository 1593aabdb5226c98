//! Compile orchestration.
//!
//! # Example
//!
//! ```ignore
//! let prepared = session.prepare(&options, &["ts-transform-runtime-check"]).await?;
//!
//! let result = Compiler::new(&session, prepared)
//!     .with_root("index.ts")
//!     .compile(&backend, &runtime_check)?;
//!
//! println!("{}", result.output.get("/index.js").unwrap_or_default());
//! ```

use super::emit::{emit_with_transform, EmitOutput};
use super::program::{CompilerBackend, Program, TransformerFactory};
use crate::diagnostic::{CompileError, Diagnostics};
use crate::host::{CompilerOptions, HostBridge, VfsCompilerHost};
use crate::resource::file::{path, VirtualFileSystem};
use crate::resource::library::LibraryKey;
use crate::session::{Prepared, Session};

/// Default root unit, relative to the working directory.
pub const DEFAULT_ROOT: &str = "index.ts";

/// Result of a successful compile.
#[derive(Debug, Clone, Default)]
pub struct CompileResult {
    /// Files generated for the root unit.
    pub output: EmitOutput,
    /// Program and emit diagnostics, with source excerpts attached.
    pub diagnostics: Diagnostics,
    /// Text the program wrote to the host console.
    pub console: String,
}

impl CompileResult {
    /// Text of the output generated for `file_name`.
    pub fn text(&self, file_name: &str) -> Option<&str> {
        self.output.get(file_name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Builder for one compile over a prepared session.
///
/// Requires the [`Prepared`] ticket of the session's newest invocation.
pub struct Compiler<'s> {
    session: &'s Session,
    prepared: Prepared,
    root: String,
    options: Option<CompilerOptions>,
}

impl<'s> Compiler<'s> {
    pub fn new(session: &'s Session, prepared: Prepared) -> Self {
        Self {
            session,
            prepared,
            root: DEFAULT_ROOT.into(),
            options: None,
        }
    }

    /// Set the root unit. Relative paths are taken from the working directory.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Override the options the session was prepared with.
    ///
    /// The override must need the same default libraries as the prepared
    /// options, or none at all; `compile` fails otherwise.
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Build the program, emit the root unit through the factory's
    /// transformer and collect the result.
    pub fn compile<B, F>(self, backend: &B, factory: &F) -> Result<CompileResult, CompileError>
    where
        B: CompilerBackend,
        F: TransformerFactory<B::Program> + ?Sized,
    {
        let session = self.session;
        if !session.is_current(&self.prepared) {
            return Err(CompileError::Superseded {
                generation: self.prepared.generation(),
            });
        }

        let fs = session.fs();
        let root = path::normalize(fs.current_directory(), &self.root)?;
        let options = self.options.as_ref().unwrap_or(self.prepared.options());
        if !options.no_lib && LibraryKey::from(options) != LibraryKey::from(self.prepared.options()) {
            return Err(CompileError::LibrariesNotPrepared {
                target: options.target.as_str(),
            });
        }

        let bridge = HostBridge::new(fs);
        let host = VfsCompilerHost::from_config(&bridge, session.config());

        tracing::debug!(root = %root, target = options.target.as_str(), "creating program");
        let program = backend.create_program(std::slice::from_ref(&root), options, &host);
        let entry = program
            .source_file(&root)
            .ok_or_else(|| CompileError::MissingEntry { path: root.clone() })?;

        let output = emit_with_transform(&program, &entry, factory, Some(bridge.cancellation()))?;

        let mut diagnostics = program.diagnostics();
        diagnostics.extend(output.diagnostics.clone());
        diagnostics.attach_sources(fs);

        if output.emit_skipped && diagnostics.has_errors() {
            tracing::debug!(root = %root, "emit skipped: {}", diagnostics.summary());
            return Err(CompileError::Compilation { diagnostics });
        }

        Ok(CompileResult {
            output,
            diagnostics,
            console: bridge.output(),
        })
    }
}
