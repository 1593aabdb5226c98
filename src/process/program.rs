//! Contracts of the compiler and transformation collaborators.
//!
//! Parsing, checking and code generation are not implemented here. A
//! [`CompilerBackend`] builds a [`Program`] from a [`CompilerHost`], and a
//! [`TransformerFactory`] supplies the pre-emit hook that rewrites each unit.

use crate::diagnostic::{Diagnostics, TransformError};
use crate::host::{CancellationToken, CompilerHost, CompilerOptions, SourceFile};

/// A source-to-source rewrite applied to a unit right before code generation.
pub trait Transformer {
    fn transform(&mut self, unit: &SourceFile) -> Result<SourceFile, TransformError>;
}

/// Creates the transformer for a program, like `runtimeCheck(program)`.
pub trait TransformerFactory<P: ?Sized> {
    fn create<'p>(&self, program: &'p P) -> Box<dyn Transformer + 'p>;
}

/// Transformers run at emit time.
#[derive(Default)]
pub struct CustomTransformers<'t> {
    /// Applied in order to every emitted unit before code generation.
    pub before: Vec<Box<dyn Transformer + 't>>,
}

impl<'t> CustomTransformers<'t> {
    pub fn before(transformers: Vec<Box<dyn Transformer + 't>>) -> Self {
        Self {
            before: transformers,
        }
    }
}

impl std::fmt::Debug for CustomTransformers<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomTransformers")
            .field("before", &self.before.len())
            .finish()
    }
}

/// What an emit reports besides the written files.
#[derive(Debug, Clone, Default)]
pub struct EmitResult {
    /// Nothing was generated.
    pub emit_skipped: bool,
    /// Diagnostics raised while emitting.
    pub diagnostics: Diagnostics,
}

/// A built compilation: units, their diagnostics and code generation.
pub trait Program {
    /// The unit named `file_name`, if it is part of the program.
    fn source_file(&self, file_name: &str) -> Option<SourceFile>;

    /// Diagnostics collected while building and checking.
    fn diagnostics(&self) -> Diagnostics;

    /// Generate output for `target` (or every root unit when `None`),
    /// passing each `(file_name, text)` to `write_file`.
    ///
    /// Each unit goes through `transformers.before` exactly once. A
    /// transformer failure aborts the emit. The cancellation token, when
    /// given, is checked before every unit.
    fn emit(
        &self,
        target: Option<&SourceFile>,
        write_file: &mut dyn FnMut(&str, &str),
        cancellation: Option<&CancellationToken>,
        emit_only_declarations: bool,
        transformers: &mut CustomTransformers<'_>,
    ) -> Result<EmitResult, TransformError>;
}

/// Builds programs. Everything the program needs must be reachable
/// through the host when this is called.
pub trait CompilerBackend {
    type Program: Program;

    fn create_program(
        &self,
        root_names: &[String],
        options: &CompilerOptions,
        host: &dyn CompilerHost,
    ) -> Self::Program;
}
