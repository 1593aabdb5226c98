//! Emit with a pre-emit transformation, capturing the output text.

use rustc_hash::FxHashSet;

use super::program::{CustomTransformers, Program, Transformer, TransformerFactory};
use crate::diagnostic::{Diagnostics, TransformError};
use crate::host::{CancellationToken, SourceFile};

/// A generated output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub file_name: String,
    pub text: String,
}

/// Everything one emit produced.
#[derive(Debug, Clone, Default)]
pub struct EmitOutput {
    /// Files in the order they were written.
    pub files: Vec<EmittedFile>,
    pub emit_skipped: bool,
    pub diagnostics: Diagnostics,
}

impl EmitOutput {
    /// Text of the output file `file_name`.
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(|f| f.text.as_str())
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.file_name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Wraps the user transformer, refusing to run twice on one unit and
/// stopping once an exit was requested.
struct Tracked<'t> {
    inner: Box<dyn Transformer + 't>,
    seen: FxHashSet<String>,
    cancellation: Option<CancellationToken>,
}

impl Transformer for Tracked<'_> {
    fn transform(&mut self, unit: &SourceFile) -> Result<SourceFile, TransformError> {
        if let Some(token) = &self.cancellation {
            token.check()?;
        }
        if !self.seen.insert(unit.file_name.clone()) {
            return Err(TransformError::Repeated {
                file_name: unit.file_name.clone(),
            });
        }
        tracing::debug!(unit = %unit.file_name, "transform");
        self.inner.transform(unit)
    }
}

/// Emit `entry` with the factory's transformer as the `before` hook.
///
/// The transformer is created once, over `program`. Written files are
/// captured in order; a transformer failure is returned as-is and no
/// partial output escapes.
pub fn emit_with_transform<P, F>(
    program: &P,
    entry: &SourceFile,
    factory: &F,
    cancellation: Option<&CancellationToken>,
) -> Result<EmitOutput, TransformError>
where
    P: Program + ?Sized,
    F: TransformerFactory<P> + ?Sized,
{
    let tracked = Tracked {
        inner: factory.create(program),
        seen: FxHashSet::default(),
        cancellation: cancellation.cloned(),
    };
    let hook: Box<dyn Transformer + '_> = Box::new(tracked);
    let mut transformers = CustomTransformers::before(vec![hook]);

    let mut files = Vec::new();
    let mut sink = |file_name: &str, text: &str| {
        files.push(EmittedFile {
            file_name: file_name.to_owned(),
            text: text.to_owned(),
        });
    };

    let result = program.emit(Some(entry), &mut sink, cancellation, false, &mut transformers)?;
    tracing::debug!(
        entry = %entry.file_name,
        files = files.len(),
        skipped = result.emit_skipped,
        "emit finished"
    );

    Ok(EmitOutput {
        files,
        emit_skipped: result.emit_skipped,
        diagnostics: result.diagnostics,
    })
}
