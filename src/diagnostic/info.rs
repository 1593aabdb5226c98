//! Structured diagnostic information reported by a program.

use std::fmt;

use super::format::{format_info, DiagnosticOptions};
use crate::resource::file::{Encoding, VirtualFileSystem};

/// Code reported for an import whose module cannot be resolved.
pub const MISSING_MODULE_CODE: u32 = 2307;

/// Code reported for a referenced file that does not exist.
pub const FILE_NOT_FOUND_CODE: u32 = 6053;

// ============================================================================
// Severity
// ============================================================================

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Blocks a successful compile.
    Error,
    /// Reported but not blocking.
    Warning,
    /// Informational output.
    Message,
}

impl Severity {
    /// Lowercase label used in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Message => "message",
        }
    }
}

// ============================================================================
// DiagnosticSummary
// ============================================================================

/// Summary of diagnostic counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    /// Number of errors.
    pub errors: usize,
    /// Number of warnings.
    pub warnings: usize,
}

impl DiagnosticSummary {
    /// Total number of counted diagnostics.
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }

    /// Whether there are any errors.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Whether nothing was counted.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for DiagnosticSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match (self.errors, self.warnings) {
            (0, 0) => write!(f, "no diagnostics"),
            (e, 0) => write!(f, "{e} error{}", plural(e)),
            (0, w) => write!(f, "{w} warning{}", plural(w)),
            (e, w) => write!(f, "{e} error{}, {w} warning{}", plural(e), plural(w)),
        }
    }
}

// ============================================================================
// Diagnostic
// ============================================================================

/// A single diagnostic with optional location and source excerpt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error severity.
    pub severity: Severity,
    /// Numeric diagnostic code, if the program assigns one.
    pub code: Option<u32>,
    /// The message.
    pub message: String,
    /// File path (if available).
    pub path: Option<String>,
    /// Line number (1-indexed, if available).
    pub line: Option<usize>,
    /// Column number (1-indexed, if available).
    pub column: Option<usize>,
    /// Source line at the reported position, filled by [`Diagnostics::attach_sources`].
    pub source_line: Option<String>,
}

impl Diagnostic {
    /// Create an error without location.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            path: None,
            line: None,
            column: None,
            source_line: None,
        }
    }

    /// Create a warning without location.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    /// The diagnostic a program reports for an unresolved import.
    pub fn missing_module(module_name: &str, containing_file: &str) -> Self {
        Self::error(format!(
            "Cannot find module '{module_name}' or its corresponding type declarations."
        ))
        .with_code(MISSING_MODULE_CODE)
        .with_path(containing_file)
    }

    /// The diagnostic a program reports for a missing referenced file.
    pub fn file_not_found(path: &str) -> Self {
        Self::error(format!("File '{path}' not found.")).with_code(FILE_NOT_FOUND_CODE)
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the file path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the 1-indexed position.
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Format with custom options.
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> DiagnosticDisplay<'a> {
        DiagnosticDisplay {
            diagnostic: self,
            options,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_options(&DiagnosticOptions::default()).fmt(f)
    }
}

/// Display wrapper for formatting a single diagnostic with custom options.
pub struct DiagnosticDisplay<'a> {
    diagnostic: &'a Diagnostic,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for DiagnosticDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::new();
        format_info(&mut output, self.diagnostic, self.options);
        f.write_str(&output)
    }
}

// ============================================================================
// Diagnostics (Collection)
// ============================================================================

/// A collection of diagnostics reported by a program.
///
/// # Example
///
/// ```ignore
/// let result = compiler.compile(&backend, &factory)?;
///
/// if !result.diagnostics.is_empty() {
///     eprintln!("{}", result.diagnostics);
///
///     for diag in result.diagnostics.errors() {
///         println!("{}: {}", diag.severity.as_str(), diag.message);
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a vector of diagnostics.
    pub fn from_vec(items: Vec<Diagnostic>) -> Self {
        Self { items }
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Append all diagnostics from another collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Check if there are no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Get a summary of diagnostic counts.
    pub fn summary(&self) -> DiagnosticSummary {
        DiagnosticSummary {
            errors: self.errors().count(),
            warnings: self.warnings().count(),
        }
    }

    /// Iterate over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Iterate over errors only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Iterate over warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Find the first diagnostic carrying `code`.
    pub fn find_code(&self, code: u32) -> Option<&Diagnostic> {
        self.items.iter().find(|d| d.code == Some(code))
    }

    /// Fill in `source_line` for every positioned diagnostic by reading
    /// its file from `fs`. Unreadable files are left without excerpt.
    pub fn attach_sources(&mut self, fs: &dyn VirtualFileSystem) {
        for diag in &mut self.items {
            let (Some(path), Some(line)) = (&diag.path, diag.line) else {
                continue;
            };
            if let Ok(text) = fs.read_file(path, Encoding::Utf8) {
                diag.source_line = text.lines().nth(line.saturating_sub(1)).map(str::to_owned);
            }
        }
    }

    /// Format with custom options.
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> DiagnosticsDisplay<'a> {
        DiagnosticsDisplay {
            diagnostics: self,
            options,
        }
    }

    /// Get a slice of all diagnostics.
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Convert to a vector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DiagnosticsDisplay {
            diagnostics: self,
            options: &DiagnosticOptions::default(),
        }
        .fmt(f)
    }
}

/// Display wrapper for formatting diagnostics with custom options.
pub struct DiagnosticsDisplay<'a> {
    diagnostics: &'a Diagnostics,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for DiagnosticsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Errors first, then warnings, then messages
        let mut sorted: Vec<_> = self.diagnostics.items.iter().collect();
        sorted.sort_by_key(|d| d.severity);

        for (i, diag) in sorted.iter().enumerate() {
            let mut output = String::new();
            format_info(&mut output, diag, self.options);
            f.write_str(&output)?;
            if i < sorted.len() - 1 {
                f.write_str("\n")?;
            }
        }

        Ok(())
    }
}
