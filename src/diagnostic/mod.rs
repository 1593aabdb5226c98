//! Diagnostics and error types.

mod error;
mod format;
mod info;

pub use error::{CompileError, FetchError, NodeKind, TransformError, VfsError};
pub use format::{format_diagnostics, format_info, DiagnosticOptions, DisplayStyle};
pub use info::{
    Diagnostic, DiagnosticDisplay, DiagnosticSummary, Diagnostics, DiagnosticsDisplay, Severity,
    FILE_NOT_FOUND_CODE, MISSING_MODULE_CODE,
};
