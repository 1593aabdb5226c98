//! Diagnostic formatting utilities.

use std::fmt::Write;

use super::info::{Diagnostic, Severity};

// ============================================================================
// Options
// ============================================================================

/// Display style for diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayStyle {
    /// Header line plus the offending source line and a marker.
    #[default]
    Rich,
    /// Single `path:line:col - error TS2307: message` line.
    Short,
}

/// Options for controlling diagnostic formatting.
///
/// # Example
///
/// ```ignore
/// use playground_host::diagnostic::{DiagnosticOptions, DisplayStyle};
///
/// // Plain text (no ANSI colors) for the editor's output pane
/// let opts = DiagnosticOptions::plain();
///
/// // One line per diagnostic
/// let opts = DiagnosticOptions::short();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticOptions {
    /// Whether to use ANSI colors in output.
    pub colored: bool,
    /// Display style (rich with snippets or short).
    pub style: DisplayStyle,
    /// Whether to include source snippets when available.
    pub snippets: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            colored: true,
            style: DisplayStyle::Rich,
            snippets: true,
        }
    }
}

impl DiagnosticOptions {
    /// Create options for plain text output (no ANSI colors).
    pub fn plain() -> Self {
        Self {
            colored: false,
            ..Self::default()
        }
    }

    /// Create options for short format.
    pub fn short() -> Self {
        Self {
            style: DisplayStyle::Short,
            snippets: false,
            ..Self::default()
        }
    }

    /// Set whether to use colors.
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Set display style.
    pub fn with_style(mut self, style: DisplayStyle) -> Self {
        self.style = style;
        self
    }

    /// Set whether to include source snippets.
    pub fn with_snippets(mut self, snippets: bool) -> Self {
        self.snippets = snippets;
        self
    }
}

/// Box-drawing characters for source code display.
mod gutter {
    pub const HEADER: &str = "┌─";
    pub const BAR: &str = "│";
    pub const MARKER: &str = "^";
}

// ============================================================================
// Coloring
// ============================================================================

#[cfg(feature = "colored-diagnostics")]
fn colorize(text: &str, severity: Severity) -> String {
    use owo_colors::OwoColorize;
    match severity {
        Severity::Error => text.red().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Message => text.cyan().to_string(),
    }
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize(text: &str, _severity: Severity) -> String {
    text.to_owned()
}

fn get_paint_fn(options: &DiagnosticOptions, severity: Severity) -> Box<dyn Fn(&str) -> String> {
    if options.colored {
        Box::new(move |s| colorize(s, severity))
    } else {
        Box::new(|s: &str| s.to_owned())
    }
}

fn label(diag: &Diagnostic) -> String {
    match diag.code {
        Some(code) => format!("{} TS{code}", diag.severity.as_str()),
        None => diag.severity.as_str().to_owned(),
    }
}

fn location(diag: &Diagnostic) -> Option<String> {
    let path = diag.path.as_deref()?;
    Some(match (diag.line, diag.column) {
        (Some(line), Some(col)) => format!("{path}:{line}:{col}"),
        (Some(line), None) => format!("{path}:{line}"),
        _ => path.to_owned(),
    })
}

// ============================================================================
// Public Formatting API
// ============================================================================

/// Format a sequence of diagnostics, errors first.
pub fn format_diagnostics(diagnostics: &[Diagnostic], options: &DiagnosticOptions) -> String {
    let mut sorted: Vec<_> = diagnostics.iter().collect();
    sorted.sort_by_key(|d| d.severity);

    let mut output = String::new();
    for (i, diag) in sorted.iter().enumerate() {
        format_info(&mut output, diag, options);
        if i < sorted.len() - 1 {
            output.push('\n');
        }
    }
    output
}

/// Format a single diagnostic into the output string.
pub fn format_info(output: &mut String, diag: &Diagnostic, options: &DiagnosticOptions) {
    let paint = get_paint_fn(options, diag.severity);
    match options.style {
        DisplayStyle::Short => format_short(output, diag, &paint),
        DisplayStyle::Rich => format_rich(output, diag, &paint, options),
    }
}

fn format_short(output: &mut String, diag: &Diagnostic, paint: &dyn Fn(&str) -> String) {
    match location(diag) {
        Some(loc) => {
            _ = writeln!(output, "{loc} - {}: {}", paint(&label(diag)), diag.message);
        }
        None => {
            _ = writeln!(output, "{}: {}", paint(&label(diag)), diag.message);
        }
    }
}

fn format_rich(
    output: &mut String,
    diag: &Diagnostic,
    paint: &dyn Fn(&str) -> String,
    options: &DiagnosticOptions,
) {
    _ = writeln!(output, "{}: {}", paint(&label(diag)), diag.message);

    let Some(loc) = location(diag) else {
        return;
    };
    let line_num = diag.line.unwrap_or(0).to_string();
    let width = line_num.len();
    _ = writeln!(output, "{:>width$} {} {loc}", "", paint(gutter::HEADER));

    if !options.snippets {
        return;
    }
    let Some(source) = diag.source_line.as_deref() else {
        return;
    };
    _ = writeln!(output, "{:>width$} {}", "", paint(gutter::BAR));
    _ = writeln!(output, "{} {} {source}", paint(&line_num), paint(gutter::BAR));
    if let Some(col) = diag.column {
        let spaces = " ".repeat(col.saturating_sub(1));
        _ = writeln!(
            output,
            "{:>width$} {} {spaces}{}",
            "",
            paint(gutter::BAR),
            paint(gutter::MARKER)
        );
    }
}
