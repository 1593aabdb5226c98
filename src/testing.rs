//! Test doubles: a scripted transport and a tiny compiler backend.
//!
//! `FakeProgram` understands just enough of the language for the host to be
//! exercised end to end: it follows `import ... from "x"` specifiers,
//! reports unresolved ones, and emits each unit's (transformed) text.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use url::Url;

use crate::diagnostic::{Diagnostic, Diagnostics, FetchError, TransformError};
use crate::host::{lib_entry_file_name, CancellationToken, CompilerHost, CompilerOptions, SourceFile};
use crate::process::program::{
    CompilerBackend, CustomTransformers, EmitResult, Program, Transformer, TransformerFactory,
};
use crate::resource::transport::{Response, Transport};

// ============================================================================
// Transport
// ============================================================================

/// Serves canned responses and records every requested URL.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    responses: Arc<Mutex<FxHashMap<String, Response>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(self, url: &str, body: &str) -> Self {
        self.with_status(url, 200, body)
    }

    pub(crate) fn with_status(self, url: &str, status: u16, body: &str) -> Self {
        self.responses.lock().insert(
            url.to_owned(),
            Response {
                status,
                body: body.to_owned(),
            },
        );
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait(?Send)]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        self.requests.lock().push(url.to_string());
        self.responses
            .lock()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".into(),
            })
    }
}

/// A registry and library mirror with the runtime-check package.
pub(crate) mod fixtures {
    use super::FakeTransport;
    use crate::config::{Config, ConfigBuilder};

    pub(crate) const PACKAGE: &str = "ts-transform-runtime-check";

    pub(crate) const ENTRY: &str = "import { is } from \"ts-transform-runtime-check\";\n\
                                    const value: unknown = 42;\n\
                                    console.log(is<number>(value));\n";

    pub(crate) fn config() -> Config {
        ConfigBuilder::new()
            .registry_url("https://registry.test/")
            .library_url("https://libs.test/lib/")
            .build()
            .unwrap()
    }

    pub(crate) fn transport() -> FakeTransport {
        FakeTransport::new()
            .with(
                "https://libs.test/lib/lib.d.ts",
                "/// <reference no-default-lib=\"true\"/>\n/// <reference lib=\"es5\" />\n",
            )
            .with(
                "https://libs.test/lib/lib.es5.d.ts",
                "interface Array<T> { length: number; }\n",
            )
            .with(
                "https://registry.test/ts-transform-runtime-check/package.json",
                r#"{"name":"ts-transform-runtime-check","version":"0.0.0-alpha5","types":"index.d.ts"}"#,
            )
            .with(
                "https://registry.test/ts-transform-runtime-check/index.d.ts",
                "export declare function is<T>(value: unknown): value is T;\n",
            )
    }
}

// ============================================================================
// Compiler backend
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    /// Run the `before` hooks twice per unit, like a misbehaving emitter.
    pub transform_twice: bool,
    /// Lines printed through the host while building the program.
    pub console: Vec<String>,
    /// Exit code requested through the host after building.
    pub exit_code: Option<i32>,
}

#[derive(Debug)]
pub(crate) struct FakeProgram {
    units: Vec<SourceFile>,
    roots: Vec<String>,
    diagnostics: Diagnostics,
    no_emit_on_error: bool,
    transform_twice: bool,
}

impl FakeProgram {
    fn contains(&self, file_name: &str) -> bool {
        self.units.iter().any(|u| u.file_name == file_name)
    }

    fn load(&mut self, host: &dyn CompilerHost, file_name: &str, options: &CompilerOptions) {
        if self.contains(file_name) {
            return;
        }
        let mut failed = false;
        let unit = {
            let on_error: &mut dyn FnMut(&str) = &mut |_| failed = true;
            host.get_source_file(file_name, options.target, Some(on_error))
        };
        if failed {
            self.diagnostics.push(Diagnostic::file_not_found(file_name));
        }
        if let Some(unit) = unit {
            self.units.push(unit);
        }
    }
}

/// `(specifier, line, column)` of every import, 1-indexed.
fn import_specifiers(text: &str) -> Vec<(String, usize, usize)> {
    let mut found = Vec::new();
    for (index, line) in text.lines().enumerate() {
        for keyword in ["from ", "import "] {
            let Some(at) = line.find(keyword) else {
                continue;
            };
            let rest = &line[at + keyword.len()..];
            let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
                continue;
            };
            if let Some(end) = rest[1..].find(quote) {
                let column = at + keyword.len() + 1;
                found.push((rest[1..1 + end].to_owned(), index + 1, column));
            }
        }
    }
    found
}

fn output_name(file_name: &str) -> String {
    let stem = file_name
        .strip_suffix(".tsx")
        .or_else(|| file_name.strip_suffix(".ts"))
        .unwrap_or(file_name);
    format!("{stem}.js")
}

impl CompilerBackend for FakeBackend {
    type Program = FakeProgram;

    fn create_program(
        &self,
        root_names: &[String],
        options: &CompilerOptions,
        host: &dyn CompilerHost,
    ) -> FakeProgram {
        let mut program = FakeProgram {
            units: Vec::new(),
            roots: root_names.to_vec(),
            diagnostics: Diagnostics::new(),
            no_emit_on_error: options.no_emit_on_error,
            transform_twice: self.transform_twice,
        };

        if !options.no_lib {
            let libs = if options.lib.is_empty() {
                vec![host.get_default_lib_file_name(options)]
            } else {
                let location = host.get_default_lib_location();
                options
                    .lib
                    .iter()
                    .map(|entry| location.clone() + &lib_entry_file_name(entry))
                    .collect()
            };
            for lib in libs {
                if host.file_exists(&lib) {
                    program.load(host, &lib, options);
                } else {
                    program.diagnostics.push(Diagnostic::file_not_found(&lib));
                }
            }
        }

        for root in root_names {
            program.load(host, root, options);
            let Some(text) = program
                .units
                .iter()
                .find(|u| &u.file_name == root)
                .map(|u| u.text.clone())
            else {
                continue;
            };

            let imports = import_specifiers(&text);
            let names: Vec<String> = imports.iter().map(|(name, ..)| name.clone()).collect();
            let resolved = host.resolve_module_names(&names, root);
            for ((name, line, column), module) in imports.iter().zip(resolved) {
                match module {
                    Some(module) if host.file_exists(&module.resolved_file_name) => {
                        program.load(host, &module.resolved_file_name, options);
                    }
                    _ => program
                        .diagnostics
                        .push(Diagnostic::missing_module(name, root).at(*line, *column)),
                }
            }
        }

        for line in &self.console {
            host.write(line);
        }
        if let Some(code) = self.exit_code {
            host.exit(code);
        }
        program
    }
}

impl Program for FakeProgram {
    fn source_file(&self, file_name: &str) -> Option<SourceFile> {
        self.units.iter().find(|u| u.file_name == file_name).cloned()
    }

    fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.clone()
    }

    fn emit(
        &self,
        target: Option<&SourceFile>,
        write_file: &mut dyn FnMut(&str, &str),
        cancellation: Option<&CancellationToken>,
        _emit_only_declarations: bool,
        transformers: &mut CustomTransformers<'_>,
    ) -> Result<EmitResult, TransformError> {
        if self.no_emit_on_error && self.diagnostics.has_errors() {
            return Ok(EmitResult {
                emit_skipped: true,
                diagnostics: Diagnostics::new(),
            });
        }

        let units: Vec<SourceFile> = match target {
            Some(unit) => vec![unit.clone()],
            None => self.roots.iter().filter_map(|r| self.source_file(r)).collect(),
        };
        let passes = if self.transform_twice { 2 } else { 1 };

        for unit in units {
            if let Some(token) = cancellation {
                token.check()?;
            }
            if unit.is_declaration_file() {
                continue;
            }
            let mut current = unit;
            for _ in 0..passes {
                for transformer in transformers.before.iter_mut() {
                    current = transformer.transform(&current)?;
                }
            }
            write_file(&output_name(&current.file_name), current.text());
        }

        Ok(EmitResult::default())
    }
}

// ============================================================================
// Runtime-check transform
// ============================================================================

const PRIMITIVES: &[&str] = &[
    "number",
    "string",
    "boolean",
    "bigint",
    "symbol",
    "undefined",
    "object",
    "function",
];

/// Rewrites `is<T>(expr)` to `(typeof expr === "T")` for primitive `T`.
pub(crate) struct RuntimeCheckTransformer;

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl Transformer for RuntimeCheckTransformer {
    fn transform(&mut self, unit: &SourceFile) -> Result<SourceFile, TransformError> {
        let text = unit.text();
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(at) = rest.find("is<") {
            let standalone = !rest[..at].chars().next_back().is_some_and(is_ident_char);
            let after = &rest[at + 3..];
            let call = after.find('>').and_then(|close| {
                let ty = after[..close].trim();
                let args = after[close + 1..].strip_prefix('(')?;
                let mut depth = 1usize;
                let end = args.char_indices().find_map(|(i, c)| {
                    match c {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    (depth == 0).then_some(i)
                })?;
                Some((ty, &args[..end], &args[end + 1..]))
            });

            match call {
                Some((ty, expr, tail)) if standalone => {
                    if !PRIMITIVES.contains(&ty) {
                        return Err(TransformError::failed(
                            &unit.file_name,
                            format!("unsupported type `{ty}` in runtime check"),
                        ));
                    }
                    out.push_str(&rest[..at]);
                    out.push_str(&format!("(typeof {} === \"{ty}\")", expr.trim()));
                    rest = tail;
                }
                _ => {
                    out.push_str(&rest[..at + 3]);
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(SourceFile::new(unit.file_name.clone(), out, unit.language_version))
    }
}

/// Creates a [`RuntimeCheckTransformer`] for any [`FakeProgram`].
pub(crate) struct RuntimeCheckFactory;

impl TransformerFactory<FakeProgram> for RuntimeCheckFactory {
    fn create<'p>(&self, _program: &'p FakeProgram) -> Box<dyn Transformer + 'p> {
        Box::new(RuntimeCheckTransformer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptTarget;

    fn run(text: &str) -> Result<String, TransformError> {
        let unit = SourceFile::new("/a.ts", text, ScriptTarget::ES5);
        RuntimeCheckTransformer
            .transform(&unit)
            .map(|u| u.text().to_owned())
    }

    #[test]
    fn test_runtime_check_rewrites_primitives() {
        assert_eq!(
            run("f(is<boolean>(a.b(c)));").unwrap(),
            "f((typeof a.b(c) === \"boolean\"));"
        );
        assert_eq!(run("this<x>(y)").unwrap(), "this<x>(y)");
    }

    #[test]
    fn test_import_specifiers() {
        let found = import_specifiers("import { is } from \"pkg\";\nimport './side';\n");
        assert_eq!(
            found,
            vec![("pkg".to_owned(), 1, 20), ("./side".to_owned(), 2, 8)]
        );
    }
}
