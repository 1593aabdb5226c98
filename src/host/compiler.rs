//! Compiler host contract and its filesystem-backed implementation.

use std::sync::Arc;

use super::options::{default_lib_file_name, CompilerOptions, ScriptTarget};
use super::read_dir::DirectoryFilter;
use super::resolve::{ModuleResolver, ResolvedModule};
use super::system::HostBridge;
use crate::config::Config;
use crate::diagnostic::VfsError;

/// A compilation unit as handed to the compiler: a name and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    pub text: Arc<str>,
    pub language_version: ScriptTarget,
}

impl SourceFile {
    pub fn new(
        file_name: impl Into<String>,
        text: impl Into<Arc<str>>,
        language_version: ScriptTarget,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
            language_version,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Declaration units (`.d.ts`) produce no output.
    pub fn is_declaration_file(&self) -> bool {
        self.file_name.ends_with(".d.ts")
    }
}

/// What the compiler collaborator asks of its environment.
///
/// Everything is synchronous; any data that has to come from the network
/// must already be in the filesystem when the program is created.
pub trait CompilerHost {
    fn read_file(&self, file_name: &str) -> Result<String, VfsError>;

    fn write_file(&self, file_name: &str, text: &str) -> Result<(), VfsError>;

    fn file_exists(&self, file_name: &str) -> bool;

    fn directory_exists(&self, path: &str) -> bool;

    /// Create one directory level; an existing directory counts as success.
    fn create_directory(&self, path: &str) -> Result<(), VfsError>;

    fn get_directories(&self, path: &str) -> Vec<String>;

    /// Recursively list files under `path` that pass `filter`.
    fn read_directory(&self, path: &str, filter: &DirectoryFilter) -> Vec<String>;

    fn get_current_directory(&self) -> &str;

    /// Print to the host console.
    fn write(&self, text: &str);

    /// Ask the host to stop; the current emit ends before its next unit.
    fn exit(&self, code: i32);

    /// Load a unit. A read failure is reported through `on_error` and the
    /// unit is returned with empty text.
    fn get_source_file(
        &self,
        file_name: &str,
        language_version: ScriptTarget,
        on_error: Option<&mut dyn FnMut(&str)>,
    ) -> Option<SourceFile>;

    /// Absolute path of the default library file for `options`.
    fn get_default_lib_file_name(&self, options: &CompilerOptions) -> String;

    /// Directory holding the default library files, with a trailing `/`.
    fn get_default_lib_location(&self) -> String;

    fn get_canonical_file_name(&self, file_name: &str) -> String;

    fn get_new_line(&self) -> &str;

    fn use_case_sensitive_file_names(&self) -> bool;

    /// Resolve each name to a declaration file, or `None` when unresolved.
    fn resolve_module_names(
        &self,
        module_names: &[String],
        containing_file: &str,
    ) -> Vec<Option<ResolvedModule>>;
}

/// [`CompilerHost`] over a [`HostBridge`], adding library lookup and the
/// module resolution policy.
#[derive(Debug)]
pub struct VfsCompilerHost<'a> {
    bridge: &'a HostBridge<'a>,
    resolver: ModuleResolver,
    library_dir: String,
}

impl<'a> VfsCompilerHost<'a> {
    /// Create an adapter with the default library directory `libs/`.
    pub fn new(bridge: &'a HostBridge<'a>, resolver: ModuleResolver) -> Self {
        Self {
            bridge,
            resolver,
            library_dir: "libs/".into(),
        }
    }

    /// Create an adapter following `config`'s resolution and library settings.
    pub fn from_config(bridge: &'a HostBridge<'a>, config: &Config) -> Self {
        Self {
            bridge,
            resolver: ModuleResolver::from_config(config),
            library_dir: config.library_dir.clone(),
        }
    }

    pub fn bridge(&self) -> &'a HostBridge<'a> {
        self.bridge
    }
}

impl CompilerHost for VfsCompilerHost<'_> {
    fn read_file(&self, file_name: &str) -> Result<String, VfsError> {
        self.bridge.read_file(file_name)
    }

    fn write_file(&self, file_name: &str, text: &str) -> Result<(), VfsError> {
        self.bridge.write_file(file_name, text)
    }

    fn file_exists(&self, file_name: &str) -> bool {
        self.bridge.file_exists(file_name)
    }

    fn directory_exists(&self, path: &str) -> bool {
        self.bridge.directory_exists(path)
    }

    fn create_directory(&self, path: &str) -> Result<(), VfsError> {
        self.bridge.create_directory(path)
    }

    fn get_directories(&self, path: &str) -> Vec<String> {
        self.bridge.get_directories(path)
    }

    fn read_directory(&self, path: &str, filter: &DirectoryFilter) -> Vec<String> {
        self.bridge.read_directory(path, filter)
    }

    fn get_current_directory(&self) -> &str {
        self.bridge.get_current_directory()
    }

    fn write(&self, text: &str) {
        self.bridge.write(text);
    }

    fn exit(&self, code: i32) {
        self.bridge.exit(code);
    }

    fn get_source_file(
        &self,
        file_name: &str,
        language_version: ScriptTarget,
        on_error: Option<&mut dyn FnMut(&str)>,
    ) -> Option<SourceFile> {
        let text = match self.read_file(file_name) {
            Ok(text) => text,
            Err(e) => {
                if let Some(report) = on_error {
                    report(&e.to_string());
                }
                String::new()
            }
        };
        Some(SourceFile::new(file_name, text, language_version))
    }

    fn get_default_lib_file_name(&self, options: &CompilerOptions) -> String {
        self.get_default_lib_location() + default_lib_file_name(options)
    }

    fn get_default_lib_location(&self) -> String {
        format!("{}{}", self.get_current_directory(), self.library_dir)
    }

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        file_name.to_owned()
    }

    fn get_new_line(&self) -> &str {
        HostBridge::NEW_LINE
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        HostBridge::USE_CASE_SENSITIVE_FILE_NAMES
    }

    fn resolve_module_names(
        &self,
        module_names: &[String],
        containing_file: &str,
    ) -> Vec<Option<ResolvedModule>> {
        self.resolver.resolve(self.bridge, module_names, containing_file)
    }
}
