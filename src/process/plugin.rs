//! Editor plugin lifecycle: mount, run, unmount.
//!
//! A [`Plugin`] ties an editor buffer to a [`Session`]. Mounting starts the
//! plugin's package fetch without failing; a fetch failure is kept by the
//! session and reported by the first `run` that needs the package.

use super::compile::{CompileResult, Compiler};
use super::program::{CompilerBackend, TransformerFactory};
use crate::diagnostic::CompileError;
use crate::host::CompilerOptions;
use crate::resource::file::{mkdirp, path, Encoding, VirtualFileSystem};
use crate::session::Session;

/// Identity and dependencies of a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub id: String,
    pub display_name: String,
    /// Packages fetched at mount and required by every run.
    pub packages: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            id: "ts-transform-runtime-check".into(),
            display_name: "Runtime Check".into(),
            packages: vec!["ts-transform-runtime-check".into()],
        }
    }
}

/// What the editor hands over on every run.
#[derive(Debug, Clone)]
pub struct EditorState {
    /// Path of the edited file, absolute or relative to the working directory.
    pub file_path: String,
    pub text: String,
    pub options: CompilerOptions,
}

impl EditorState {
    pub fn new(file_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            text: text.into(),
            options: CompilerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }
}

/// A plugin mounted on a session.
#[derive(Debug)]
pub struct Plugin<'s> {
    session: &'s Session,
    config: PluginConfig,
    mounted: bool,
    last: Option<CompileResult>,
}

impl<'s> Plugin<'s> {
    pub fn new(session: &'s Session, config: PluginConfig) -> Self {
        Self {
            session,
            config,
            mounted: false,
            last: None,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Start fetching the plugin's packages. Never fails.
    pub async fn mount(&mut self) {
        tracing::debug!(plugin = %self.config.id, "mount");
        self.session.preload(&self.config.packages).await;
        self.mounted = true;
    }

    /// Write the editor buffer, prepare the session and compile it.
    pub async fn run<B, F>(
        &mut self,
        backend: &B,
        editor: &EditorState,
        factory: &F,
    ) -> Result<&CompileResult, CompileError>
    where
        B: CompilerBackend,
        F: TransformerFactory<B::Program> + ?Sized,
    {
        let fs = self.session.fs();
        let file = path::normalize(fs.current_directory(), &editor.file_path)?;
        if let Some(parent) = path::parent(&file) {
            mkdirp(fs, parent)?;
        }
        fs.write_file(&file, &editor.text, Encoding::Utf8)?;

        let prepared = self
            .session
            .prepare(&editor.options, &self.config.packages)
            .await?;
        let result = Compiler::new(self.session, prepared)
            .with_root(file)
            .with_options(editor.options.clone())
            .compile(backend, factory)?;

        tracing::debug!(
            plugin = %self.config.id,
            files = result.output.files.len(),
            "run finished: {}",
            result.diagnostics.summary()
        );
        Ok(self.last.insert(result))
    }

    /// Result of the last successful run.
    pub fn last_output(&self) -> Option<&CompileResult> {
        self.last.as_ref()
    }

    pub fn unmount(&mut self) {
        tracing::debug!(plugin = %self.config.id, "unmount");
        self.last = None;
        self.mounted = false;
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::diagnostic::{FetchError, MISSING_MODULE_CODE};
    use crate::session::PackageState;
    use crate::testing::{fixtures, FakeBackend, FakeTransport, RuntimeCheckFactory};

    fn session(transport: &FakeTransport) -> Session {
        Session::new(fixtures::config(), Rc::new(transport.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_run_runtime_check_end_to_end() {
        let session = session(&fixtures::transport());
        let mut plugin = Plugin::new(&session, PluginConfig::default());
        plugin.mount().await;
        assert!(plugin.is_mounted());

        let editor = EditorState::new("index.ts", fixtures::ENTRY);
        let result = plugin
            .run(&FakeBackend::default(), &editor, &RuntimeCheckFactory)
            .await
            .unwrap();

        let js = result.text("/index.js").unwrap();
        assert!(js.contains("(typeof value === \"number\")"));
        assert!(!js.contains("is<number>(value)"));
        assert!(plugin.last_output().is_some());

        plugin.unmount();
        assert!(plugin.last_output().is_none());
        assert!(!plugin.is_mounted());
    }

    #[tokio::test]
    async fn test_run_writes_nested_editor_file() {
        let session = session(&fixtures::transport());
        let mut plugin = Plugin::new(&session, PluginConfig::default());

        let editor = EditorState::new("/src/app/main.ts", "import \"nowhere\";\n");
        let result = plugin
            .run(&FakeBackend::default(), &editor, &RuntimeCheckFactory)
            .await
            .unwrap();

        assert!(session.fs().stat("/src/app/main.ts").unwrap().is_file());
        assert!(result.text("/src/app/main.js").is_some());
        assert!(result.diagnostics.find_code(MISSING_MODULE_CODE).is_some());
    }

    #[tokio::test]
    async fn test_manifest_404_surfaces_on_run() {
        let transport = FakeTransport::new().with_status(
            "https://registry.test/ts-transform-runtime-check/package.json",
            404,
            "Not found",
        );
        let session = session(&transport);
        let mut plugin = Plugin::new(&session, PluginConfig::default());

        plugin.mount().await;
        assert!(matches!(
            session.package_state("ts-transform-runtime-check"),
            Some(PackageState::Failed(_))
        ));

        let editor = EditorState::new("index.ts", fixtures::ENTRY)
            .with_options(CompilerOptions::default().with_no_lib(true));
        let err = plugin
            .run(&FakeBackend::default(), &editor, &RuntimeCheckFactory)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Fetch(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(transport.requests().len(), 1);
        assert!(plugin.last_output().is_none());
    }
}
