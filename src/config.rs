//! Configuration for a playground session.
//!
//! Use [`ConfigBuilder`] to describe where packages and libraries come from
//! and how module names resolve. The resulting [`Config`] is owned by the
//! [`Session`](crate::session::Session) it is passed to.

use thiserror::Error;
use url::Url;

use crate::host::ResolutionMode;
use crate::resource::file::path;

/// Default package registry mirror.
pub const DEFAULT_REGISTRY_URL: &str = "https://unpkg.com/";

/// Default mirror for the compiler's bundled library declarations.
pub const DEFAULT_LIBRARY_URL: &str = "https://unpkg.com/typescript/lib/";

/// Version reported for every resolved package under shallow resolution.
pub const DEFAULT_PACKAGE_VERSION: &str = "0.0.0-alpha5";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A mirror URL does not parse.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A mirror URL cannot have paths joined onto it.
    #[error("URL '{url}' cannot be used as a base")]
    NotABase { url: String },

    /// A directory setting is not a usable path.
    #[error("invalid directory '{path}'")]
    InvalidDirectory { path: String },
}

/// Runtime configuration for a session.
#[derive(Debug, Clone)]
pub struct Config {
    /// User-Agent string for registry requests.
    /// Example: "my-editor/1.0.0"
    pub user_agent: String,
    /// Registry base; packages live at `<registry>/<name>/`.
    pub registry_url: Url,
    /// Base the default library files are fetched from.
    pub library_url: Url,
    /// Working directory, always absolute with a trailing `/`.
    pub current_directory: String,
    /// Library directory relative to the working directory, with a trailing `/`.
    pub library_dir: String,
    /// Version reported for shallow-resolved packages.
    pub package_version: String,
    /// Module resolution policy.
    pub resolution: ResolutionMode,
}

impl Config {
    /// Absolute directory holding the default library files.
    pub fn library_location(&self) -> String {
        format!("{}{}", self.current_directory, self.library_dir)
    }
}

/// Configuration builder for fluent API.
///
/// # Example
///
/// ```ignore
/// use playground_host::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .user_agent("my-editor/1.0.0")
///     .registry_url("https://registry.example.com/npm")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    user_agent: Option<String>,
    registry_url: Option<String>,
    library_url: Option<String>,
    current_directory: Option<String>,
    library_dir: Option<String>,
    package_version: Option<String>,
    resolution: ResolutionMode,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the User-Agent string for registry requests.
    ///
    /// Default: "playground-host/{version}"
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the package registry base URL.
    pub fn registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = Some(url.into());
        self
    }

    /// Set the default library mirror URL.
    pub fn library_url(mut self, url: impl Into<String>) -> Self {
        self.library_url = Some(url.into());
        self
    }

    /// Set the working directory. Default: `/`.
    pub fn current_directory(mut self, dir: impl Into<String>) -> Self {
        self.current_directory = Some(dir.into());
        self
    }

    /// Set the library directory, relative to the working directory. Default: `libs/`.
    pub fn library_dir(mut self, dir: impl Into<String>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }

    /// Set the version reported for shallow-resolved packages.
    pub fn package_version(mut self, version: impl Into<String>) -> Self {
        self.package_version = Some(version.into());
        self
    }

    /// Set the module resolution policy.
    pub fn resolution(mut self, mode: ResolutionMode) -> Self {
        self.resolution = mode;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let cwd = self.current_directory.as_deref().unwrap_or("/");
        let cwd = path::normalize("/", cwd)
            .map_err(|_| ConfigError::InvalidDirectory { path: cwd.into() })?;

        let library_dir = self.library_dir.as_deref().unwrap_or("libs/");
        let trimmed = library_dir.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|s| s == ".." || s.is_empty()) {
            return Err(ConfigError::InvalidDirectory {
                path: library_dir.into(),
            });
        }

        Ok(Config {
            user_agent: self
                .user_agent
                .unwrap_or_else(|| concat!("playground-host/", env!("CARGO_PKG_VERSION")).into()),
            registry_url: base_url(self.registry_url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL))?,
            library_url: base_url(self.library_url.as_deref().unwrap_or(DEFAULT_LIBRARY_URL))?,
            current_directory: path::as_directory(&cwd),
            library_dir: format!("{trimmed}/"),
            package_version: self
                .package_version
                .unwrap_or_else(|| DEFAULT_PACKAGE_VERSION.into()),
            resolution: self.resolution,
        })
    }
}

/// Parse a base URL, adding the trailing slash `Url::join` needs to keep
/// the last path segment.
fn base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = path::as_directory(raw);
    let url = Url::parse(&with_slash).map_err(|source| ConfigError::InvalidUrl {
        url: raw.into(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase { url: raw.into() });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigBuilder::new().build().unwrap();
        assert!(config.user_agent.starts_with("playground-host/"));
        assert_eq!(config.registry_url.as_str(), DEFAULT_REGISTRY_URL);
        assert_eq!(config.current_directory, "/");
        assert_eq!(config.library_location(), "/libs/");
        assert_eq!(config.package_version, "0.0.0-alpha5");
        assert_eq!(config.resolution, ResolutionMode::Shallow);
    }

    #[test]
    fn test_builder_normalizes() {
        let config = ConfigBuilder::new()
            .user_agent("test/1.0")
            .registry_url("https://registry.test/npm")
            .current_directory("/work/./project")
            .library_dir("/lib")
            .build()
            .unwrap();
        assert_eq!(config.user_agent, "test/1.0");
        assert_eq!(config.registry_url.as_str(), "https://registry.test/npm/");
        assert_eq!(config.library_location(), "/work/project/lib/");
    }

    #[test]
    fn test_builder_rejects_invalid() {
        assert!(matches!(
            ConfigBuilder::new().registry_url("not a url").build(),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ConfigBuilder::new().library_dir("../up").build(),
            Err(ConfigError::InvalidDirectory { .. })
        ));
        assert!(matches!(
            ConfigBuilder::new().current_directory("").build(),
            Err(ConfigError::InvalidDirectory { .. })
        ));
    }
}
