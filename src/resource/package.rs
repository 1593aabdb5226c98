//! Remote package fetching.
//!
//! A package is fetched in two requests against the registry mirror:
//!
//! ```text
//! GET <registry>/<name>/package.json   ─► manifest ("types" / "typings")
//! GET <registry>/<name>/<types>        ─► declaration text
//! ```
//!
//! The result is materialized at `node_modules/<name>/<types>` next to a
//! copy of the manifest. Caching and failure bookkeeping belong to the
//! [`Session`](crate::session::Session); the fetcher itself is stateless.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use super::file::{mkdirp, path, Encoding, VirtualFileSystem};
use super::transport::Transport;
use crate::diagnostic::FetchError;

/// Directory packages are materialized under, relative to the working directory.
pub const NODE_MODULES: &str = "node_modules";

/// Manifest file name inside a package root.
pub const MANIFEST_FILE: &str = "package.json";

/// The fields of `package.json` this crate reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub types: Option<String>,
    #[serde(default)]
    pub typings: Option<String>,
}

impl PackageManifest {
    /// Parse manifest JSON for `package`.
    pub fn parse(package: &str, text: &str) -> Result<Self, FetchError> {
        serde_json::from_str(text).map_err(|e| FetchError::Manifest {
            package: package.into(),
            message: e.to_string(),
        })
    }

    /// The declared type-definition entry, `types` taking precedence over `typings`.
    pub fn types_entry(&self) -> Option<&str> {
        self.types
            .as_deref()
            .or(self.typings.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// What a package needs to be fetched: its name and declared types entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePackageDescriptor {
    /// Registry name, possibly scoped (`@scope/name`).
    pub name: String,
    /// Entry path relative to the package root, without a leading `./`.
    pub declared_types_entry_path: String,
}

impl RemotePackageDescriptor {
    /// Package root, relative to the working directory.
    pub fn package_root(&self) -> String {
        format!("{NODE_MODULES}/{}", self.name)
    }

    /// Declaration path, relative to the working directory.
    pub fn entry_path(&self) -> String {
        format!("{}/{}", self.package_root(), self.declared_types_entry_path)
    }
}

/// A package retrieved from the registry, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct FetchedPackage {
    pub descriptor: RemotePackageDescriptor,
    /// Version from the manifest, if declared.
    pub version: Option<String>,
    /// Raw manifest text.
    pub manifest: String,
    /// Declaration file text.
    pub declarations: String,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPackage {
    /// Write the declarations and manifest into `fs`, creating directories
    /// as needed. Returns the absolute path of the declaration file.
    pub fn materialize(&self, fs: &dyn VirtualFileSystem) -> Result<String, FetchError> {
        let cwd = fs.current_directory();
        let root = path::normalize(cwd, &self.descriptor.package_root())?;
        let entry = path::normalize(cwd, &self.descriptor.entry_path())?;

        let entry_dir = path::parent(&entry).unwrap_or("/");
        mkdirp(fs, entry_dir)?;
        mkdirp(fs, &root)?;

        fs.write_file(&entry, &self.declarations, Encoding::Utf8)?;
        fs.write_file(&path::join(&root, MANIFEST_FILE), &self.manifest, Encoding::Utf8)?;

        tracing::debug!(package = %self.descriptor.name, path = %entry, "materialized package");
        Ok(entry)
    }
}

/// Check a registry package name: plain `name` or scoped `@scope/name`.
pub fn validate_package_name(name: &str) -> Result<(), FetchError> {
    let invalid = || FetchError::InvalidReference {
        reference: name.into(),
    };
    let segments: Vec<&str> = name.split('/').collect();
    let well_formed = match segments.as_slice() {
        [single] => !single.starts_with('@'),
        [scope, _] => scope.len() > 1 && scope.starts_with('@'),
        _ => false,
    };
    let clean = segments.iter().all(|s| {
        !s.is_empty()
            && *s != "."
            && *s != ".."
            && !s.chars().any(|c| c.is_whitespace() || c.is_control() || c == '\\')
    });
    if well_formed && clean {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Normalize a declared entry to a package-relative path.
///
/// `./index.d.ts` and `index.d.ts` are equivalent; absolute paths and
/// paths escaping the package root are rejected.
pub fn normalize_entry_path(entry: &str) -> Result<String, FetchError> {
    let invalid = || FetchError::InvalidReference {
        reference: entry.into(),
    };
    let trimmed = entry.trim();
    if trimmed.starts_with('/') || trimmed.contains('\0') || trimmed.contains('\\') {
        return Err(invalid());
    }
    let mut parts = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(invalid()),
            name => parts.push(name),
        }
    }
    if parts.is_empty() {
        return Err(invalid());
    }
    Ok(parts.join("/"))
}

/// Fetches package manifests and declarations from a registry mirror.
pub struct PackageFetcher {
    transport: Rc<dyn Transport>,
    registry: Url,
}

impl std::fmt::Debug for PackageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageFetcher")
            .field("registry", &self.registry.as_str())
            .finish_non_exhaustive()
    }
}

impl PackageFetcher {
    /// Create a fetcher for `registry`, which must end with `/`.
    pub fn new(transport: Rc<dyn Transport>, registry: Url) -> Self {
        Self {
            transport,
            registry,
        }
    }

    /// URL of `file` inside the package `name`.
    pub fn package_url(&self, name: &str, file: &str) -> Result<Url, FetchError> {
        self.registry
            .join(&format!("{name}/{file}"))
            .map_err(|_| FetchError::InvalidReference {
                reference: format!("{name}/{file}"),
            })
    }

    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.transport.get(url).await?.error_for_status(url)?;
        Ok(response.body)
    }

    /// Fetch the manifest and declaration file of package `name`.
    pub async fn fetch(&self, name: &str) -> Result<FetchedPackage, FetchError> {
        validate_package_name(name)?;

        let manifest_url = self.package_url(name, MANIFEST_FILE)?;
        tracing::debug!(package = name, url = %manifest_url, "fetching manifest");
        let manifest_text = self.get_text(&manifest_url).await?;
        let manifest = PackageManifest::parse(name, &manifest_text)?;

        let entry = manifest
            .types_entry()
            .ok_or_else(|| FetchError::MissingTypes {
                package: name.into(),
            })?;
        let entry = normalize_entry_path(entry)?;

        let types_url = self.package_url(name, &entry)?;
        tracing::debug!(package = name, url = %types_url, "fetching declarations");
        let declarations = self.get_text(&types_url).await?;

        Ok(FetchedPackage {
            descriptor: RemotePackageDescriptor {
                name: name.into(),
                declared_types_entry_path: entry,
            },
            version: manifest.version,
            manifest: manifest_text,
            declarations,
            fetched_at: Utc::now(),
        })
    }
}
