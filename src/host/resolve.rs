//! Module name resolution policy.
//!
//! Only bare package names are resolved, and only against packages
//! materialized directly under `<cwd>node_modules/`. There is no walk up
//! through parent `node_modules` directories and no relative-path
//! resolution; the compiler reports everything else as unresolved.

use super::system::HostBridge;
use crate::config::Config;
use crate::resource::file::path;
use crate::resource::package::{normalize_entry_path, PackageManifest, MANIFEST_FILE, NODE_MODULES};

/// How bare module names map to declaration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResolutionMode {
    /// A listed package resolves to `node_modules/<name>/index.d.ts` with
    /// the configured fixed version.
    #[default]
    Shallow,
    /// The entry and version are read from the materialized `package.json`,
    /// falling back to [`Shallow`](Self::Shallow).
    Manifest,
}

/// Kind of file a module resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Ts,
    Tsx,
    Dts,
    Js,
    Jsx,
    Json,
}

impl Extension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ts => ".ts",
            Self::Tsx => ".tsx",
            Self::Dts => ".d.ts",
            Self::Js => ".js",
            Self::Jsx => ".jsx",
            Self::Json => ".json",
        }
    }

    /// Derive the extension from a file name, `.d.ts` taking precedence over `.ts`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        [
            Self::Dts,
            Self::Ts,
            Self::Tsx,
            Self::Js,
            Self::Jsx,
            Self::Json,
        ]
        .into_iter()
        .find(|ext| name.ends_with(ext.as_str()))
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the package a module came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId {
    pub name: String,
    /// Path inside the package the specifier pointed at; empty for the root.
    pub sub_module_name: String,
    pub version: String,
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sub_module_name.is_empty() {
            write!(f, "{}@{}", self.name, self.version)
        } else {
            write!(f, "{}/{}@{}", self.name, self.sub_module_name, self.version)
        }
    }
}

/// A successfully resolved module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub resolved_file_name: String,
    pub extension: Extension,
    pub package_id: Option<PackageId>,
    /// Resolved from `node_modules` rather than the project.
    pub is_external_library_import: bool,
}

/// Whether `name` is a path rather than a package name.
fn is_path_specifier(name: &str) -> bool {
    name.is_empty()
        || name.starts_with('/')
        || name == "."
        || name == ".."
        || name.starts_with("./")
        || name.starts_with("../")
}

/// Split `@scope/pkg/sub/path` into (`@scope/pkg`, `sub/path`).
fn split_package_name(name: &str) -> (&str, &str) {
    let skip = usize::from(name.starts_with('@'));
    match name.match_indices('/').nth(skip) {
        Some((i, _)) => (&name[..i], &name[i + 1..]),
        None => (name, ""),
    }
}

/// Resolves module names for the compiler host adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResolver {
    mode: ResolutionMode,
    package_version: String,
}

impl ModuleResolver {
    pub fn new(mode: ResolutionMode, package_version: impl Into<String>) -> Self {
        Self {
            mode,
            package_version: package_version.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resolution, config.package_version.clone())
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Resolve each name independently, in order.
    ///
    /// The `node_modules` listing is taken once per call.
    pub fn resolve(
        &self,
        bridge: &HostBridge<'_>,
        names: &[String],
        containing_file: &str,
    ) -> Vec<Option<ResolvedModule>> {
        let packages = bridge.get_directories(NODE_MODULES);
        names
            .iter()
            .map(|name| {
                let resolved = if is_path_specifier(name) {
                    None
                } else {
                    match self.mode {
                        ResolutionMode::Shallow => self.shallow(bridge, &packages, name),
                        ResolutionMode::Manifest => self
                            .from_manifest(bridge, name)
                            .or_else(|| self.shallow(bridge, &packages, name)),
                    }
                };
                tracing::debug!(
                    module = %name,
                    from = containing_file,
                    resolved = resolved.as_ref().map(|r| r.resolved_file_name.as_str()),
                    "resolve module"
                );
                resolved
            })
            .collect()
    }

    fn shallow(
        &self,
        bridge: &HostBridge<'_>,
        packages: &[String],
        name: &str,
    ) -> Option<ResolvedModule> {
        if !packages.iter().any(|p| p == name) {
            return None;
        }
        let resolved_file_name = format!(
            "{}{NODE_MODULES}/{name}/index.d.ts",
            bridge.get_current_directory()
        );
        Some(ResolvedModule {
            extension: Extension::from_file_name(&resolved_file_name)?,
            resolved_file_name,
            package_id: Some(PackageId {
                name: name.to_owned(),
                sub_module_name: String::new(),
                version: self.package_version.clone(),
            }),
            is_external_library_import: true,
        })
    }

    fn from_manifest(&self, bridge: &HostBridge<'_>, name: &str) -> Option<ResolvedModule> {
        let (package, sub_path) = split_package_name(name);
        if sub_path.split('/').any(|s| s == "..") {
            return None;
        }
        let root = format!("{}{NODE_MODULES}/{package}", bridge.get_current_directory());
        if !bridge.directory_exists(&root) {
            return None;
        }

        let manifest = bridge
            .read_file(&path::join(&root, MANIFEST_FILE))
            .ok()
            .and_then(|text| PackageManifest::parse(package, &text).ok());

        let candidates: Vec<String> = if sub_path.is_empty() {
            manifest
                .as_ref()
                .and_then(PackageManifest::types_entry)
                .and_then(|entry| normalize_entry_path(entry).ok())
                .into_iter()
                .chain(std::iter::once("index.d.ts".to_owned()))
                .collect()
        } else {
            let sub = sub_path.trim_end_matches('/');
            vec![
                sub.to_owned(),
                format!("{sub}.d.ts"),
                format!("{sub}/index.d.ts"),
            ]
        };

        let resolved_file_name = candidates
            .iter()
            .map(|candidate| path::join(&root, candidate))
            .find(|candidate| {
                bridge.file_exists(candidate)
                    && Extension::from_file_name(candidate) == Some(Extension::Dts)
            })?;

        let version = manifest
            .and_then(|m| m.version)
            .unwrap_or_else(|| self.package_version.clone());
        Some(ResolvedModule {
            extension: Extension::Dts,
            resolved_file_name,
            package_id: Some(PackageId {
                name: package.to_owned(),
                sub_module_name: sub_path.to_owned(),
                version,
            }),
            is_external_library_import: true,
        })
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new(ResolutionMode::Shallow, crate::config::DEFAULT_PACKAGE_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::resource::file::{mkdirp, Encoding, MemoryFs, VirtualFileSystem};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn with_package(fs: &MemoryFs, dir: &str, manifest: Option<&str>, files: &[&str]) {
        mkdirp(fs, dir).unwrap();
        if let Some(manifest) = manifest {
            fs.write_file(&format!("{dir}/package.json"), manifest, Encoding::Utf8)
                .unwrap();
        }
        for file in files {
            let full = format!("{dir}/{file}");
            mkdirp(fs, path::parent(&full).unwrap()).unwrap();
            fs.write_file(&full, "export {};", Encoding::Utf8).unwrap();
        }
    }

    #[test]
    fn test_shallow_resolves_only_present_packages() {
        let fs = MemoryFs::new();
        with_package(&fs, "/node_modules/ts-transform-runtime-check", None, &[]);
        let bridge = HostBridge::new(&fs);

        let resolved = ModuleResolver::default().resolve(
            &bridge,
            &names(&["ts-transform-runtime-check", "left-pad"]),
            "/index.ts",
        );

        assert_eq!(resolved.len(), 2);
        let first = resolved[0].as_ref().unwrap();
        assert_eq!(
            first.resolved_file_name,
            "/node_modules/ts-transform-runtime-check/index.d.ts"
        );
        assert_eq!(first.extension, Extension::Dts);
        assert_eq!(
            first.package_id,
            Some(PackageId {
                name: "ts-transform-runtime-check".into(),
                sub_module_name: String::new(),
                version: "0.0.0-alpha5".into(),
            })
        );
        assert!(resolved[1].is_none());
    }

    #[test]
    fn test_shallow_without_node_modules() {
        let fs = MemoryFs::new();
        let bridge = HostBridge::new(&fs);
        let resolved = ModuleResolver::default().resolve(&bridge, &names(&["a", "b"]), "/index.ts");
        assert_eq!(resolved, vec![None, None]);
    }

    #[rstest]
    #[case("./local")]
    #[case("../up")]
    #[case("/abs/path")]
    #[case(".")]
    fn test_path_specifiers_unresolved(#[case] specifier: &str) {
        let fs = MemoryFs::new();
        with_package(&fs, "/node_modules/local", None, &["index.d.ts"]);
        let bridge = HostBridge::new(&fs);
        for mode in [ResolutionMode::Shallow, ResolutionMode::Manifest] {
            let resolver = ModuleResolver::new(mode, "1.0.0");
            assert_eq!(resolver.resolve(&bridge, &names(&[specifier]), "/index.ts"), vec![None]);
        }
    }

    #[test]
    fn test_manifest_mode_reads_entry_and_version() {
        let fs = MemoryFs::new();
        with_package(
            &fs,
            "/node_modules/typed",
            Some(r#"{"version":"2.1.0","types":"./dist/typed.d.ts"}"#),
            &["dist/typed.d.ts"],
        );
        let bridge = HostBridge::new(&fs);
        let resolver = ModuleResolver::new(ResolutionMode::Manifest, "0.0.0-alpha5");

        let resolved = resolver.resolve(&bridge, &names(&["typed"]), "/index.ts");
        let module = resolved[0].as_ref().unwrap();
        assert_eq!(module.resolved_file_name, "/node_modules/typed/dist/typed.d.ts");
        assert_eq!(module.package_id.as_ref().unwrap().version, "2.1.0");
    }

    #[test]
    fn test_manifest_mode_scoped_and_sub_path() {
        let fs = MemoryFs::new();
        with_package(
            &fs,
            "/node_modules/@scope/pkg",
            Some(r#"{"types":"index.d.ts"}"#),
            &["index.d.ts", "sub/index.d.ts", "extra.d.ts"],
        );
        let bridge = HostBridge::new(&fs);
        let resolver = ModuleResolver::new(ResolutionMode::Manifest, "0.0.0-alpha5");

        let resolved = resolver.resolve(
            &bridge,
            &names(&["@scope/pkg", "@scope/pkg/sub", "@scope/pkg/extra", "@scope/other"]),
            "/index.ts",
        );
        assert_eq!(
            resolved[0].as_ref().unwrap().resolved_file_name,
            "/node_modules/@scope/pkg/index.d.ts"
        );
        let sub = resolved[1].as_ref().unwrap();
        assert_eq!(sub.resolved_file_name, "/node_modules/@scope/pkg/sub/index.d.ts");
        assert_eq!(sub.package_id.as_ref().unwrap().sub_module_name, "sub");
        assert_eq!(sub.package_id.as_ref().unwrap().version, "0.0.0-alpha5");
        assert_eq!(
            resolved[2].as_ref().unwrap().resolved_file_name,
            "/node_modules/@scope/pkg/extra.d.ts"
        );
        assert!(resolved[3].is_none());
    }

    #[test]
    fn test_manifest_mode_falls_back_to_shallow() {
        let fs = MemoryFs::new();
        with_package(&fs, "/node_modules/bare", Some("{ broken"), &[]);
        let bridge = HostBridge::new(&fs);
        let resolver = ModuleResolver::new(ResolutionMode::Manifest, "9.9.9");

        let resolved = resolver.resolve(&bridge, &names(&["bare"]), "/index.ts");
        let module = resolved[0].as_ref().unwrap();
        assert_eq!(module.resolved_file_name, "/node_modules/bare/index.d.ts");
        assert_eq!(module.package_id.as_ref().unwrap().version, "9.9.9");
    }

    #[rstest]
    #[case("pkg", ("pkg", ""))]
    #[case("pkg/sub/deep", ("pkg", "sub/deep"))]
    #[case("@scope/pkg", ("@scope/pkg", ""))]
    #[case("@scope/pkg/sub", ("@scope/pkg", "sub"))]
    fn test_split_package_name(#[case] name: &str, #[case] expected: (&str, &str)) {
        assert_eq!(split_package_name(name), expected);
    }

    #[test]
    fn test_extension_from_file_name() {
        assert_eq!(Extension::from_file_name("index.d.ts"), Some(Extension::Dts));
        assert_eq!(Extension::from_file_name("index.ts"), Some(Extension::Ts));
        assert_eq!(Extension::from_file_name("index.css"), None);
    }
}
