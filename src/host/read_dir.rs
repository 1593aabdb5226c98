//! Recursive directory listing with extension, glob and depth filters.

use glob::{MatchOptions, Pattern};

use crate::resource::file::{path, VirtualFileSystem};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Filters for [`HostBridge::read_directory`](super::HostBridge::read_directory).
///
/// Patterns starting with `/` match absolute paths, others match the path
/// relative to the listing root. `*` stays within a segment, `**` spans
/// directories.
///
/// # Example
///
/// ```ignore
/// let filter = DirectoryFilter::new()
///     .with_extensions([".ts", ".tsx"])
///     .with_exclude(["node_modules"])
///     .with_depth(2);
/// let files = bridge.read_directory("/", &filter);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    /// Kept file name suffixes (`.ts`, `.d.ts`); empty keeps all.
    pub extensions: Vec<String>,
    /// Files must match one of these; empty keeps all.
    pub include: Vec<String>,
    /// Matching files are dropped and matching directories pruned.
    pub exclude: Vec<String>,
    /// Maximum directory levels below the root; `None` is unlimited.
    pub depth: Option<usize>,
}

impl DirectoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// A compiled glob, remembering whether it targets absolute paths.
struct Glob {
    pattern: Pattern,
    absolute: bool,
}

impl Glob {
    fn matches(&self, absolute: &str, relative: &str) -> bool {
        let candidate = if self.absolute { absolute } else { relative };
        self.pattern.matches_with(candidate, MATCH_OPTIONS)
    }
}

fn compile(patterns: &[String]) -> Vec<Glob> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(Glob {
                pattern,
                absolute: raw.starts_with('/'),
            }),
            Err(e) => {
                tracing::warn!(pattern = %raw, error = %e, "ignoring invalid glob pattern");
                None
            }
        })
        .collect()
}

struct Walk<'a> {
    fs: &'a dyn VirtualFileSystem,
    extensions: &'a [String],
    include: Vec<Glob>,
    exclude: Vec<Glob>,
    depth: Option<usize>,
    found: Vec<String>,
}

impl Walk<'_> {
    fn excluded(&self, absolute: &str, relative: &str) -> bool {
        self.exclude.iter().any(|g| g.matches(absolute, relative))
    }

    fn keep_file(&self, absolute: &str, relative: &str) -> bool {
        let name = path::file_name(absolute).unwrap_or_default();
        let extension_ok =
            self.extensions.is_empty() || self.extensions.iter().any(|ext| name.ends_with(ext.as_str()));
        let included =
            self.include.is_empty() || self.include.iter().any(|g| g.matches(absolute, relative));
        extension_ok && included && !self.excluded(absolute, relative)
    }

    fn visit(&mut self, dir: &str, relative_dir: &str, level: usize) {
        let Ok(names) = self.fs.readdir(dir) else {
            return;
        };
        for name in names {
            let absolute = path::join(dir, &name);
            let relative = if relative_dir.is_empty() {
                name
            } else {
                format!("{relative_dir}/{name}")
            };
            let Ok(stat) = self.fs.stat(&absolute) else {
                continue;
            };
            if stat.is_directory() {
                let within_depth = self.depth.is_none_or(|max| level < max);
                if within_depth && !self.excluded(&absolute, &relative) {
                    self.visit(&absolute, &relative, level + 1);
                }
            } else if self.keep_file(&absolute, &relative) {
                self.found.push(absolute);
            }
        }
    }
}

/// List files below `root`, sorted by absolute path. Never fails.
pub fn read_directory(fs: &dyn VirtualFileSystem, root: &str, filter: &DirectoryFilter) -> Vec<String> {
    let Ok(root) = path::normalize(fs.current_directory(), root) else {
        return Vec::new();
    };
    let mut walk = Walk {
        fs,
        extensions: &filter.extensions,
        include: compile(&filter.include),
        exclude: compile(&filter.exclude),
        depth: filter.depth,
        found: Vec::new(),
    };
    walk.visit(&root, "", 0);

    let mut found = walk.found;
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::file::{mkdirp, Encoding, MemoryFs};

    fn project() -> MemoryFs {
        let fs = MemoryFs::new();
        for dir in ["/src/util", "/node_modules/pkg", "/libs"] {
            mkdirp(&fs, dir).unwrap();
        }
        for file in [
            "/index.ts",
            "/readme.md",
            "/src/a.ts",
            "/src/b.tsx",
            "/src/util/c.ts",
            "/src/util/c.d.ts",
            "/node_modules/pkg/index.d.ts",
            "/libs/lib.d.ts",
        ] {
            fs.write_file(file, "", Encoding::Utf8).unwrap();
        }
        fs
    }

    #[test]
    fn test_lists_everything_sorted() {
        let fs = project();
        let files = read_directory(&fs, "/", &DirectoryFilter::new());
        assert_eq!(files.len(), 8);
        assert_eq!(files.first().map(String::as_str), Some("/index.ts"));
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_extension_filter() {
        let fs = project();
        let filter = DirectoryFilter::new().with_extensions([".tsx", ".md"]);
        assert_eq!(
            read_directory(&fs, "/", &filter),
            vec!["/readme.md", "/src/b.tsx"]
        );
    }

    #[test]
    fn test_exclude_prunes_directories() {
        let fs = project();
        let filter = DirectoryFilter::new()
            .with_extensions([".ts"])
            .with_exclude(["node_modules", "libs", "**/*.d.ts"]);
        assert_eq!(
            read_directory(&fs, "/", &filter),
            vec!["/index.ts", "/src/a.ts", "/src/util/c.ts"]
        );
    }

    #[test]
    fn test_include_relative_and_absolute() {
        let fs = project();
        let relative = DirectoryFilter::new().with_include(["src/*.ts"]);
        assert_eq!(read_directory(&fs, "/", &relative), vec!["/src/a.ts"]);

        let absolute = DirectoryFilter::new().with_include(["/src/**/*.ts"]);
        assert_eq!(
            read_directory(&fs, "/src", &absolute),
            vec!["/src/a.ts", "/src/util/c.d.ts", "/src/util/c.ts"]
        );
    }

    #[test]
    fn test_depth_limit() {
        let fs = project();
        let root_only = DirectoryFilter::new().with_depth(0);
        assert_eq!(
            read_directory(&fs, "/", &root_only),
            vec!["/index.ts", "/readme.md"]
        );

        let one_level = DirectoryFilter::new().with_extensions([".ts"]).with_depth(1);
        assert_eq!(
            read_directory(&fs, "/src", &one_level),
            vec!["/src/a.ts", "/src/util/c.d.ts", "/src/util/c.ts"]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let fs = project();
        assert!(read_directory(&fs, "/nope", &DirectoryFilter::new()).is_empty());
        assert!(read_directory(&fs, "", &DirectoryFilter::new()).is_empty());
    }
}
