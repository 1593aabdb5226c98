//! Compiler options consumed by the host layer.

/// ECMAScript language level the compiler targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptTarget {
    ES3,
    #[default]
    ES5,
    ES2015,
    ES2016,
    ES2017,
    ES2018,
    ES2019,
    ES2020,
    ES2021,
    ES2022,
    ES2023,
    ESNext,
}

impl ScriptTarget {
    /// Lowercase option spelling (`"es2015"`, `"esnext"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ES3 => "es3",
            Self::ES5 => "es5",
            Self::ES2015 => "es2015",
            Self::ES2016 => "es2016",
            Self::ES2017 => "es2017",
            Self::ES2018 => "es2018",
            Self::ES2019 => "es2019",
            Self::ES2020 => "es2020",
            Self::ES2021 => "es2021",
            Self::ES2022 => "es2022",
            Self::ES2023 => "es2023",
            Self::ESNext => "esnext",
        }
    }

    /// File name of the default library bundle for this target.
    pub fn default_lib_file_name(self) -> &'static str {
        match self {
            Self::ES3 | Self::ES5 => "lib.d.ts",
            Self::ES2015 => "lib.es6.d.ts",
            Self::ES2016 => "lib.es2016.full.d.ts",
            Self::ES2017 => "lib.es2017.full.d.ts",
            Self::ES2018 => "lib.es2018.full.d.ts",
            Self::ES2019 => "lib.es2019.full.d.ts",
            Self::ES2020 => "lib.es2020.full.d.ts",
            Self::ES2021 => "lib.es2021.full.d.ts",
            Self::ES2022 => "lib.es2022.full.d.ts",
            Self::ES2023 => "lib.es2023.full.d.ts",
            Self::ESNext => "lib.esnext.full.d.ts",
        }
    }
}

/// Options the host needs to know about.
///
/// The compiler collaborator may understand many more; only the ones that
/// affect library lookup live here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CompilerOptions {
    pub target: ScriptTarget,
    /// Explicit library entries (`"es2015.core"`, `"dom"`); empty means the
    /// target's default bundle.
    pub lib: Vec<String>,
    /// Skip default libraries entirely.
    pub no_lib: bool,
    /// Skip emitting when the program has errors.
    pub no_emit_on_error: bool,
}

impl CompilerOptions {
    pub fn new(target: ScriptTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_lib<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lib = entries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_no_lib(mut self, no_lib: bool) -> Self {
        self.no_lib = no_lib;
        self
    }

    pub fn with_no_emit_on_error(mut self, no_emit_on_error: bool) -> Self {
        self.no_emit_on_error = no_emit_on_error;
        self
    }
}

/// Default library file name for `options`, following the compiler's convention.
pub fn default_lib_file_name(options: &CompilerOptions) -> &'static str {
    options.target.default_lib_file_name()
}

/// File name for a `lib` option entry or `reference lib` directive.
///
/// `"es2015.core"` becomes `"lib.es2015.core.d.ts"`.
pub fn lib_entry_file_name(entry: &str) -> String {
    format!("lib.{}.d.ts", entry.trim().to_ascii_lowercase())
}
