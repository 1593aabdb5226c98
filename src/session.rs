//! Per-editor session state.
//!
//! A [`Session`] owns everything that lives as long as one editing session:
//! the filesystem, the fetch clients, which packages and libraries are
//! already in place, and the invocation generation.
//!
//! ```text
//! prepare(options, packages)
//!   ├─► begin generation N
//!   ├─► default libraries   (once per LibraryKey)
//!   ├─► packages            (once per name; failures are kept)
//!   └─► Prepared { N }  ──► Compiler::new(&session, prepared)
//! ```
//!
//! Every remote result is checked against the generation before it touches
//! the filesystem, so an older invocation that resumes late cannot
//! overwrite what a newer one set up.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::Config;
use crate::diagnostic::{CompileError, FetchError, VfsError};
use crate::host::CompilerOptions;
use crate::resource::file::{mkdirp, MemoryFs};
use crate::resource::library::{DefaultLibraryMap, LibraryKey, LibraryLoader};
use crate::resource::package::PackageFetcher;
use crate::resource::transport::Transport;

/// Monotonic invocation counter.
#[derive(Debug, Default)]
pub struct Generation(Cell<u64>);

impl Generation {
    /// Start a new invocation, returning its number.
    pub fn begin(&self) -> u64 {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }

    pub fn current(&self) -> u64 {
        self.0.get()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Outcome of fetching a package, kept for the rest of the session.
#[derive(Debug, Clone)]
pub enum PackageState {
    Ready {
        /// Absolute path of the materialized declaration file.
        entry: String,
        version: Option<String>,
        fetched_at: DateTime<Utc>,
    },
    /// Reported again by every action that depends on the package.
    Failed(FetchError),
}

impl PackageState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Proof that libraries and packages for one invocation are in place.
///
/// Only [`Session::prepare`] creates it; the compiler refuses tickets from
/// superseded invocations.
#[derive(Debug, Clone)]
pub struct Prepared {
    generation: u64,
    options: CompilerOptions,
}

impl Prepared {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Options the libraries were installed for.
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }
}

/// One editing session.
///
/// Sessions live on one thread: state sits in `Cell`/`RefCell`, and no
/// borrow is held across an `.await`.
pub struct Session {
    config: Config,
    fs: MemoryFs,
    fetcher: PackageFetcher,
    libraries: LibraryLoader,
    generation: Generation,
    packages: RefCell<FxHashMap<String, PackageState>>,
    installed_libraries: RefCell<FxHashSet<LibraryKey>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cwd", &self.config.current_directory)
            .field("generation", &self.generation.current())
            .field("packages", &self.packages.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create the filesystem with its working directory and the fetch clients.
    pub fn new(config: Config, transport: Rc<dyn Transport>) -> Result<Self, VfsError> {
        let fs = MemoryFs::with_cwd(&config.current_directory)?;
        mkdirp(&fs, &config.current_directory)?;

        tracing::debug!(
            cwd = %config.current_directory,
            registry = %config.registry_url,
            "session started"
        );
        Ok(Self {
            fetcher: PackageFetcher::new(transport.clone(), config.registry_url.clone()),
            libraries: LibraryLoader::new(transport, config.library_url.clone()),
            config,
            fs,
            generation: Generation::default(),
            packages: RefCell::new(FxHashMap::default()),
            installed_libraries: RefCell::new(FxHashSet::default()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fs(&self) -> &MemoryFs {
        &self.fs
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Recorded state of package `name`, if it was ever fetched.
    pub fn package_state(&self, name: &str) -> Option<PackageState> {
        self.packages.borrow().get(name).cloned()
    }

    /// Whether `prepared` still belongs to the newest invocation.
    pub fn is_current(&self, prepared: &Prepared) -> bool {
        self.generation.is_current(prepared.generation)
    }

    fn ensure_current(&self, generation: u64) -> Result<(), CompileError> {
        if self.generation.is_current(generation) {
            Ok(())
        } else {
            tracing::debug!(generation, current = self.generation.current(), "invocation superseded");
            Err(CompileError::Superseded { generation })
        }
    }

    /// Put libraries and packages in place for one invocation.
    ///
    /// Starts a new generation. Fails with the stored error of any package
    /// that could not be fetched, now or earlier in the session.
    pub async fn prepare<S: AsRef<str>>(
        &self,
        options: &CompilerOptions,
        packages: &[S],
    ) -> Result<Prepared, CompileError> {
        let generation = self.generation.begin();

        self.ensure_libraries(options, generation).await?;
        for name in packages {
            self.ensure_package(name.as_ref(), generation).await?;
        }

        self.ensure_current(generation)?;
        Ok(Prepared {
            generation,
            options: options.clone(),
        })
    }

    /// Fetch packages ahead of time. Failures are stored, not returned.
    pub async fn preload<S: AsRef<str>>(&self, packages: &[S]) {
        let generation = self.generation.current();
        for name in packages {
            if let Err(e) = self.ensure_package(name.as_ref(), generation).await {
                tracing::debug!(package = name.as_ref(), error = %e, "preload did not complete");
            }
        }
    }

    /// Install an in-memory library set for `options` without fetching.
    pub fn install_libraries(
        &self,
        options: &CompilerOptions,
        libraries: &DefaultLibraryMap,
    ) -> Result<(), VfsError> {
        libraries.install(&self.fs, &self.config.library_location())?;
        self.installed_libraries.borrow_mut().insert(LibraryKey::from(options));
        Ok(())
    }

    async fn ensure_libraries(
        &self,
        options: &CompilerOptions,
        generation: u64,
    ) -> Result<(), CompileError> {
        let key = LibraryKey::from(options);
        if key.no_lib || self.installed_libraries.borrow().contains(&key) {
            return Ok(());
        }

        let map = self.libraries.load(options).await?;
        self.ensure_current(generation)?;

        map.install(&self.fs, &self.config.library_location())?;
        self.installed_libraries.borrow_mut().insert(key);
        Ok(())
    }

    async fn ensure_package(&self, name: &str, generation: u64) -> Result<(), CompileError> {
        match self.packages.borrow().get(name) {
            Some(PackageState::Ready { .. }) => return Ok(()),
            Some(PackageState::Failed(e)) => return Err(e.clone().into()),
            None => {}
        }

        let fetched = self.fetcher.fetch(name).await;
        self.ensure_current(generation)?;

        let state = match fetched.and_then(|package| {
            let entry = package.materialize(&self.fs)?;
            Ok((package, entry))
        }) {
            Ok((package, entry)) => PackageState::Ready {
                entry,
                version: package.version,
                fetched_at: package.fetched_at,
            },
            Err(e) => {
                tracing::warn!(package = name, error = %e, "package unavailable");
                PackageState::Failed(e)
            }
        };

        let result = match &state {
            PackageState::Ready { .. } => Ok(()),
            PackageState::Failed(e) => Err(e.clone().into()),
        };
        self.packages.borrow_mut().insert(name.to_owned(), state);
        result
    }

    /// End the session, dropping the filesystem and all cached state.
    pub fn teardown(self) {
        tracing::debug!(
            generation = self.generation.current(),
            packages = self.packages.borrow().len(),
            "session closed"
        );
    }
}
