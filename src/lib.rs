//! # playground-host
//!
//! The environment a source-to-source transform needs to run inside a
//! browser playground: an in-memory filesystem, an OS-like host facade, a
//! compiler host adapter, and a fetcher that pulls package declarations and
//! default libraries from a registry mirror.
//!
//! The compiler itself and the transformation are collaborators: they are
//! plugged in through [`process::CompilerBackend`] and
//! [`process::TransformerFactory`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use playground_host::prelude::*;
//!
//! let config = ConfigBuilder::new().build()?;
//! let transport = HttpTransport::from_config(&config)?;
//! let session = Session::new(config, Rc::new(transport))?;
//!
//! let mut plugin = Plugin::new(&session, PluginConfig::default());
//! plugin.mount().await;
//!
//! let editor = EditorState::new("index.ts", "console.log(is<number>(42));");
//! let result = plugin.run(&backend, &editor, &runtime_check).await?;
//! println!("{}", result.text("/index.js").unwrap_or_default());
//! ```
//!
//! ## Layout
//!
//! ```text
//! /                              working directory
//! /libs/lib.d.ts, lib.es5.d.ts   default libraries
//! /node_modules/<pkg>/<entry>    fetched package declarations
//! /index.ts                      editor file
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Registry, library mirror and layout settings
//! - [`resource`]: Filesystem, package fetcher, library loader
//! - [`host`]: Host bridge, compiler host adapter, module resolution
//! - [`session`]: Per-editor state and the preparation barrier
//! - [`process`]: Compile orchestration and plugin lifecycle
//! - [`diagnostic`]: Errors and diagnostic formatting

#![forbid(unsafe_code)]

pub mod config;
pub mod diagnostic;
pub mod host;
pub mod prelude;
pub mod process;
pub mod resource;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigBuilder};
pub use diagnostic::{CompileError, Diagnostic, Diagnostics, FetchError, TransformError, VfsError};
pub use process::{CompileResult, Compiler, EditorState, Plugin, PluginConfig};
pub use session::{PackageState, Prepared, Session};
