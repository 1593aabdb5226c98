//! The compiler's view of the world.
//!
//! ```text
//! VirtualFileSystem ──► HostBridge ──► VfsCompilerHost ──► CompilerBackend
//!                       (system)       (+ libs, resolution)
//! ```

mod cancel;
mod compiler;
mod options;
mod read_dir;
mod resolve;
mod system;

pub use cancel::CancellationToken;
pub use compiler::{CompilerHost, SourceFile, VfsCompilerHost};
pub use options::{default_lib_file_name, lib_entry_file_name, CompilerOptions, ScriptTarget};
pub use read_dir::{read_directory, DirectoryFilter};
pub use resolve::{Extension, ModuleResolver, PackageId, ResolutionMode, ResolvedModule};
pub use system::HostBridge;
