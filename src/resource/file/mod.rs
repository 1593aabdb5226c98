//! In-memory file system.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                   Filesystem layout                   │
//! ├───────────────────────────────────────────────────────┤
//! │  /                      working directory             │
//! │  /libs/<lib>.d.ts       default library declarations  │
//! │  /node_modules/<pkg>/   fetched package declarations  │
//! │  /<editor path>         the file being edited         │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! [`VirtualFileSystem`] is the synchronous contract; [`MemoryFs`] is the
//! only implementation. [`mkdirp`] builds directory chains on top of the
//! single-level `mkdir`.

mod memory;
mod mkdirp;
pub mod path;
mod read;
mod vfs;

pub use memory::MemoryFs;
pub use mkdirp::mkdirp;
pub use read::Encoding;
pub use vfs::{Stat, VirtualFileSystem};
