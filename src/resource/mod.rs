//! Resources a compilation reads: the in-memory filesystem, fetched
//! packages and default libraries.

pub mod file;
pub mod library;
pub mod package;
pub mod transport;
