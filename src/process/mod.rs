//! Compilation pipeline.
//!
//! - [`program`] - Contracts of the compiler and transform collaborators
//! - [`emit_with_transform`] - Emit one unit through a pre-emit transformer
//! - [`Compiler`] - Builder-based compile over a prepared [`Session`](crate::session::Session)
//! - [`Plugin`] - Editor lifecycle (mount, run, unmount)

mod emit;
pub mod compile;
pub mod plugin;
pub mod program;

pub use compile::{CompileResult, Compiler, DEFAULT_ROOT};
pub use emit::{emit_with_transform, EmitOutput, EmittedFile};
pub use plugin::{EditorState, Plugin, PluginConfig};
pub use program::{
    CompilerBackend, CustomTransformers, EmitResult, Program, Transformer, TransformerFactory,
};
