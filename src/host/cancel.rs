//! Exit requests raised by the compiler through the host.

use std::sync::{Arc, OnceLock};

use crate::diagnostic::TransformError;

/// Shared flag recording the first exit code requested via
/// [`HostBridge::exit`](super::HostBridge::exit).
///
/// Clones observe the same state. The emit step checks it between units.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    code: Arc<OnceLock<i32>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `code`. Later calls keep the first code.
    pub fn cancel(&self, code: i32) {
        _ = self.code.set(code);
    }

    pub fn is_cancelled(&self) -> bool {
        self.code.get().is_some()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.code.get().copied()
    }

    /// Fail with [`TransformError::Cancelled`] once an exit was requested.
    pub fn check(&self) -> Result<(), TransformError> {
        match self.exit_code() {
            Some(code) => Err(TransformError::Cancelled { code }),
            None => Ok(()),
        }
    }
}
