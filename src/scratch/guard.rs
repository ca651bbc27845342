use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use super::space::{ScratchError, ScratchHandle, ScratchSpace};

/// Scoped ownership of one scratch file.
///
/// The file is released when the guard is dropped, whichever way the owning
/// operation exits. Drop-time failures are logged, never propagated.
pub struct ScratchGuard {
    space: Arc<ScratchSpace>,
    handle: Option<ScratchHandle>,
}

impl ScratchGuard {
    pub(super) fn new(space: Arc<ScratchSpace>, handle: ScratchHandle) -> Self {
        Self {
            space,
            handle: Some(handle),
        }
    }

    pub fn path(&self) -> &Path {
        // Only `release`/`drop` take the handle, and both consume the guard
        self.handle
            .as_ref()
            .map(ScratchHandle::path)
            .unwrap_or_else(|| Path::new(""))
    }

    /// Release now and report the outcome instead of logging it
    pub fn release(mut self) -> Result<(), ScratchError> {
        match self.handle.take() {
            Some(handle) => self.space.release(&handle).map(|_| ()),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ScratchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchGuard")
            .field("handle", &self.handle)
            .finish()
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.space.release(&handle) {
                warn!("Scratch cleanup failed on drop: {}", e);
            }
        }
    }
}
