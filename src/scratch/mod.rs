//! Temporary resource management
//!
//! Every scratch file the service creates (uploaded audio, per-session live
//! chunks, merged video awaiting delivery) is allocated and released here.

mod guard;
mod space;

pub use guard::ScratchGuard;
pub use space::{ScratchError, ScratchHandle, ScratchKind, ScratchSpace};
