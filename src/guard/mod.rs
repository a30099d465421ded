//! Host-wide exclusivity for backup and restore runs.
//!
//! A run holds a zero-byte marker file created with exclusive-create
//! semantics; a second run fails fast instead of waiting.

pub mod lock;

pub use lock::{with_lock, ExclusivityGuard, DEFAULT_LOCK_FILE};
