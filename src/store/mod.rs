// ABOUTME: Local persistence of resource state and per-resource locks.
// ABOUTME: Everything lives under .ecrbuildpush/ next to the config file.

mod lock;
mod state;

pub use lock::{LockInfo, ResourceLock};
pub use state::{ResourceRecord, STATE_DIR, STATE_FILE, StateFile, StateStore};
