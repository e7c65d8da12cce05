//! Shinpo - local-first learning progress tracking
//!
//! Shinpo keeps a versioned progress document (learning paths, modules,
//! sections, quiz and exercise results, streaks and achievements) in a
//! pluggable key-value store, and exposes a snapshot-based session API
//! for presentation code.

pub mod model;
pub mod session;
pub mod store;
pub mod tracker;

pub use model::{ProgressStatus, ProgressStorage};
pub use session::{ProgressSession, ProgressSnapshot};
pub use store::{FileStore, MemoryStore, NullStore, ProgressStore};
pub use tracker::{ProgressError, ProgressTracker, ResetScope, SectionUpdate};
