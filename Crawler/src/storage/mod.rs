//! Storage abstractions for the course snapshot.
//!
//! The snapshot is the full list of courses seen on the last check that
//! found something new. It is replaced wholesale, never merged.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Watcher configuration
//! └── binance_courses.json  # Snapshot: JSON array of courses
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Course;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot.
    ///
    /// A missing snapshot is an empty list; any other failure propagates.
    async fn load(&self) -> Result<Vec<Course>>;

    /// Replace the stored snapshot with `courses`.
    async fn save(&self, courses: &[Course]) -> Result<()>;

    /// Human-readable location of the snapshot, for logs.
    fn location(&self) -> String;
}
