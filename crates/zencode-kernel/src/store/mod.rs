//! Durable key-value storage for editor state.
//!
//! Everything the session persists is a plain string under a string key,
//! the same shape as browser local storage. Three backends:
//!
//! - [`MemoryStore`]: ephemeral, used for tests and as the degrade target.
//! - [`FileStore`]: one JSON object on disk, rewritten atomically per write.
//! - [`FallbackStore`]: wraps a durable store and silently switches to memory
//!   for the rest of the session once the durable side fails.

mod error;
mod fallback;
mod file;
mod memory;

pub use error::{StoreError, StoreResult};
pub use fallback::FallbackStore;
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::sync::Arc;

/// Key-value storage operations.
///
/// Implementations must give read-after-write consistency per key: a `get`
/// that starts after a `set` for the same key completed returns that value.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend name for logs ("memory", "file", ...).
    fn name(&self) -> &str;

    /// Read a value. Absent keys are `Ok(None)`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Overwrite a value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a value. Deleting an absent key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Shared handle to a store, as held by the preference and snapshot layers.
pub type SharedStore = Arc<dyn KvStore>;
