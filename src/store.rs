//! Storage contracts and built-in token-state stores.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenState};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the broker's token state.
///
/// The broker depends only on this narrow load/save pair; the concrete medium (file,
/// database, key-value store) stays behind the trait.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Reads the persisted token state, if any.
	fn load(&self) -> StoreFuture<'_, Option<TokenState>>;

	/// Persists or replaces the token state.
	fn save(&self, state: TokenState) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
