//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	store::{StoreError, StoreFuture, TokenStore},
};

type StateCell = Arc<RwLock<Option<TokenState>>>;

/// Thread-safe store that keeps the token state in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StateCell);
impl MemoryStore {
	fn save_now(cell: StateCell, state: TokenState) -> Result<(), StoreError> {
		*cell.write() = Some(state);

		Ok(())
	}

	fn load_now(cell: StateCell) -> Option<TokenState> {
		cell.read().clone()
	}
}
impl TokenStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenState>> {
		let cell = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(cell)) })
	}

	fn save(&self, state: TokenState) -> StoreFuture<'_, ()> {
		let cell = self.0.clone();

		Box::pin(async move { Self::save_now(cell, state) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ShopId;

	#[tokio::test]
	async fn save_replaces_the_previous_state() {
		let store = MemoryStore::default();

		assert!(store.load().await.expect("Empty store should load cleanly.").is_none());

		let initial =
			TokenState::new(ShopId::new(1), "access-a", "refresh-a", OffsetDateTime::now_utc());

		store.save(initial.clone()).await.expect("Saving the initial state should succeed.");

		let replacement = initial.rotated("access-b", "refresh-b", OffsetDateTime::now_utc());

		store.save(replacement.clone()).await.expect("Replacing the state should succeed.");

		let loaded = store
			.load()
			.await
			.expect("Loading the replaced state should succeed.")
			.expect("Replaced state should be present.");

		assert_eq!(loaded, replacement);
	}
}
