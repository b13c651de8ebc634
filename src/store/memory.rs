//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{CredentialKey, CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<CredentialKey, String>>>;

/// Thread-safe storage backend that keeps credentials in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns a copy of the value stored under `key` without going through the async contract.
	pub fn peek(&self, key: CredentialKey) -> Option<String> {
		self.0.read().get(&key).cloned()
	}

	/// Number of keys currently stored.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no credential is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn set_now(map: StoreMap, key: CredentialKey, value: String) -> Result<(), StoreError> {
		map.write().insert(key, value);

		Ok(())
	}

	fn delete_now(map: StoreMap, keys: &[CredentialKey]) -> Result<(), StoreError> {
		let mut guard = map.write();

		for key in keys {
			guard.remove(key);
		}

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, key: CredentialKey) -> StoreFuture<'_, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn set(&self, key: CredentialKey, value: String) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, key, value) })
	}

	fn delete<'a>(&'a self, keys: &'a [CredentialKey]) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::delete_now(map, keys) })
	}
}
