//! Thread-safe in-memory [`Storage`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{Storage, StorageEntry, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<BTreeMap<String, Vec<u8>>>>;

/// Thread-safe storage backend that keeps entries in-process for tests and demos.
///
/// Keys are kept sorted, so listings come back in lexicographic order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: StoreMap, key: &str) -> Option<StorageEntry> {
		map.read().get(key).map(|value| StorageEntry { key: key.to_owned(), value: value.clone() })
	}

	fn put_now(map: StoreMap, entry: StorageEntry) -> Result<(), StoreError> {
		map.write().insert(entry.key, entry.value);

		Ok(())
	}

	fn list_now(map: StoreMap, prefix: &str) -> Vec<String> {
		let guard = map.read();

		super::list_children(guard.keys(), prefix)
	}
}
impl Storage for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<StorageEntry>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn put(&self, entry: StorageEntry) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::put_now(map, entry) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(key);

			Ok(())
		})
	}

	fn list<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::list_now(map, prefix)) })
	}
}
