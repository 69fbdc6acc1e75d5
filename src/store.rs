//! Host storage contract and built-in store implementations.
//!
//! The host platform owns persistence; the engine only needs single-key reads, writes, and
//! deletes plus a prefix listing. [`MemoryStore`] and [`FileStore`] implement the same
//! contract for tests and lightweight deployments.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Boxed future returned by [`Storage`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Keyed storage provided by the host platform.
///
/// Single-key operations must be atomic. No multi-key transactions are expected.
pub trait Storage
where
	Self: Send + Sync,
{
	/// Fetches the entry stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<StorageEntry>>;

	/// Persists or replaces an entry.
	fn put(&self, entry: StorageEntry) -> StoreFuture<'_, ()>;

	/// Removes the entry stored under `key`; deleting a missing key succeeds.
	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Lists the direct children of `prefix`.
	///
	/// Keys are returned relative to `prefix`; nested children collapse into a single
	/// `"<segment>/"` entry.
	fn list<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<String>>;
}

/// Raw value stored under a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEntry {
	/// Storage key.
	pub key: String,
	/// Encoded payload.
	pub value: Vec<u8>,
}
impl StorageEntry {
	/// Encodes `value` as JSON under `key`.
	pub fn json<T>(key: impl Into<String>, value: &T) -> Result<Self, StoreError>
	where
		T: ?Sized + Serialize,
	{
		let key = key.into();
		let value = serde_json::to_vec(value).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode {key}: {e}"),
		})?;

		Ok(Self { key, value })
	}

	/// Decodes the JSON payload.
	pub fn decode_json<T>(&self) -> Result<T, StoreError>
	where
		T: DeserializeOwned,
	{
		serde_json::from_slice(&self.value).map_err(|e| StoreError::Serialization {
			message: format!("Failed to decode {}: {e}", self.key),
		})
	}
}

/// Error type produced by [`Storage`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced while encoding or decoding entries.
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

/// Reduces sorted keys to the direct children of `prefix`.
pub(crate) fn list_children<'k>(
	keys: impl IntoIterator<Item = &'k String>,
	prefix: &str,
) -> Vec<String> {
	let mut children: Vec<String> = Vec::new();

	for key in keys {
		let Some(rest) = key.strip_prefix(prefix) else { continue };

		if rest.is_empty() {
			continue;
		}

		let child = match rest.find('/') {
			Some(idx) => &rest[..=idx],
			None => rest,
		};

		if children.last().map(String::as_str) != Some(child) {
			children.push(child.to_owned());
		}
	}

	children
}
