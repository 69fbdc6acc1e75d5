//! Remote API contracts and the lazily rebuilt client cache.
//!
//! [`ServiceTokenApi`] is the engine's only dependency on the remote account-management
//! service, and [`ClientConnector`] turns the stored [`EngineConfig`] into such a client.
//! [`ClientCache`] keeps at most one client alive per configuration generation: readers share
//! the cached handle, and a miss takes the exclusive lock, re-checks, and builds once.

#[cfg(feature = "reqwest")] pub mod cloudflare;

// self
use crate::{
	_prelude::*,
	backend::Backend,
	config::EngineConfig,
	credential::{AccountId, ServiceToken, TokenId},
	error::RemoteError,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

/// Boxed future returned by [`ServiceTokenApi`] calls.
pub type ServiceTokenFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, RemoteError>> + 'a + Send>>;
/// Boxed future returned by [`ClientConnector::connect`].
pub type ConnectFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Service token operations exposed by the remote API, each scoped to an account.
pub trait ServiceTokenApi
where
	Self: 'static + Send + Sync,
{
	/// Mints a new service token named `name` under `account`.
	fn create_service_token<'a>(
		&'a self,
		account: &'a AccountId,
		name: &'a str,
	) -> ServiceTokenFuture<'a, ServiceToken>;

	/// Extends the validity of an existing service token without rotating its secret.
	fn refresh_service_token<'a>(
		&'a self,
		account: &'a AccountId,
		token: &'a TokenId,
	) -> ServiceTokenFuture<'a, ()>;

	/// Deletes a service token; the remote side treats a token ID as single-use.
	fn delete_service_token<'a>(
		&'a self,
		account: &'a AccountId,
		token: &'a TokenId,
	) -> ServiceTokenFuture<'a, ()>;
}

/// Builds [`ServiceTokenApi`] clients from the stored configuration.
///
/// Construction may be expensive (for example, verifying the API token over the network), so
/// the backend caches the result until the configuration changes.
pub trait ClientConnector
where
	Self: 'static + Send + Sync,
{
	/// Client type produced by this connector.
	type Client: ServiceTokenApi;

	/// Builds a client; an empty API token must fail with
	/// [`ConfigError::MissingApiToken`](crate::error::ConfigError::MissingApiToken).
	fn connect<'a>(&'a self, config: &'a EngineConfig) -> ConnectFuture<'a, Self::Client>;
}

/// Process-wide slot holding the current client.
pub struct ClientCache<C> {
	slot: AsyncRwLock<Option<Arc<C>>>,
}
impl<C> ClientCache<C> {
	/// Returns the cached client or builds one with `build`.
	///
	/// The build runs under the exclusive lock after a second lookup, so concurrent misses
	/// produce a single client. A failed build leaves the slot empty.
	pub async fn get_or_build<F, Fut>(&self, build: F) -> Result<Arc<C>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<C>>,
	{
		let cached = self.slot.read().await.clone();

		if let Some(client) = cached {
			return Ok(client);
		}

		let mut slot = self.slot.write().await;

		if let Some(client) = slot.as_ref() {
			return Ok(client.clone());
		}

		let client = Arc::new(build().await?);

		*slot = Some(client.clone());

		Ok(client)
	}

	#[cfg(test)]
	async fn cached(&self) -> Option<Arc<C>> {
		self.slot.read().await.clone()
	}

	/// Drops the cached client; the next lookup rebuilds it.
	pub async fn invalidate(&self) {
		*self.slot.write().await = None;
	}
}
impl<C> Default for ClientCache<C> {
	fn default() -> Self {
		Self { slot: AsyncRwLock::new(None) }
	}
}
impl<C> Debug for ClientCache<C> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ClientCache(..)")
	}
}

impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Returns the shared remote client, building it from the stored configuration on a miss.
	///
	/// A missing configuration is treated as empty and therefore fails with a configuration
	/// error; nothing is cached in that case.
	pub async fn client(&self) -> Result<Arc<K::Client>> {
		self.clients
			.get_or_build(move || async move {
				const KIND: OperationKind = OperationKind::ClientBuild;

				let span = OperationSpan::new(KIND, "client");

				obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

				let result = span
					.instrument(async {
						let config = self.read_config().await?.unwrap_or_default();

						self.connector.connect(&config).await
					})
					.await;

				obs::record_result(KIND, &result);

				result
			})
			.await
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::error::ConfigError;

	#[tokio::test]
	async fn concurrent_misses_build_once() {
		let cache = <ClientCache<usize>>::default();
		let builds = AtomicUsize::new(0);
		let builds = &builds;
		let build = move || async move {
			builds.fetch_add(1, Ordering::SeqCst);

			Ok(7)
		};
		let (a, b, c) = tokio::join!(
			cache.get_or_build(build),
			cache.get_or_build(build),
			cache.get_or_build(build),
		);
		let a = a.expect("First lookup should build the client.");
		let b = b.expect("Second lookup should reuse the client.");
		let c = c.expect("Third lookup should reuse the client.");

		assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
		assert_eq!(builds.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn failed_build_leaves_slot_empty() {
		let cache = <ClientCache<usize>>::default();
		let err = cache
			.get_or_build(|| async { Err(ConfigError::MissingApiToken.into()) })
			.await
			.expect_err("Build failures should propagate.");

		assert!(matches!(err, Error::Config(ConfigError::MissingApiToken)));
		assert!(cache.cached().await.is_none());

		let client =
			cache.get_or_build(|| async { Ok(1) }).await.expect("Later builds should succeed.");

		assert_eq!(*client, 1);
	}

	#[tokio::test]
	async fn invalidate_forces_rebuild() {
		let cache = <ClientCache<usize>>::default();
		let first = cache.get_or_build(|| async { Ok(1) }).await.expect("Build should succeed.");

		cache.invalidate().await;

		let second = cache.get_or_build(|| async { Ok(2) }).await.expect("Rebuild should succeed.");

		assert!(!Arc::ptr_eq(&first, &second));
		assert_eq!(*second, 2);
	}
}
