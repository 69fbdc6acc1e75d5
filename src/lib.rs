//! Secrets engine core that mints, renews, and revokes Cloudflare Access service tokens on
//! behalf of a lease-managing host, with role-scoped issuance and a lazily rebuilt API client.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod backend;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod flows;
pub mod handler;
#[cfg(feature = "reqwest")] pub mod http;
pub mod lease;
pub mod obs;
pub mod role;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		backend::Backend,
		client::{ClientConnector, ConnectFuture, ServiceTokenApi, ServiceTokenFuture},
		config::EngineConfig,
		credential::{AccountId, ServiceToken, TokenId, TokenSecret},
		error::{ConfigError, RemoteError},
		store::{MemoryStore, Storage},
	};
	#[cfg(feature = "reqwest")]
	use crate::{client::cloudflare::CloudflareConnector, http::ReqwestHttpClient};

	/// Backend type alias used by fake-connector tests.
	pub type FakeBackend = Backend<FakeConnector>;
	#[cfg(feature = "reqwest")]
	/// Backend type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBackend = Backend<CloudflareConnector>;

	/// A token minted by [`FakeServiceTokenApi`].
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub struct FakeToken {
		/// Account the token was minted under.
		pub account_id: String,
		/// Display name requested by the engine.
		pub name: String,
		/// Number of successful refresh calls.
		pub refreshes: usize,
		/// Whether the token was deleted.
		pub revoked: bool,
	}

	/// In-process stand-in for the remote account-management API.
	///
	/// Tokens are numbered sequentially. Refreshing or deleting an unknown or deleted token
	/// answers with a 404 API error, mirroring the remote service.
	#[derive(Debug, Default)]
	pub struct FakeServiceTokenApi {
		tokens: Mutex<BTreeMap<String, FakeToken>>,
		calls: AtomicUsize,
		sequence: AtomicUsize,
		fail_with_status: Mutex<Option<u16>>,
	}
	impl FakeServiceTokenApi {
		/// Returns the number of remote calls observed so far.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		/// Returns a snapshot of the minted token with the provided identifier.
		pub fn token(&self, id: &str) -> Option<FakeToken> {
			self.tokens.lock().get(id).cloned()
		}

		/// Makes every following call fail with an API error carrying `status`.
		pub fn fail_with_status(&self, status: u16) {
			*self.fail_with_status.lock() = Some(status);
		}

		/// Clears a failure installed by [`FakeServiceTokenApi::fail_with_status`].
		pub fn recover(&self) {
			*self.fail_with_status.lock() = None;
		}

		fn observe(&self) -> Result<(), RemoteError> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			match *self.fail_with_status.lock() {
				Some(status) => Err(RemoteError::Api {
					status,
					messages: vec!["Injected failure.".into()],
					retry_after: None,
				}),
				None => Ok(()),
			}
		}

		fn with_live_token(
			&self,
			account: &AccountId,
			token: &TokenId,
			f: impl FnOnce(&mut FakeToken),
		) -> Result<(), RemoteError> {
			self.observe()?;

			let mut tokens = self.tokens.lock();

			match tokens.get_mut(token.as_ref()) {
				Some(entry) if !entry.revoked && entry.account_id == account.as_ref() => {
					f(entry);

					Ok(())
				},
				_ => Err(RemoteError::Api {
					status: 404,
					messages: vec![format!("Service token {token} does not exist.")],
					retry_after: None,
				}),
			}
		}
	}

	/// Client handle produced by [`FakeConnector`].
	#[derive(Debug)]
	pub struct FakeClient {
		/// API token the client was built with.
		pub api_token: TokenSecret,
		api: Arc<FakeServiceTokenApi>,
	}
	impl ServiceTokenApi for FakeClient {
		fn create_service_token<'a>(
			&'a self,
			account: &'a AccountId,
			name: &'a str,
		) -> ServiceTokenFuture<'a, ServiceToken> {
			Box::pin(async move {
				self.api.observe()?;

				let n = self.api.sequence.fetch_add(1, Ordering::SeqCst) + 1;
				let id = format!("token-{n}");

				self.api.tokens.lock().insert(id.clone(), FakeToken {
					account_id: account.to_string(),
					name: name.to_owned(),
					refreshes: 0,
					revoked: false,
				});

				Ok(ServiceToken {
					token_id: TokenId::new(&id).map_err(RemoteError::malformed)?,
					token_name: name.to_owned(),
					client_id: format!("client-{n}.access"),
					client_secret: TokenSecret::new(format!("secret-{n}")),
				})
			})
		}

		fn refresh_service_token<'a>(
			&'a self,
			account: &'a AccountId,
			token: &'a TokenId,
		) -> ServiceTokenFuture<'a, ()> {
			Box::pin(async move {
				self.api.with_live_token(account, token, |entry| entry.refreshes += 1)
			})
		}

		fn delete_service_token<'a>(
			&'a self,
			account: &'a AccountId,
			token: &'a TokenId,
		) -> ServiceTokenFuture<'a, ()> {
			Box::pin(
				async move { self.api.with_live_token(account, token, |entry| entry.revoked = true) },
			)
		}
	}

	/// Connector that hands out [`FakeClient`] handles and counts how often it was asked to.
	#[derive(Debug, Default)]
	pub struct FakeConnector {
		/// Shared fake remote API.
		pub api: Arc<FakeServiceTokenApi>,
		connects: AtomicUsize,
	}
	impl FakeConnector {
		/// Returns how many clients were built successfully.
		pub fn connects(&self) -> usize {
			self.connects.load(Ordering::SeqCst)
		}
	}
	impl ClientConnector for FakeConnector {
		type Client = FakeClient;

		fn connect<'a>(&'a self, config: &'a EngineConfig) -> ConnectFuture<'a, Self::Client> {
			Box::pin(async move {
				if config.api_token.expose().is_empty() {
					return Err(ConfigError::MissingApiToken.into());
				}

				self.connects.fetch_add(1, Ordering::SeqCst);

				Ok(FakeClient { api_token: config.api_token.clone(), api: self.api.clone() })
			})
		}
	}

	/// Constructs a [`FakeBackend`] over an in-memory store.
	pub fn build_fake_backend() -> (FakeBackend, Arc<MemoryStore>, Arc<FakeConnector>) {
		let store_backend = Arc::new(MemoryStore::default());
		let storage: Arc<dyn Storage> = store_backend.clone();
		let connector = Arc::new(FakeConnector::default());
		let backend = Backend::new(storage, connector.clone());

		(backend, store_backend, connector)
	}

	#[cfg(feature = "reqwest")]
	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	#[cfg(feature = "reqwest")]
	/// Constructs a [`Backend`] whose Cloudflare connector targets `base_url`, backed by an
	/// in-memory store.
	pub fn build_reqwest_test_backend(base_url: &str) -> (ReqwestTestBackend, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let storage: Arc<dyn Storage> = store_backend.clone();
		let base_url = Url::parse(base_url).expect("Mock API base URL should parse.");
		let connector = CloudflareConnector::with_base_url(base_url)
			.expect("Mock API base URL should be accepted by the connector.")
			.with_http_client(test_reqwest_http_client());
		let backend = Backend::new(storage, connector);

		(backend, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::RwLock as AsyncRwLock;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
