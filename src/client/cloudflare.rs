//! Reqwest-backed client for the Cloudflare v4 Access service token API.

// crates.io
use reqwest::{
	RequestBuilder,
	header::{ACCEPT, CONTENT_TYPE},
	redirect::Policy,
};
use serde::de::{DeserializeOwned, IgnoredAny};
// self
use crate::{
	_prelude::*,
	client::{ClientConnector, ConnectFuture, ServiceTokenApi, ServiceTokenFuture},
	config::EngineConfig,
	credential::{AccountId, ServiceToken, TokenId, TokenSecret},
	error::{ConfigError, RemoteError},
	http::{ReqwestHttpClient, ResponseMetadata},
};

/// Public Cloudflare v4 API root.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4/";

/// Builds [`CloudflareClient`] handles from the stored configuration.
#[derive(Clone, Debug)]
pub struct CloudflareConnector {
	http: ReqwestHttpClient,
	base_url: Url,
	verify: bool,
}
impl CloudflareConnector {
	/// Creates a connector targeting the public Cloudflare API.
	pub fn new() -> Result<Self> {
		let base_url = Url::parse(DEFAULT_API_BASE)
			.map_err(|_| ConfigError::InvalidBaseUrl { url: DEFAULT_API_BASE.into() })?;

		Self::with_base_url(base_url)
	}

	/// Creates a connector targeting `base_url`, which must be able to carry path segments.
	///
	/// The default HTTP client does not follow redirects.
	pub fn with_base_url(base_url: Url) -> Result<Self> {
		if base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidBaseUrl { url: base_url.into() }.into());
		}

		let client =
			ReqwestClient::builder().redirect(Policy::none()).build().map_err(ConfigError::from)?;

		Ok(Self { http: ReqwestHttpClient::with_client(client), base_url, verify: false })
	}

	/// Replaces the HTTP client shared by every connected client.
	pub fn with_http_client(mut self, http: ReqwestHttpClient) -> Self {
		self.http = http;

		self
	}

	/// Verifies the API token against `user/tokens/verify` before caching a client.
	pub fn verify_on_connect(mut self, verify: bool) -> Self {
		self.verify = verify;

		self
	}

	/// Returns the API root the connector targets.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}
}
impl ClientConnector for CloudflareConnector {
	type Client = CloudflareClient;

	fn connect<'a>(&'a self, config: &'a EngineConfig) -> ConnectFuture<'a, Self::Client> {
		Box::pin(async move {
			if config.api_token.is_empty() {
				return Err(ConfigError::MissingApiToken.into());
			}

			let client = CloudflareClient {
				http: self.http.clone(),
				base_url: self.base_url.clone(),
				api_token: config.api_token.clone(),
			};

			if self.verify {
				client.verify_api_token().await.map_err(verification_error)?;
			}

			Ok(client)
		})
	}
}

// Only 401 and 403 answers reject the token.
fn verification_error(source: RemoteError) -> ConfigError {
	match source {
		RemoteError::Api { status: 401 | 403, .. } => ConfigError::ApiTokenRejected { source },
		other => ConfigError::ApiTokenVerification { source: other },
	}
}

/// Authenticated handle for one API token.
#[derive(Clone, Debug)]
pub struct CloudflareClient {
	http: ReqwestHttpClient,
	base_url: Url,
	api_token: TokenSecret,
}
impl CloudflareClient {
	/// Checks that the API token is active.
	pub async fn verify_api_token(&self) -> Result<(), RemoteError> {
		let url = self.endpoint(&["user", "tokens", "verify"]);

		self.send::<IgnoredAny>(self.http.get(url)).await.map(drop)
	}

	fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.base_url.clone();

		// Base URLs are checked by the connector, so this always succeeds.
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}

	fn service_tokens(&self, account: &AccountId, rest: &[&str]) -> Url {
		let mut segments = vec!["accounts", account.as_ref(), "access", "service_tokens"];

		segments.extend_from_slice(rest);

		self.endpoint(&segments)
	}

	async fn send<T>(&self, request: RequestBuilder) -> Result<(u16, Option<T>), RemoteError>
	where
		T: DeserializeOwned,
	{
		let response = request
			.bearer_auth(self.api_token.expose())
			.header(ACCEPT, "application/json")
			.send()
			.await?;
		let meta = ResponseMetadata::from_response(&response);
		let body = response.bytes().await?;

		if !meta.is_success() {
			let messages = serde_json::from_slice::<ApiEnvelope<IgnoredAny>>(&body)
				.map(|envelope| envelope.messages())
				.unwrap_or_default();

			return Err(RemoteError::Api {
				status: meta.status,
				messages,
				retry_after: meta.retry_after,
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let envelope: ApiEnvelope<T> = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| RemoteError::Decode { source, status: meta.status })?;

		if !envelope.success {
			return Err(RemoteError::Api {
				status: meta.status,
				messages: envelope.messages(),
				retry_after: meta.retry_after,
			});
		}

		Ok((meta.status, envelope.result))
	}
}
impl ServiceTokenApi for CloudflareClient {
	fn create_service_token<'a>(
		&'a self,
		account: &'a AccountId,
		name: &'a str,
	) -> ServiceTokenFuture<'a, ServiceToken> {
		Box::pin(async move {
			let url = self.service_tokens(account, &[]);
			let body = serde_json::json!({ "name": name }).to_string();
			let request = self.http.post(url).header(CONTENT_TYPE, "application/json").body(body);
			let (status, created) = self.send::<CreatedServiceToken>(request).await?;
			let created = created.ok_or(RemoteError::MissingResult { status })?;

			Ok(ServiceToken {
				token_id: TokenId::new(&created.id).map_err(RemoteError::malformed)?,
				token_name: created.name,
				client_id: created.client_id,
				client_secret: TokenSecret::new(created.client_secret),
			})
		})
	}

	fn refresh_service_token<'a>(
		&'a self,
		account: &'a AccountId,
		token: &'a TokenId,
	) -> ServiceTokenFuture<'a, ()> {
		Box::pin(async move {
			let url = self.service_tokens(account, &[token.as_ref(), "refresh"]);

			self.send::<IgnoredAny>(self.http.post(url)).await.map(drop)
		})
	}

	fn delete_service_token<'a>(
		&'a self,
		account: &'a AccountId,
		token: &'a TokenId,
	) -> ServiceTokenFuture<'a, ()> {
		Box::pin(async move {
			let url = self.service_tokens(account, &[token.as_ref()]);

			self.send::<IgnoredAny>(self.http.delete(url)).await.map(drop)
		})
	}
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiEnvelope<T> {
	#[serde(default)]
	success: bool,
	#[serde(default)]
	errors: Vec<ApiMessage>,
	#[serde(default)]
	result: Option<T>,
}
impl<T> ApiEnvelope<T> {
	fn messages(&self) -> Vec<String> {
		self.errors.iter().map(|e| format!("{} (code {})", e.message, e.code)).collect()
	}
}

#[derive(Deserialize)]
struct ApiMessage {
	#[serde(default)]
	code: i64,
	#[serde(default)]
	message: String,
}

#[derive(Deserialize)]
struct CreatedServiceToken {
	id: String,
	name: String,
	client_id: String,
	client_secret: String,
}
