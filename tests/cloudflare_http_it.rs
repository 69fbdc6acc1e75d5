// crates.io
use httpmock::prelude::*;
// self
use cloudflare_secrets_engine::{
	_preludet::*,
	backend::WriteOperation,
	client::cloudflare::CloudflareConnector,
	config::ConfigPatch,
	error::{ConfigError, RemoteError, RemoteOperation},
	role::RolePatch,
	store::{MemoryStore, Storage},
};

const API_TOKEN: &str = "cf-api-token";
const ACCOUNT: &str = "acc-1";
const TOKENS_PATH: &str = "/client/v4/accounts/acc-1/access/service_tokens";

async fn configured_backend(server: &MockServer) -> ReqwestTestBackend {
	let (backend, _) = build_reqwest_test_backend(&server.url("/client/v4/"));

	configure(&backend).await;

	backend
}

async fn configure(backend: &ReqwestTestBackend) {
	backend
		.write_config(ConfigPatch::default().api_token(API_TOKEN), WriteOperation::Create)
		.await
		.expect("Configuration create should succeed.");
	backend
		.write_role(
			"ops",
			RolePatch::default().credential_type("service").account_id(ACCOUNT),
			WriteOperation::Create,
		)
		.await
		.expect("Role create should succeed.");
}

#[tokio::test]
async fn issue_renew_revoke_round_trip() {
	let server = MockServer::start_async().await;
	let backend = configured_backend(&server).await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKENS_PATH)
				.header("authorization", "Bearer cf-api-token")
				.header("content-type", "application/json");
			then.status(201).header("content-type", "application/json").body(
				"{\"success\":true,\"errors\":[],\"messages\":[],\"result\":{\"id\":\"f174e90a\",\"name\":\"vault-account-1\",\"client_id\":\"88bf3b6d.access\",\"client_secret\":\"bdd31cbc4dec990953e39163fbbb194c\",\"created_at\":\"2024-01-01T00:00:00Z\"}}",
			);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("{TOKENS_PATH}/f174e90a/refresh"));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true,\"errors\":[],\"result\":{\"id\":\"f174e90a\"}}");
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path(format!("{TOKENS_PATH}/f174e90a"));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true,\"errors\":[],\"result\":{\"id\":\"f174e90a\"}}");
		})
		.await;
	let envelope = backend.issue_service_token("ops").await.expect("Issue should succeed.");

	assert_eq!(envelope.data.token_id.as_ref(), "f174e90a");
	assert_eq!(envelope.data.client_id, "88bf3b6d.access");
	assert_eq!(envelope.data.client_secret.expose(), "bdd31cbc4dec990953e39163fbbb194c");

	let renewed = backend.renew(envelope.clone()).await.expect("Renew should succeed.");

	assert_eq!(renewed, envelope);

	backend.revoke(&envelope).await.expect("Revoke should succeed.");

	create.assert_async().await;
	refresh.assert_async().await;
	delete.assert_async().await;
}

#[tokio::test]
async fn api_errors_keep_status_messages_and_retry_hint() {
	let server = MockServer::start_async().await;
	let backend = configured_backend(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKENS_PATH);
			then.status(429).header("content-type", "application/json").header("retry-after", "30").body(
				"{\"success\":false,\"errors\":[{\"code\":10429,\"message\":\"Rate limited\"}],\"result\":null}",
			);
		})
		.await;
	let err = backend.issue_service_token("ops").await.expect_err("Rate limits should surface.");

	match err {
		Error::Remote {
			operation: RemoteOperation::CreateServiceToken,
			source: RemoteError::Api { status, messages, retry_after },
			..
		} => {
			assert_eq!(status, 429);
			assert_eq!(messages, vec!["Rate limited (code 10429)".to_owned()]);
			assert_eq!(retry_after, Some(Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	mock.assert_async().await;
}

#[tokio::test]
async fn unsuccessful_envelopes_are_errors_even_with_ok_status() {
	let server = MockServer::start_async().await;
	let backend = configured_backend(&server).await;
	let envelope = {
		let create = server
			.mock_async(|when, then| {
				when.method(POST).path(TOKENS_PATH);
				then.status(200).header("content-type", "application/json").body(
					"{\"success\":true,\"errors\":[],\"result\":{\"id\":\"tok-2\",\"name\":\"n\",\"client_id\":\"c\",\"client_secret\":\"s\"}}",
				);
			})
			.await;
		let envelope = backend.issue_service_token("ops").await.expect("Issue should succeed.");

		create.assert_async().await;

		envelope
	};
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("{TOKENS_PATH}/tok-2/refresh"));
			then.status(200).header("content-type", "application/json").body(
				"{\"success\":false,\"errors\":[{\"code\":1000,\"message\":\"Token expired\"}],\"result\":null}",
			);
		})
		.await;
	let err = backend.renew(envelope).await.expect_err("Unsuccessful envelopes should fail.");

	match err {
		Error::Remote { operation, token_id, source, .. } => {
			assert_eq!(operation, RemoteOperation::RefreshServiceToken);
			assert_eq!(token_id.as_deref(), Some("tok-2"));
			assert_eq!(source.status(), Some(200));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	refresh.assert_async().await;
}

#[tokio::test]
async fn malformed_create_payload_reports_decode_error() {
	let server = MockServer::start_async().await;
	let backend = configured_backend(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKENS_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true,\"errors\":[],\"result\":{\"id\":\"tok-3\"}}");
		})
		.await;
	let err = backend.issue_service_token("ops").await.expect_err("Incomplete payloads must fail.");

	assert!(matches!(err, Error::Remote { source: RemoteError::Decode { status: 200, .. }, .. }));

	mock.assert_async().await;
}

#[tokio::test]
async fn verify_on_connect_rejects_inactive_tokens() {
	let server = MockServer::start_async().await;
	let base_url = Url::parse(&server.url("/client/v4/")).expect("Mock API base URL should parse.");
	let connector = CloudflareConnector::with_base_url(base_url)
		.expect("Mock API base URL should be accepted.")
		.with_http_client(test_reqwest_http_client())
		.verify_on_connect(true);
	let storage: Arc<dyn Storage> = Arc::new(MemoryStore::default());
	let backend = ReqwestTestBackend::new(storage, connector);
	let verify = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/client/v4/user/tokens/verify")
				.header("authorization", "Bearer cf-api-token");
			then.status(401).header("content-type", "application/json").body(
				"{\"success\":false,\"errors\":[{\"code\":1000,\"message\":\"Invalid API Token\"}],\"result\":null}",
			);
		})
		.await;

	configure(&backend).await;

	let err = backend.client().await.expect_err("Rejected tokens must not produce a client.");

	match err {
		Error::Config(ConfigError::ApiTokenRejected { source }) => {
			assert_eq!(source.status(), Some(401));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	verify.assert_async().await;
}

#[tokio::test]
async fn verify_on_connect_separates_outages_from_rejections() {
	let server = MockServer::start_async().await;
	let base_url = Url::parse(&server.url("/client/v4/")).expect("Mock API base URL should parse.");
	let connector = CloudflareConnector::with_base_url(base_url)
		.expect("Mock API base URL should be accepted.")
		.with_http_client(test_reqwest_http_client())
		.verify_on_connect(true);
	let storage: Arc<dyn Storage> = Arc::new(MemoryStore::default());
	let backend = ReqwestTestBackend::new(storage, connector);
	let verify = server
		.mock_async(|when, then| {
			when.method(GET).path("/client/v4/user/tokens/verify");
			then.status(503).header("retry-after", "30").body("upstream unavailable");
		})
		.await;

	configure(&backend).await;

	let err = backend.client().await.expect_err("Unverified tokens must not produce a client.");

	match err {
		Error::Config(ConfigError::ApiTokenVerification { source }) => {
			assert_eq!(source.status(), Some(503));
			assert!(matches!(
				source,
				RemoteError::Api { retry_after: Some(wait), .. } if wait == Duration::seconds(30)
			));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	verify.assert_async().await;
}
