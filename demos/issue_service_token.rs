//! Issues, renews, and revokes a service token against a mocked Cloudflare API using the
//! reqwest connector and the in-memory store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use cloudflare_secrets_engine::{
	backend::{CloudflareBackend, WriteOperation},
	client::cloudflare::CloudflareConnector,
	config::ConfigPatch,
	role::RolePatch,
	store::{MemoryStore, Storage},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let tokens_path = "/client/v4/accounts/demo-account/access/service_tokens";
	let create_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(tokens_path);
			then.status(200).header("content-type", "application/json").body(
				"{\"success\":true,\"errors\":[],\"result\":{\"id\":\"demo-token\",\"name\":\"vault-account-demo\",\"client_id\":\"demo.access\",\"client_secret\":\"demo-secret\"}}",
			);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("{tokens_path}/demo-token/refresh"));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true,\"errors\":[],\"result\":{}}");
		})
		.await;
	let delete_mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path(format!("{tokens_path}/demo-token"));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true,\"errors\":[],\"result\":{}}");
		})
		.await;
	let storage: Arc<dyn Storage> = Arc::new(MemoryStore::default());
	let connector = CloudflareConnector::with_base_url(Url::parse(&server.url("/client/v4/"))?)?;
	let backend = CloudflareBackend::new(storage, connector);

	backend
		.write_config(ConfigPatch::default().api_token("demo-api-token"), WriteOperation::Create)
		.await?;
	backend
		.write_role(
			"deploy",
			RolePatch::default().credential_type("service").account_id("demo-account"),
			WriteOperation::Create,
		)
		.await?;

	let envelope = backend.issue_service_token("deploy").await?;

	println!("Issued {} for client {}.", envelope.data.token_id, envelope.data.client_id);

	let envelope = backend.renew(envelope).await?;

	backend.revoke(&envelope).await?;

	println!("Lease lifecycle finished; issued {} token(s).", backend.metrics.issued());

	create_mock.assert_async().await;
	refresh_mock.assert_async().await;
	delete_mock.assert_async().await;

	Ok(())
}
