// self
use cloudflare_secrets_engine::{
	_preludet::*,
	backend::WriteOperation,
	config::ConfigPatch,
	error::{InternalDataError, RemoteError, RemoteOperation},
	lease::SERVICE_TOKEN_SECRET_TYPE,
	role::RolePatch,
};

async fn configured_backend() -> (FakeBackend, Arc<FakeConnector>) {
	let (backend, _, connector) = build_fake_backend();

	backend
		.write_config(ConfigPatch::default().api_token("cf-token"), WriteOperation::Create)
		.await
		.expect("Configuration create should succeed.");
	backend
		.write_role(
			"ops",
			RolePatch::default()
				.credential_type("service")
				.account_id("acc-1")
				.ttl(Duration::hours(1))
				.max_ttl(Duration::hours(24)),
			WriteOperation::Create,
		)
		.await
		.expect("Role create should succeed.");

	(backend, connector)
}

#[tokio::test]
async fn issue_returns_unique_tokens_with_internal_data() {
	let (backend, connector) = configured_backend().await;
	let first = backend.handle_token_issue("ops").await.expect("First issue should succeed.");
	let second = backend.handle_token_issue("OPS").await.expect("Second issue should succeed.");

	assert_ne!(first.data.token_name, second.data.token_name);
	assert_ne!(first.data.token_id, second.data.token_id);
	assert_ne!(first.data.client_secret.expose(), second.data.client_secret.expose());
	assert_eq!(
		first.caller_data().get("client_secret"),
		Some(&JsonValue::from(first.data.client_secret.expose()))
	);
	assert!(first.data.token_name.starts_with("vault-account-"));
	assert_eq!(first.secret_type, SERVICE_TOKEN_SECRET_TYPE);
	assert_eq!(first.lease.ttl, Some(Duration::hours(1)));
	assert_eq!(first.lease.max_ttl, Some(Duration::hours(24)));

	let internal = first.internal_data().expect("Issued envelopes carry internal data.");

	assert_eq!(internal.role.as_ref(), "ops");
	assert_eq!(internal.token_id, first.data.token_id);

	let minted = connector
		.api
		.token(first.data.token_id.as_ref())
		.expect("The fake API should have minted the token.");

	assert_eq!(minted.account_id, "acc-1");
	assert_eq!(minted.name, first.data.token_name);
	assert_eq!(backend.metrics.issued(), 2);
}

#[tokio::test]
async fn issue_for_unknown_role_fails_before_remote_calls() {
	let (backend, connector) = configured_backend().await;
	let err = backend.issue_service_token("missing").await.expect_err("Unknown roles must fail.");

	assert!(matches!(err, Error::RoleNotFound { ref role } if role == "missing"));
	assert_eq!(connector.api.calls(), 0);
	assert_eq!(backend.metrics.failures(), 1);
}

#[tokio::test]
async fn renew_refreshes_and_returns_the_envelope_unchanged() {
	let (backend, connector) = configured_backend().await;
	let envelope = backend.issue_service_token("ops").await.expect("Issue should succeed.");
	let renewed =
		backend.handle_token_renew(envelope.clone()).await.expect("Renew should succeed.");

	assert_eq!(renewed, envelope);
	assert_eq!(
		connector.api.token(envelope.data.token_id.as_ref()).map(|token| token.refreshes),
		Some(1)
	);
	assert_eq!(backend.metrics.renewed(), 1);
}

#[tokio::test]
async fn revoke_deletes_the_remote_token() {
	let (backend, connector) = configured_backend().await;
	let envelope = backend.issue_service_token("ops").await.expect("Issue should succeed.");

	backend.handle_token_revoke(&envelope).await.expect("Revoke should succeed.");

	assert_eq!(
		connector.api.token(envelope.data.token_id.as_ref()).map(|token| token.revoked),
		Some(true)
	);

	let err = backend.revoke(&envelope).await.expect_err("A deleted token cannot be revoked twice.");

	match err {
		Error::Remote { operation, ref token_id, source: RemoteError::Api { status, .. }, .. } => {
			assert_eq!(operation, RemoteOperation::DeleteServiceToken);
			assert_eq!(token_id.as_deref(), Some(envelope.data.token_id.as_ref()));
			assert_eq!(status, 404);
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(backend.metrics.revoked(), 1);
	assert_eq!(backend.metrics.failures(), 1);
}

#[tokio::test]
async fn malformed_internal_data_fails_without_io() {
	let (seeded, _) = configured_backend().await;
	let mut envelope = seeded.issue_service_token("ops").await.expect("Issue should succeed.");
	let (backend, _, connector) = build_fake_backend();

	envelope.internal.remove("token_id");

	let err = backend.revoke(&envelope).await.expect_err("Revoke needs a token_id.");

	assert!(matches!(
		err,
		Error::InternalData(InternalDataError::MissingField { field: "token_id" })
	));
	assert_eq!(connector.api.calls(), 0);
	assert_eq!(connector.connects(), 0);

	envelope.internal.clear();

	let err = backend.renew(envelope).await.expect_err("Renew needs a role.");

	assert!(matches!(err, Error::InternalData(InternalDataError::MissingField { field: "role" })));
	assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn lifecycle_requires_the_role_to_still_exist() {
	let (backend, connector) = configured_backend().await;
	let envelope = backend.issue_service_token("ops").await.expect("Issue should succeed.");
	let calls = connector.api.calls();

	backend.delete_role("ops").await.expect("Role delete should succeed.");

	let err = backend.renew(envelope.clone()).await.expect_err("Renew needs the role.");

	assert!(matches!(err, Error::RoleNotFound { .. }));

	let err = backend.revoke(&envelope).await.expect_err("Revoke needs the role.");

	assert!(matches!(err, Error::RoleNotFound { .. }));
	assert_eq!(connector.api.calls(), calls);
}

#[tokio::test]
async fn remote_failures_carry_operation_context() {
	let (backend, connector) = configured_backend().await;

	connector.api.fail_with_status(503);

	let err = backend.issue_service_token("ops").await.expect_err("Injected failures propagate.");

	match err {
		Error::Remote { operation, ref account_id, token_id: None, ref source } => {
			assert_eq!(operation, RemoteOperation::CreateServiceToken);
			assert_eq!(account_id, "acc-1");
			assert_eq!(source.status(), Some(503));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	connector.api.recover();
	backend.issue_service_token("ops").await.expect("Issue should succeed after recovery.");
}

#[tokio::test]
async fn token_name_prefix_is_configurable() {
	let (backend, _, _) = build_fake_backend();
	let backend = backend.with_token_name_prefix("ci");

	backend
		.write_config(ConfigPatch::default().api_token("cf-token"), WriteOperation::Create)
		.await
		.expect("Configuration create should succeed.");
	backend
		.write_role(
			"ops",
			RolePatch::default().credential_type("service").account_id("acc-1"),
			WriteOperation::Create,
		)
		.await
		.expect("Role create should succeed.");

	let envelope = backend.issue_service_token("ops").await.expect("Issue should succeed.");

	assert!(envelope.data.token_name.starts_with("ci-"));
	assert_eq!(envelope.lease.ttl, None);
}
