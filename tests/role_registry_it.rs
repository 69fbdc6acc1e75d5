// self
use cloudflare_secrets_engine::{
	_preludet::*,
	backend::WriteOperation,
	error::ValidationError,
	role::{CredentialType, RolePatch},
};

fn role_fields(value: JsonValue) -> JsonMap<String, JsonValue> {
	match value {
		JsonValue::Object(map) => map,
		other => panic!("Role fixture must be an object, got {other}."),
	}
}

#[tokio::test]
async fn role_write_validates_credential_type_and_account() {
	let (backend, _, _) = build_fake_backend();
	let err = backend
		.handle_role_write(
			"ops",
			role_fields(serde_json::json!({ "credential_type": "api_token", "account_id": "acc-1" })),
			WriteOperation::Create,
		)
		.await
		.expect_err("Only service roles are supported.");

	assert!(matches!(err, Error::Validation(ValidationError::InvalidCredentialType { .. })));

	let err = backend
		.handle_role_write(
			"ops",
			role_fields(serde_json::json!({ "credential_type": "service" })),
			WriteOperation::Create,
		)
		.await
		.expect_err("Service roles need an account.");

	assert!(matches!(err, Error::Validation(ValidationError::MissingField { .. })));
	assert!(!backend.role_exists("ops").await.expect("Existence check should succeed."));

	let err = backend.read_role("").await.expect_err("Empty role names are invalid.");

	assert!(matches!(err, Error::Validation(ValidationError::Identifier(_))));
}

#[tokio::test]
async fn role_update_keeps_omitted_fields() {
	let (backend, _, _) = build_fake_backend();

	backend
		.handle_role_write(
			"Ops",
			role_fields(serde_json::json!({
				"credential_type": "service",
				"account_id": "acc-1",
				"ttl": 600
			})),
			WriteOperation::Create,
		)
		.await
		.expect("Role create should succeed.");
	backend
		.write_role("ops", RolePatch::default().account_id("acc-2"), WriteOperation::Update)
		.await
		.expect("Role update should succeed.");

	let role = backend
		.handle_role_read("OPS")
		.await
		.expect("Role read should succeed.")
		.expect("Role should exist after update.");

	assert_eq!(role.credential_type, CredentialType::Service);
	assert_eq!(role.account_id, "acc-2");
	assert_eq!(role.ttl, 600);
	assert_eq!(role.max_ttl, 0);
}

#[tokio::test]
async fn role_list_returns_every_role_once() {
	let (backend, _, _) = build_fake_backend();

	for i in 0..10 {
		backend
			.write_role(
				&format!("role-{i}"),
				RolePatch::default().credential_type("service").account_id(format!("acc-{i}")),
				WriteOperation::Create,
			)
			.await
			.expect("Role create should succeed.");
	}

	let mut listed = backend.handle_role_list().await.expect("Role listing should succeed.").keys;

	listed.sort();

	let mut expected = (0..10).map(|i| format!("role-{i}")).collect::<Vec<_>>();

	expected.sort();

	assert_eq!(listed, expected);
}

#[tokio::test]
async fn role_delete_is_idempotent() {
	let (backend, store, _) = build_fake_backend();

	backend
		.write_role(
			"ops",
			RolePatch::default().credential_type("service").account_id("acc-1"),
			WriteOperation::Create,
		)
		.await
		.expect("Role create should succeed.");
	backend.handle_role_delete("ops").await.expect("Role delete should succeed.");
	backend.handle_role_delete("ops").await.expect("Deleting a missing role should succeed.");

	assert!(backend.handle_role_read("ops").await.expect("Role read should succeed.").is_none());
	assert!(store.is_empty());
}
