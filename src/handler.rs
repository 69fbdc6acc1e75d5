//! Host-facing operations over decoded request field maps.
//!
//! The host owns path routing and its field schema; each `handle_*` method receives the
//! already-routed field map, decodes it into a typed request with [`serde_path_to_error`] so
//! mistyped fields are reported with their path, and delegates to the component operation.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	backend::{Backend, WriteOperation},
	client::ClientConnector,
	config::{ConfigPatch, MaskedConfig},
	error::ValidationError,
	lease::SecretEnvelope,
	role::{CredentialType, Role, RolePatch},
};

/// Field map handed over by the host router.
pub type Fields = JsonMap<String, JsonValue>;

fn decode_fields<T>(fields: Fields) -> Result<T, ValidationError>
where
	T: DeserializeOwned,
{
	Ok(serde_path_to_error::deserialize(JsonValue::Object(fields))?)
}

/// Configuration write request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigWriteRequest {
	/// Replacement API token.
	#[serde(default)]
	pub api_token: Option<String>,
}
impl ConfigWriteRequest {
	/// Decodes a host field map; unknown or mistyped fields fail validation.
	pub fn from_fields(fields: Fields) -> Result<Self, ValidationError> {
		decode_fields(fields)
	}
}
impl From<ConfigWriteRequest> for ConfigPatch {
	fn from(request: ConfigWriteRequest) -> Self {
		Self { api_token: request.api_token }
	}
}

/// Role write request; durations are whole seconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleWriteRequest {
	/// Credential type; only `"service"` is accepted.
	#[serde(default)]
	pub credential_type: Option<String>,
	/// Target account identifier.
	#[serde(default)]
	pub account_id: Option<String>,
	/// Lease duration in seconds; `0` clears the override.
	#[serde(default)]
	pub ttl: Option<i64>,
	/// Maximum lease duration in seconds; `0` clears the override.
	#[serde(default)]
	pub max_ttl: Option<i64>,
}
impl RoleWriteRequest {
	/// Decodes a host field map; unknown or mistyped fields fail validation.
	pub fn from_fields(fields: Fields) -> Result<Self, ValidationError> {
		decode_fields(fields)
	}
}
impl From<RoleWriteRequest> for RolePatch {
	fn from(request: RoleWriteRequest) -> Self {
		Self {
			credential_type: request.credential_type,
			account_id: request.account_id,
			ttl: request.ttl.map(Duration::seconds),
			max_ttl: request.max_ttl.map(Duration::seconds),
		}
	}
}

/// Role as returned to operators; durations are whole seconds, `0` when unset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleReadResponse {
	/// Credential type issued for the role.
	pub credential_type: CredentialType,
	/// Account issued tokens are scoped to.
	pub account_id: String,
	/// Lease duration.
	pub ttl: i64,
	/// Maximum lease duration.
	pub max_ttl: i64,
}
impl From<Role> for RoleReadResponse {
	fn from(role: Role) -> Self {
		Self {
			credential_type: role.credential_type,
			account_id: role.account_id.into(),
			ttl: role.ttl.map_or(0, |ttl| ttl.whole_seconds()),
			max_ttl: role.max_ttl.map_or(0, |max_ttl| max_ttl.whole_seconds()),
		}
	}
}

/// Role listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleListResponse {
	/// Role names in storage order.
	pub keys: Vec<String>,
}

impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Reads the configuration with its API token masked.
	pub async fn handle_config_read(&self) -> Result<Option<MaskedConfig>> {
		self.read_config_masked().await
	}

	/// Creates or updates the configuration from a host field map.
	pub async fn handle_config_write(&self, fields: Fields, op: WriteOperation) -> Result<()> {
		let request = ConfigWriteRequest::from_fields(fields)?;

		self.write_config(request.into(), op).await
	}

	/// Deletes the configuration.
	pub async fn handle_config_delete(&self) -> Result<()> {
		self.delete_config().await
	}

	/// Reads a role.
	pub async fn handle_role_read(&self, name: &str) -> Result<Option<RoleReadResponse>> {
		Ok(self.read_role(name).await?.map(RoleReadResponse::from))
	}

	/// Creates or updates a role from a host field map.
	pub async fn handle_role_write(
		&self,
		name: &str,
		fields: Fields,
		op: WriteOperation,
	) -> Result<RoleReadResponse> {
		let request = RoleWriteRequest::from_fields(fields)?;

		Ok(self.write_role(name, request.into(), op).await?.into())
	}

	/// Deletes a role.
	pub async fn handle_role_delete(&self, name: &str) -> Result<()> {
		self.delete_role(name).await
	}

	/// Lists roles.
	pub async fn handle_role_list(&self) -> Result<RoleListResponse> {
		Ok(RoleListResponse { keys: self.list_roles().await? })
	}

	/// Issues a service token for `role_name`.
	pub async fn handle_token_issue(&self, role_name: &str) -> Result<SecretEnvelope> {
		self.issue_service_token(role_name).await
	}

	/// Lease scheduler callback: renews the lease behind `envelope`.
	pub async fn handle_token_renew(&self, envelope: SecretEnvelope) -> Result<SecretEnvelope> {
		self.renew(envelope).await
	}

	/// Lease scheduler callback: revokes the lease behind `envelope`.
	pub async fn handle_token_revoke(&self, envelope: &SecretEnvelope) -> Result<()> {
		self.revoke(envelope).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fields(value: JsonValue) -> Fields {
		match value {
			JsonValue::Object(map) => map,
			other => panic!("Fixture must be an object, got {other}."),
		}
	}

	#[test]
	fn role_request_reports_mistyped_field_path() {
		let err = RoleWriteRequest::from_fields(fields(serde_json::json!({ "ttl": "soon" })))
			.expect_err("A string ttl must be rejected.");

		match err {
			ValidationError::Fields(e) => assert_eq!(e.path().to_string(), "ttl"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let err = ConfigWriteRequest::from_fields(fields(serde_json::json!({ "token": "abc" })))
			.expect_err("Unknown fields must be rejected.");

		assert!(matches!(err, ValidationError::Fields(_)));
	}

	#[test]
	fn role_request_converts_seconds() {
		let request = RoleWriteRequest::from_fields(fields(serde_json::json!({
			"credential_type": "service",
			"account_id": "acc-1",
			"ttl": 3600
		})))
		.expect("Valid fields should decode.");
		let patch = RolePatch::from(request);

		assert_eq!(patch.ttl, Some(Duration::hours(1)));
		assert_eq!(patch.max_ttl, None);
	}
}
