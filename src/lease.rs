//! Secret envelopes handed to the host's lease tracker.
//!
//! An envelope splits a minted [`ServiceToken`] into caller-visible data and server-only
//! internal data. The host stores the whole envelope and passes it back verbatim on renew and
//! revoke; only [`InternalData`] is consulted at that point.

// self
use crate::{
	_prelude::*,
	credential::{IdentifierError, RoleName, ServiceToken, TokenId},
	error::InternalDataError,
	role::Role,
};

/// Secret type label attached to every envelope this engine issues.
pub const SERVICE_TOKEN_SECRET_TYPE: &str = "cloudflare_service_token";

const ROLE_FIELD: &str = "role";
const TOKEN_ID_FIELD: &str = "token_id";

/// Lease bookkeeping: the role that authorized issuance and the remote token handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalData {
	/// Role resolved at issue time.
	pub role: RoleName,
	/// Remote token identifier used for refresh and delete calls.
	pub token_id: TokenId,
}
impl InternalData {
	/// Encodes the bookkeeping fields as a JSON object.
	pub fn to_map(&self) -> JsonMap<String, JsonValue> {
		let mut map = JsonMap::new();

		map.insert(ROLE_FIELD.into(), JsonValue::String(self.role.to_string()));
		map.insert(TOKEN_ID_FIELD.into(), JsonValue::String(self.token_id.to_string()));

		map
	}

	/// Decodes the bookkeeping fields, failing on the first missing or malformed one.
	pub fn from_map(map: &JsonMap<String, JsonValue>) -> Result<Self, InternalDataError> {
		Ok(Self {
			role: field(map, ROLE_FIELD, |raw| RoleName::new(raw))?,
			token_id: field(map, TOKEN_ID_FIELD, |raw| TokenId::new(raw))?,
		})
	}
}

fn field<T, F>(
	map: &JsonMap<String, JsonValue>,
	name: &'static str,
	parse: F,
) -> Result<T, InternalDataError>
where
	F: FnOnce(&str) -> Result<T, IdentifierError>,
{
	let raw = map.get(name).ok_or(InternalDataError::MissingField { field: name })?;
	let raw = raw.as_str().ok_or(InternalDataError::NotAString { field: name })?;

	parse(raw).map_err(|source| InternalDataError::InvalidField { field: name, source })
}

/// Lease hints forwarded to the host scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseOptions {
	/// Requested lease duration; `None` lets the host pick its default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ttl: Option<Duration>,
	/// Upper bound across renewals; `None` lets the host pick its default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_ttl: Option<Duration>,
	/// Whether the host may call renew on this lease.
	pub renewable: bool,
}
impl LeaseOptions {
	/// Lease options derived from a role's lease bounds.
	pub fn for_role(role: &Role) -> Self {
		Self { ttl: role.ttl, max_ttl: role.max_ttl, renewable: true }
	}
}
impl Default for LeaseOptions {
	fn default() -> Self {
		Self { ttl: None, max_ttl: None, renewable: true }
	}
}

/// Issued secret as stored by the host's lease tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecretEnvelope {
	/// Secret type label; always [`SERVICE_TOKEN_SECRET_TYPE`] for envelopes minted here.
	pub secret_type: String,
	/// Caller-visible fields.
	pub data: ServiceToken,
	/// Server-only bookkeeping; never returned to the caller.
	pub internal: JsonMap<String, JsonValue>,
	/// Lease hints.
	pub lease: LeaseOptions,
	/// Issue timestamp.
	pub issued_at: OffsetDateTime,
}
impl SecretEnvelope {
	/// Wraps a freshly minted token issued under `role_name`.
	pub fn issued(token: ServiceToken, role_name: RoleName, lease: LeaseOptions) -> Self {
		let internal = InternalData { role: role_name, token_id: token.token_id.clone() };

		Self {
			secret_type: SERVICE_TOKEN_SECRET_TYPE.into(),
			data: token,
			internal: internal.to_map(),
			lease,
			issued_at: OffsetDateTime::now_utc(),
		}
	}

	/// Parses the bookkeeping fields.
	pub fn internal_data(&self) -> Result<InternalData, InternalDataError> {
		InternalData::from_map(&self.internal)
	}

	/// Returns the caller-visible fields as a JSON object.
	pub fn caller_data(&self) -> JsonMap<String, JsonValue> {
		let mut map = JsonMap::new();

		map.insert("token_id".into(), JsonValue::String(self.data.token_id.to_string()));
		map.insert("token_name".into(), JsonValue::String(self.data.token_name.clone()));
		map.insert("client_id".into(), JsonValue::String(self.data.client_id.clone()));
		map.insert(
			"client_secret".into(),
			JsonValue::String(self.data.client_secret.expose().to_owned()),
		);

		map
	}
}
