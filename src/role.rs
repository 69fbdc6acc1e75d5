//! Role registry: named bindings that authorize token issuance for one remote account.

// self
use crate::{
	_prelude::*,
	backend::{Backend, WriteOperation},
	client::ClientConnector,
	credential::{AccountId, RoleName},
	error::ValidationError,
	store::StorageEntry,
};

/// Storage prefix under which roles are kept.
pub const ROLE_STORAGE_PREFIX: &str = "role/";

/// Kind of credential a role issues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
	/// Access service token (client ID + client secret).
	#[default]
	Service,
}
impl CredentialType {
	/// Returns the wire label of the credential type.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Service => "service",
		}
	}
}
impl Display for CredentialType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for CredentialType {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"service" => Ok(Self::Service),
			other => Err(ValidationError::InvalidCredentialType { value: other.to_owned() }),
		}
	}
}

/// Stored role definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	/// Credential type issued for this role.
	#[serde(rename = "type")]
	pub credential_type: CredentialType,
	/// Account that issued tokens are scoped to.
	pub account_id: AccountId,
	/// Default lease duration for issued tokens; `None` defers to the host default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ttl: Option<Duration>,
	/// Maximum lease duration for issued tokens; `None` defers to the host default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_ttl: Option<Duration>,
}
impl Role {
	/// Creates a service role for `account_id` without lease overrides.
	pub fn service(account_id: AccountId) -> Self {
		Self { credential_type: CredentialType::Service, account_id, ttl: None, max_ttl: None }
	}
}

/// Fields supplied by a role write; `None` keeps the stored value on update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RolePatch {
	/// Requested credential type; only `"service"` is accepted.
	pub credential_type: Option<String>,
	/// Target account identifier.
	pub account_id: Option<String>,
	/// Lease duration; zero clears the override.
	pub ttl: Option<Duration>,
	/// Maximum lease duration; zero clears the override.
	pub max_ttl: Option<Duration>,
}
impl RolePatch {
	/// Sets the credential type.
	pub fn credential_type(mut self, value: impl Into<String>) -> Self {
		self.credential_type = Some(value.into());

		self
	}

	/// Sets the account identifier.
	pub fn account_id(mut self, value: impl Into<String>) -> Self {
		self.account_id = Some(value.into());

		self
	}

	/// Sets the lease duration.
	pub fn ttl(mut self, value: Duration) -> Self {
		self.ttl = Some(value);

		self
	}

	/// Sets the maximum lease duration.
	pub fn max_ttl(mut self, value: Duration) -> Self {
		self.max_ttl = Some(value);

		self
	}

	/// Merges the patch onto `existing`, enforcing create/update rules.
	///
	/// On create, `credential_type` and `account_id` are mandatory. On update, omitted fields
	/// keep their stored values.
	pub fn apply(self, existing: Option<Role>, op: WriteOperation) -> Result<Role, ValidationError> {
		let inherited = existing.filter(|_| !op.is_create());
		let credential_type = match self.credential_type {
			Some(raw) => raw.parse()?,
			None => match &inherited {
				Some(role) => role.credential_type,
				None => return Err(missing("credential_type")),
			},
		};
		let account_id = match self.account_id {
			Some(raw) => AccountId::new(raw)?,
			None => match &inherited {
				Some(role) => role.account_id.clone(),
				None => return Err(missing("account_id")),
			},
		};
		let ttl = lease_bound("ttl", self.ttl, inherited.as_ref().and_then(|role| role.ttl))?;
		let max_ttl =
			lease_bound("max_ttl", self.max_ttl, inherited.as_ref().and_then(|role| role.max_ttl))?;

		if let (Some(ttl), Some(max_ttl)) = (ttl, max_ttl)
			&& ttl > max_ttl
		{
			return Err(ValidationError::TtlExceedsMaxTtl);
		}

		Ok(Role { credential_type, account_id, ttl, max_ttl })
	}
}

fn missing(field: &'static str) -> ValidationError {
	ValidationError::MissingField { entity: "role", field }
}

fn lease_bound(
	field: &'static str,
	supplied: Option<Duration>,
	inherited: Option<Duration>,
) -> Result<Option<Duration>, ValidationError> {
	match supplied {
		Some(value) if value.is_negative() => Err(ValidationError::NegativeDuration { field }),
		Some(value) if value.is_zero() => Ok(None),
		Some(value) => Ok(Some(value)),
		None => Ok(inherited),
	}
}

fn role_key(name: &RoleName) -> String {
	format!("{ROLE_STORAGE_PREFIX}{name}")
}

pub(crate) fn parse_name(name: &str) -> Result<RoleName> {
	Ok(RoleName::new(name).map_err(ValidationError::from)?)
}

impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Reads a role; an empty or malformed name fails validation.
	pub async fn read_role(&self, name: &str) -> Result<Option<Role>> {
		self.fetch_role(&parse_name(name)?).await
	}

	/// Existence check used by the host to pick create or update.
	pub async fn role_exists(&self, name: &str) -> Result<bool> {
		let name = parse_name(name)?;

		Ok(self.storage.get(&role_key(&name)).await?.is_some())
	}

	/// Validates and persists a role write, returning the merged role.
	pub async fn write_role(&self, name: &str, patch: RolePatch, op: WriteOperation) -> Result<Role> {
		let name = parse_name(name)?;
		let existing = self.fetch_role(&name).await?;
		let role = patch.apply(existing, op)?;

		self.storage.put(StorageEntry::json(role_key(&name), &role)?).await?;

		Ok(role)
	}

	/// Removes a role; deleting a missing role succeeds.
	pub async fn delete_role(&self, name: &str) -> Result<()> {
		let name = parse_name(name)?;

		self.storage.delete(&role_key(&name)).await?;

		Ok(())
	}

	/// Lists role names in storage order.
	pub async fn list_roles(&self) -> Result<Vec<String>> {
		Ok(self.storage.list(ROLE_STORAGE_PREFIX).await?)
	}

	pub(crate) async fn fetch_role(&self, name: &RoleName) -> Result<Option<Role>> {
		let entry = self.storage.get(&role_key(name)).await?;

		Ok(entry.map(|entry| entry.decode_json()).transpose()?)
	}
}
