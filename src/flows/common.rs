//! Shared helpers for lifecycle operations (role resolution, lease parsing, token naming).

// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	backend::Backend,
	client::ClientConnector,
	credential::RoleName,
	lease::{InternalData, SecretEnvelope},
	role::Role,
};

/// Role and bookkeeping recovered from a lease before any remote call is made.
#[derive(Clone, Debug)]
pub struct ResolvedLease {
	/// Parsed internal data.
	pub internal: InternalData,
	/// Role the lease was issued under, as currently stored.
	pub role: Role,
}

impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Loads a role or fails with [`Error::RoleNotFound`].
	pub async fn require_role(&self, name: &RoleName) -> Result<Role> {
		self.fetch_role(name).await?.ok_or_else(|| Error::RoleNotFound { role: name.to_string() })
	}

	/// Parses the envelope's internal data, then resolves its role.
	///
	/// Malformed internal data fails before storage or the remote API is touched.
	pub async fn resolve_lease(&self, envelope: &SecretEnvelope) -> Result<ResolvedLease> {
		let internal = envelope.internal_data()?;
		let role = self.require_role(&internal.role).await?;

		Ok(ResolvedLease { internal, role })
	}
}

/// Builds a unique remote display name (`"<prefix>-<uuid v4>"`).
pub(crate) fn token_name(prefix: &str) -> String {
	format!("{prefix}-{}", Uuid::new_v4())
}
