//! Service token issuance for a named role.

// self
use crate::{
	_prelude::*,
	backend::Backend,
	client::{ClientConnector, ServiceTokenApi},
	credential::ServiceToken,
	error::RemoteOperation,
	flows::common,
	lease::{LeaseOptions, SecretEnvelope},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	role::{self, CredentialType, Role},
};

impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Mints a remote service token scoped to the role's account.
	///
	/// The display name is `"<prefix>-<uuid>"` so repeated calls never collide.
	pub async fn create_token(&self, role: &Role) -> Result<ServiceToken> {
		let client = self.client().await?;
		let name = common::token_name(self.token_name_prefix());

		match role.credential_type {
			CredentialType::Service => client
				.create_service_token(&role.account_id, &name)
				.await
				.map_err(|e| {
					Error::remote(RemoteOperation::CreateServiceToken, &role.account_id, None, e)
				}),
		}
	}

	/// Resolves `role_name`, mints a token, and wraps it in a lease envelope.
	pub async fn issue_service_token(&self, role_name: &str) -> Result<SecretEnvelope> {
		const KIND: OperationKind = OperationKind::Issue;

		let span = OperationSpan::new(KIND, "issue_service_token");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let name = role::parse_name(role_name)?;
				let role = self.require_role(&name).await?;
				let token = self.create_token(&role).await?;

				Ok(SecretEnvelope::issued(token, name, LeaseOptions::for_role(&role)))
			})
			.await;

		match &result {
			Ok(_) => self.metrics.record_issued(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::record_result(KIND, &result);

		result
	}
}
