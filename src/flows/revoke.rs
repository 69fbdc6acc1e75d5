//! Lease revocation: deletes the remote token.

// self
use crate::{
	_prelude::*,
	backend::Backend,
	client::{ClientConnector, ServiceTokenApi},
	error::RemoteOperation,
	flows::common::ResolvedLease,
	lease::SecretEnvelope,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Deletes the token behind `envelope`.
	///
	/// A failed delete leaves the remote token in place and is reported to the host, which
	/// decides whether to retry.
	pub async fn revoke(&self, envelope: &SecretEnvelope) -> Result<()> {
		const KIND: OperationKind = OperationKind::Revoke;

		let span = OperationSpan::new(KIND, "revoke");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let ResolvedLease { internal, role } = self.resolve_lease(envelope).await?;
				let client = self.client().await?;

				client.delete_service_token(&role.account_id, &internal.token_id).await.map_err(
					|e| {
						Error::remote(
							RemoteOperation::DeleteServiceToken,
							&role.account_id,
							Some(&internal.token_id),
							e,
						)
					},
				)
			})
			.await;

		match &result {
			Ok(_) => self.metrics.record_revoked(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::record_result(KIND, &result);

		result
	}
}
