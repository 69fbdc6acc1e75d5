//! Lease renewal: extends the remote token without rotating its secret.

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
	/// Refreshes the token behind `envelope` and hands the envelope back unchanged.
	///
	/// The client secret is never re-disclosed, so the caller-visible data stays as issued.
	pub async fn renew(&self, envelope: SecretEnvelope) -> Result<SecretEnvelope> {
		const KIND: OperationKind = OperationKind::Renew;

		let span = OperationSpan::new(KIND, "renew");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let ResolvedLease { internal, role } = self.resolve_lease(&envelope).await?;
				let client = self.client().await?;

				client.refresh_service_token(&role.account_id, &internal.token_id).await.map_err(
					|e| {
						Error::remote(
							RemoteOperation::RefreshServiceToken,
							&role.account_id,
							Some(&internal.token_id),
							e,
						)
					},
				)?;

				Ok(envelope)
			})
			.await;

		match &result {
			Ok(_) => self.metrics.record_renewed(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::record_result(KIND, &result);

		result
	}
}
