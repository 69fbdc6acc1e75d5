//! Service token minted by the remote account-management API.

// self
use crate::{
	_prelude::*,
	credential::{TokenId, TokenSecret},
};

/// Client ID + client secret pair issued for a role's account.
///
/// `client_secret` is only ever returned by the create call; renewals never re-disclose it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceToken {
	/// Remote identifier used for refresh and delete calls.
	pub token_id: TokenId,
	/// Display name chosen at creation.
	pub token_name: String,
	/// Access client ID header value.
	pub client_id: String,
	/// Access client secret header value.
	pub client_secret: TokenSecret,
}
