//! Engine-level error types shared across configuration, roles, leases, and remote calls.

// self
use crate::{
	_prelude::*,
	credential::{AccountId, IdentifierError, TokenId},
};

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error surfaced to the host platform.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage collaborator failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Malformed or missing caller input.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// A client was requested before a usable configuration exists.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Lease bookkeeping fields are missing or malformed.
	#[error(transparent)]
	InternalData(#[from] InternalDataError),

	/// The referenced role does not exist.
	#[error("Role `{role}` does not exist.")]
	RoleNotFound {
		/// Normalized role name.
		role: String,
	},
	/// A call to the remote account-management API failed.
	#[error("Remote {operation} call failed for account `{account_id}`{}.", token_suffix(.token_id))]
	Remote {
		/// Remote operation that failed.
		operation: RemoteOperation,
		/// Account the call was scoped to.
		account_id: String,
		/// Token targeted by the call, when one was known.
		token_id: Option<String>,
		/// Underlying remote failure.
		#[source]
		source: RemoteError,
	},
}
impl Error {
	/// Wraps a [`RemoteError`] with the operation and target it belongs to.
	pub fn remote(
		operation: RemoteOperation,
		account_id: &AccountId,
		token_id: Option<&TokenId>,
		source: RemoteError,
	) -> Self {
		Self::Remote {
			operation,
			account_id: account_id.to_string(),
			token_id: token_id.map(ToString::to_string),
			source,
		}
	}
}

fn token_suffix(token_id: &Option<String>) -> String {
	match token_id {
		Some(id) => format!(" (token `{id}`)"),
		None => String::new(),
	}
}

/// Caller input that failed validation; no state is mutated when these are returned.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// An identifier (role name, account, token) is malformed.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// A field required on create was not supplied.
	#[error("Missing {field} in {entity}.")]
	MissingField {
		/// Entity being written.
		entity: &'static str,
		/// Field name.
		field: &'static str,
	},
	/// The requested credential type is not supported.
	#[error("Invalid credential_type `{value}` in role.")]
	InvalidCredentialType {
		/// Value supplied by the caller.
		value: String,
	},
	/// The supplied API token was empty.
	#[error("The api_token value cannot be empty.")]
	EmptyApiToken,
	/// An update was requested while no configuration exists.
	#[error("Configuration not found during update operation.")]
	ConfigNotFound,
	/// Role lease bounds are inconsistent.
	#[error("The ttl value cannot be greater than max_ttl.")]
	TtlExceedsMaxTtl,
	/// A lease duration was negative.
	#[error("The {field} value cannot be negative.")]
	NegativeDuration {
		/// Field name.
		field: &'static str,
	},
	/// The request field map could not be decoded.
	#[error("Request fields are invalid at `{}`.", .0.path())]
	Fields(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Configuration failures raised while building a remote client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No API token is configured.
	#[error("The API token was not defined.")]
	MissingApiToken,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The remote API refused the configured API token during verification.
	#[error("The API token was rejected by the remote API.")]
	ApiTokenRejected {
		/// Authentication or authorization failure.
		#[source]
		source: RemoteError,
	},
	/// Verification did not complete, so the API token is neither accepted nor rejected.
	#[error("The API token could not be verified.")]
	ApiTokenVerification {
		/// Transport, server or decode failure.
		#[source]
		source: RemoteError,
	},
	/// The API base URL cannot carry path segments.
	#[error("API base URL `{url}` cannot be used as a base.")]
	InvalidBaseUrl {
		/// Rejected URL.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Lease internal data that cannot be trusted; renew and revoke refuse to proceed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum InternalDataError {
	/// A bookkeeping field is absent.
	#[error("Secret is missing {field} internal data.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// A bookkeeping field is not a string.
	#[error("Secret internal data field {field} is not a string.")]
	NotAString {
		/// Field name.
		field: &'static str,
	},
	/// A bookkeeping field holds an invalid identifier.
	#[error("Secret internal data field {field} is invalid.")]
	InvalidField {
		/// Field name.
		field: &'static str,
		/// Identifier validation failure.
		#[source]
		source: IdentifierError,
	},
}

/// Remote API operations, used to label failures and observability signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
	/// Service token creation.
	CreateServiceToken,
	/// Service token refresh.
	RefreshServiceToken,
	/// Service token deletion.
	DeleteServiceToken,
}
impl RemoteOperation {
	/// Returns a stable label suitable for messages and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::CreateServiceToken => "create_service_token",
			Self::RefreshServiceToken => "refresh_service_token",
			Self::DeleteServiceToken => "delete_service_token",
		}
	}
}
impl Display for RemoteOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failures reported by a [`ServiceTokenApi`](crate::client::ServiceTokenApi) implementation.
#[derive(Debug, ThisError)]
pub enum RemoteError {
	/// Network, TLS, or timeout failure before a response was read.
	#[error("Network error occurred while calling the remote API.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The API answered with an error status or `success: false`.
	#[error("Remote API returned status {status}: {}.", join_messages(.messages))]
	Api {
		/// HTTP status code.
		status: u16,
		/// Error messages reported by the API.
		messages: Vec<String>,
		/// Retry-After hint, when supplied.
		retry_after: Option<Duration>,
	},
	/// The API answered successfully but the payload could not be decoded.
	#[error("Remote API returned a malformed payload.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// The API reported success without the expected result object.
	#[error("Remote API response with status {status} did not include a result.")]
	MissingResult {
		/// HTTP status code.
		status: u16,
	},
	/// The API answered successfully but a field violates local invariants.
	#[error("Remote API returned an unusable value.")]
	Malformed {
		/// Validation failure.
		#[source]
		source: BoxError,
	},
}
impl RemoteError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Wraps a validation failure for a value returned by the API.
	pub fn malformed(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Malformed { source: Box::new(src) }
	}

	/// Returns the HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } | Self::Decode { status, .. } | Self::MissingResult { status } =>
				Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for RemoteError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}

fn join_messages(messages: &[String]) -> String {
	if messages.is_empty() { "no error details".into() } else { messages.join("; ") }
}
