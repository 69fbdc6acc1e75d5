//! Singleton engine configuration: the API token used to reach the remote service.

// self
use crate::{
	_prelude::*,
	backend::{Backend, WriteOperation},
	client::ClientConnector,
	credential::TokenSecret,
	error::ValidationError,
	store::StorageEntry,
};

/// Storage key of the configuration singleton.
pub const CONFIG_STORAGE_KEY: &str = "config";

/// Persisted backend configuration.
///
/// An absent configuration is treated as [`EngineConfig::default`], whose empty token makes
/// client construction fail.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
	/// API token authorized to manage service tokens.
	pub api_token: TokenSecret,
}
impl EngineConfig {
	/// Creates a configuration holding `api_token`.
	pub fn new(api_token: impl Into<String>) -> Self {
		Self { api_token: TokenSecret::new(api_token) }
	}

	/// Returns the configuration with its token masked for display.
	pub fn masked(&self) -> MaskedConfig {
		MaskedConfig { api_token: self.api_token.masked() }
	}
}

/// Configuration as shown to operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedConfig {
	/// Token with all but the last four characters replaced by `x`.
	pub api_token: String,
}

/// Fields supplied by a configuration write; `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigPatch {
	/// Replacement API token.
	pub api_token: Option<String>,
}
impl ConfigPatch {
	/// Sets the API token.
	pub fn api_token(mut self, value: impl Into<String>) -> Self {
		self.api_token = Some(value.into());

		self
	}

	/// Merges the patch onto `existing`, enforcing create/update rules.
	pub fn apply(
		self,
		existing: Option<EngineConfig>,
		op: WriteOperation,
	) -> Result<EngineConfig, ValidationError> {
		let mut config = match existing {
			Some(config) => config,
			None if op.is_create() => EngineConfig::default(),
			None => return Err(ValidationError::ConfigNotFound),
		};

		match self.api_token {
			Some(token) if token.is_empty() => return Err(ValidationError::EmptyApiToken),
			Some(token) => config.api_token = TokenSecret::new(token),
			None if op.is_create() =>
				return Err(ValidationError::MissingField {
					entity: "configuration",
					field: "api_token",
				}),
			None => {},
		}

		Ok(config)
	}
}

impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Reads the stored configuration, if any.
	pub async fn read_config(&self) -> Result<Option<EngineConfig>> {
		let entry = self.storage.get(CONFIG_STORAGE_KEY).await?;

		Ok(entry.map(|entry| entry.decode_json()).transpose()?)
	}

	/// Reads the stored configuration with its API token masked.
	pub async fn read_config_masked(&self) -> Result<Option<MaskedConfig>> {
		Ok(self.read_config().await?.map(|config| config.masked()))
	}

	/// Existence check used by the host to pick create or update.
	pub async fn config_exists(&self) -> Result<bool> {
		Ok(self.storage.get(CONFIG_STORAGE_KEY).await?.is_some())
	}

	/// Validates and persists a configuration write, then drops the cached client.
	pub async fn write_config(&self, patch: ConfigPatch, op: WriteOperation) -> Result<()> {
		let existing = self.read_config().await?;
		let config = patch.apply(existing, op)?;

		self.storage.put(StorageEntry::json(CONFIG_STORAGE_KEY, &config)?).await?;
		self.clients.invalidate().await;

		Ok(())
	}

	/// Removes the configuration and drops the cached client; deleting nothing succeeds.
	pub async fn delete_config(&self) -> Result<()> {
		self.storage.delete(CONFIG_STORAGE_KEY).await?;
		self.clients.invalidate().await;

		Ok(())
	}
}
