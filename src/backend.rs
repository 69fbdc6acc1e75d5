//! Engine façade shared by the configuration, role, and token lifecycle components.

// self
use crate::{
	_prelude::*,
	client::{ClientCache, ClientConnector},
	config::CONFIG_STORAGE_KEY,
	flows::LifecycleMetrics,
	store::Storage,
};
#[cfg(feature = "reqwest")] use crate::client::cloudflare::CloudflareConnector;

#[cfg(feature = "reqwest")]
/// Backend specialized for the crate's reqwest-backed Cloudflare connector.
pub type CloudflareBackend = Backend<CloudflareConnector>;

/// Whether a write creates a new entry or updates an existing one.
///
/// The host decides this with an existence check ([`Backend::config_exists`],
/// [`Backend::role_exists`]) before dispatching the write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteOperation {
	/// Entry does not exist yet; required fields must be supplied.
	Create,
	/// Entry exists; omitted fields keep their stored values.
	Update,
}
impl WriteOperation {
	/// Returns `true` for [`WriteOperation::Create`].
	pub const fn is_create(self) -> bool {
		matches!(self, Self::Create)
	}
}

/// Issues, renews, and revokes service tokens against a single remote API.
///
/// The backend owns the host storage handle, the connector used to build remote clients, and
/// the process-wide client cache. Component operations live in `impl Backend` blocks across
/// the [`config`](crate::config), [`role`](crate::role), [`client`](crate::client),
/// [`flows`](crate::flows), and [`handler`](crate::handler) modules.
pub struct Backend<K>
where
	K: ClientConnector,
{
	/// Host-provided keyed storage.
	pub storage: Arc<dyn Storage>,
	/// Connector that turns the stored configuration into a remote client.
	pub connector: Arc<K>,
	/// Counters for lifecycle outcomes.
	pub metrics: Arc<LifecycleMetrics>,
	pub(crate) clients: ClientCache<K::Client>,
	token_name_prefix: String,
}
impl<K> Backend<K>
where
	K: ClientConnector,
{
	/// Prefix used for remote token display names unless overridden.
	pub const DEFAULT_TOKEN_NAME_PREFIX: &'static str = "vault-account";

	/// Creates a backend over the host storage and the provided connector.
	pub fn new(storage: Arc<dyn Storage>, connector: impl Into<Arc<K>>) -> Self {
		Self {
			storage,
			connector: connector.into(),
			metrics: Default::default(),
			clients: ClientCache::default(),
			token_name_prefix: Self::DEFAULT_TOKEN_NAME_PREFIX.into(),
		}
	}

	/// Overrides the prefix of remote token display names (`"<prefix>-<uuid>"`).
	pub fn with_token_name_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.token_name_prefix = prefix.into();

		self
	}

	/// Returns the prefix of remote token display names.
	pub fn token_name_prefix(&self) -> &str {
		&self.token_name_prefix
	}

	/// Host callback for storage change notifications.
	///
	/// Drops the cached client when the configuration key changed; other keys are ignored.
	pub async fn invalidate(&self, key: &str) {
		if key == CONFIG_STORAGE_KEY {
			self.clients.invalidate().await;
		}
	}
}
impl<K> Debug for Backend<K>
where
	K: ClientConnector,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Backend")
			.field("token_name_prefix", &self.token_name_prefix)
			.field("metrics", &self.metrics)
			.finish()
	}
}
