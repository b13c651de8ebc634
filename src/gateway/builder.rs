//! Builder for [`Gateway`] instances.

// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	error::ConfigError,
	gateway::{Gateway, RefreshCoordinator, RefreshMetrics},
	http::HttpTransport,
	refresh::TokenRefresher,
	store::CredentialStore,
};

/// Collects a gateway's collaborators and validates its configuration.
pub struct GatewayBuilder<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	store: Arc<dyn CredentialStore>,
	refresher: Option<Arc<dyn TokenRefresher>>,
	config: GatewayConfig,
}
impl<T> GatewayBuilder<T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) fn new(transport: Arc<T>, store: Arc<dyn CredentialStore>) -> Self {
		Self { transport, store, refresher: None, config: GatewayConfig::default() }
	}

	/// Sets the refresh collaborator.
	pub fn refresher(self, refresher: impl 'static + TokenRefresher) -> Self {
		self.shared_refresher(Arc::new(refresher))
	}

	/// Sets a refresh collaborator shared with other components.
	pub fn shared_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
		self.refresher = Some(refresher);

		self
	}

	/// Replaces the default configuration.
	pub fn config(mut self, config: GatewayConfig) -> Self {
		self.config = config;

		self
	}

	/// Validates the configuration and assembles the gateway with a fresh coordinator.
	pub fn build(self) -> Result<Gateway<T>> {
		self.config.validate()?;

		let refresher = self.refresher.ok_or(ConfigError::MissingRefresher)?;

		Ok(Gateway {
			transport: self.transport,
			store: self.store,
			refresher,
			coordinator: Arc::new(RefreshCoordinator::default()),
			config: self.config,
			refresh_metrics: Arc::new(RefreshMetrics::default()),
		})
	}
}
impl<T> Debug for GatewayBuilder<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatewayBuilder")
			.field("config", &self.config)
			.field("refresher_set", &self.refresher.is_some())
			.finish()
	}
}
