//! Gateway tuning knobs.
//!
//! [`GatewayConfig`] derives serde so embedding applications can load it from their own
//! configuration files; every field has a default, so partial documents are accepted.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Behavior switches for a [`Gateway`](crate::gateway::Gateway).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
	/// Status code that marks an expired access credential.
	pub unauthorized_status: u16,
	/// Deadline for a single refresh call in milliseconds; `None` waits indefinitely.
	///
	/// A deadline is enforced with `tokio::time`, so the gateway must then run on a Tokio
	/// runtime with timers enabled. `None` removes that requirement.
	pub refresh_timeout_ms: Option<u64>,
	/// Purge stored credentials when a request is rejected again after a refreshed replay.
	pub purge_on_repeated_unauthorized: bool,
}
impl GatewayConfig {
	const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 30_000;
	const DEFAULT_UNAUTHORIZED_STATUS: u16 = 401;

	/// Overrides the status treated as an authentication failure.
	pub fn with_unauthorized_status(mut self, status: u16) -> Self {
		self.unauthorized_status = status;

		self
	}

	/// Overrides the refresh deadline; `None` disables it.
	pub fn with_refresh_timeout(mut self, timeout: Option<StdDuration>) -> Self {
		self.refresh_timeout_ms =
			timeout.map(|value| u64::try_from(value.as_millis()).unwrap_or(u64::MAX));

		self
	}

	/// Toggles the purge after a repeated authentication failure.
	pub fn with_purge_on_repeated_unauthorized(mut self, purge: bool) -> Self {
		self.purge_on_repeated_unauthorized = purge;

		self
	}

	/// Refresh deadline as a [`StdDuration`].
	pub fn refresh_timeout(&self) -> Option<StdDuration> {
		self.refresh_timeout_ms.map(StdDuration::from_millis)
	}

	/// Checks the configuration for values the gateway cannot honor.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(400..500).contains(&self.unauthorized_status) {
			return Err(ConfigError::InvalidUnauthorizedStatus {
				status: self.unauthorized_status,
			});
		}

		Ok(())
	}
}
impl Default for GatewayConfig {
	fn default() -> Self {
		Self {
			unauthorized_status: Self::DEFAULT_UNAUTHORIZED_STATUS,
			refresh_timeout_ms: Some(Self::DEFAULT_REFRESH_TIMEOUT_MS),
			purge_on_repeated_unauthorized: true,
		}
	}
}
