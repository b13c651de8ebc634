//! Bearer-token request gateway: attaches stored credentials to outbound requests, runs a
//! single refresh per expiry episode while concurrent callers queue behind it, and purges
//! stored credentials when the session can no longer be recovered.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::GatewayConfig,
		gateway::Gateway,
		http::ReqwestTransport,
		refresh::HttpRefresher,
		store::{CredentialStore, MemoryStore},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestTransport>;

	/// Builds a reqwest transport with a short request timeout so broken mocks fail fast.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		ReqwestTransport::with_timeout(std::time::Duration::from_secs(5))
			.expect("Failed to build Reqwest client for tests.")
	}

	/// Constructs a [`Gateway`] backed by an in-memory store and an [`HttpRefresher`] pointed at
	/// `refresh_endpoint`, sharing one reqwest transport.
	pub fn build_reqwest_test_gateway(
		refresh_endpoint: Url,
		config: GatewayConfig,
	) -> (ReqwestTestGateway, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let transport = Arc::new(test_reqwest_transport());
		let refresher = HttpRefresher::new(refresh_endpoint, transport.clone());
		let gateway = Gateway::builder(transport, store)
			.refresher(refresher)
			.config(config)
			.build()
			.expect("Test gateway configuration should be valid.");

		(gateway, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
