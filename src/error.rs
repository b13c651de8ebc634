//! Gateway-level error types shared across the transport, store, and refresh layers.

// self
use crate::{_prelude::*, http::GatewayResponse, refresh::RefreshFailure};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure outside the credential purge path.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Network-level failure with no HTTP response (timeout, DNS, connection reset).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The session could not be recovered; stored credentials have been purged and the
	/// caller must force re-authentication.
	#[error("Session expired and stored credentials were purged.")]
	AuthenticationExpired {
		/// Refresh failure shared by every request of the failed episode.
		#[source]
		failure: RefreshFailure,
	},
	/// Upstream answered with a non-recoverable HTTP error status.
	#[error("Request failed with HTTP status {}.", .response.status)]
	RequestFailed {
		/// Unmodified upstream response, kept for caller inspection.
		response: Box<GatewayResponse>,
	},
}
impl Error {
	/// Returns `true` when the caller must redirect to a sign-in flow.
	pub fn is_authentication_expired(&self) -> bool {
		matches!(self, Self::AuthenticationExpired { .. })
	}

	/// Returns the refresh failure carried by [`Error::AuthenticationExpired`].
	pub fn refresh_failure(&self) -> Option<&RefreshFailure> {
		match self {
			Self::AuthenticationExpired { failure } => Some(failure),
			_ => None,
		}
	}

	/// HTTP status of the upstream response when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::RequestFailed { response } => Some(response.status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised while assembling a gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Refresh endpoint URL cannot be parsed.
	#[error("Refresh endpoint is invalid.")]
	InvalidRefreshEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The configured unauthorized status is not a client error code.
	#[error("Unauthorized status {status} is not a 4xx code.")]
	InvalidUnauthorizedStatus {
		/// Rejected status code.
		status: u16,
	},
	/// Builder finished without a refresh collaborator.
	#[error("Gateway requires a token refresher.")]
	MissingRefresher,
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

/// Transport-level failures (network, IO) that produced no HTTP response.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request exceeded the transport's deadline.
	#[error("Request timed out before a response arrived.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Returns `true` for deadline failures.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
