//! Refresh endpoint collaborator and the failure value shared across a refresh episode.
//!
//! A [`TokenRefresher`] turns the stored refresh credential into a new access credential.
//! The gateway calls it from exactly one task per episode, so implementations need no
//! coordination of their own. [`HttpRefresher`] talks to a JSON endpoint through the plain
//! transport, never through the gateway, so a refresh can never trigger another refresh.

// self
use crate::{
	_prelude::*,
	auth::{RefreshedTokens, TokenSecret},
	http::{GatewayRequest, HttpTransport},
};

/// Boxed future returned by [`TokenRefresher::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RefreshedTokens, RefreshFailure>> + 'a + Send>>;

/// Mints a new access credential from a refresh credential.
pub trait TokenRefresher
where
	Self: Send + Sync,
{
	/// Exchanges `refresh_token` for fresh credentials.
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a>;
}

/// Why a refresh episode ended without a usable credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RefreshFailureKind {
	/// The store held no refresh credential.
	MissingRefreshToken,
	/// The refresh endpoint answered with an error status.
	Rejected {
		/// HTTP status returned by the endpoint.
		status: u16,
	},
	/// No response was received from the refresh endpoint.
	Transport,
	/// The refresh call exceeded the configured deadline.
	Timeout,
	/// The endpoint answered 2xx but the payload was unusable.
	MalformedResponse,
	/// The new credential could not be persisted.
	Storage,
	/// The leader stopped before settling the episode.
	Abandoned,
	/// A request was rejected again right after replaying with a refreshed credential.
	RejectedAfterRefresh,
}
impl RefreshFailureKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MissingRefreshToken => "missing_refresh_token",
			Self::Rejected { .. } => "rejected",
			Self::Transport => "transport",
			Self::Timeout => "timeout",
			Self::MalformedResponse => "malformed_response",
			Self::Storage => "storage",
			Self::Abandoned => "abandoned",
			Self::RejectedAfterRefresh => "rejected_after_refresh",
		}
	}
}

/// Cloneable failure delivered identically to the leader and every follower of an episode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Credential refresh failed ({}): {message}.", .kind.as_str())]
pub struct RefreshFailure {
	/// Failure category.
	pub kind: RefreshFailureKind,
	/// Human-readable detail.
	pub message: String,
}
impl RefreshFailure {
	/// Builds a failure of the given kind.
	pub fn new(kind: RefreshFailureKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}
}

/// JSON refresh endpoint client.
///
/// Sends `POST <endpoint>` with `{"refreshToken": "<value>"}`. The reply must carry
/// `accessToken` (or `access_token`) and may carry `refreshToken`/`refresh_token` and
/// `expiresIn`/`expires_in` in seconds. Sending both spellings of one field is malformed.
pub struct HttpRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	endpoint: Url,
	transport: Arc<T>,
}
impl<T> HttpRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a refresher posting to `endpoint` through `transport`.
	pub fn new(endpoint: Url, transport: Arc<T>) -> Self {
		Self { endpoint, transport }
	}

	/// Parses `endpoint` before creating the refresher.
	pub fn parse(
		endpoint: &str,
		transport: Arc<T>,
	) -> Result<Self, crate::error::ConfigError> {
		let endpoint = Url::parse(endpoint)
			.map_err(|source| crate::error::ConfigError::InvalidRefreshEndpoint { source })?;

		Ok(Self::new(endpoint, transport))
	}

	/// Target endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	async fn exchange(&self, refresh_token: &TokenSecret) -> Result<RefreshedTokens, RefreshFailure> {
		let request = GatewayRequest::post(self.endpoint.clone())
			.with_header("accept", "application/json")
			.with_json(&RefreshRequestBody { refresh_token: refresh_token.expose() })
			.map_err(|e| RefreshFailure::new(RefreshFailureKind::MalformedResponse, e.to_string()))?;
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| {
				let kind = if e.is_timeout() {
					RefreshFailureKind::Timeout
				} else {
					RefreshFailureKind::Transport
				};

				RefreshFailure::new(kind, e.to_string())
			})?;

		if !response.is_success() {
			return Err(RefreshFailure::new(
				RefreshFailureKind::Rejected { status: response.status },
				format!("Refresh endpoint returned HTTP {}", response.status),
			));
		}

		let body = response.json::<RefreshResponseBody>().map_err(|e| {
			RefreshFailure::new(
				RefreshFailureKind::MalformedResponse,
				format!("Refresh response is malformed at `{}`: {}", e.path(), e.inner()),
			)
		})?;

		body.into_tokens()
	}
}
impl<T> TokenRefresher for HttpRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> RefreshFuture<'a> {
		Box::pin(self.exchange(refresh_token))
	}
}
impl<T> Debug for HttpRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpRefresher").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequestBody<'a> {
	refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponseBody {
	#[serde(alias = "accessToken")]
	access_token: Option<String>,
	#[serde(default, alias = "refreshToken")]
	refresh_token: Option<String>,
	#[serde(default, alias = "expiresIn")]
	expires_in: Option<i64>,
}
impl RefreshResponseBody {
	fn into_tokens(self) -> Result<RefreshedTokens, RefreshFailure> {
		let access = self.access_token.filter(|value| !value.is_empty()).ok_or_else(|| {
			RefreshFailure::new(
				RefreshFailureKind::MalformedResponse,
				"Refresh response carries no access token",
			)
		})?;
		let mut tokens = RefreshedTokens::new(access);

		if let Some(refresh) = self.refresh_token.filter(|value| !value.is_empty()) {
			tokens = tokens.with_refresh_token(refresh);
		}
		if let Some(secs) = self.expires_in {
			tokens = tokens.with_expires_in_secs(secs);
		}

		Ok(tokens)
	}
}
