//! Authenticated request gateway.
//!
//! [`Gateway::send`] attaches the stored access token, forwards the request through the
//! transport, and recovers from exactly one failure class: an authentication failure on the
//! first attempt. Recovery goes through the gateway's [`RefreshCoordinator`], so concurrent
//! failures share a single refresh call and all replay with the same new credential. When the
//! episode fails, stored credentials are purged and every participant receives
//! [`Error::AuthenticationExpired`].

mod builder;
mod coordinator;
mod metrics;

pub use builder::GatewayBuilder;
pub use coordinator::*;
pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenSecret},
	config::GatewayConfig,
	http::{GatewayRequest, GatewayResponse, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	refresh::{RefreshFailure, RefreshFailureKind, TokenRefresher},
	store::{CredentialKey, CredentialStore},
};
#[cfg(feature = "reqwest")] use crate::{http::ReqwestTransport, refresh::HttpRefresher};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Position of a transmission within one logical request; a request is replayed at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
	First,
	Replay,
}

enum Step {
	Done(Result<GatewayResponse>),
	Recover,
	Expire(GatewayResponse),
}

/// Decorates an [`HttpTransport`] with bearer credentials and single-flight refresh.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	store: Arc<dyn CredentialStore>,
	refresher: Arc<dyn TokenRefresher>,
	coordinator: Arc<RefreshCoordinator>,
	config: GatewayConfig,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Starts building a gateway around `transport` and `store`.
	pub fn builder(transport: Arc<T>, store: Arc<dyn CredentialStore>) -> GatewayBuilder<T> {
		GatewayBuilder::new(transport, store)
	}

	/// Sends `request` with the stored bearer credential, transparently recovering once from
	/// an expired credential.
	///
	/// # Errors
	///
	/// - [`Error::AuthenticationExpired`] when the refresh episode fails or the replay is rejected
	///   again; stored credentials are purged before it is returned.
	/// - [`Error::RequestFailed`] for any other `4xx`/`5xx` response, unchanged.
	/// - [`Error::Transport`] when no response was received.
	/// - [`Error::Storage`] when the access token cannot be read.
	///
	/// # Runtime
	///
	/// With a refresh deadline configured (the default), recovery arms a `tokio` timer and must
	/// run on a Tokio runtime with the time driver enabled. Set
	/// [`GatewayConfig::refresh_timeout_ms`] to `None` to drive the gateway on other executors.
	pub async fn send(&self, request: GatewayRequest) -> Result<GatewayResponse> {
		const KIND: FlowKind = FlowKind::Send;

		let span = FlowSpan::for_request(KIND, "send", &request);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_with_recovery(&request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Persists a freshly authenticated session.
	pub async fn sign_in(&self, session: &SessionTokens) -> Result<()> {
		self.store.write_session(session).await?;

		Ok(())
	}

	/// Deletes every stored credential.
	pub async fn sign_out(&self) -> Result<()> {
		self.store.delete(&CredentialKey::ALL).await?;

		Ok(())
	}

	/// Returns the access token the next request would carry.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>> {
		Ok(self.store.load_access_token().await?)
	}

	/// Returns the stored access-token expiry, if known.
	pub async fn expires_at(&self) -> Result<Option<OffsetDateTime>> {
		Ok(self.store.load_expires_at().await?)
	}

	/// Credential store shared by this gateway.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Effective configuration.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	/// Refresh coordinator owned by this gateway (shared with its clones).
	pub fn coordinator(&self) -> &RefreshCoordinator {
		&self.coordinator
	}

	/// Counters for refresh episodes led by this gateway.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	async fn send_with_recovery(&self, request: &GatewayRequest) -> Result<GatewayResponse> {
		let mut token = self.store.load_access_token().await?;
		let mut attempt = Attempt::First;

		loop {
			let response = self.transmit(request, token.as_ref(), attempt).await?;

			match self.classify(response, attempt) {
				Step::Done(result) => return result,
				Step::Recover => {
					let fresh = self.recover(token.as_ref()).await?;

					token = Some(fresh);
					attempt = Attempt::Replay;
				},
				Step::Expire(response) => return Err(self.expire_after_replay(response).await),
			}
		}
	}

	async fn transmit(
		&self,
		request: &GatewayRequest,
		token: Option<&TokenSecret>,
		attempt: Attempt,
	) -> Result<GatewayResponse> {
		if attempt == Attempt::Replay {
			obs::record_flow_outcome(FlowKind::Replay, FlowOutcome::Attempt);
		}

		obs::gateway_event!(
			debug,
			?attempt,
			credential = ?token.map(TokenSecret::fingerprint),
			"Transmitting request."
		);

		Ok(self.transport.execute(request.authorized(token)).await?)
	}

	fn classify(&self, response: GatewayResponse, attempt: Attempt) -> Step {
		if response.status == self.config.unauthorized_status {
			return match attempt {
				Attempt::First => Step::Recover,
				Attempt::Replay => Step::Expire(response),
			};
		}
		if response.is_error() {
			return Step::Done(Err(Error::RequestFailed { response: Box::new(response) }));
		}

		Step::Done(Ok(response))
	}

	async fn recover(&self, stale: Option<&TokenSecret>) -> Result<TokenSecret> {
		let outcome = match self.coordinator.acquire_or_enqueue() {
			Ticket::Leader(guard) => self.lead(guard, stale).await,
			Ticket::Follower(follower) => {
				obs::gateway_event!(debug, "Refresh in flight; waiting for the leader.");

				follower.wait().await
			},
		};

		outcome.into_result().map_err(|failure| Error::AuthenticationExpired { failure })
	}

	async fn lead(&self, guard: LeaderGuard<'_>, stale: Option<&TokenSecret>) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "lead");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let outcome = span
			.instrument(async {
				match self.obtain_fresh_token(stale).await {
					Ok(token) => {
						self.refresh_metrics.record_success();
						obs::record_flow_outcome(KIND, FlowOutcome::Success);

						RefreshOutcome::Refreshed(token)
					},
					Err(failure) => {
						self.refresh_metrics.record_failure();
						obs::record_flow_outcome(KIND, FlowOutcome::Failure);
						obs::record_refresh_failure(failure.kind);
						obs::gateway_event!(warn, error = %failure, "Credential refresh failed.");
						self.purge_credentials().await;

						RefreshOutcome::Failed(failure)
					},
				}
			})
			.await;
		let resumed = guard.settle(outcome.clone());

		self.refresh_metrics.record_followers(resumed);
		obs::gateway_event!(debug, resumed, "Refresh episode settled.");

		outcome
	}

	async fn obtain_fresh_token(
		&self,
		stale: Option<&TokenSecret>,
	) -> Result<TokenSecret, RefreshFailure> {
		let current = self.store.load_access_token().await.map_err(storage_failure)?;

		if let Some(current) = current.filter(|current| Some(current) != stale) {
			self.refresh_metrics.record_reuse();
			obs::gateway_event!(
				debug,
				credential = %current.fingerprint(),
				"Stored credential already rotated; skipping refresh call."
			);

			return Ok(current);
		}

		let refresh_token =
			self.store.load_refresh_token().await.map_err(storage_failure)?.ok_or_else(|| {
				RefreshFailure::new(
					RefreshFailureKind::MissingRefreshToken,
					"No refresh token is stored",
				)
			})?;
		let issued_at = OffsetDateTime::now_utc();
		let tokens = match self.config.refresh_timeout() {
			Some(limit) => tokio::time::timeout(limit, self.refresher.refresh(&refresh_token))
				.await
				.map_err(|_| {
					RefreshFailure::new(
						RefreshFailureKind::Timeout,
						format!("Refresh call exceeded {} ms", limit.as_millis()),
					)
				})??,
			None => self.refresher.refresh(&refresh_token).await?,
		};

		self.store.write_refreshed(&tokens, issued_at).await.map_err(storage_failure)?;

		Ok(tokens.access_token)
	}

	async fn expire_after_replay(&self, response: GatewayResponse) -> Error {
		if !self.config.purge_on_repeated_unauthorized {
			return Error::RequestFailed { response: Box::new(response) };
		}

		obs::gateway_event!(
			warn,
			status = response.status,
			"Request rejected again after refresh; purging credentials."
		);
		self.purge_credentials().await;

		Error::AuthenticationExpired {
			failure: RefreshFailure::new(
				RefreshFailureKind::RejectedAfterRefresh,
				format!("Replay with a refreshed credential returned HTTP {}", response.status),
			),
		}
	}

	async fn purge_credentials(&self) {
		const KIND: FlowKind = FlowKind::Purge;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let failed = self.store.purge().await;

		if failed == 0 {
			obs::record_flow_outcome(KIND, FlowOutcome::Success);
		} else {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			obs::gateway_event!(warn, failed, "Credential purge left keys behind.");
		}
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway on a default reqwest client whose refresh endpoint shares that client.
	pub fn with_reqwest(store: Arc<dyn CredentialStore>, refresh_endpoint: Url) -> Result<Self> {
		let transport = Arc::new(ReqwestTransport::default());
		let refresher = HttpRefresher::new(refresh_endpoint, transport.clone());

		Self::builder(transport, store).refresher(refresher).build()
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			refresher: self.refresher.clone(),
			coordinator: self.coordinator.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("refreshing", &self.coordinator.is_refreshing())
			.field("pending", &self.coordinator.pending())
			.finish()
	}
}

fn storage_failure(err: crate::store::StoreError) -> RefreshFailure {
	RefreshFailure::new(RefreshFailureKind::Storage, err.to_string())
}
