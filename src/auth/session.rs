//! Credential sets exchanged with the store at sign-in and after each refresh.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Credentials written to the store when a user authenticates.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionTokens {
	/// Short-lived bearer credential.
	pub access_token: TokenSecret,
	/// Long-lived credential used to mint new access tokens.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry of the access token, when the issuer reported one.
	pub expires_at: Option<OffsetDateTime>,
	/// Cached user/session payload kept next to the tokens.
	pub user: Option<serde_json::Value>,
}
impl SessionTokens {
	/// Creates a session holding only an access token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None, expires_at: None, user: None }
	}

	/// Attaches the refresh credential.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Records the absolute access-token expiry.
	pub fn with_expires_at(mut self, expires_at: OffsetDateTime) -> Self {
		self.expires_at = Some(expires_at);

		self
	}

	/// Attaches the cached user payload.
	pub fn with_user(mut self, user: serde_json::Value) -> Self {
		self.user = Some(user);

		self
	}
}

/// Credentials minted by the refresh endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshedTokens {
	/// Replacement access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token, when the endpoint issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime of the new access token.
	pub expires_in: Option<Duration>,
}
impl RefreshedTokens {
	/// Creates a result carrying only a new access token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None, expires_in: None }
	}

	/// Attaches a rotated refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Records the lifetime in seconds; non-positive values are ignored.
	pub fn with_expires_in_secs(mut self, secs: i64) -> Self {
		self.expires_in = (secs > 0).then(|| Duration::seconds(secs));

		self
	}

	/// Resolves the lifetime into an absolute instant relative to `issued_at`.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires_in.and_then(|lifetime| issued_at.checked_add(lifetime))
	}
}
