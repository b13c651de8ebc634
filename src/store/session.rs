//! Session-level helpers layered over the raw [`CredentialStore`] key-value contract.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{RefreshedTokens, SessionTokens, TokenSecret},
	obs,
	store::{CredentialKey, CredentialStore, StoreError},
};

impl dyn CredentialStore {
	/// Loads the stored access token, if any.
	pub async fn load_access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.get(CredentialKey::AccessToken).await?.map(TokenSecret::from))
	}

	/// Loads the stored refresh token, if any.
	pub async fn load_refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.get(CredentialKey::RefreshToken).await?.map(TokenSecret::from))
	}

	/// Loads and parses the stored access-token expiry.
	pub async fn load_expires_at(&self) -> Result<Option<OffsetDateTime>, StoreError> {
		let Some(raw) = self.get(CredentialKey::ExpiresAt).await? else {
			return Ok(None);
		};

		OffsetDateTime::parse(&raw, &Rfc3339).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Stored expiry `{raw}` is not RFC 3339: {e}"),
		})
	}

	/// Loads and parses the cached user payload.
	pub async fn load_user(&self) -> Result<Option<serde_json::Value>, StoreError> {
		let Some(raw) = self.get(CredentialKey::User).await? else {
			return Ok(None);
		};

		serde_json::from_str(&raw).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Stored user payload is not valid JSON: {e}"),
		})
	}

	/// Writes a freshly authenticated session, replacing whatever was stored before.
	pub async fn write_session(&self, session: &SessionTokens) -> Result<(), StoreError> {
		self.set(CredentialKey::AccessToken, session.access_token.expose().to_owned()).await?;

		match &session.refresh_token {
			Some(refresh) => self.set(CredentialKey::RefreshToken, refresh.expose().to_owned()).await?,
			None => self.delete(&[CredentialKey::RefreshToken]).await?,
		}
		match session.expires_at {
			Some(instant) => self.set(CredentialKey::ExpiresAt, format_instant(instant)?).await?,
			None => self.delete(&[CredentialKey::ExpiresAt]).await?,
		}
		match &session.user {
			Some(user) => self.set(CredentialKey::User, user.to_string()).await?,
			None => self.delete(&[CredentialKey::User]).await?,
		}

		Ok(())
	}

	/// Persists the outcome of a successful refresh.
	///
	/// The refresh token and expiry are only overwritten when the endpoint supplied new values;
	/// a stale expiry is dropped when the new lifetime is unknown.
	pub async fn write_refreshed(
		&self,
		tokens: &RefreshedTokens,
		issued_at: OffsetDateTime,
	) -> Result<(), StoreError> {
		self.set(CredentialKey::AccessToken, tokens.access_token.expose().to_owned()).await?;

		if let Some(refresh) = &tokens.refresh_token {
			self.set(CredentialKey::RefreshToken, refresh.expose().to_owned()).await?;
		}

		match tokens.expires_at(issued_at) {
			Some(instant) => self.set(CredentialKey::ExpiresAt, format_instant(instant)?).await,
			None => self.delete(&[CredentialKey::ExpiresAt]).await,
		}
	}

	/// Deletes every credential key, best effort.
	///
	/// A failed bulk delete falls back to key-by-key deletion. Returns the number of keys that
	/// could not be removed; the purge never fails the caller's error path.
	pub async fn purge(&self) -> usize {
		let Err(bulk) = self.delete(&CredentialKey::ALL).await else {
			return 0;
		};

		obs::gateway_event!(warn, error = %bulk, "Bulk credential purge failed; deleting keys one by one.");

		let mut failed = 0;

		for key in CredentialKey::ALL {
			if let Err(e) = self.delete(&[key]).await {
				obs::gateway_event!(warn, key = key.as_str(), error = %e, "Failed to purge credential key.");

				failed += 1;
			}
		}

		failed
	}
}

fn format_instant(instant: OffsetDateTime) -> Result<String, StoreError> {
	instant.format(&Rfc3339).map_err(|e| StoreError::Serialization {
		message: format!("Failed to format expiry instant: {e}"),
	})
}
