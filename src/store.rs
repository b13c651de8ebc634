//! Credential store contract, its logical key schema, and built-in implementations.

pub mod file;
pub mod memory;

mod session;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistent key-value storage holding tokens and session metadata.
///
/// The gateway reads the access token before every request, and only the refresh leader
/// writes during a recovery episode.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if any.
	fn get(&self, key: CredentialKey) -> StoreFuture<'_, Option<String>>;

	/// Stores or replaces the value under `key`.
	fn set(&self, key: CredentialKey, value: String) -> StoreFuture<'_, ()>;

	/// Removes every listed key; missing keys are not an error.
	fn delete<'a>(&'a self, keys: &'a [CredentialKey]) -> StoreFuture<'a, ()>;
}

/// Logical keys the gateway reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKey {
	/// Short-lived bearer credential.
	AccessToken,
	/// Long-lived credential used to mint access tokens.
	RefreshToken,
	/// Cached user/session payload.
	User,
	/// RFC 3339 expiry instant of the access token.
	ExpiresAt,
}
impl CredentialKey {
	/// Every key, in the order the purge path deletes them.
	pub const ALL: [Self; 4] = [Self::AccessToken, Self::RefreshToken, Self::User, Self::ExpiresAt];

	/// Returns the stable storage name for the key.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessToken => "access_token",
			Self::RefreshToken => "refresh_token",
			Self::User => "user",
			Self::ExpiresAt => "expires_at",
		}
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for CredentialKey {
	type Err = StoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL.into_iter().find(|key| key.as_str() == s).ok_or_else(|| {
			StoreError::Serialization { message: format!("Unknown credential key `{s}`") }
		})
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;
	use std::error::Error as StdError;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "keychain locked".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert!(gateway_error.to_string().contains("keychain locked"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn credential_keys_parse_from_storage_names() {
		for key in CredentialKey::ALL {
			assert_eq!(key.as_str().parse::<CredentialKey>(), Ok(key));
		}

		assert!("session".parse::<CredentialKey>().is_err());
	}

	#[test]
	fn credential_key_serializes_as_storage_name() {
		let payload = serde_json::to_string(&CredentialKey::ExpiresAt)
			.expect("CredentialKey should serialize to JSON.");

		assert_eq!(payload, "\"expires_at\"");
	}
}
