//! Credential value types: redacted secrets and the session token sets written to the store.

pub mod secret;
pub mod session;

pub use secret::*;
pub use session::*;
