//! Observability helpers for gateway flows.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits structured spans named `bearer_gateway.flow` with the `flow` and
//!   `stage` fields, plus the crate's warn/debug events.
//! - `metrics` increments the `bearer_gateway_flow_total` counter for every attempt/success/failure,
//!   labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

pub(crate) use self::tracing::gateway_event;

// self
use crate::_prelude::*;

/// Gateway flow kinds observed by the instrumentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// A caller-initiated request passing through the gateway.
	Send,
	/// A credential refresh performed by the episode leader.
	Refresh,
	/// Re-sending a request with a refreshed credential.
	Replay,
	/// Credential purge after an unrecoverable session failure.
	Purge,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Send => "send",
			FlowKind::Refresh => "refresh",
			FlowKind::Replay => "replay",
			FlowKind::Purge => "purge",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a gateway helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
