// self
use crate::{
	obs::{FlowKind, FlowOutcome},
	refresh::RefreshFailureKind,
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_gateway_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a failed refresh episode under `bearer_gateway_refresh_failure_total{kind}`.
///
/// One increment per episode, not per participant.
pub fn record_refresh_failure(kind: RefreshFailureKind) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bearer_gateway_refresh_failure_total", "kind" => kind.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = kind;
	}
}
