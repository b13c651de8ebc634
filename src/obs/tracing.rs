// self
use crate::{_prelude::*, http::GatewayRequest, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span attached to one gateway flow.
///
/// Spans are named `bearer_gateway.flow`. Request spans also carry `method` and `path`; the
/// query string and credentials are never recorded.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a span tagged with the flow kind and stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_gateway.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Creates a span for `request`, recording its method and path.
	pub fn for_request(kind: FlowKind, stage: &'static str, request: &GatewayRequest) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bearer_gateway.flow",
				flow = kind.as_str(),
				stage,
				method = request.method.as_str(),
				path = request.url.path(),
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, request);

			Self {}
		}
	}

	/// Instruments a future without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `tracing` event at the given level; compiles to nothing without the feature.
macro_rules! gateway_event {
	($level:ident, $($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	};
}
pub(crate) use gateway_event;

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn request_span_wraps_future() {
		let request = GatewayRequest::get(
			Url::parse("https://api.example.com/v1/gauges?token=secret")
				.expect("Fixture URL should parse."),
		);
		let span = FlowSpan::for_request(FlowKind::Send, "request_span_wraps_future", &request);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn gateway_event_expands_in_statement_position() {
		let attempts = 3;

		gateway_event!(debug, attempts, "Event macro smoke test.");

		assert_eq!(attempts, 3);
	}
}
