// self
use crate::{_prelude::*, obs::CallPhase};

/// Instrumented future returned by [`CallSpan::instrument`].
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;

/// A span builder used by service calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the phase, HTTP method, and service path.
	pub fn new(phase: CallPhase, method: &Method, path: &str) -> Self {
		let span = tracing::info_span!(
			"service_broker.call",
			phase = phase.as_str(),
			method = method.as_str(),
			path
		);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
