// self
use crate::obs::{CallOutcome, CallPhase};

/// Records a phase outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(phase: CallPhase, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"service_broker_call_total",
			"phase" => phase.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (phase, outcome);
	}
}
