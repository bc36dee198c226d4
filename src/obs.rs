//! Observability helpers for service calls.
//!
//! # Feature Flags
//!
//! - Spans named `service_broker.call` (fields `phase`, `method`, `path`) are always emitted
//!   through `tracing`.
//! - Enable `metrics` to increment the `service_broker_call_total` counter for every
//!   attempt/success/failure/cancellation, labeled by `phase` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stages a single service call can pass through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallPhase {
	/// The original request.
	Request,
	/// The refresh-token exchange triggered by a 401.
	Refresh,
	/// The replay of the original request with a fresh bearer.
	Replay,
}
impl CallPhase {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallPhase::Request => "request",
			CallPhase::Refresh => "refresh",
			CallPhase::Replay => "replay",
		}
	}
}
impl Display for CallPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a phase.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure folded into the envelope.
	Failure,
	/// Aborted by a newer request.
	Cancelled,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
			CallOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
