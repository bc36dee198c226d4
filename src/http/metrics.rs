// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::CallOutcome;

/// Thread-safe counters for calls issued through one client.
#[derive(Debug, Default)]
pub struct CallMetrics {
	calls: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	cancelled: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_failures: AtomicU64,
	replays: AtomicU64,
}
impl CallMetrics {
	/// Returns the total number of calls sent.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that settled as a success.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that settled as a failure, cancellations excluded.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of calls aborted by a newer request.
	pub fn cancellations(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh-token exchanges attempted.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh-token exchanges that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of requests replayed after a refresh.
	pub fn replays(&self) -> u64 {
		self.replays.load(Ordering::Relaxed)
	}

	pub(crate) fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_settled(&self, outcome: CallOutcome) {
		let counter = match outcome {
			CallOutcome::Attempt => return,
			CallOutcome::Success => &self.success,
			CallOutcome::Failure => &self.failure,
			CallOutcome::Cancelled => &self.cancelled,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_replay(&self) {
		self.replays.fetch_add(1, Ordering::Relaxed);
	}
}
