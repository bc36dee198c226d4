//! Per-fingerprint cancellation of in-flight requests.
//!
//! The registry guarantees at most one live request per fingerprint: registering a
//! fingerprint cancels whichever request currently holds it and installs the new one under
//! the same lock acquisition. Releasing a lease only clears the slot if the lease is still
//! its occupant, so a superseded request finishing late never evicts its successor.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{_prelude::*, config::ExecutionContext};

type SlotMap = Arc<Mutex<HashMap<String, Slot>>>;

#[derive(Debug)]
struct Slot {
	id: u64,
	token: CancellationToken,
}

/// Registry of in-flight cancellable requests, owned by one client.
#[derive(Clone, Debug)]
pub struct CancellationRegistry {
	enabled: bool,
	slots: SlotMap,
	next_id: Arc<AtomicU64>,
}
impl CancellationRegistry {
	/// Creates a registry; it is inert outside the client execution context.
	pub fn new(context: ExecutionContext) -> Self {
		Self {
			enabled: matches!(context, ExecutionContext::Client),
			slots: Default::default(),
			next_id: Arc::new(AtomicU64::new(1)),
		}
	}

	/// Returns `true` when registrations actually track requests.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Cancels the current holder of `fingerprint` (if any) and installs a new lease.
	pub fn register(&self, fingerprint: impl Into<String>) -> AbortLease {
		if !self.enabled {
			return AbortLease::detached();
		}

		let fingerprint = fingerprint.into();
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let token = CancellationToken::new();
		let previous = {
			let mut slots = self.slots.lock();
			let previous = slots.remove(&fingerprint);

			if let Some(previous) = previous.as_ref() {
				previous.token.cancel();
			}

			slots.insert(fingerprint.clone(), Slot { id, token: token.clone() });

			previous
		};

		if let Some(previous) = previous {
			tracing::debug!(%fingerprint, superseded = previous.id, "cancelled in-flight request");
		}

		AbortLease {
			signal: CancelSignal(Some(token)),
			release: Some(Release { slots: self.slots.clone(), fingerprint, id }),
		}
	}

	/// Number of fingerprints with a live request.
	pub fn len(&self) -> usize {
		self.slots.lock().len()
	}

	/// Returns `true` when no request is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns `true` when `fingerprint` currently has a live request.
	pub fn contains(&self, fingerprint: &str) -> bool {
		self.slots.lock().contains_key(fingerprint)
	}
}
impl Default for CancellationRegistry {
	fn default() -> Self {
		Self::new(ExecutionContext::Client)
	}
}

/// Computes the registry key for a request URL.
///
/// A custom key wins; otherwise the full URL is used, with its query string stripped when
/// `with_query` is false.
pub fn fingerprint(url: &Url, with_query: bool, custom_key: Option<&str>) -> String {
	if let Some(key) = custom_key {
		return key.to_owned();
	}
	if with_query {
		return url.to_string();
	}

	let mut stripped = url.clone();

	stripped.set_query(None);

	stripped.to_string()
}

/// Cancellation signal observed by a request while it is in flight.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal(Option<CancellationToken>);
impl CancelSignal {
	/// A signal that never fires.
	pub fn never() -> Self {
		Self(None)
	}

	/// Returns `true` once the request has been superseded.
	pub fn is_cancelled(&self) -> bool {
		self.0.as_ref().is_some_and(CancellationToken::is_cancelled)
	}

	/// Resolves when the request is superseded; pends forever for detached signals.
	pub async fn cancelled(&self) {
		match &self.0 {
			Some(token) => token.cancelled().await,
			None => std::future::pending().await,
		}
	}
}

#[derive(Debug)]
struct Release {
	slots: SlotMap,
	fingerprint: String,
	id: u64,
}

/// Registration handle for one request; dropping it releases the fingerprint slot.
#[derive(Debug)]
pub struct AbortLease {
	signal: CancelSignal,
	release: Option<Release>,
}
impl AbortLease {
	/// Lease that is not tracked by any registry.
	pub fn detached() -> Self {
		Self { signal: CancelSignal::never(), release: None }
	}

	/// Signal to race the request against.
	pub fn signal(&self) -> &CancelSignal {
		&self.signal
	}

	/// Releases the slot now; equivalent to dropping the lease.
	pub fn done(self) {}
}
impl Drop for AbortLease {
	fn drop(&mut self) {
		let Some(release) = self.release.take() else {
			return;
		};
		let mut slots = release.slots.lock();

		if slots.get(&release.fingerprint).is_some_and(|slot| slot.id == release.id) {
			slots.remove(&release.fingerprint);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn newer_registration_cancels_previous_holder() {
		let registry = CancellationRegistry::default();
		let first = registry.register("GET /auth/user/42");
		let second = registry.register("GET /auth/user/42");

		assert!(first.signal().is_cancelled());
		assert!(!second.signal().is_cancelled());
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn superseded_release_keeps_newer_entry() {
		let registry = CancellationRegistry::default();
		let first = registry.register("key");
		let second = registry.register("key");

		drop(first);

		assert!(registry.contains("key"));

		second.done();

		assert!(registry.is_empty());
	}

	#[test]
	fn distinct_fingerprints_do_not_interfere() {
		let registry = CancellationRegistry::default();
		let a = registry.register("a");
		let b = registry.register("b");

		assert!(!a.signal().is_cancelled());
		assert!(!b.signal().is_cancelled());
		assert_eq!(registry.len(), 2);
	}

	#[test]
	fn server_context_registry_is_inert() {
		let registry = CancellationRegistry::new(ExecutionContext::Server);
		let first = registry.register("key");
		let second = registry.register("key");

		assert!(!registry.is_enabled());
		assert!(!first.signal().is_cancelled());
		assert!(!second.signal().is_cancelled());
		assert!(registry.is_empty());
	}

	#[test]
	fn fingerprint_honors_query_and_custom_key() {
		let url = Url::parse("http://localhost:3000/api/items?page=2")
			.expect("Fingerprint fixture URL should parse.");

		assert_eq!(fingerprint(&url, true, None), "http://localhost:3000/api/items?page=2");
		assert_eq!(fingerprint(&url, false, None), "http://localhost:3000/api/items");
		assert_eq!(fingerprint(&url, false, Some("items")), "items");
	}

	#[tokio::test]
	async fn cancelled_future_resolves_after_supersession() {
		let registry = CancellationRegistry::default();
		let first = registry.register("key");
		let _second = registry.register("key");

		first.signal().cancelled().await;

		assert!(first.signal().is_cancelled());
	}
}
