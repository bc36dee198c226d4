//! Thread-safe in-memory [`CookieJar`] standing in for a client runtime's cookie storage.

// self
use crate::{
	_prelude::*,
	store::{Cookie, CookieJar, StoreError},
};

type CookieMap = Arc<RwLock<HashMap<String, Cookie>>>;

/// Thread-safe jar that keeps cookies in-process; clones share the same cookies.
#[derive(Clone, Debug, Default)]
pub struct MemoryCookieJar(CookieMap);
impl MemoryCookieJar {
	/// Number of live cookies currently held.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|cookie| !cookie.is_expired_at(now)).count()
	}

	/// Returns `true` when no live cookie is held.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn get_now(map: &CookieMap, name: &str) -> Option<Cookie> {
		let mut guard = map.write();

		match guard.get(name) {
			Some(cookie) if cookie.is_expired() => {
				guard.remove(name);

				None
			},
			Some(cookie) => Some(cookie.clone()),
			None => None,
		}
	}
}
impl CookieJar for MemoryCookieJar {
	fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError> {
		Ok(Self::get_now(&self.0, name))
	}

	fn set(&self, cookie: Cookie) -> Result<(), StoreError> {
		self.0.write().insert(cookie.name.clone(), cookie);

		Ok(())
	}

	fn remove(&self, name: &str, _path: &str) -> Result<(), StoreError> {
		self.0.write().remove(name);

		Ok(())
	}
}
