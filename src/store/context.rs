//! Per-request cookie context for server-rendered requests.
//!
//! Reads come from the incoming `Cookie` header (shadowed by anything written during the
//! request); writes are queued as `Set-Cookie` values for the outgoing response.

// crates.io
use reqwest::header::COOKIE;
// self
use crate::{
	_prelude::*,
	store::{Cookie, CookieJar, StoreError},
};

/// Cookie view of a single incoming request and its pending response cookies.
#[derive(Debug, Default)]
pub struct RequestContext {
	incoming: HashMap<String, String>,
	outgoing: Mutex<Vec<Cookie>>,
}
impl RequestContext {
	/// Parses a raw `Cookie` request header (`a=1; b=2`).
	pub fn from_cookie_header(header: &str) -> Self {
		let mut incoming = HashMap::new();

		parse_cookie_header(header, &mut incoming);

		Self { incoming, outgoing: Mutex::default() }
	}

	/// Collects every `Cookie` header of an incoming request.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let mut incoming = HashMap::new();

		for value in headers.get_all(COOKIE) {
			if let Ok(raw) = value.to_str() {
				parse_cookie_header(raw, &mut incoming);
			}
		}

		Self { incoming, outgoing: Mutex::default() }
	}

	/// Cookies written during this request, in write order.
	pub fn pending(&self) -> Vec<Cookie> {
		self.outgoing.lock().clone()
	}

	/// Renders the pending cookies as `Set-Cookie` header values.
	pub fn set_cookie_headers(&self) -> Result<Vec<String>, StoreError> {
		self.outgoing.lock().iter().map(Cookie::to_set_cookie).collect()
	}

	fn queue(&self, cookie: Cookie) {
		let mut outgoing = self.outgoing.lock();

		outgoing.retain(|queued| !(queued.name == cookie.name && queued.path == cookie.path));
		outgoing.push(cookie);
	}
}
impl CookieJar for RequestContext {
	fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError> {
		let written = self.outgoing.lock().iter().rev().find(|cookie| cookie.name == name).cloned();

		if let Some(cookie) = written {
			return Ok(Some(cookie).filter(|cookie| !cookie.is_expired()));
		}

		Ok(self.incoming.get(name).map(|value| Cookie::new(name, value.as_str())))
	}

	fn set(&self, cookie: Cookie) -> Result<(), StoreError> {
		self.queue(cookie);

		Ok(())
	}

	fn remove(&self, name: &str, path: &str) -> Result<(), StoreError> {
		self.queue(Cookie::removal(name, path));

		Ok(())
	}
}

fn parse_cookie_header(header: &str, into: &mut HashMap<String, String>) {
	for pair in header.split(';') {
		let Some((name, value)) = pair.split_once('=') else {
			continue;
		};
		let name = name.trim();

		if name.is_empty() {
			continue;
		}

		let value = value.trim();
		let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);

		into.entry(name.to_owned()).or_insert_with(|| value.to_owned());
	}
}
