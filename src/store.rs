//! Cookie jar contracts, built-in jars, and the token store layered on top of them.
//!
//! Tokens are never cached in memory by the [`TokenStore`]; every read goes to the
//! jar, so whichever jar is authoritative (browser-like memory jar, JSON file, or the
//! cookies of one server-rendered request) stays the single source of truth.

pub mod context;
pub mod file;
pub mod memory;

pub use context::RequestContext;
pub use file::FileCookieJar;
pub use memory::MemoryCookieJar;

// crates.io
use time::{UtcOffset, format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	auth::{self, TokenKind, TokenPair, TokenSecret},
	config::CookieConfig,
};

const HTTP_DATE: &[BorrowedFormatItem<'static>] = format_description!(
	"[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Storage backend contract implemented by cookie jars.
pub trait CookieJar
where
	Self: Send + Sync,
{
	/// Fetches a live (unexpired) cookie by name.
	fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError>;

	/// Persists or replaces a cookie.
	fn set(&self, cookie: Cookie) -> Result<(), StoreError>;

	/// Deletes the cookie stored under `name` for `path`.
	fn remove(&self, name: &str, path: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`CookieJar`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// A single persisted cookie.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
	/// Cookie name.
	pub name: String,
	/// Raw cookie value.
	pub value: String,
	/// Cookie path attribute.
	pub path: String,
	/// Absolute expiry; `None` marks a session cookie.
	pub expires: Option<OffsetDateTime>,
}
impl Cookie {
	/// Creates a session cookie scoped to `/`.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into(), path: "/".into(), expires: None }
	}

	/// Builds the tombstone that instructs a user agent to drop the cookie.
	pub fn removal(name: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: String::new(),
			path: path.into(),
			expires: Some(OffsetDateTime::UNIX_EPOCH),
		}
	}

	/// Overrides the path attribute.
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();

		self
	}

	/// Sets (or clears) the absolute expiry.
	pub fn with_expires(mut self, expires: Option<OffsetDateTime>) -> Self {
		self.expires = expires;

		self
	}

	/// Returns `true` when the cookie has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires.is_some_and(|expires| expires <= instant)
	}

	/// Returns `true` when the cookie has expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Renders the cookie as a `Set-Cookie` header value.
	pub fn to_set_cookie(&self) -> Result<String, StoreError> {
		let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);

		if let Some(expires) = self.expires {
			let date = expires.to_offset(UtcOffset::UTC).format(HTTP_DATE).map_err(|e| {
				StoreError::Serialization {
					message: format!("Failed to format expiry for cookie {}: {e}", self.name),
				}
			})?;

			header.push_str("; Expires=");
			header.push_str(&date);
		}

		Ok(header)
	}
}
impl Debug for Cookie {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Cookie")
			.field("name", &self.name)
			.field("value", &"<redacted>")
			.field("path", &self.path)
			.field("expires", &self.expires)
			.finish()
	}
}

/// Reads and writes the access/refresh tokens through a [`CookieJar`].
///
/// Every operation optionally takes a [`RequestContext`]; when present the cookies of
/// that server-rendered request are used instead of the store's own jar.
#[derive(Clone)]
pub struct TokenStore {
	jar: Arc<dyn CookieJar>,
	cookies: CookieConfig,
}
impl TokenStore {
	/// Creates a store over the provided jar and cookie layout.
	pub fn new(jar: Arc<dyn CookieJar>, cookies: CookieConfig) -> Self {
		Self { jar, cookies }
	}

	/// Cookie layout used by this store.
	pub fn cookies(&self) -> &CookieConfig {
		&self.cookies
	}

	/// Reads the token of the requested kind.
	pub fn get(&self, kind: TokenKind, ctx: Option<&RequestContext>) -> Result<Option<TokenSecret>> {
		let cookie = self.jar(ctx).get(self.cookies.name(kind))?;

		Ok(cookie.filter(|cookie| !cookie.value.is_empty()).map(|cookie| cookie.value.into()))
	}

	/// Persists the token of the requested kind.
	///
	/// Claims-bearing kinds get a cookie expiring exactly at the token's `exp` claim;
	/// a token that cannot be decoded fails with [`Error::MalformedToken`](crate::error::Error::MalformedToken) and nothing
	/// is written. An empty token removes the cookie.
	pub fn set(
		&self,
		kind: TokenKind,
		token: &TokenSecret,
		ctx: Option<&RequestContext>,
	) -> Result<()> {
		if token.is_empty() {
			return self.remove(kind, ctx);
		}

		let cookie = self.cookie_for(kind, token)?;

		self.jar(ctx).set(cookie)?;

		Ok(())
	}

	/// Deletes the token of the requested kind.
	pub fn remove(&self, kind: TokenKind, ctx: Option<&RequestContext>) -> Result<()> {
		self.jar(ctx).remove(self.cookies.name(kind), &self.cookies.path)?;

		Ok(())
	}

	/// Persists both tokens; neither is written unless both decode.
	pub fn save_pair(&self, pair: &TokenPair, ctx: Option<&RequestContext>) -> Result<()> {
		let access = self.cookie_for(TokenKind::Access, &pair.access_token)?;
		let refresh = self.cookie_for(TokenKind::Refresh, &pair.refresh_token)?;
		let jar = self.jar(ctx);

		jar.set(access)?;
		jar.set(refresh)?;

		Ok(())
	}

	/// Deletes both tokens.
	pub fn clear(&self, ctx: Option<&RequestContext>) -> Result<()> {
		for kind in TokenKind::ALL {
			self.remove(kind, ctx)?;
		}

		Ok(())
	}

	fn cookie_for(&self, kind: TokenKind, token: &TokenSecret) -> Result<Cookie> {
		let expires = if self.cookies.is_claims_bearing(kind) {
			auth::decode_claims(token.expose())?.expires_at
		} else {
			None
		};

		Ok(Cookie::new(self.cookies.name(kind), token.expose())
			.with_path(self.cookies.path.clone())
			.with_expires(expires))
	}

	fn jar<'a>(&'a self, ctx: Option<&'a RequestContext>) -> &'a dyn CookieJar {
		match ctx {
			Some(ctx) => ctx as &dyn CookieJar,
			None => self.jar.as_ref(),
		}
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("cookies", &self.cookies).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
	use time::macros;
	// self
	use super::*;
	use crate::error::Error;

	fn jwt(exp: i64) -> TokenSecret {
		TokenSecret::new(format!(
			"{}.{}.sig",
			URL_SAFE_NO_PAD.encode("{\"alg\":\"HS256\"}"),
			URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"))
		))
	}

	fn build_store() -> (TokenStore, Arc<MemoryCookieJar>) {
		let jar = Arc::new(MemoryCookieJar::default());
		let store = TokenStore::new(jar.clone(), CookieConfig::default());

		(store, jar)
	}

	#[test]
	fn access_token_cookie_expires_at_claimed_expiry() {
		let (store, jar) = build_store();

		store.set(TokenKind::Access, &jwt(1_893_456_000), None).expect("Well-formed JWT should persist.");

		let cookie = jar
			.get("accessToken")
			.expect("Memory jar reads should not fail.")
			.expect("Access cookie should be present.");

		assert_eq!(cookie.expires, Some(macros::datetime!(2030-01-01 00:00 UTC)));
		assert_eq!(cookie.path, "/");
	}

	#[test]
	fn malformed_access_token_propagates_and_persists_nothing() {
		let (store, jar) = build_store();
		let err = store
			.set(TokenKind::Access, &TokenSecret::new("not-a-jwt"), None)
			.expect_err("Malformed JWT must be rejected.");

		assert!(matches!(err, Error::MalformedToken(_)));
		assert!(jar.get("accessToken").expect("Memory jar reads should not fail.").is_none());
	}

	#[test]
	fn refresh_token_is_a_session_cookie() {
		let (store, jar) = build_store();

		store
			.set(TokenKind::Refresh, &TokenSecret::new("opaque-refresh"), None)
			.expect("Opaque refresh token should persist.");

		let cookie = jar
			.get("refreshToken")
			.expect("Memory jar reads should not fail.")
			.expect("Refresh cookie should be present.");

		assert_eq!(cookie.expires, None);
		assert_eq!(
			store
				.get(TokenKind::Refresh, None)
				.expect("Token reads should not fail.")
				.map(|secret| secret.expose().to_owned()),
			Some("opaque-refresh".into())
		);
	}

	#[test]
	fn save_pair_is_all_or_nothing() {
		let (store, jar) = build_store();
		let pair = TokenPair::new("broken", "opaque-refresh");

		store.save_pair(&pair, None).expect_err("Malformed access token must fail the pair.");

		assert!(jar.get("refreshToken").expect("Memory jar reads should not fail.").is_none());
	}

	#[test]
	fn empty_token_and_clear_remove_entries() {
		let (store, _jar) = build_store();

		store
			.save_pair(&TokenPair::new(jwt(1_893_456_000), "opaque-refresh"), None)
			.expect("Pair should persist.");
		store
			.set(TokenKind::Access, &TokenSecret::new(""), None)
			.expect("Empty token should remove the cookie.");

		assert!(store.get(TokenKind::Access, None).expect("Token reads should not fail.").is_none());

		store.clear(None).expect("Clearing tokens should succeed.");

		assert!(store.get(TokenKind::Refresh, None).expect("Token reads should not fail.").is_none());
	}

	#[test]
	fn context_routes_operations_to_request_cookies() {
		let (store, jar) = build_store();
		let ctx = RequestContext::from_cookie_header("refreshToken=from-request");

		assert_eq!(
			store
				.get(TokenKind::Refresh, Some(&ctx))
				.expect("Context reads should not fail.")
				.map(|secret| secret.expose().to_owned()),
			Some("from-request".into())
		);

		store
			.set(TokenKind::Refresh, &TokenSecret::new("rotated"), Some(&ctx))
			.expect("Context writes should succeed.");

		assert!(jar.get("refreshToken").expect("Memory jar reads should not fail.").is_none());
		assert_eq!(
			ctx.set_cookie_headers().expect("Set-Cookie rendering should succeed."),
			vec!["refreshToken=rotated; Path=/".to_owned()]
		);
	}

	#[test]
	fn set_cookie_renders_http_date() {
		let cookie = Cookie::new("accessToken", "v")
			.with_expires(Some(macros::datetime!(2030-01-01 00:00 UTC)));

		assert_eq!(
			cookie.to_set_cookie().expect("Set-Cookie rendering should succeed."),
			"accessToken=v; Path=/; Expires=Tue, 01 Jan 2030 00:00:00 GMT"
		);
	}
}
