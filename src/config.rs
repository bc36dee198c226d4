//! Client configuration, its validating builder, and environment loading.

// std
use std::{env, time::Duration as StdDuration};
// self
use crate::{_prelude::*, auth::TokenKind, error::ConfigError};

/// Base URL used when `API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
/// Application URL used when `APP_URL` is not set.
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
/// Default header carrying the bearer credential.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";
/// Default header carrying a CAPTCHA token.
pub const DEFAULT_CAPTCHA_HEADER: &str = "X-Recaptcha-Token";
/// Default refresh endpoint, relative to the API base URL.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";

/// Where the client runs; decides whether cancellation and alerts are active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContext {
	/// Interactive client runtime: duplicate requests are aborted and failures alerted.
	#[default]
	Client,
	/// Server-side rendering: the cancellation registry is inert and alerts are suppressed.
	Server,
}

/// How concurrent 401 responses share the refresh endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
	/// Each failing request runs its own refresh call.
	#[default]
	PerRequest,
	/// Refreshes are serialized; waiters reuse a rotation that completed while they waited.
	Coalesced,
}

/// Cookie names, path, and which tokens carry JWT claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieConfig {
	/// Cookie holding the access token.
	pub access_name: String,
	/// Cookie holding the refresh token.
	pub refresh_name: String,
	/// Cookie path attribute.
	pub path: String,
	/// Access token is a JWT whose `exp` drives cookie expiry.
	pub access_is_jwt: bool,
	/// Refresh token is a JWT whose `exp` drives cookie expiry.
	pub refresh_is_jwt: bool,
}
impl CookieConfig {
	/// Cookie name for the requested kind.
	pub fn name(&self, kind: TokenKind) -> &str {
		match kind {
			TokenKind::Access => &self.access_name,
			TokenKind::Refresh => &self.refresh_name,
		}
	}

	/// Whether the requested kind is decoded for an expiry when stored.
	pub fn is_claims_bearing(&self, kind: TokenKind) -> bool {
		match kind {
			TokenKind::Access => self.access_is_jwt,
			TokenKind::Refresh => self.refresh_is_jwt,
		}
	}

	fn validate(&self) -> Result<(), ConfigError> {
		validate_cookie_name(&self.access_name)?;
		validate_cookie_name(&self.refresh_name)?;

		if self.access_name == self.refresh_name {
			return Err(ConfigError::DuplicateCookieName { name: self.access_name.clone() });
		}

		Ok(())
	}
}
impl Default for CookieConfig {
	fn default() -> Self {
		Self {
			access_name: "accessToken".into(),
			refresh_name: "refreshToken".into(),
			path: "/".into(),
			access_is_jwt: true,
			refresh_is_jwt: false,
		}
	}
}

/// Immutable, validated client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// API base URL every service path is appended to.
	pub api_url: Url,
	/// Public application URL, if configured.
	pub app_url: Option<Url>,
	/// Header carrying `Bearer <token>`.
	pub auth_header: HeaderName,
	/// Header carrying CAPTCHA tokens.
	pub captcha_header: HeaderName,
	/// CAPTCHA site key handed to front-end widgets.
	pub recaptcha_site_key: Option<String>,
	/// Token cookie layout.
	pub cookies: CookieConfig,
	/// Execution context.
	pub context: ExecutionContext,
	/// Refresh coordination policy.
	pub refresh_policy: RefreshPolicy,
	/// Refresh endpoint path, relative to `api_url`.
	pub refresh_path: String,
	/// Default per-request timeout.
	pub timeout: Option<StdDuration>,
}
impl ClientConfig {
	/// Creates a builder targeting the provided API base URL.
	pub fn builder(api_url: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(api_url)
	}

	/// Loads configuration from the process environment.
	///
	/// Reads `API_URL`, `APP_URL`, `RECAPTCHA_HEADERS_KEY`, and `RECAPTCHA_SITE_KEY`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Loads configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let api_url = read("API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
		let mut builder = ClientConfigBuilder::new(api_url)
			.app_url(read("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.into()));

		if let Some(header) = read("RECAPTCHA_HEADERS_KEY") {
			builder = builder.captcha_header(header);
		}
		if let Some(site_key) = read("RECAPTCHA_SITE_KEY") {
			builder = builder.recaptcha_site_key(site_key);
		}

		builder.build()
	}

	/// Resolves a service path (which may carry its own query string) against the API base URL.
	pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
		let base = self.api_url.as_str().trim_end_matches('/');

		if path.is_empty() {
			Url::parse(base)
		} else if path.starts_with('/') || path.starts_with('?') {
			Url::parse(&format!("{base}{path}"))
		} else {
			Url::parse(&format!("{base}/{path}"))
		}
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	api_url: String,
	app_url: Option<String>,
	auth_header: String,
	captcha_header: String,
	recaptcha_site_key: Option<String>,
	cookies: CookieConfig,
	context: ExecutionContext,
	refresh_policy: RefreshPolicy,
	refresh_path: String,
	timeout: Option<StdDuration>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults.
	pub fn new(api_url: impl Into<String>) -> Self {
		Self {
			api_url: api_url.into(),
			app_url: None,
			auth_header: DEFAULT_AUTH_HEADER.into(),
			captcha_header: DEFAULT_CAPTCHA_HEADER.into(),
			recaptcha_site_key: None,
			cookies: CookieConfig::default(),
			context: ExecutionContext::default(),
			refresh_policy: RefreshPolicy::default(),
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			timeout: None,
		}
	}

	/// Sets the public application URL.
	pub fn app_url(mut self, url: impl Into<String>) -> Self {
		self.app_url = Some(url.into());

		self
	}

	/// Overrides the bearer header name.
	pub fn auth_header(mut self, name: impl Into<String>) -> Self {
		self.auth_header = name.into();

		self
	}

	/// Overrides the CAPTCHA header name.
	pub fn captcha_header(mut self, name: impl Into<String>) -> Self {
		self.captcha_header = name.into();

		self
	}

	/// Sets the CAPTCHA site key.
	pub fn recaptcha_site_key(mut self, key: impl Into<String>) -> Self {
		self.recaptcha_site_key = Some(key.into());

		self
	}

	/// Overrides the token cookie layout.
	pub fn cookies(mut self, cookies: CookieConfig) -> Self {
		self.cookies = cookies;

		self
	}

	/// Overrides the execution context.
	pub fn context(mut self, context: ExecutionContext) -> Self {
		self.context = context;

		self
	}

	/// Overrides the refresh coordination policy.
	pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
		self.refresh_policy = policy;

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Sets a default timeout applied to every request.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let api_url = parse_http_url("api", &self.api_url)?;
		let app_url = self.app_url.as_deref().map(|raw| parse_http_url("app", raw)).transpose()?;
		let auth_header = parse_header_name(&self.auth_header)?;
		let captcha_header = parse_header_name(&self.captcha_header)?;

		self.cookies.validate()?;

		if !self.refresh_path.starts_with('/') {
			return Err(ConfigError::InvalidRefreshPath { path: self.refresh_path });
		}

		Ok(ClientConfig {
			api_url,
			app_url,
			auth_header,
			captcha_header,
			recaptcha_site_key: self.recaptcha_site_key,
			cookies: self.cookies,
			context: self.context,
			refresh_policy: self.refresh_policy,
			refresh_path: self.refresh_path,
			timeout: self.timeout,
		})
	}
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
		field,
		value: raw.to_owned(),
		source,
	})?;

	match url.scheme() {
		"http" | "https" => Ok(url),
		_ => Err(ConfigError::UnsupportedScheme { field, url: url.to_string() }),
	}
}

fn parse_header_name(raw: &str) -> Result<HeaderName, ConfigError> {
	HeaderName::from_bytes(raw.as_bytes())
		.map_err(|_| ConfigError::InvalidHeaderName { name: raw.to_owned() })
}

fn validate_cookie_name(name: &str) -> Result<(), ConfigError> {
	let invalid = name.is_empty()
		|| name.chars().any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | ',' | '='));

	if invalid { Err(ConfigError::InvalidCookieName { name: name.to_owned() }) } else { Ok(()) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builder_applies_defaults() {
		let config = ClientConfig::builder("https://api.example.com/v1")
			.build()
			.expect("Config with defaults should build.");

		assert_eq!(config.auth_header.as_str(), "authorization");
		assert_eq!(config.captcha_header.as_str(), "x-recaptcha-token");
		assert_eq!(config.cookies.name(TokenKind::Access), "accessToken");
		assert!(config.cookies.is_claims_bearing(TokenKind::Access));
		assert!(!config.cookies.is_claims_bearing(TokenKind::Refresh));
		assert_eq!(config.context, ExecutionContext::Client);
		assert_eq!(config.refresh_policy, RefreshPolicy::PerRequest);
		assert_eq!(config.refresh_path, "/auth/refresh-token");
	}

	#[test]
	fn builder_rejects_invalid_values() {
		assert!(matches!(
			ClientConfig::builder("not a url").build(),
			Err(ConfigError::InvalidUrl { field: "api", .. })
		));
		assert!(matches!(
			ClientConfig::builder("ftp://example.com").build(),
			Err(ConfigError::UnsupportedScheme { field: "api", .. })
		));
		assert!(matches!(
			ClientConfig::builder("https://example.com").auth_header("bad header").build(),
			Err(ConfigError::InvalidHeaderName { .. })
		));
		assert!(matches!(
			ClientConfig::builder("https://example.com")
				.cookies(CookieConfig { refresh_name: "accessToken".into(), ..CookieConfig::default() })
				.build(),
			Err(ConfigError::DuplicateCookieName { .. })
		));
		assert!(matches!(
			ClientConfig::builder("https://example.com").refresh_path("auth/refresh").build(),
			Err(ConfigError::InvalidRefreshPath { .. })
		));
	}

	#[test]
	fn lookup_falls_back_to_defaults() {
		let config = ClientConfig::from_lookup(|key| match key {
			"RECAPTCHA_HEADERS_KEY" => Some("X-Captcha".into()),
			"RECAPTCHA_SITE_KEY" => Some("site-key".into()),
			"APP_URL" => Some("   ".into()),
			_ => None,
		})
		.expect("Lookup-based config should build.");

		assert_eq!(config.api_url.as_str(), DEFAULT_API_URL);
		assert_eq!(config.app_url.as_ref().map(Url::as_str), Some("http://localhost:3000/"));
		assert_eq!(config.captcha_header.as_str(), "x-captcha");
		assert_eq!(config.recaptcha_site_key.as_deref(), Some("site-key"));
	}

	#[test]
	fn resolve_appends_paths_to_base() {
		let config = ClientConfig::builder("http://localhost:3000/api/")
			.build()
			.expect("Config should build.");

		assert_eq!(
			config.resolve("/auth/user/42?full=1").expect("Path should resolve.").as_str(),
			"http://localhost:3000/api/auth/user/42?full=1"
		);
		assert_eq!(
			config.resolve("auth/login").expect("Path should resolve.").as_str(),
			"http://localhost:3000/api/auth/login"
		);
	}
}
