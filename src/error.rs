//! Crate-level error types shared across the client, token store, and configuration.
//!
//! HTTP-layer failures never surface through these types at the service boundary; they are
//! folded into [`ApiResponse`](crate::envelope::ApiResponse) failures. What does propagate is
//! configuration mistakes, cookie jar backend failures, and token-store misuse.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cookie jar failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (network, timeout, cancellation, encoding).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A claims-bearing token could not be decoded while persisting it.
	#[error(transparent)]
	MalformedToken(#[from] crate::auth::ClaimsError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid: {value}.")]
	InvalidUrl {
		/// Which configuration field failed.
		field: &'static str,
		/// Raw value that failed to parse.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured URL uses a scheme other than HTTP(S).
	#[error("The {field} URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which configuration field failed.
		field: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// Header name is not a valid HTTP token.
	#[error("Header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Rejected header name.
		name: String,
	},
	/// Header value contains bytes HTTP does not allow.
	#[error("Header value for `{name}` is invalid.")]
	InvalidHeaderValue {
		/// Header the value was meant for.
		name: String,
	},
	/// Cookie names must be non-empty and free of separators.
	#[error("Cookie name `{name}` is invalid.")]
	InvalidCookieName {
		/// Rejected cookie name.
		name: String,
	},
	/// Access and refresh cookies must not share a name.
	#[error("Access and refresh cookies share the name `{name}`.")]
	DuplicateCookieName {
		/// Shared cookie name.
		name: String,
	},
	/// Refresh path must be an absolute path relative to the API base URL.
	#[error("Refresh path must start with `/`: {path}.")]
	InvalidRefreshPath {
		/// Rejected path.
		path: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, cancellation, payload encoding).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request was aborted because a newer request took over its fingerprint.
	#[error("canceled")]
	Cancelled,
	/// The request exceeded its timeout.
	#[error("Request timed out while calling {url}.")]
	Timeout {
		/// Target URL.
		url: String,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request URL could not be resolved against the API base URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// Raw URL that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request parameters could not be encoded.
	#[error("Request parameters could not be encoded: {source}.")]
	Encode {
		/// Serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Response body is not a valid envelope for the expected payload.
	#[error("Response body could not be decoded at `{path}`: {message}.", path = .source.path(), message = .source.inner())]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}
impl TransportError {
	/// Classifies a reqwest failure for the provided URL.
	pub fn from_reqwest(url: &Url, e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout { url: url.to_string() }
		} else {
			Self::Network { url: url.to_string(), source: Box::new(e) }
		}
	}

	/// Returns `true` when the failure came from request cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}
