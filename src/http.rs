//! HTTP client that turns every outcome into an [`ApiResponse`].
//!
//! [`ApiClient`] owns the reqwest transport, the [`TokenStore`], the per-client
//! [`CancellationRegistry`], and call counters. [`ApiClient::send`] injects the bearer
//! credential, races the request against its cancellation signal, and normalizes the
//! response; HTTP-level failures never escape as `Err`. A 401 runs through the refresh and
//! replay cycle before the caller sees a result.

pub mod form;
mod interceptor;
mod metrics;

pub use metrics::CallMetrics;

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::{
	header::{ACCEPT, CONTENT_TYPE},
	multipart::Form,
};
// self
use crate::{
	_prelude::*,
	auth::{TokenKind, TokenSecret},
	cancel::{CancelSignal, CancellationRegistry},
	config::ClientConfig,
	envelope::{self, ApiResponse, FailureKind},
	error::{ConfigError, TransportError},
	obs::{self, CallOutcome, CallPhase, CallSpan},
	service::{NoopNotifier, Notifier},
	store::{CookieJar, TokenStore},
};

/// Per-service or per-call request configuration.
#[derive(Clone, Debug, Default)]
pub struct RequestConfig {
	/// Extra request headers.
	pub headers: HeaderMap,
	/// Query pairs appended to the request URL.
	pub query: Vec<(String, String)>,
	/// Request timeout overriding the client default.
	pub timeout: Option<StdDuration>,
}
impl RequestConfig {
	/// Creates an empty configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a header, replacing any previous value for the same name.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a header from raw strings, validating both parts.
	pub fn try_header(self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let header = HeaderName::from_bytes(name.as_bytes())
			.map_err(|_| ConfigError::InvalidHeaderName { name: name.to_owned() })?;
		let value = HeaderValue::from_str(value)
			.map_err(|_| ConfigError::InvalidHeaderValue { name: name.to_owned() })?;

		Ok(self.header(header, value))
	}

	/// Sets a query pair, replacing earlier pairs with the same key.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let key = key.into();

		self.query.retain(|(existing, _)| existing != &key);
		self.query.push((key, value.into()));

		self
	}

	/// Sets the request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Layers `other` on top of `self`.
	///
	/// Headers and query keys present in `other` replace those in `self`; the timeout of
	/// `other` wins when set.
	pub fn merge(mut self, other: RequestConfig) -> Self {
		self.headers.extend(other.headers);

		if !other.query.is_empty() {
			self.query.retain(|(key, _)| !other.query.iter().any(|(k, _)| k == key));
			self.query.extend(other.query);
		}

		self.timeout = other.timeout.or(self.timeout);

		self
	}
}

/// Encoded request payload.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document.
	Json(serde_json::Value),
	/// Multipart form with flattened text fields.
	Form(Vec<(String, String)>),
}

/// A fully resolved request, ready to be sent and, after a refresh, replayed.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including query.
	pub url: Url,
	/// Request headers, excluding the bearer credential.
	pub headers: HeaderMap,
	/// Request payload.
	pub body: RequestBody,
	/// Request timeout overriding the client default.
	pub timeout: Option<StdDuration>,
}
impl PreparedRequest {
	/// Creates a bodiless request.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: RequestBody::Empty, timeout: None }
	}

	/// Replaces the request body.
	pub fn with_body(mut self, body: RequestBody) -> Self {
		self.body = body;

		self
	}

	/// Applies headers, query pairs, and timeout from `config`.
	pub fn with_config(mut self, config: RequestConfig) -> Self {
		if !config.query.is_empty() {
			self.url
				.query_pairs_mut()
				.extend_pairs(config.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		self.headers.extend(config.headers);
		self.timeout = config.timeout.or(self.timeout);

		self
	}
}

/// Status and body of a response that reached the client.
#[derive(Clone, Debug)]
pub(crate) struct RawResponse {
	pub(crate) status: StatusCode,
	pub(crate) body: Vec<u8>,
}

/// Envelope-producing HTTP client shared by every service.
#[derive(Clone)]
pub struct ApiClient {
	http: ReqwestClient,
	config: Arc<ClientConfig>,
	tokens: TokenStore,
	registry: CancellationRegistry,
	notifier: Arc<dyn Notifier>,
	refresh_guard: Arc<AsyncMutex<()>>,
	metrics: Arc<CallMetrics>,
}
impl ApiClient {
	/// Creates a client with a reqwest transport honoring the configured timeout.
	pub fn new(config: ClientConfig, jar: Arc<dyn CookieJar>) -> Result<Self> {
		let mut builder = ReqwestClient::builder();

		if let Some(timeout) = config.timeout {
			builder = builder.timeout(timeout);
		}

		let http = builder.build().map_err(ConfigError::from)?;

		Ok(Self::with_http_client(config, jar, http))
	}

	/// Creates a client around an existing reqwest transport.
	pub fn with_http_client(
		config: ClientConfig,
		jar: Arc<dyn CookieJar>,
		http: ReqwestClient,
	) -> Self {
		let tokens = TokenStore::new(jar, config.cookies.clone());
		let registry = CancellationRegistry::new(config.context);

		Self {
			http,
			config: Arc::new(config),
			tokens,
			registry,
			notifier: Arc::new(NoopNotifier),
			refresh_guard: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Installs the notifier used for generic failure alerts.
	pub fn with_notifier<N>(mut self, notifier: N) -> Self
	where
		N: 'static + Notifier,
	{
		self.notifier = Arc::new(notifier);

		self
	}

	/// Client configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Token store backing the bearer credential.
	pub fn tokens(&self) -> &TokenStore {
		&self.tokens
	}

	/// Cancellation registry owned by this client.
	pub fn registry(&self) -> &CancellationRegistry {
		&self.registry
	}

	/// Call counters for this client and its clones.
	pub fn metrics(&self) -> &CallMetrics {
		&self.metrics
	}

	pub(crate) fn notifier(&self) -> &dyn Notifier {
		self.notifier.as_ref()
	}

	/// Sends `request` and normalizes the outcome into an envelope.
	///
	/// The stored access token, when present, is sent as a bearer credential. A 401 triggers
	/// at most one refresh and one replay. `signal` aborts the request when it fires.
	pub async fn send<T>(&self, request: PreparedRequest, signal: &CancelSignal) -> ApiResponse<T>
	where
		T: DeserializeOwned,
	{
		let span = CallSpan::new(CallPhase::Request, &request.method, request.url.path());

		span.instrument(async {
			self.metrics.record_call();
			obs::record_call_outcome(CallPhase::Request, CallOutcome::Attempt);

			let bearer = self.read_token(TokenKind::Access);
			let response = match self.dispatch(&request, signal, bearer.as_ref()).await {
				Ok(raw) if raw.status == StatusCode::UNAUTHORIZED =>
					self.recover_unauthorized(&request, signal, raw).await,
				Ok(raw) => normalize(raw),
				Err(e) => transport_failure(e),
			};
			let outcome = settled_outcome(&response);

			self.metrics.record_settled(outcome);
			obs::record_call_outcome(CallPhase::Request, outcome);

			response
		})
		.await
	}

	pub(crate) async fn dispatch(
		&self,
		request: &PreparedRequest,
		signal: &CancelSignal,
		bearer: Option<&TokenSecret>,
	) -> Result<RawResponse, TransportError> {
		let mut headers = request.headers.clone();

		headers.entry(ACCEPT).or_insert(HeaderValue::from_static("application/json"));

		if let Some(token) = bearer {
			match HeaderValue::from_str(&token.bearer()) {
				Ok(mut value) => {
					value.set_sensitive(true);
					headers.insert(self.config.auth_header.clone(), value);
				},
				Err(_) => tracing::warn!("stored access token is not a valid header value"),
			}
		}

		let mut builder = self.http.request(request.method.clone(), request.url.clone());

		match &request.body {
			RequestBody::Empty => builder = builder.headers(headers),
			RequestBody::Json(value) => {
				let body = serde_json::to_vec(value).map_err(|source| TransportError::Encode { source })?;

				headers.entry(CONTENT_TYPE).or_insert(HeaderValue::from_static("application/json"));

				builder = builder.headers(headers).body(body);
			},
			RequestBody::Form(fields) => {
				let form = fields
					.iter()
					.fold(Form::new(), |form, (key, value)| form.text(key.clone(), value.clone()));

				// The encoder supplies the boundary.
				headers.remove(CONTENT_TYPE);

				builder = builder.headers(headers).multipart(form);
			},
		}

		if let Some(timeout) = request.timeout {
			builder = builder.timeout(timeout);
		}

		let url = &request.url;
		let exchange = async {
			let response =
				builder.send().await.map_err(|e| TransportError::from_reqwest(url, e))?;
			let status = response.status();
			let body = response.bytes().await.map_err(|e| TransportError::from_reqwest(url, e))?;

			Ok(RawResponse { status, body: body.to_vec() })
		};

		tokio::select! {
			biased;
			_ = signal.cancelled() => Err(TransportError::Cancelled),
			result = exchange => result,
		}
	}

	pub(crate) fn read_token(&self, kind: TokenKind) -> Option<TokenSecret> {
		match self.tokens.get(kind, None) {
			Ok(token) => token.filter(|token| !token.is_empty()),
			Err(e) => {
				tracing::warn!(error = %e, %kind, "failed to read token");

				None
			},
		}
	}

	pub(crate) fn clear_tokens(&self) {
		match self.tokens.clear(None) {
			Ok(()) => tracing::debug!("cleared stored tokens"),
			Err(e) => tracing::warn!(error = %e, "failed to clear stored tokens"),
		}
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("tokens", &self.tokens)
			.field("registry", &self.registry)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}

/// Normalizes a response that reached the client.
pub(crate) fn normalize<T>(raw: RawResponse) -> ApiResponse<T>
where
	T: DeserializeOwned,
{
	if raw.status.is_success() {
		return decode_envelope(&raw).unwrap_or_else(|e| {
			tracing::warn!(
				status = raw.status.as_u16(),
				error = %e,
				"response envelope did not decode"
			);

			ApiResponse::failure(FailureKind::Decode, e.to_string())
		});
	}

	error_envelope(&raw)
}

/// The server's own envelope when the body carries one, else a generic status failure.
pub(crate) fn error_envelope<T>(raw: &RawResponse) -> ApiResponse<T>
where
	T: DeserializeOwned,
{
	decode_envelope(raw).unwrap_or_else(|_| {
		ApiResponse::failure(
			FailureKind::Transport,
			format!("Request failed with status code {}", raw.status.as_u16()),
		)
	})
}

fn decode_envelope<T>(raw: &RawResponse) -> Result<ApiResponse<T>, TransportError>
where
	T: DeserializeOwned,
{
	envelope::decode_json(&raw.body)
		.map_err(|source| TransportError::Decode { source, status: raw.status.as_u16() })
}

pub(crate) fn transport_failure<T>(e: TransportError) -> ApiResponse<T> {
	let kind = if e.is_cancelled() { FailureKind::Cancelled } else { FailureKind::Transport };

	ApiResponse::failure(kind, e.to_string())
}

pub(crate) fn settled_outcome<T>(response: &ApiResponse<T>) -> CallOutcome {
	match response.failure_kind() {
		None => CallOutcome::Success,
		Some(FailureKind::Cancelled) => CallOutcome::Cancelled,
		Some(_) => CallOutcome::Failure,
	}
}
