//! Typed endpoint functions built from an [`ApiClient`].
//!
//! A [`Service`] fixes the method, path, payload types, and service-level defaults of one
//! endpoint. Each call layers its own [`RequestConfig`] and [`ServiceOptions`] on top,
//! registers with the client's cancellation registry, and raises a generic alert for
//! failures when enabled.

mod notify;
mod options;

pub use notify::*;
pub use options::*;

// crates.io
use reqwest::header::CONTENT_TYPE;
// self
use crate::{
	_prelude::*,
	cancel::{self, AbortLease},
	config::ExecutionContext,
	envelope::{ApiResponse, FailureKind},
	error::TransportError,
	http::{ApiClient, PreparedRequest, RequestBody, RequestConfig, form},
};

impl ApiClient {
	/// Builds a `GET` service; parameters, if any, become query pairs.
	pub fn get<T>(&self, path: impl Into<String>) -> Service<T> {
		Service::new(self.clone(), Method::GET, path)
	}

	/// Builds a `POST` service.
	pub fn post<T, P>(&self, path: impl Into<String>) -> Service<T, P> {
		Service::new(self.clone(), Method::POST, path)
	}

	/// Builds a `PUT` service.
	pub fn put<T, P>(&self, path: impl Into<String>) -> Service<T, P> {
		Service::new(self.clone(), Method::PUT, path)
	}

	/// Builds a `PATCH` service.
	pub fn patch<T, P>(&self, path: impl Into<String>) -> Service<T, P> {
		Service::new(self.clone(), Method::PATCH, path)
	}

	/// Builds a `DELETE` service; parameters, if any, become query pairs.
	pub fn delete<T>(&self, path: impl Into<String>) -> Service<T> {
		Service::new(self.clone(), Method::DELETE, path)
	}
}

/// One endpoint returning `ApiResponse<T>` for parameters of type `P`.
pub struct Service<T, P = ()> {
	client: ApiClient,
	method: Method,
	path: String,
	config: RequestConfig,
	options: ServiceOptions,
	_marker: PhantomData<fn(&P) -> T>,
}
impl<T, P> Service<T, P> {
	fn new(client: ApiClient, method: Method, path: impl Into<String>) -> Self {
		Self {
			client,
			method,
			path: path.into(),
			config: RequestConfig::default(),
			options: ServiceOptions::default(),
			_marker: PhantomData,
		}
	}

	/// Sets the request configuration applied to every call.
	pub fn with_config(mut self, config: RequestConfig) -> Self {
		self.config = config;

		self
	}

	/// Sets the options applied to every call, under the per-call overrides.
	pub fn with_options(mut self, options: ServiceOptions) -> Self {
		self.options = options;

		self
	}

	/// Changes the parameter type, keeping everything else.
	pub fn with_params<Q>(self) -> Service<T, Q> {
		Service {
			client: self.client,
			method: self.method,
			path: self.path,
			config: self.config,
			options: self.options,
			_marker: PhantomData,
		}
	}

	/// HTTP method of this endpoint.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Path of this endpoint, relative to the API base URL.
	pub fn path(&self) -> &str {
		&self.path
	}
}
impl<T, P> Service<T, P>
where
	T: DeserializeOwned,
	P: Serialize,
{
	/// Calls the endpoint with the service-level configuration.
	pub async fn call(&self, params: Option<&P>) -> ApiResponse<T> {
		self.call_with(params, RequestConfig::default(), ServiceOptions::default()).await
	}

	/// Calls the endpoint with per-call configuration and options layered on top.
	pub async fn call_with(
		&self,
		params: Option<&P>,
		config: RequestConfig,
		options: ServiceOptions,
	) -> ApiResponse<T> {
		let options = self.options.clone().merge(options).resolve();
		let response = match self.prepare(params, config, &options) {
			Ok(request) => {
				let lease = if options.auto_abort {
					self.client.registry().register(cancel::fingerprint(
						&request.url,
						options.abort_with_query,
						options.custom_abort_key.as_deref(),
					))
				} else {
					AbortLease::detached()
				};
				let response = self.client.send(request, lease.signal()).await;

				lease.done();

				response
			},
			Err(e) => {
				tracing::warn!(
					method = %self.method,
					path = %self.path,
					error = %e,
					"request could not be built"
				);

				ApiResponse::failure(FailureKind::InvalidRequest, e.to_string())
			},
		};

		self.alert(&options, &response);

		response
	}

	fn prepare(
		&self,
		params: Option<&P>,
		config: RequestConfig,
		options: &ResolvedOptions,
	) -> Result<PreparedRequest, TransportError> {
		let url = self
			.client
			.config()
			.resolve(&self.path)
			.map_err(|source| TransportError::InvalidUrl { url: self.path.clone(), source })?;
		let mut config = self.config.clone().merge(config);
		let mut body = RequestBody::Empty;

		if let Some(params) = params {
			let value =
				serde_json::to_value(params).map_err(|source| TransportError::Encode { source })?;

			if matches!(self.method, Method::GET | Method::DELETE) {
				if !value.is_null() {
					let pairs = form::flatten(&value).ok_or_else(|| TransportError::Encode {
						source: serde::ser::Error::custom("query parameters must be an object"),
					})?;

					config = config.merge(RequestConfig { query: pairs, ..Default::default() });
				}
			} else {
				body = match (options.is_form_data, form::flatten(&value)) {
					(true, Some(fields)) => {
						config = config.merge(RequestConfig::new().header(
							CONTENT_TYPE,
							HeaderValue::from_static("multipart/form-data"),
						));

						RequestBody::Form(fields)
					},
					_ => RequestBody::Json(value),
				};
			}
		}
		if let Some(token) = options.re_captcha_token.as_deref() {
			let value = HeaderValue::from_str(token).map_err(|e| TransportError::Encode {
				source: serde::ser::Error::custom(e),
			})?;

			config = config.merge(
				RequestConfig::new().header(self.client.config().captcha_header.clone(), value),
			);
		}

		Ok(PreparedRequest::new(self.method.clone(), url).with_body(body).with_config(config))
	}

	fn alert(&self, options: &ResolvedOptions, response: &ApiResponse<T>) {
		if !options.auto_generic_alert || self.client.config().context != ExecutionContext::Client {
			return;
		}

		match response {
			ApiResponse::Failure { message: Some(message), kind }
				if *kind != FailureKind::Cancelled && !message.is_empty() =>
				self.client.notifier().notify(message),
			_ => (),
		}
	}
}
impl<T, P> Clone for Service<T, P> {
	fn clone(&self) -> Self {
		Self {
			client: self.client.clone(),
			method: self.method.clone(),
			path: self.path.clone(),
			config: self.config.clone(),
			options: self.options.clone(),
			_marker: PhantomData,
		}
	}
}
impl<T, P> Debug for Service<T, P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("Service")
			.field("method", &self.method)
			.field("path", &self.path)
			.field("config", &self.config)
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
