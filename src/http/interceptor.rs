//! Refresh-and-replay handling for 401 responses.
//!
//! A 401 with no stored refresh token clears both tokens and returns the server's
//! envelope. Otherwise exactly one refresh call is made; on success the new pair is
//! persisted and the original request is replayed once with the new bearer, and on failure
//! both tokens are cleared. Under [`RefreshPolicy::Coalesced`] refreshes are serialized and a
//! caller that finds the refresh token already rotated reuses the stored access token.

// self
use crate::{
	_prelude::*,
	auth::{TokenKind, TokenPair, TokenSecret},
	cancel::CancelSignal,
	config::RefreshPolicy,
	envelope::{ApiResponse, FailureKind},
	http::{self, ApiClient, PreparedRequest, RawResponse, RequestBody},
	obs::{self, CallOutcome, CallPhase, CallSpan},
	services::auth::RefreshTokenParams,
};

type RefreshOutcome = Result<TokenSecret, Option<String>>;

impl ApiClient {
	pub(crate) async fn recover_unauthorized<T>(
		&self,
		request: &PreparedRequest,
		signal: &CancelSignal,
		raw: RawResponse,
	) -> ApiResponse<T>
	where
		T: DeserializeOwned,
	{
		let Some(refresh_token) = self.read_token(TokenKind::Refresh) else {
			tracing::debug!("unauthorized without a refresh token");
			self.clear_tokens();

			return http::error_envelope::<T>(&raw).with_failure_kind(FailureKind::AuthExpired);
		};
		let refreshed = match self.config().refresh_policy {
			RefreshPolicy::PerRequest => self.refresh(&refresh_token).await,
			RefreshPolicy::Coalesced => self.refresh_coalesced(refresh_token).await,
		};

		match refreshed {
			Ok(access_token) => self.replay(request, signal, &access_token).await,
			Err(message) => {
				self.metrics.record_refresh_failure();
				self.clear_tokens();

				ApiResponse::failure(FailureKind::AuthExpired, message)
			},
		}
	}

	async fn refresh_coalesced(&self, observed: TokenSecret) -> RefreshOutcome {
		let _guard = self.refresh_guard.lock().await;

		match self.read_token(TokenKind::Refresh) {
			Some(current) if current == observed => self.refresh(&current).await,
			Some(current) => match self.read_token(TokenKind::Access) {
				Some(access_token) => {
					tracing::debug!("reusing tokens rotated by a concurrent refresh");

					Ok(access_token)
				},
				None => self.refresh(&current).await,
			},
			None => Err(Some("Refresh token is no longer available.".into())),
		}
	}

	async fn refresh(&self, refresh_token: &TokenSecret) -> RefreshOutcome {
		let path = self.config().refresh_path.clone();
		let span = CallSpan::new(CallPhase::Refresh, &Method::POST, &path);

		span.instrument(async {
			self.metrics.record_refresh_attempt();
			obs::record_call_outcome(CallPhase::Refresh, CallOutcome::Attempt);

			let outcome = self.exchange_refresh_token(&path, refresh_token).await;

			match &outcome {
				Ok(_) => {
					tracing::debug!("refreshed token pair");
					obs::record_call_outcome(CallPhase::Refresh, CallOutcome::Success);
				},
				Err(message) => {
					tracing::warn!(reason = message.as_deref().unwrap_or_default(), "token refresh failed");
					obs::record_call_outcome(CallPhase::Refresh, CallOutcome::Failure);
				},
			}

			outcome
		})
		.await
	}

	async fn exchange_refresh_token(&self, path: &str, refresh_token: &TokenSecret) -> RefreshOutcome {
		let url = self.config().resolve(path).map_err(|e| Some(e.to_string()))?;
		let params = RefreshTokenParams { refresh_token: refresh_token.clone() };
		let body = serde_json::to_value(&params).map_err(|e| Some(e.to_string()))?;
		let request = PreparedRequest::new(Method::POST, url).with_body(RequestBody::Json(body));
		// The refresh call still carries the current bearer and cannot be aborted.
		let access_token = self.read_token(TokenKind::Access);
		let raw = self
			.dispatch(&request, &CancelSignal::never(), access_token.as_ref())
			.await
			.map_err(|e| Some(e.to_string()))?;
		let pair = match http::normalize::<TokenPair>(raw) {
			ApiResponse::Success { data, .. } => data,
			ApiResponse::Failure { message, .. } => return Err(message),
		};

		self.tokens().save_pair(&pair, None).map_err(|e| Some(e.to_string()))?;

		Ok(pair.access_token)
	}

	async fn replay<T>(
		&self,
		request: &PreparedRequest,
		signal: &CancelSignal,
		access_token: &TokenSecret,
	) -> ApiResponse<T>
	where
		T: DeserializeOwned,
	{
		let span = CallSpan::new(CallPhase::Replay, &request.method, request.url.path());

		span.instrument(async {
			self.metrics.record_replay();
			obs::record_call_outcome(CallPhase::Replay, CallOutcome::Attempt);

			// A second 401 is normalized like any other error status.
			let response = match self.dispatch(request, signal, Some(access_token)).await {
				Ok(raw) => http::normalize(raw),
				Err(e) => http::transport_failure(e),
			};

			obs::record_call_outcome(CallPhase::Replay, http::settled_outcome(&response));

			response
		})
		.await
	}
}
