//! Login, registration, refresh, profile lookup, and logout.
//!
//! Login and registration persist the returned token pair so later calls carry the new
//! bearer; a malformed access token in that pair propagates as
//! [`Error::MalformedToken`](crate::error::Error::MalformedToken).

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	endpoints,
	envelope::{ApiResponse, FailureKind},
	http::ApiClient,
	service::Service,
	store::RequestContext,
};

/// Credentials posted to the login endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginParams {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}

/// Account details posted to the register endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterParams {
	/// Display name.
	pub name: String,
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}

/// Body of the refresh-token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenParams {
	/// Refresh token to exchange.
	pub refresh_token: TokenSecret,
}

/// User profile returned by the get-user endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// User id.
	pub id: String,
	/// Account email.
	pub email: String,
	/// Display name.
	pub name: String,
	/// Role label.
	pub role: String,
	/// Avatar URL.
	pub avatar: String,
	/// Creation timestamp.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Last update timestamp.
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

/// Authentication services bound to one client.
#[derive(Clone, Debug)]
pub struct AuthApi {
	client: ApiClient,
	login: Service<TokenPair, LoginParams>,
	register: Service<TokenPair, RegisterParams>,
	refresh: Service<TokenPair, RefreshTokenParams>,
}
impl AuthApi {
	/// Builds the services against `client`.
	pub fn new(client: ApiClient) -> Self {
		let login = client.post(endpoints::auth::LOGIN);
		let register = client.post(endpoints::auth::REGISTER);
		let refresh = client.post(endpoints::auth::REFRESH_TOKEN);

		Self { client, login, register, refresh }
	}

	/// Logs in and stores the returned token pair.
	pub async fn login(&self, params: &LoginParams) -> Result<ApiResponse<TokenPair>> {
		let response = self.login.call(Some(params)).await;

		self.persist(response)
	}

	/// Registers an account and stores the returned token pair.
	pub async fn register(&self, params: &RegisterParams) -> Result<ApiResponse<TokenPair>> {
		let response = self.register.call(Some(params)).await;

		self.persist(response)
	}

	/// Exchanges a refresh token without touching the stored tokens.
	pub async fn refresh_token(&self, params: &RefreshTokenParams) -> ApiResponse<TokenPair> {
		self.refresh.call(Some(params)).await
	}

	/// Fetches a user profile.
	pub async fn get_user(&self, id: &str) -> ApiResponse<User> {
		match endpoints::auth::GET_USER.fill(&[("userId", id)]) {
			Ok(path) => self.client.get::<User>(path).call(None).await,
			Err(e) => ApiResponse::failure(FailureKind::InvalidRequest, e.to_string()),
		}
	}

	/// Removes both tokens from the client jar, or from `ctx` when given.
	pub fn logout(&self, ctx: Option<&RequestContext>) -> Result<()> {
		self.client.tokens().clear(ctx)?;

		tracing::debug!("logged out");

		Ok(())
	}

	fn persist(&self, response: ApiResponse<TokenPair>) -> Result<ApiResponse<TokenPair>> {
		if let Some(pair) = response.data() {
			self.client.tokens().save_pair(pair, None)?;
		}

		Ok(response)
	}
}
