//! Access/refresh token pair as issued by the login, register, and refresh endpoints.

// self
use crate::{
	_prelude::*,
	auth::{TokenKind, TokenSecret},
};

/// Token pair returned by the auth endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret; callers must avoid logging it.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}

	/// Returns the secret for the requested kind.
	pub fn get(&self, kind: TokenKind) -> &TokenSecret {
		match kind {
			TokenKind::Access => &self.access_token,
			TokenKind::Refresh => &self.refresh_token,
		}
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}
