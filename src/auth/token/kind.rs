//! Token kind discriminator shared by the token store and cookie configuration.

// self
use crate::_prelude::*;

/// The two tokens a session carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Short-lived bearer token sent with every request.
	Access,
	/// Long-lived opaque token exchanged for a new pair on 401.
	Refresh,
}
impl TokenKind {
	/// Both kinds, access first.
	pub const ALL: [TokenKind; 2] = [TokenKind::Access, TokenKind::Refresh];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Access => "access",
			TokenKind::Refresh => "refresh",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
