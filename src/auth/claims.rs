//! Unverified JWT claims decoding used to derive cookie expiry.
//!
//! The signature is never checked here; the server remains the authority. Only the
//! payload segment is inspected so the cookie can expire together with the token.

// crates.io
use base64::{
	Engine,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::_prelude::*;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while decoding a claims-bearing token.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// The token does not have the `header.payload.signature` shape.
	#[error("Token must have three dot-separated segments, found {found}.")]
	Segments {
		/// Number of segments present.
		found: usize,
	},
	/// The payload segment is not base64url.
	#[error("Token payload is not valid base64url.")]
	Base64 {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// The payload is not a JSON object.
	#[error("Token payload is not a JSON claims object.")]
	Json {
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// The `exp` claim is present but not a numeric date.
	#[error("Token `exp` claim is not a numeric date.")]
	InvalidExpiry,
	/// The `exp` claim cannot be represented as a timestamp.
	#[error("Token `exp` claim is out of range: {exp}.")]
	ExpiryOutOfRange {
		/// Raw claim value.
		exp: i64,
	},
}

/// Subset of registered claims the token store cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenClaims {
	/// `sub` claim, if present.
	pub subject: Option<String>,
	/// `exp` claim converted to an instant, if present.
	pub expires_at: Option<OffsetDateTime>,
}

#[derive(Deserialize)]
struct RawClaims {
	#[serde(default)]
	sub: Option<String>,
	#[serde(default)]
	exp: Option<serde_json::Number>,
}

/// Decodes the payload segment of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
	let segments = token.split('.').collect::<Vec<_>>();

	if segments.len() != 3 {
		return Err(ClaimsError::Segments { found: segments.len() });
	}

	let payload = PAYLOAD_ENGINE
		.decode(segments[1])
		.map_err(|source| ClaimsError::Base64 { source })?;
	let raw: RawClaims =
		serde_json::from_slice(&payload).map_err(|source| ClaimsError::Json { source })?;
	let expires_at = raw.exp.map(numeric_date).transpose()?;

	Ok(TokenClaims { subject: raw.sub, expires_at })
}

fn numeric_date(value: serde_json::Number) -> Result<OffsetDateTime, ClaimsError> {
	let exp = match value.as_i64() {
		Some(exp) => exp,
		None => value
			.as_f64()
			.filter(|exp| exp.is_finite())
			.map(|exp| exp.trunc() as i64)
			.ok_or(ClaimsError::InvalidExpiry)?,
	};

	OffsetDateTime::from_unix_timestamp(exp).map_err(|_| ClaimsError::ExpiryOutOfRange { exp })
}
