//! Uniform success/error envelope returned by every service call.
//!
//! On the wire the envelope is `{"success": bool, "message": string|null, "data": T|null}`.
//! In Rust it is a sum type, so `data` exists exactly when the call succeeded.

// crates.io
use serde::{Deserializer, Serializer, de::Error as _, ser::SerializeStruct};
// self
use crate::_prelude::*;

/// Why a call ended in [`ApiResponse::Failure`].
///
/// Local metadata only; it is never serialized, and envelopes read off the wire are
/// [`FailureKind::Service`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FailureKind {
	/// The server answered with `success: false`.
	#[default]
	Service,
	/// Network failure, timeout, or an HTTP error without a server envelope.
	Transport,
	/// The request was aborted by a newer request sharing its fingerprint.
	Cancelled,
	/// 401 without a usable refresh token, or the refresh itself failed.
	AuthExpired,
	/// The request could not be built (bad path or unserializable parameters).
	InvalidRequest,
	/// The response body did not match the expected envelope.
	Decode,
}
impl FailureKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureKind::Service => "service",
			FailureKind::Transport => "transport",
			FailureKind::Cancelled => "cancelled",
			FailureKind::AuthExpired => "auth_expired",
			FailureKind::InvalidRequest => "invalid_request",
			FailureKind::Decode => "decode",
		}
	}
}
impl Display for FailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Result of a service call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiResponse<T> {
	/// The call succeeded and carries its payload.
	Success {
		/// Response payload.
		data: T,
		/// Optional server message.
		message: Option<String>,
	},
	/// The call failed; no payload exists.
	Failure {
		/// Human-readable failure message.
		message: Option<String>,
		/// Local failure classification.
		kind: FailureKind,
	},
}
impl<T> ApiResponse<T> {
	/// Successful envelope with an empty message.
	pub fn success(data: T) -> Self {
		Self::Success { data, message: Some(String::new()) }
	}

	/// Service-level failure envelope.
	pub fn error(message: impl Into<Option<String>>) -> Self {
		Self::failure(FailureKind::Service, message)
	}

	/// Failure envelope with an explicit classification.
	pub fn failure(kind: FailureKind, message: impl Into<Option<String>>) -> Self {
		Self::Failure { message: message.into(), kind }
	}

	/// Returns `true` for [`ApiResponse::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Returns `true` when the call was aborted by a newer request.
	pub fn is_cancelled(&self) -> bool {
		self.failure_kind() == Some(FailureKind::Cancelled)
	}

	/// Payload of a successful call.
	pub fn data(&self) -> Option<&T> {
		match self {
			Self::Success { data, .. } => Some(data),
			Self::Failure { .. } => None,
		}
	}

	/// Consumes the envelope, returning the payload of a successful call.
	pub fn into_data(self) -> Option<T> {
		match self {
			Self::Success { data, .. } => Some(data),
			Self::Failure { .. } => None,
		}
	}

	/// Message attached to either variant.
	pub fn message(&self) -> Option<&str> {
		match self {
			Self::Success { message, .. } | Self::Failure { message, .. } => message.as_deref(),
		}
	}

	/// Classification of a failed call.
	pub fn failure_kind(&self) -> Option<FailureKind> {
		match self {
			Self::Success { .. } => None,
			Self::Failure { kind, .. } => Some(*kind),
		}
	}

	/// Maps the payload of a successful call.
	pub fn map<U, F>(self, f: F) -> ApiResponse<U>
	where
		F: FnOnce(T) -> U,
	{
		match self {
			Self::Success { data, message } => ApiResponse::Success { data: f(data), message },
			Self::Failure { message, kind } => ApiResponse::Failure { message, kind },
		}
	}

	/// Reclassifies a failure; successes pass through.
	pub fn with_failure_kind(self, kind: FailureKind) -> Self {
		match self {
			Self::Failure { message, .. } => Self::Failure { message, kind },
			success => success,
		}
	}

	/// Converts into a `Result`, keeping the failure message and kind.
	pub fn into_result(self) -> Result<T, (FailureKind, Option<String>)> {
		match self {
			Self::Success { data, .. } => Ok(data),
			Self::Failure { message, kind } => Err((kind, message)),
		}
	}
}
impl<T> Serialize for ApiResponse<T>
where
	T: Serialize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut state = serializer.serialize_struct("ApiResponse", 3)?;

		match self {
			Self::Success { data, message } => {
				state.serialize_field("success", &true)?;
				state.serialize_field("message", message)?;
				state.serialize_field("data", data)?;
			},
			Self::Failure { message, .. } => {
				state.serialize_field("success", &false)?;
				state.serialize_field("message", message)?;
				state.serialize_field("data", &Option::<()>::None)?;
			},
		}

		state.end()
	}
}
impl<'de, T> Deserialize<'de> for ApiResponse<T>
where
	T: DeserializeOwned,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let wire = WireEnvelope::deserialize(deserializer)?;

		if !wire.success {
			return Ok(Self::Failure { message: wire.message, kind: FailureKind::Service });
		}

		let data = serde_json::from_value(wire.data.unwrap_or(serde_json::Value::Null))
			.map_err(D::Error::custom)?;

		Ok(Self::Success { data, message: wire.message })
	}
}

/// Decodes a JSON envelope so payload mismatches report their full field path.
pub(crate) fn decode_json<T>(body: &[u8]) -> Result<ApiResponse<T>, PathError>
where
	T: DeserializeOwned,
{
	let head = decode_tracked::<WireHead>(body)?;

	if !head.success {
		return Ok(ApiResponse::Failure { message: head.message, kind: FailureKind::Service });
	}

	let data = match decode_tracked::<WireData<T>>(body)?.data {
		Some(data) => data,
		None => serde_path_to_error::deserialize(serde_json::Value::Null)?,
	};

	Ok(ApiResponse::Success { data, message: head.message })
}

type PathError = serde_path_to_error::Error<serde_json::Error>;

fn decode_tracked<T>(body: &[u8]) -> Result<T, PathError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
}

#[derive(Deserialize)]
struct WireHead {
	success: bool,
	#[serde(default)]
	message: Option<String>,
}

#[derive(Deserialize)]
struct WireData<T> {
	data: Option<T>,
}

#[derive(Deserialize)]
struct WireEnvelope {
	success: bool,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	data: Option<serde_json::Value>,
}
