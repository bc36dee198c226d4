// self
use crate::_prelude::*;

/// Per-service or per-call behavior switches; unset fields defer to the layer below.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOptions {
	/// Encode object parameters as a multipart form.
	pub is_form_data: Option<bool>,
	/// CAPTCHA token sent under the configured CAPTCHA header.
	pub re_captcha_token: Option<String>,
	/// Abort the previous in-flight request with the same fingerprint.
	pub auto_abort: Option<bool>,
	/// Include the query string in the fingerprint.
	pub abort_with_query: Option<bool>,
	/// Fingerprint override.
	pub custom_abort_key: Option<String>,
	/// Notify failures with a non-empty message.
	pub auto_generic_alert: Option<bool>,
}
impl ServiceOptions {
	/// Creates an empty layer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets [`ServiceOptions::is_form_data`].
	pub fn form_data(mut self, enabled: bool) -> Self {
		self.is_form_data = Some(enabled);

		self
	}

	/// Sets [`ServiceOptions::re_captcha_token`].
	pub fn re_captcha_token(mut self, token: impl Into<String>) -> Self {
		self.re_captcha_token = Some(token.into());

		self
	}

	/// Sets [`ServiceOptions::auto_abort`].
	pub fn auto_abort(mut self, enabled: bool) -> Self {
		self.auto_abort = Some(enabled);

		self
	}

	/// Sets [`ServiceOptions::abort_with_query`].
	pub fn abort_with_query(mut self, enabled: bool) -> Self {
		self.abort_with_query = Some(enabled);

		self
	}

	/// Sets [`ServiceOptions::custom_abort_key`].
	pub fn custom_abort_key(mut self, key: impl Into<String>) -> Self {
		self.custom_abort_key = Some(key.into());

		self
	}

	/// Sets [`ServiceOptions::auto_generic_alert`].
	pub fn auto_generic_alert(mut self, enabled: bool) -> Self {
		self.auto_generic_alert = Some(enabled);

		self
	}

	/// Layers `other` on top of `self`, field by field.
	pub fn merge(self, other: ServiceOptions) -> Self {
		Self {
			is_form_data: other.is_form_data.or(self.is_form_data),
			re_captcha_token: other.re_captcha_token.or(self.re_captcha_token),
			auto_abort: other.auto_abort.or(self.auto_abort),
			abort_with_query: other.abort_with_query.or(self.abort_with_query),
			custom_abort_key: other.custom_abort_key.or(self.custom_abort_key),
			auto_generic_alert: other.auto_generic_alert.or(self.auto_generic_alert),
		}
	}

	/// Fills unset fields with the built-in defaults.
	pub fn resolve(self) -> ResolvedOptions {
		ResolvedOptions {
			is_form_data: self.is_form_data.unwrap_or(false),
			re_captcha_token: self.re_captcha_token.filter(|token| !token.is_empty()),
			auto_abort: self.auto_abort.unwrap_or(true),
			abort_with_query: self.abort_with_query.unwrap_or(true),
			custom_abort_key: self.custom_abort_key.filter(|key| !key.is_empty()),
			auto_generic_alert: self.auto_generic_alert.unwrap_or(true),
		}
	}
}

/// Concrete options for one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOptions {
	/// Encode object parameters as a multipart form.
	pub is_form_data: bool,
	/// CAPTCHA token to send.
	pub re_captcha_token: Option<String>,
	/// Abort the previous in-flight request with the same fingerprint.
	pub auto_abort: bool,
	/// Include the query string in the fingerprint.
	pub abort_with_query: bool,
	/// Fingerprint override.
	pub custom_abort_key: Option<String>,
	/// Notify failures with a non-empty message.
	pub auto_generic_alert: bool,
}
impl Default for ResolvedOptions {
	fn default() -> Self {
		ServiceOptions::default().resolve()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_enable_abort_and_alerts() {
		let resolved = ResolvedOptions::default();

		assert!(!resolved.is_form_data);
		assert!(resolved.auto_abort);
		assert!(resolved.abort_with_query);
		assert!(resolved.auto_generic_alert);
		assert!(resolved.custom_abort_key.is_none());
	}

	#[test]
	fn later_layers_win_per_field() {
		let service = ServiceOptions::new().auto_abort(false).custom_abort_key("users");
		let call = ServiceOptions::new().auto_abort(true).auto_generic_alert(false);
		let resolved = service.merge(call).resolve();

		assert!(resolved.auto_abort);
		assert!(!resolved.auto_generic_alert);
		assert_eq!(resolved.custom_abort_key.as_deref(), Some("users"));
		assert!(resolved.abort_with_query);
	}

	#[test]
	fn empty_strings_resolve_to_unset() {
		let resolved = ServiceOptions::new().re_captcha_token("").custom_abort_key("").resolve();

		assert!(resolved.re_captcha_token.is_none());
		assert!(resolved.custom_abort_key.is_none());
	}
}
