//! Endpoint paths and the parametrized route helper.

// self
use crate::_prelude::*;

/// Route filling failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RouteError {
	/// A declared parameter was not supplied.
	#[error("Route `{template}` is missing the `{name}` parameter.")]
	MissingParam {
		/// Route template.
		template: &'static str,
		/// Missing parameter name.
		name: &'static str,
	},
	/// A supplied parameter is not declared by the route.
	#[error("Route `{template}` has no `{name}` parameter.")]
	UnknownParam {
		/// Route template.
		template: &'static str,
		/// Unexpected parameter name.
		name: String,
	},
}

/// Path template with `[name]` placeholders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Route {
	template: &'static str,
	params: &'static [&'static str],
}
impl Route {
	/// Declares a route and the parameters its template uses.
	pub const fn new(template: &'static str, params: &'static [&'static str]) -> Self {
		Self { template, params }
	}

	/// Raw template.
	pub fn template(&self) -> &'static str {
		self.template
	}

	/// Declared parameter names.
	pub fn params(&self) -> &'static [&'static str] {
		self.params
	}

	/// Replaces every `[name]` placeholder with its value.
	pub fn fill(&self, values: &[(&str, &str)]) -> Result<String, RouteError> {
		if let Some((name, _)) =
			values.iter().find(|(name, _)| !self.params.iter().any(|param| param == name))
		{
			return Err(RouteError::UnknownParam { template: self.template, name: (*name).to_owned() });
		}

		let mut path = self.template.to_owned();

		for name in self.params {
			let (_, value) = values
				.iter()
				.find(|(candidate, _)| candidate == name)
				.ok_or(RouteError::MissingParam { template: self.template, name: *name })?;

			path = path.replace(&format!("[{name}]"), value);
		}

		Ok(path)
	}
}
impl Display for Route {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.template)
	}
}

/// Authentication endpoints.
pub mod auth {
	// self
	use super::Route;

	/// `POST` credentials, returns a token pair.
	pub const LOGIN: &str = "/auth/login";
	/// `POST` a new account, returns a token pair.
	pub const REGISTER: &str = "/auth/register";
	/// `POST` a refresh token, returns a rotated token pair.
	pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
	/// `GET` a user profile by id.
	pub const GET_USER: Route = Route::new("/auth/user/[userId]", &["userId"]);
}
