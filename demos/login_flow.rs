//! Logs in against a mock API, lets the access token get rejected, and watches the client
//! refresh and replay the request.

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use service_broker::{
	config::ClientConfig,
	http::ApiClient,
	services::{AuthApi, auth::LoginParams},
	store::MemoryCookieJar,
};

fn jwt(subject: &str) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
	let payload = URL_SAFE_NO_PAD.encode(json!({"sub": subject, "exp": 1_893_456_000}).to_string());

	format!("{header}.{payload}.")
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let (first, second) = (jwt("first"), jwt("second"));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200).json_body(json!({
				"success": true,
				"message": "",
				"data": {"accessToken": first, "refreshToken": "refresh-1"}
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/auth/user/1")
				.header("authorization", format!("Bearer {first}").as_str());
			then.status(401).json_body(json!({"success": false, "message": "jwt expired"}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).json_body(json!({
				"success": true,
				"message": "",
				"data": {"accessToken": second, "refreshToken": "refresh-2"}
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/auth/user/1")
				.header("authorization", format!("Bearer {second}").as_str());
			then.status(200).json_body(json!({
				"success": true,
				"message": "",
				"data": {
					"id": "1",
					"email": "ada@example.com",
					"name": "Ada",
					"role": "admin",
					"avatar": "",
					"createdAt": "2024-01-01T00:00:00Z",
					"updatedAt": "2024-01-01T00:00:00Z"
				}
			}));
		})
		.await;

	let config = ClientConfig::builder(server.base_url()).build()?;
	let client = ApiClient::new(config, Arc::new(MemoryCookieJar::default()))?
		.with_notifier(|message: &str| eprintln!("alert: {message}"));
	let auth = AuthApi::new(client.clone());
	let login = auth
		.login(&LoginParams { email: "ada@example.com".into(), password: "hunter2".into() })
		.await?;

	println!("login succeeded: {}", login.is_success());

	let user = auth.get_user("1").await;

	println!("user: {:?}", user.data().map(|user| &user.name));
	println!(
		"refresh attempts: {}, replays: {}",
		client.metrics().refresh_attempts(),
		client.metrics().replays()
	);

	Ok(())
}
