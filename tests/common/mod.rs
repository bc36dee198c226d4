#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::MockServer;
use serde_json::{Value, json};
// self
use service_broker::{
	auth::TokenPair,
	config::{ClientConfig, ClientConfigBuilder},
	http::ApiClient,
	store::MemoryCookieJar,
};

/// `exp` used by fixture tokens: 2030-01-01T00:00:00Z.
pub const FIXTURE_EXP: i64 = 1_893_456_000;

/// Builds an unsigned JWT whose payload carries `sub` and `exp`.
pub fn jwt(subject: &str, exp: i64) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(json!({"sub": subject, "exp": exp}).to_string());

	format!("{header}.{payload}.signature")
}

/// Serialized success envelope.
pub fn success_body(data: Value) -> String {
	json!({"success": true, "message": "", "data": data}).to_string()
}

/// Serialized failure envelope.
pub fn failure_body(message: &str) -> String {
	json!({"success": false, "message": message, "data": null}).to_string()
}

/// Client pointed at `server` with a fresh in-memory jar.
pub fn build_client(server: &MockServer) -> (ApiClient, MemoryCookieJar) {
	build_client_with(server, |builder| builder)
}

/// Same as [`build_client`], with extra builder configuration.
pub fn build_client_with<F>(server: &MockServer, configure: F) -> (ApiClient, MemoryCookieJar)
where
	F: FnOnce(ClientConfigBuilder) -> ClientConfigBuilder,
{
	let config = configure(ClientConfig::builder(server.base_url()))
		.build()
		.expect("Fixture client config should build.");
	let jar = MemoryCookieJar::default();
	let client = ApiClient::new(config, Arc::new(jar.clone()))
		.expect("Fixture client should build.");

	(client, jar)
}

/// Stores an access/refresh pair in the client's jar.
pub fn seed_tokens(client: &ApiClient, access: &str, refresh: &str) {
	client
		.tokens()
		.save_pair(&TokenPair::new(access, refresh), None)
		.expect("Fixture tokens should be stored.");
}
