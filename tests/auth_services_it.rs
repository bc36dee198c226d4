mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use service_broker::{
	auth::{TokenKind, TokenSecret},
	envelope::FailureKind,
	error::Error,
	services::{
		AuthApi,
		auth::{LoginParams, RefreshTokenParams, RegisterParams},
	},
	store::RequestContext,
};

fn credentials() -> LoginParams {
	LoginParams { email: "ada@example.com".into(), password: "hunter2".into() }
}

#[tokio::test]
async fn login_persists_the_returned_pair() {
	let server = MockServer::start_async().await;
	let (client, jar) = build_client(&server);
	let access = jwt("ada", FIXTURE_EXP);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/login")
				.json_body(json!({"email": "ada@example.com", "password": "hunter2"}));
			then.status(200).body(success_body(
				json!({"accessToken": access, "refreshToken": "refresh-ada"}),
			));
		})
		.await;
	let api = AuthApi::new(client.clone());
	let response = api.login(&credentials()).await.expect("Login should persist tokens.");

	assert!(response.is_success());
	mock.assert_async().await;
	assert_eq!(jar.len(), 2);
	assert_eq!(
		client.tokens().get(TokenKind::Refresh, None).expect("Token read should succeed."),
		Some(TokenSecret::new("refresh-ada"))
	);

	api.logout(None).expect("Logout should clear tokens.");

	assert!(jar.is_empty());
}

#[tokio::test]
async fn failed_login_stores_nothing() {
	let server = MockServer::start_async().await;
	let (client, jar) = build_client(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(401).body(failure_body("Invalid credentials"));
		})
		.await;

	let response = AuthApi::new(client)
		.login(&credentials())
		.await
		.expect("A failed login is still an envelope.");

	assert_eq!(response.message(), Some("Invalid credentials"));
	assert_eq!(response.failure_kind(), Some(FailureKind::AuthExpired));
	assert!(jar.is_empty());
}

#[tokio::test]
async fn register_with_malformed_access_token_is_an_error() {
	let server = MockServer::start_async().await;
	let (client, jar) = build_client(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/register");
			then.status(201).body(success_body(
				json!({"accessToken": "opaque", "refreshToken": "refresh-1"}),
			));
		})
		.await;

	let params = RegisterParams {
		name: "Ada".into(),
		email: "ada@example.com".into(),
		password: "hunter2".into(),
	};
	let err = AuthApi::new(client)
		.register(&params)
		.await
		.expect_err("Malformed access tokens should propagate.");

	assert!(matches!(err, Error::MalformedToken(_)));
	assert!(jar.is_empty());
}

#[tokio::test]
async fn refresh_token_service_does_not_touch_the_store() {
	let server = MockServer::start_async().await;
	let (client, jar) = build_client(&server);
	let access = jwt("ada", FIXTURE_EXP);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token").json_body(json!({"refreshToken": "refresh-1"}));
			then.status(200).body(success_body(
				json!({"accessToken": access, "refreshToken": "refresh-2"}),
			));
		})
		.await;

	let response = AuthApi::new(client)
		.refresh_token(&RefreshTokenParams { refresh_token: TokenSecret::new("refresh-1") })
		.await;

	assert_eq!(
		response.into_data().map(|pair| pair.refresh_token),
		Some(TokenSecret::new("refresh-2"))
	);
	assert!(jar.is_empty());
}

#[test]
fn logout_in_request_context_emits_removal_cookies() {
	let server = MockServer::start();
	let (client, jar) = build_client(&server);
	let ctx = RequestContext::from_cookie_header("accessToken=a; refreshToken=b");

	AuthApi::new(client).logout(Some(&ctx)).expect("Logout should clear context cookies.");

	let headers = ctx.set_cookie_headers().expect("Removal cookies should render.");

	assert_eq!(headers.len(), 2);
	assert!(headers.iter().all(|header| header.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT")));
	assert!(jar.is_empty());
}
