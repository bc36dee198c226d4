mod common;

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use service_broker::{
	auth::{TokenKind, TokenSecret},
	config::RefreshPolicy,
	envelope::FailureKind,
	service::ServiceOptions,
	services::{AuthApi, auth::User},
};

fn user_json() -> serde_json::Value {
	json!({
		"id": "42",
		"email": "ada@example.com",
		"name": "Ada",
		"role": "admin",
		"avatar": "https://example.com/ada.png",
		"createdAt": "2024-01-01T00:00:00Z",
		"updatedAt": "2024-06-01T12:30:00Z"
	})
}

fn refresh_body(refresh: &str) -> serde_json::Value {
	json!({"refreshToken": refresh})
}

#[tokio::test]
async fn unauthorized_refreshes_once_and_replays_with_new_bearer() {
	let server = MockServer::start_async().await;
	let (client, _jar) = build_client(&server);
	let old_access = jwt("old", FIXTURE_EXP);
	let new_access = jwt("new", FIXTURE_EXP);

	seed_tokens(&client, &old_access, "refresh-1");

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/auth/user/42")
				.header("authorization", format!("Bearer {old_access}").as_str());
			then.status(401)
				.header("content-type", "application/json")
				.body(failure_body("jwt expired"));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh-token")
				.header("authorization", format!("Bearer {old_access}").as_str())
				.json_body(refresh_body("refresh-1"));
			then.status(200).header("content-type", "application/json").body(success_body(
				json!({"accessToken": new_access, "refreshToken": "refresh-2"}),
			));
		})
		.await;
	let replayed = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/auth/user/42")
				.header("authorization", format!("Bearer {new_access}").as_str());
			then.status(200)
				.header("content-type", "application/json")
				.body(success_body(user_json()));
		})
		.await;
	let response = AuthApi::new(client.clone()).get_user("42").await;
	let user: User = response.into_data().expect("Replayed request should succeed.");

	assert_eq!(user.name, "Ada");
	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	replayed.assert_calls_async(1).await;
	assert_eq!(
		client.tokens().get(TokenKind::Access, None).expect("Token read should succeed."),
		Some(TokenSecret::new(new_access.clone()))
	);
	assert_eq!(
		client.tokens().get(TokenKind::Refresh, None).expect("Token read should succeed."),
		Some(TokenSecret::new("refresh-2"))
	);
	assert_eq!(client.metrics().refresh_attempts(), 1);
	assert_eq!(client.metrics().replays(), 1);
	assert_eq!(client.metrics().successes(), 1);
}

#[tokio::test]
async fn unauthorized_without_refresh_token_clears_tokens() {
	let server = MockServer::start_async().await;
	let (client, jar) = build_client(&server);
	let access = jwt("only-access", FIXTURE_EXP);

	client
		.tokens()
		.set(TokenKind::Access, &TokenSecret::new(access.clone()), None)
		.expect("Access token should be stored.");

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile");
			then.status(401)
				.header("content-type", "application/json")
				.body(failure_body("Unauthorized"));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).body(success_body(json!({"accessToken": "x", "refreshToken": "y"})));
		})
		.await;
	let response = client.get::<serde_json::Value>("/profile").call(None).await;

	assert_eq!(response.message(), Some("Unauthorized"));
	assert_eq!(response.failure_kind(), Some(FailureKind::AuthExpired));
	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
	assert!(jar.is_empty());
}

#[tokio::test]
async fn failed_refresh_clears_tokens_and_reports_its_message() {
	let server = MockServer::start_async().await;
	let (client, jar) = build_client(&server);
	let access = jwt("stale", FIXTURE_EXP);

	seed_tokens(&client, &access, "refresh-stale");

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/orders");
			then.status(401).body(failure_body("jwt expired"));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token").json_body(refresh_body("refresh-stale"));
			then.status(401)
				.header("content-type", "application/json")
				.body(failure_body("expired"));
		})
		.await;
	let response = client.get::<serde_json::Value>("/orders").call(None).await;

	assert_eq!(response.message(), Some("expired"));
	assert_eq!(response.failure_kind(), Some(FailureKind::AuthExpired));
	assert!(response.data().is_none());
	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	assert!(jar.is_empty());
	assert_eq!(client.metrics().refresh_failures(), 1);
	assert_eq!(client.metrics().replays(), 0);
}

#[tokio::test]
async fn malformed_refreshed_token_counts_as_refresh_failure() {
	let server = MockServer::start_async().await;
	let (client, jar) = build_client(&server);

	seed_tokens(&client, &jwt("stale", FIXTURE_EXP), "refresh-1");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/orders");
			then.status(401).body(failure_body("jwt expired"));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).body(success_body(
				json!({"accessToken": "not-a-jwt", "refreshToken": "refresh-2"}),
			));
		})
		.await;

	let response = client.get::<serde_json::Value>("/orders").call(None).await;

	assert_eq!(response.failure_kind(), Some(FailureKind::AuthExpired));
	assert!(jar.is_empty());
}

#[tokio::test]
async fn second_unauthorized_is_returned_without_another_refresh() {
	let server = MockServer::start_async().await;
	let (client, _jar) = build_client(&server);
	let old_access = jwt("old", FIXTURE_EXP);
	let new_access = jwt("new", FIXTURE_EXP);

	seed_tokens(&client, &old_access, "refresh-1");

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/reports")
				.header("authorization", format!("Bearer {old_access}").as_str());
			then.status(401).body(failure_body("jwt expired"));
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).body(success_body(
				json!({"accessToken": new_access, "refreshToken": "refresh-2"}),
			));
		})
		.await;
	let replayed = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/reports")
				.header("authorization", format!("Bearer {new_access}").as_str());
			then.status(401)
				.header("content-type", "application/json")
				.body(failure_body("still unauthorized"));
		})
		.await;
	let response = client.get::<serde_json::Value>("/reports").call(None).await;

	assert_eq!(response.message(), Some("still unauthorized"));
	refresh.assert_calls_async(1).await;
	replayed.assert_calls_async(1).await;
}

#[tokio::test]
async fn coalesced_policy_refreshes_once_for_concurrent_unauthorized() {
	let server = MockServer::start_async().await;
	let (client, _jar) =
		build_client_with(&server, |builder| builder.refresh_policy(RefreshPolicy::Coalesced));
	let old_access = jwt("old", FIXTURE_EXP);
	let new_access = jwt("new", FIXTURE_EXP);

	seed_tokens(&client, &old_access, "refresh-1");

	for path in ["/a", "/b"] {
		server
			.mock_async(|when, then| {
				when.method(GET).path(path).header("authorization", format!("Bearer {old_access}").as_str());
				then.status(401).body(failure_body("jwt expired"));
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path(path).header("authorization", format!("Bearer {new_access}").as_str());
				then.status(200).body(success_body(json!(path)));
			})
			.await;
	}

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token").json_body(refresh_body("refresh-1"));
			then.status(200)
				.delay(Duration::from_millis(200))
				.body(success_body(json!({"accessToken": new_access, "refreshToken": "refresh-2"})));
		})
		.await;
	let a = client.get::<String>("/a");
	let b = client.get::<String>("/b");
	let (first, second) = tokio::join!(a.call(None), b.call(None));

	assert_eq!(first.into_data().as_deref(), Some("/a"));
	assert_eq!(second.into_data().as_deref(), Some("/b"));
	refresh.assert_calls_async(1).await;
	assert_eq!(client.metrics().refresh_attempts(), 1);
	assert_eq!(client.metrics().replays(), 2);
}

#[tokio::test]
async fn transport_failures_never_refresh() {
	let server = MockServer::start_async().await;
	let (client, _jar) = build_client(&server);

	seed_tokens(&client, &jwt("old", FIXTURE_EXP), "refresh-1");

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/slow");
			then.status(401).delay(Duration::from_millis(500)).body(failure_body("late"));
		})
		.await;

	let response = client
		.get::<serde_json::Value>("/slow")
		.with_config(service_broker::http::RequestConfig::new().timeout(Duration::from_millis(50)))
		.call_with(None, Default::default(), ServiceOptions::new().auto_abort(false))
		.await;

	assert_eq!(response.failure_kind(), Some(FailureKind::Transport));
	refresh.assert_calls_async(0).await;
}
