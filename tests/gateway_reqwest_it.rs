#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use bearer_gateway::{
	_preludet::*,
	auth::SessionTokens,
	config::GatewayConfig,
	error::TransportError,
	http::GatewayRequest,
	refresh::RefreshFailureKind,
	store::CredentialKey,
};

fn endpoint(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.")
}

async fn sign_in(gateway: &ReqwestTestGateway, access: &str) {
	gateway
		.sign_in(&SessionTokens::new(access).with_refresh_token("refresh-1"))
		.await
		.expect("Seeding the session should succeed.");
}

#[tokio::test]
async fn expired_credential_is_refreshed_and_replayed() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(endpoint(&server, "/auth/refresh"), GatewayConfig::default());

	sign_in(&gateway, "stale").await;

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/stations").header("authorization", "Bearer stale");
			then.status(401).body("token expired");
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/stations").header("authorization", "Bearer fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":\"gauge-7\",\"level_cm\":412}]");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh")
				.json_body(serde_json::json!({ "refreshToken": "refresh-1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"fresh\",\"refreshToken\":\"refresh-2\",\"expiresIn\":1800}");
		})
		.await;
	let response = gateway.send(GatewayRequest::get(endpoint(&server, "/api/stations"))).await?;

	rejected.assert_async().await;
	refresh.assert_async().await;
	accepted.assert_async().await;

	let stations: Vec<serde_json::Value> = response.json()?;

	assert_eq!(stations[0]["id"], "gauge-7");
	assert_eq!(store.peek(CredentialKey::AccessToken), Some("fresh".into()));
	assert_eq!(store.peek(CredentialKey::RefreshToken), Some("refresh-2".into()));
	assert!(gateway.expires_at().await?.is_some());

	Ok(())
}

#[tokio::test]
async fn concurrent_requests_trigger_one_refresh_call() {
	let server = MockServer::start_async().await;
	let (gateway, _) =
		build_reqwest_test_gateway(endpoint(&server, "/auth/refresh"), GatewayConfig::default());

	sign_in(&gateway, "stale").await;

	let _rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/alerts").header("authorization", "Bearer stale");
			then.status(401);
		})
		.await;
	let _accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/alerts").header("authorization", "Bearer fresh");
			then.status(200).body("[]");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"accessToken\":\"fresh\"}");
		})
		.await;
	let url = endpoint(&server, "/api/alerts");
	let (a, b, c) = tokio::join!(
		gateway.send(GatewayRequest::get(url.clone())),
		gateway.send(GatewayRequest::get(url.clone())),
		gateway.send(GatewayRequest::get(url)),
	);

	for result in [a, b, c] {
		assert_eq!(result.expect("Every request should recover.").status, 200);
	}

	refresh.assert_async().await;

	assert_eq!(gateway.refresh_metrics().successes(), gateway.refresh_metrics().attempts());
}

#[tokio::test]
async fn rejected_refresh_purges_the_store() {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(endpoint(&server, "/auth/refresh"), GatewayConfig::default());

	sign_in(&gateway, "stale").await;

	let _rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/forecast");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401).body("refresh token revoked");
		})
		.await;
	let err = gateway
		.send(GatewayRequest::get(endpoint(&server, "/api/forecast")))
		.await
		.expect_err("A revoked refresh token should expire the session.");

	refresh.assert_async().await;

	assert_eq!(
		err.refresh_failure().map(|failure| failure.kind),
		Some(RefreshFailureKind::Rejected { status: 401 })
	);
	assert!(store.is_empty());
}

#[tokio::test]
async fn server_errors_pass_through_untouched() {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(endpoint(&server, "/auth/refresh"), GatewayConfig::default());

	sign_in(&gateway, "valid").await;

	let failing = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/reports").header("authorization", "Bearer valid");
			then.status(503).header("retry-after", "30").body("maintenance");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body("{\"accessToken\":\"unused\"}");
		})
		.await;
	let request = GatewayRequest::post(endpoint(&server, "/api/reports"))
		.with_json(&serde_json::json!({ "gauge": "gauge-7", "level_cm": 430 }))
		.expect("Report payload should serialize.");
	let err = gateway.send(request).await.expect_err("503 should surface as a failure.");

	failing.assert_async().await;
	refresh.assert_calls_async(0).await;

	match err {
		Error::RequestFailed { response } => {
			assert_eq!(response.status, 503);
			assert_eq!(response.header("Retry-After"), Some("30"));
			assert_eq!(response.text(), "maintenance");
		},
		other => panic!("Expected RequestFailed, got {other:?}."),
	}

	assert_eq!(store.peek(CredentialKey::AccessToken), Some("valid".into()));
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
	let refresh = Url::parse("http://127.0.0.1:1/auth/refresh")
		.expect("Unreachable refresh endpoint should parse.");
	let (gateway, _) = build_reqwest_test_gateway(refresh, GatewayConfig::default());
	let err = gateway
		.send(GatewayRequest::get(
			Url::parse("http://127.0.0.1:1/api/stations").expect("Unreachable URL should parse."),
		))
		.await
		.expect_err("Connection refusal should fail the request.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
}
