use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, Response, StatusCode, header},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use studio_api::{auth, routes, state::AppState};
use studio_service::StudioService;
use studio_testkit::MemoryStore;

const ALICE: &str = "Bearer token-alice";
const BOB: &str = "Bearer token-bob";

fn test_app() -> (Router, Arc<MemoryStore>) {
	let cfg = studio_testkit::sample_config().expect("Failed to load sample config.");
	let store = Arc::new(MemoryStore::new());
	let identity =
		auth::identity_from_config(&cfg.security).expect("Failed to build identity provider.");
	let service = StudioService::new(cfg, store.clone()).expect("Failed to build service.");

	(routes::router(AppState::from_parts(service, identity)), store)
}

async fn send(
	app: &Router,
	method: &str,
	uri: &str,
	token: Option<&str>,
	payload: Option<Value>,
) -> Response<Body> {
	let mut builder = Request::builder().method(method).uri(uri);

	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, token);
	}

	let body = match payload {
		Some(payload) => {
			builder = builder.header(header::CONTENT_TYPE, "application/json");

			Body::from(payload.to_string())
		},
		None => Body::empty(),
	};

	app.clone()
		.oneshot(builder.body(body).expect("Failed to build request."))
		.await
		.expect("Failed to call router.")
}

async fn read_json(response: Response<Body>) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_needs_no_token() {
	let (app, _store) = test_app();
	let response = send(&app, "GET", "/health", None, None).await;

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_or_unknown_tokens_are_rejected() {
	let (app, store) = test_app();
	let response =
		send(&app, "POST", "/research", None, Some(json!({ "query": "AI trends 2025" }))).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(
		response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).map(|v| v.as_bytes()),
		Some(&b"*"[..])
	);
	assert_eq!(read_json(response).await, json!({ "error": "Unauthorized" }));

	let response = send(
		&app,
		"POST",
		"/research",
		Some("Bearer nope"),
		Some(json!({ "query": "AI trends 2025" })),
	)
	.await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(read_json(response).await, json!({ "error": "Invalid or expired token" }));
	assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn preflight_returns_no_content() {
	let (app, _store) = test_app();
	let response = send(&app, "OPTIONS", "/generate", None, None).await;

	assert_eq!(response.status(), StatusCode::NO_CONTENT);
	assert_eq!(
		response.headers().get(header::ACCESS_CONTROL_ALLOW_HEADERS).map(|v| v.as_bytes()),
		Some(&b"Content-Type, Authorization"[..])
	);
}

#[tokio::test]
async fn research_falls_back_when_upstream_is_disabled() {
	let (app, store) = test_app();
	let response =
		send(&app, "POST", "/research", Some(ALICE), Some(json!({ "query": "AI trends 2025" })))
			.await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;

	assert_eq!(json["status"], "completed");
	assert_eq!(json["sources"].as_array().map(Vec::len), Some(2));
	assert_eq!(json["sources"][0]["url"], "https://example.com/source1");
	assert_eq!(json["job"]["progress"], 100);
	assert_eq!(json["job"]["user_id"], "user-alice");
	assert_eq!(store.usage().len(), 1);
}

#[tokio::test]
async fn research_validation_and_quota_map_to_status_codes() {
	let (app, store) = test_app();
	let response = send(&app, "POST", "/research", Some(ALICE), Some(json!({}))).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(read_json(response).await, json!({ "error": "query is required" }));

	for n in 0..3 {
		let response =
			send(&app, "POST", "/research", Some(ALICE), Some(json!({ "query": format!("q{n}") })))
				.await;

		assert_eq!(response.status(), StatusCode::OK);
	}

	let response =
		send(&app, "POST", "/research", Some(ALICE), Some(json!({ "query": "one more" }))).await;

	assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(read_json(response).await["error"], "Daily research quota (3) exceeded");
	assert_eq!(store.jobs().len(), 3);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
	let (app, _store) = test_app();
	let response = app
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/generate")
				.header(header::AUTHORIZATION, ALICE)
				.body(Body::from("{not json"))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /generate.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = read_json(response).await;

	assert_eq!(json["error"], "Invalid JSON body");
	assert!(json["details"].is_string());
}

#[tokio::test]
async fn generate_validates_and_approves() {
	let (app, _store) = test_app();
	let response =
		send(&app, "POST", "/generate", Some(ALICE), Some(json!({ "prompt": "" }))).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(read_json(response).await["error"], "prompt is required");

	let response = send(
		&app,
		"POST",
		"/generate",
		Some(ALICE),
		Some(json!({ "prompt": "hello", "output_type": "tweet" })),
	)
	.await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(
		read_json(response).await["error"],
		"output_type must be one of: thread, script, caption, article"
	);

	let response =
		send(&app, "POST", "/generate", Some(ALICE), Some(json!({ "prompt": "launch plan" })))
			.await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;
	let output_id = json["output_id"].as_str().expect("output_id").to_string();

	assert_eq!(json["output"]["approved"], false);

	let approve_uri = format!("/outputs/{output_id}/approve");

	for _ in 0..2 {
		let response = send(&app, "POST", &approve_uri, Some(ALICE), None).await;

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(read_json(response).await["output"]["approved"], true);
	}

	let response = send(&app, "POST", &approve_uri, Some(BOB), None).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(read_json(response).await["error"], "Output not found");

	let response = send(&app, "GET", "/outputs?limit=5", Some(ALICE), None).await;
	let json = read_json(response).await;

	assert_eq!(json["count"], 1);
	assert_eq!(json["outputs"][0]["output_id"], output_id.as_str());
}

#[tokio::test]
async fn job_actions_over_get_and_post() {
	let (app, store) = test_app();
	let response =
		send(&app, "POST", "/research", Some(ALICE), Some(json!({ "query": "lifecycle" }))).await;
	let job_id = read_json(response).await["job_id"].as_str().expect("job_id").to_string();
	let get_uri = format!("/jobs?action=get&job_id={job_id}");
	let response = send(&app, "GET", &get_uri, Some(ALICE), None).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(read_json(response).await["job"]["job_id"], job_id.as_str());

	let response = send(&app, "GET", "/jobs?action=get", Some(ALICE), None).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(read_json(response).await["error"], "job_id is required");

	let response = send(&app, "GET", &get_uri, Some(BOB), None).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(read_json(response).await["error"], "Job not found");

	let cancel_uri = format!("/jobs?action=cancel&job_id={job_id}");
	let response = send(&app, "GET", &cancel_uri, Some(ALICE), None).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(read_json(response).await["error"], "Invalid action or method");
	assert_eq!(store.jobs()[0].status, "completed");

	let response = send(
		&app,
		"POST",
		"/jobs",
		Some(BOB),
		Some(json!({ "action": "cancel", "job_id": job_id })),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(store.jobs()[0].status, "completed");

	let response = send(
		&app,
		"POST",
		"/jobs?action=cancel",
		Some(ALICE),
		Some(json!({ "job_id": job_id })),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;

	assert_eq!(json["success"], true);
	assert_eq!(json["message"], "Job cancelled");
	assert_eq!(json["job"]["status"], "cancelled");

	let response = send(&app, "GET", "/jobs?action=list&limit=500", Some(ALICE), None).await;
	let json = read_json(response).await;

	assert_eq!(json["count"], 1);
	assert_eq!(json["jobs"][0]["status"], "cancelled");

	let response = send(&app, "GET", "/jobs?action=usage", Some(ALICE), None).await;
	let json = read_json(response).await;

	assert_eq!(json["api_calls_24h"], 1);
	assert_eq!(json["records"].as_array().map(Vec::len), Some(1));

	let response = send(&app, "GET", "/jobs?action=purge", Some(ALICE), None).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_method_is_405() {
	let (app, _store) = test_app();
	let response = send(&app, "GET", "/research", Some(ALICE), None).await;

	assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
	assert_eq!(read_json(response).await, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn storage_outage_is_an_opaque_500() {
	let (app, store) = test_app();

	store.set_failing(true);

	let response =
		send(&app, "POST", "/research", Some(ALICE), Some(json!({ "query": "down" }))).await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(read_json(response).await, json!({ "error": "Internal server error" }));
}
