use std::collections::HashMap;

use axum::{
	Extension, Json, Router,
	body::Bytes,
	extract::{Path, Query, Request, State},
	http::{HeaderValue, Method, StatusCode, header},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use studio_service::{
	GenerateResponse, JobControl, JobControlResponse, ListOutputsRequest, ListOutputsResponse,
	OutputRecord, ResearchRequest, ResearchResponse,
};

use crate::{
	auth::{self, AuthUser},
	state::AppState,
};

const CORS_HEADERS: [(header::HeaderName, &str); 3] = [
	(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
	(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
	(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
];

pub fn router(state: AppState) -> Router {
	let authed = Router::new()
		.route("/research", post(research))
		.route("/generate", post(generate))
		.route("/jobs", get(jobs).post(jobs))
		.route("/outputs", get(list_outputs))
		.route("/outputs/{output_id}", get(get_output))
		.route("/outputs/{output_id}/approve", post(approve_output))
		.route_layer(middleware::from_fn_with_state(state.clone(), auth::require_user));

	Router::new()
		.route("/health", get(health))
		.merge(authed)
		.method_not_allowed_fallback(method_not_allowed)
		.fallback(not_found)
		.layer(middleware::from_fn(cors))
		.with_state(state)
}

#[derive(Debug, Serialize)]
pub struct OutputBody {
	pub output: OutputRecord,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn research(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	body: Bytes,
) -> Result<Json<ResearchResponse>, ApiError> {
	let payload: ResearchRequest = parse_body(&body)?;
	let response = state.service.research(&user.user_id, payload).await?;

	Ok(Json(response))
}

async fn generate(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
	let payload = parse_body(&body)?;
	let response = state.service.generate(&user.user_id, payload).await?;

	Ok(Json(response))
}

/// Query parameters seed the action; a POST body overrides them field by field.
async fn jobs(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	method: Method,
	Query(query): Query<HashMap<String, String>>,
	body: Bytes,
) -> Result<Json<JobControlResponse>, ApiError> {
	let mut fields = query_fields(query);

	if method == Method::POST && !body.is_empty() {
		match serde_json::from_slice::<Value>(&body).map_err(ApiError::invalid_json)? {
			Value::Object(map) => fields.extend(map),
			_ => return Err(JobControl::invalid_method().into()),
		}
	}

	let action = JobControl::from_value(Value::Object(fields))?;

	if method != Method::POST && action.is_mutating() {
		return Err(JobControl::invalid_method().into());
	}

	let response = state.service.job_control(&user.user_id, action).await?;

	Ok(Json(response))
}

async fn list_outputs(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListOutputsResponse>, ApiError> {
	let payload: ListOutputsRequest = serde_json::from_value(Value::Object(query_fields(query)))
		.map_err(ApiError::invalid_json)?;
	let response = state.service.list_outputs(&user.user_id, payload).await?;

	Ok(Json(response))
}

async fn get_output(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	Path(output_id): Path<String>,
) -> Result<Json<OutputBody>, ApiError> {
	let output = state.service.get_output(&user.user_id, &output_id).await?;

	Ok(Json(OutputBody { output }))
}

async fn approve_output(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	Path(output_id): Path<String>,
) -> Result<Json<OutputBody>, ApiError> {
	let output = state.service.approve_output(&user.user_id, &output_id).await?;

	Ok(Json(OutputBody { output }))
}

async fn method_not_allowed() -> ApiError {
	ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn not_found() -> ApiError {
	ApiError::new(StatusCode::NOT_FOUND, "Not found")
}

async fn cors(req: Request, next: Next) -> Response {
	let mut response = if req.method() == Method::OPTIONS {
		StatusCode::NO_CONTENT.into_response()
	} else {
		next.run(req).await
	};
	let headers = response.headers_mut();

	for (name, value) in CORS_HEADERS {
		headers.insert(name, HeaderValue::from_static(value));
	}

	response
}

/// An empty body reads as `{}` so missing fields surface as field-level validation errors.
fn parse_body<T>(body: &Bytes) -> Result<T, ApiError>
where
	T: DeserializeOwned,
{
	if body.iter().all(u8::is_ascii_whitespace) {
		return serde_json::from_value(Value::Object(Map::new())).map_err(ApiError::invalid_json);
	}

	serde_json::from_slice(body).map_err(ApiError::invalid_json)
}

fn query_fields(query: HashMap<String, String>) -> Map<String, Value> {
	query.into_iter().map(|(key, value)| (key, Value::String(value))).collect()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error: String,
	details: Option<String>,
}
impl ApiError {
	pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
		Self { status, error: error.into(), details: None }
	}

	fn invalid_json(err: serde_json::Error) -> Self {
		Self {
			status: StatusCode::BAD_REQUEST,
			error: "Invalid JSON body".to_string(),
			details: Some(err.to_string()),
		}
	}
}

impl From<studio_service::Error> for ApiError {
	fn from(err: studio_service::Error) -> Self {
		use studio_service::Error;

		match err {
			Error::InvalidRequest { message } => Self::new(StatusCode::BAD_REQUEST, message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, message),
			Error::Conflict { message } => Self::new(StatusCode::CONFLICT, message),
			Error::QuotaExceeded { message } => Self::new(StatusCode::TOO_MANY_REQUESTS, message),
			err @ (Error::Provider { .. } | Error::Storage { .. }) => {
				tracing::error!(error = %err, "Request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: self.error, details: self.details };

		(self.status, Json(body)).into_response()
	}
}
