//! Bearer-token authentication. Every route except `/health` runs behind [`require_user`].

use std::{collections::HashMap, future, sync::Arc};

use axum::{
	extract::{Request, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	middleware::Next,
	response::{IntoResponse, Response},
};
use color_eyre::eyre;

use studio_config::{AUTH_MODE_REMOTE, AUTH_MODE_STATIC_KEYS, Security, SecurityAuthKey};
use studio_providers::identity::RemoteIdentity;
use studio_service::BoxFuture;

use crate::{routes::ApiError, state::AppState};

/// The caller resolved from the bearer token, available to handlers as an extension.
#[derive(Clone, Debug)]
pub struct AuthUser {
	pub user_id: String,
}

/// Maps a bearer token to a user id. `None` means the token is not accepted.
pub trait IdentityProvider
where
	Self: Send + Sync,
{
	fn resolve<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<String>>;
}

pub struct StaticKeys {
	users: HashMap<String, String>,
}
impl StaticKeys {
	pub fn new(keys: &[SecurityAuthKey]) -> Self {
		let users = keys.iter().map(|key| (key.token.clone(), key.user_id.clone())).collect();

		Self { users }
	}
}

impl IdentityProvider for StaticKeys {
	fn resolve<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<String>> {
		Box::pin(future::ready(self.users.get(token).cloned()))
	}
}

impl IdentityProvider for RemoteIdentity {
	fn resolve<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<String>> {
		Box::pin(async move {
			match RemoteIdentity::resolve(self, token).await {
				Ok(user_id) => user_id,
				Err(err) => {
					tracing::warn!(error = %err, "Identity lookup failed.");

					None
				},
			}
		})
	}
}

pub fn identity_from_config(security: &Security) -> color_eyre::Result<Arc<dyn IdentityProvider>> {
	match security.auth_mode.as_str() {
		AUTH_MODE_STATIC_KEYS => Ok(Arc::new(StaticKeys::new(&security.auth_keys))),
		AUTH_MODE_REMOTE => {
			let Some(remote) = security.remote.as_ref() else {
				return Err(eyre::eyre!("security.remote is required when auth_mode is remote."));
			};

			Ok(Arc::new(RemoteIdentity::from_config(remote)?))
		},
		other => Err(eyre::eyre!("Unsupported security.auth_mode {other:?}.")),
	}
}

pub async fn require_user(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
	let Some(token) = read_bearer_token(req.headers()).map(str::to_string) else {
		return ApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
	};
	let Some(user_id) = state.identity.resolve(&token).await else {
		return ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response();
	};

	req.extensions_mut().insert(AuthUser { user_id });

	next.run(req).await
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}
