//! The auth service: token issuance and authorization checks

use std::error::Error as StdError;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use turnstile::JwtRef;
use turnstile_axum::{AuthxError, ErrorBody};
use turnstile_oauth2::{AuthorizationRequirement, InvalidConfig, Verifier};

use crate::{
    config::AuthServiceConfig,
    credentials::{TokenClient, TokenRequestError},
};

/// Everything the auth service's handlers share
///
/// Cloning is cheap; every clone uses the same key cache.
#[derive(Clone, Debug)]
pub struct AuthState {
    verifier: Verifier,
    tokens: TokenClient,
}

/// The auth service could not be set up
#[derive(Debug, Error)]
pub enum SetupError {
    /// The verifier's configuration is not usable
    #[error(transparent)]
    Verifier(#[from] InvalidConfig),

    /// The HTTP client for the token endpoint could not be built
    #[error("unable to initialize HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

impl AuthState {
    /// Assembles the state from its parts
    pub fn new(verifier: Verifier, tokens: TokenClient) -> Self {
        Self { verifier, tokens }
    }

    /// Builds the verifier and the token client from configuration
    ///
    /// # Errors
    ///
    /// Fails if the key set URL or an HTTP client cannot be set up.
    pub fn from_config(config: &AuthServiceConfig) -> Result<Self, SetupError> {
        let verifier = Verifier::new(config.verifier())?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("turnstile_server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let tokens = TokenClient::new(client, config.token_endpoint.clone(), config.credentials());

        Ok(Self::new(verifier, tokens))
    }
}

/// The auth service's routes
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/echo", get(echo))
        .route("/auth/token", post(token))
        .route("/auth/authorize", post(authorize))
        .with_state(state)
}

async fn echo() -> Json<serde_json::Value> {
    Json(json!({ "message": "Echo method" }))
}

async fn token(State(state): State<AuthState>) -> Response {
    match state.tokens.request_token().await {
        Ok(token) => Json(token).into_response(),
        Err(err) => {
            let status = match &err {
                TokenRequestError::Rejected { status, .. } => Some(*status),
                _ => None,
            };
            let error: &dyn StdError = &err;
            tracing::error!(
                error,
                upstream.status_code = status,
                "unable to obtain an access token"
            );
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody::message(
                    "unable to obtain an access token from the identity provider",
                )),
            )
                .into_response()
        }
    }
}

/// Query parameters of `/auth/authorize`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizeQuery {
    /// The bearer token under test
    pub access_token: Option<String>,
    /// Required scopes, space-separated
    pub scopes: Option<String>,
    /// Required permissions, comma-separated
    pub permissions: Option<String>,
}

impl AuthorizeQuery {
    /// The requirement the query describes
    ///
    /// # Errors
    ///
    /// Fails if a scope entry is not a valid scope token.
    pub fn requirement(&self) -> Result<AuthorizationRequirement, AuthxError> {
        let requirement = match &self.scopes {
            Some(scopes) => AuthorizationRequirement::new()
                .with_scopes_str(scopes)
                .map_err(|err| {
                    AuthxError::new(
                        StatusCode::BAD_REQUEST,
                        ErrorBody {
                            message: format!("invalid scopes: {err}"),
                            identifier: Some("scopes".into()),
                        },
                    )
                })?,
            None => AuthorizationRequirement::new(),
        };

        let permissions = self
            .permissions
            .iter()
            .flat_map(|permissions| permissions.split(','))
            .map(str::trim)
            .filter(|permission| !permission.is_empty())
            .map(str::to_owned);

        Ok(requirement.with_permissions(permissions))
    }
}

async fn authorize(
    State(state): State<AuthState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response, AuthxError> {
    let token = query.access_token.as_deref().ok_or_else(|| {
        AuthxError::new(
            StatusCode::BAD_REQUEST,
            ErrorBody {
                message: "missing access token".into(),
                identifier: Some("access_token".into()),
            },
        )
    })?;
    let requirement = query.requirement()?;

    match state.verifier.verify(JwtRef::from_str(token), &requirement).await {
        Ok(claims) => {
            tracing::debug!(sub = claims.sub(), "access token authorized");
            Ok(Json(claims).into_response())
        }
        Err(err) => {
            tracing::info!(
                error = %err,
                identifier = err.identifier(),
                "access token rejected"
            );
            Err(AuthxError::from(err))
        }
    }
}
