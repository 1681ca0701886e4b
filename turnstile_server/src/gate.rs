//! Delegates authorization decisions to the auth service

use std::{error::Error as StdError, time::Duration};

use async_trait::async_trait;
use axum::http::StatusCode;
use turnstile::{jwt::Claims, JwtRef};
use turnstile_axum::{Authorize, AuthxError, ErrorBody};
use turnstile_oauth2::AuthorizationRequirement;
use url::Url;

/// An [`Authorize`] implementation backed by the auth service's
/// `/auth/authorize` endpoint
///
/// Rejections are relayed with the auth service's status and body. If the
/// auth service cannot be reached, requests are refused with
/// `503 Service Unavailable`.
#[derive(Clone, Debug)]
pub struct RemoteAuthorizer {
    client: reqwest::Client,
    authorize_url: Url,
}

/// A [`RemoteAuthorizer`] could not be built
#[derive(Debug, thiserror::Error)]
pub enum InvalidAuthServiceUrl {
    /// The authorize endpoint could not be derived from the base URL
    #[error("unable to derive the authorize endpoint")]
    Url(#[from] url::ParseError),

    /// The HTTP client could not be initialized
    #[error("unable to initialize HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

impl RemoteAuthorizer {
    /// Constructs an authorizer for the auth service at `base_url`
    ///
    /// A base URL with a path is treated as a directory, so
    /// `http://host/prefix` and `http://host/prefix/` both resolve to
    /// `http://host/prefix/auth/authorize`.
    ///
    /// # Errors
    ///
    /// Fails if the authorize endpoint cannot be resolved against the base
    /// URL or the HTTP client cannot be built.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, InvalidAuthServiceUrl> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("turnstile_server/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            authorize_url: as_directory(base_url).join("auth/authorize")?,
        })
    }

    /// The endpoint decisions are requested from
    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }
}

fn as_directory(base_url: &Url) -> Url {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn unavailable() -> AuthxError {
    AuthxError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorBody::message("authorization service unavailable"),
    )
}

fn bad_gateway() -> AuthxError {
    AuthxError::new(
        StatusCode::BAD_GATEWAY,
        ErrorBody::message("authorization service answered unexpectedly"),
    )
}

#[async_trait]
impl Authorize for RemoteAuthorizer {
    #[tracing::instrument(skip_all, fields(auth.url = %self.authorize_url))]
    async fn authorize(
        &self,
        token: &JwtRef,
        requirement: &AuthorizationRequirement,
    ) -> Result<Claims, AuthxError> {
        let mut query = vec![("access_token", token.as_str().to_owned())];
        if !requirement.scopes().is_empty() {
            let scopes: Vec<_> = requirement.scopes().iter().map(|s| s.as_str()).collect();
            query.push(("scopes", scopes.join(" ")));
        }
        if !requirement.permissions().is_empty() {
            let permissions: Vec<_> = requirement
                .permissions()
                .iter()
                .map(|p| p.as_str())
                .collect();
            query.push(("permissions", permissions.join(",")));
        }

        let resp = self
            .client
            .post(self.authorize_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(|err| {
                let error: &dyn StdError = &err;
                tracing::warn!(
                    error,
                    "unable to reach the authorization service"
                );
                unavailable()
            })?;

        let status = resp.status();
        tracing::debug!(
            http.status_code = status.as_u16(),
            "received authorization decision"
        );

        if status.is_success() {
            return resp.json::<Claims>().await.map_err(|err| {
                let error: &dyn StdError = &err;
                tracing::warn!(
                    error,
                    "authorization service answered with an unreadable body"
                );
                bad_gateway()
            });
        }

        if status.is_server_error() {
            tracing::warn!(
                http.status_code = status.as_u16(),
                "authorization service failed"
            );
        }

        let body = resp
            .json::<ErrorBody>()
            .await
            .unwrap_or_else(|_| ErrorBody::message("authorization failed"));

        Err(AuthxError::new(status, body))
    }
}
