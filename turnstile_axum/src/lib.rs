//! Axum glue for enforcing bearer token requirements
//!
//! Failures from the verification pipeline are rendered with
//! [`AuthxError`]: the mapped status, a JSON `{"message", "identifier"}`
//! body, and a `www-authenticate` challenge on `401` and `403` responses.
//!
//! Endpoints declare what they need with [`requirement_guard!`]. The
//! generated extractor reads the `Authorization: Bearer` header, hands the
//! token to the router's [`AuthGate`], and yields the verified claims.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use axum::{routing::get, Router};
//! use turnstile::{jwa, jwt};
//! use turnstile_axum::{requirement_guard, AuthGate};
//! use turnstile_oauth2::{KeyResolver, Verifier, VerifierConfig};
//!
//! requirement_guard!(ReadOrders; "orders:read");
//! requirement_guard!(DeleteOrders; "orders:write"; permissions = ["orders:delete"]);
//!
//! async fn list(_: ReadOrders) -> &'static str {
//!     "[]"
//! }
//!
//! async fn purge(DeleteOrders(claims): DeleteOrders) -> String {
//!     format!("purged by {}", claims.sub().unwrap_or("unknown"))
//! }
//!
//! # async fn run(resolver: KeyResolver) -> Result<(), Box<dyn std::error::Error>> {
//! let config = VerifierConfig {
//!     audience: jwt::Audience::from_static("api://orders"),
//!     issuer: jwt::Issuer::from_static("https://issuer.example/"),
//!     algorithm: jwa::Algorithm::RS256,
//!     jwks_url: "https://issuer.example/.well-known/jwks.json".into(),
//!     fetch_timeout: Duration::from_secs(5),
//! };
//! let gate = AuthGate::new(Verifier::with_resolver(&config, resolver));
//!
//! let router: Router = Router::new()
//!     .route("/orders", get(list).delete(purge))
//!     .with_state(gate);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use turnstile_oauth2::AuthorizationRequirement;

mod bearer;
mod error;
mod gate;
mod macros;

pub use bearer::{bearer_token, BearerToken};
pub use error::{AuthxError, ErrorBody};
pub use gate::{AuthGate, Authorize};

/// Declares the requirement an endpoint guard enforces
pub trait EndpointRequirement {
    /// The scopes and permissions a token must grant
    fn requirement() -> &'static AuthorizationRequirement;
}

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use axum_core::extract::{FromRef, FromRequestParts};
    pub use http::request::Parts;
    pub use once_cell::sync::OnceCell;
    pub use turnstile::jwt::Claims;
    pub use turnstile_oauth2::AuthorizationRequirement;

    use crate::{bearer_token, AuthGate, AuthxError};

    pub async fn from_request<S>(
        parts: &mut Parts,
        state: &S,
        requirement: &'static AuthorizationRequirement,
    ) -> Result<Claims, AuthxError>
    where
        AuthGate: FromRef<S>,
    {
        let token = bearer_token(&parts.headers)?;
        AuthGate::from_ref(state).authorize(token, requirement).await
    }
}
