//! Verification and authorization of OAuth2 bearer tokens
//!
//! This crate turns an opaque bearer token into a verified set of claims, or
//! into a typed [`VerificationError`] that knows how it should be reported.
//! The pipeline runs strictly in order and stops at the first failure:
//!
//! 1. structural parse of the token
//! 2. signing key lookup by the header's `kid`, via the [`KeyResolver`]
//! 3. signature and registered claim checks ([`validate()`])
//! 4. required scopes, then required permissions ([`authorize()`])
//!
//! The [`Verifier`] bundles these stages behind a single call.
//!
//! ```no_run
//! use std::time::Duration;
//! use turnstile::{jwa, jwt, JwtRef};
//! use turnstile_oauth2::{AuthorizationRequirement, Verifier, VerifierConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = Verifier::new(VerifierConfig {
//!     audience: jwt::Audience::from_static("api://orders"),
//!     issuer: jwt::Issuer::from_static("https://issuer.example/"),
//!     algorithm: jwa::Algorithm::RS256,
//!     jwks_url: "https://issuer.example/.well-known/jwks.json".into(),
//!     fetch_timeout: Duration::from_secs(5),
//! })?;
//!
//! let requirement = AuthorizationRequirement::new().with_scopes_str("orders:read")?;
//! let token = JwtRef::from_str("eyJhbGciOi...");
//!
//! match verifier.verify(token, &requirement).await {
//!     Ok(claims) => println!("subject: {:?}", claims.sub()),
//!     Err(err) => println!("{} {}", err.status_kind().as_u16(), err),
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
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

mod error;
mod requirement;
mod resolver;
mod validate;
mod verifier;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
mod remote;

pub use error::{ErrorResponse, StatusKind, VerificationError};
pub use requirement::{
    authorize, AuthorizationRequirement, InvalidScopeToken, Permission, PermissionRef,
    ScopeToken, ScopeTokenRef,
};
pub use resolver::{FetchError, Fetched, JwksSource, KeyResolver};
pub use validate::{validate, validate_with_clock};
pub use verifier::{Verifier, VerifierConfig};

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub use remote::RemoteJwks;
#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub use verifier::InvalidConfig;
