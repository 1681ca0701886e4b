use std::{fmt, sync::Arc};

use async_trait::async_trait;
use turnstile::{jwt::Claims, JwtRef};
use turnstile_oauth2::{AuthorizationRequirement, Verifier};

use crate::AuthxError;

/// Decides whether a bearer token satisfies a requirement
///
/// Implemented by [`Verifier`] for in-process verification. Services that
/// delegate to a separate authorization service implement it over their
/// client.
#[async_trait]
pub trait Authorize: Send + Sync + 'static {
    /// Verifies the token and checks it against the requirement
    async fn authorize(
        &self,
        token: &JwtRef,
        requirement: &AuthorizationRequirement,
    ) -> Result<Claims, AuthxError>;
}

#[async_trait]
impl Authorize for Verifier {
    async fn authorize(
        &self,
        token: &JwtRef,
        requirement: &AuthorizationRequirement,
    ) -> Result<Claims, AuthxError> {
        self.verify(token, requirement).await.map_err(|err| {
            tracing::debug!(
                error = %err,
                identifier = err.identifier(),
                "bearer token rejected"
            );
            AuthxError::from(err)
        })
    }
}

/// Shared handle to the [`Authorize`] implementation used by request guards
///
/// Make it reachable from the router state (directly, or through
/// [`FromRef`](axum_core::extract::FromRef)) so generated guards can find it.
#[derive(Clone)]
pub struct AuthGate(Arc<dyn Authorize>);

impl AuthGate {
    /// Wraps an authorizer
    pub fn new(authorizer: impl Authorize) -> Self {
        Self(Arc::new(authorizer))
    }

    /// Verifies the token and checks it against the requirement
    ///
    /// # Errors
    ///
    /// Returns the rejection rendered by the underlying authorizer.
    pub async fn authorize(
        &self,
        token: &JwtRef,
        requirement: &AuthorizationRequirement,
    ) -> Result<Claims, AuthxError> {
        self.0.authorize(token, requirement).await
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}
