use async_trait::async_trait;
use axum_core::extract::FromRequestParts;
use http::{header, request::Parts, HeaderMap};
use turnstile::{Jwt, JwtRef};
use turnstile_oauth2::VerificationError;

use crate::AuthxError;

/// The raw token presented in an `Authorization: Bearer` header
///
/// The token has not been verified. Extraction fails with a `400` when the
/// header is absent or does not use the bearer scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BearerToken(pub Jwt);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AuthxError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        Ok(Self(token.to_owned()))
    }
}

/// Reads the bearer token out of the `Authorization` header
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// Fails with [`VerificationError::MalformedToken`] if there is no usable
/// bearer token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&JwtRef, AuthxError> {
    let malformed = |message: &str| {
        AuthxError::from(VerificationError::MalformedToken {
            message: message.to_owned(),
        })
    };

    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| malformed("missing authorization header"))?
        .to_str()
        .map_err(|_| malformed("authorization header is not valid text"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(malformed("bearer token is empty"))
            } else {
                Ok(JwtRef::from_str(token))
            }
        }
        _ => Err(malformed("authorization header does not carry a bearer token")),
    }
}
