use serde::Serialize;
use thiserror::Error;
use turnstile::{error::JwtVerifyError, jwk::KeyId};

use crate::{Permission, ScopeToken};

/// The reasons a bearer token can be refused
///
/// Every failure in the pipeline is reported as exactly one of these kinds.
/// Each carries a human-readable message (its `Display` output) and, where one
/// applies, an identifier naming the offending key, claim, scope, or
/// permission.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The token could not be parsed into a header, payload, and signature
    #[error("{message}")]
    MalformedToken {
        /// What was wrong with the token's structure
        message: String,
    },

    /// No signing key could be found for the token
    #[error("{message}")]
    KeyResolutionFailure {
        /// Whether the key was unknown or the key set unreachable
        message: String,
        /// The key ID named in the token header
        key_id: Option<KeyId>,
    },

    /// The signature did not verify or a registered claim was rejected
    #[error("{message}")]
    SignatureOrClaimInvalid {
        /// The first check that failed
        message: String,
        /// The claim that failed the check, if any
        claim: Option<&'static str>,
    },

    /// A claim needed for authorization is absent or has the wrong shape
    #[error("No claim '{claim}' found in token")]
    MissingClaim {
        /// The name of the claim
        claim: &'static str,
    },

    /// The token does not grant a required scope
    #[error("Insufficient scope ({scope}). You don't have access to this resource")]
    InsufficientScope {
        /// The first required scope not granted
        scope: ScopeToken,
    },

    /// The token does not grant a required permission
    #[error("Insufficient permissions ({permission}). You don't have access to this resource")]
    InsufficientPermission {
        /// The first required permission not granted
        permission: Permission,
    },
}

impl VerificationError {
    /// The human-readable description of the failure
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The key, claim, scope, or permission the failure concerns
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::MalformedToken { .. } => None,
            Self::KeyResolutionFailure { key_id, .. } => key_id.as_ref().map(|k| k.as_str()),
            Self::SignatureOrClaimInvalid { claim, .. } => *claim,
            Self::MissingClaim { claim } => Some(*claim),
            Self::InsufficientScope { scope } => Some(scope.as_str()),
            Self::InsufficientPermission { permission } => Some(permission.as_str()),
        }
    }

    /// The class of transport status this failure is reported with
    #[must_use]
    pub fn status_kind(&self) -> StatusKind {
        match self {
            Self::MalformedToken { .. } | Self::MissingClaim { .. } => StatusKind::BadRequest,
            Self::KeyResolutionFailure { .. } | Self::SignatureOrClaimInvalid { .. } => {
                StatusKind::Unauthorized
            }
            Self::InsufficientScope { .. } | Self::InsufficientPermission { .. } => {
                StatusKind::Forbidden
            }
        }
    }

    /// Maps the failure onto its reportable form
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status_kind(),
            message: self.message(),
            identifier: self.identifier().map(ToOwned::to_owned),
        }
    }
}

impl From<JwtVerifyError> for VerificationError {
    fn from(err: JwtVerifyError) -> Self {
        match err {
            JwtVerifyError::MalformedToken(_)
            | JwtVerifyError::MalformedTokenHeader(_)
            | JwtVerifyError::MalformedTokenPayload(_)
            | JwtVerifyError::MalformedTokenSignature(_) => Self::MalformedToken {
                message: err.to_string(),
            },
            JwtVerifyError::JwkVerifyError(inner) => Self::SignatureOrClaimInvalid {
                message: inner.to_string(),
                claim: None,
            },
            JwtVerifyError::ClaimsRejected(rejected) => Self::SignatureOrClaimInvalid {
                message: rejected.to_string(),
                claim: Some(rejected.claim()),
            },
        }
    }
}

/// Transport-independent classes of failure status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// The request itself is unusable (400)
    BadRequest,
    /// The caller is not authenticated (401)
    Unauthorized,
    /// The caller is authenticated but not allowed (403)
    Forbidden,
}

impl StatusKind {
    /// The HTTP status code for this class
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
        }
    }
}

/// A failure in the form a transport renders it
///
/// Serializes as `{"message": ..., "identifier": ...}`, leaving out the
/// identifier when there is none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// The status class
    #[serde(skip)]
    pub status: StatusKind,
    /// The human-readable description
    pub message: String,
    /// The key, claim, scope, or permission concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl From<VerificationError> for ErrorResponse {
    fn from(err: VerificationError) -> Self {
        err.to_response()
    }
}
