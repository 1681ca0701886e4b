use std::{error::Error, fmt};

use axum_core::{
    body::Body,
    response::{IntoResponse, Response},
};
use http::{header, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use turnstile_oauth2::{ErrorResponse, VerificationError};

/// The JSON body of a rejected request
///
/// Serializes as `{"message": ..., "identifier": ...}`; the identifier is
/// left out when there is none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// What went wrong
    pub message: String,

    /// The key, claim, scope, or permission concerned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl ErrorBody {
    /// A body with only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            identifier: None,
        }
    }
}

/// A request was refused by the authentication or authorization layer
///
/// Renders as a JSON [`ErrorBody`] under the carried status. `401` responses
/// also carry a `www-authenticate` challenge with `error="invalid_token"`,
/// and `403` responses one with `error="insufficient_scope"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthxError {
    status: StatusCode,
    body: ErrorBody,
}

impl AuthxError {
    /// Constructs an error with an explicit status and body
    pub fn new(status: StatusCode, body: ErrorBody) -> Self {
        Self { status, body }
    }

    /// The status the error is reported with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reported body
    #[must_use]
    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl fmt::Display for AuthxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.body.message)
    }
}

impl Error for AuthxError {}

impl From<ErrorResponse> for AuthxError {
    fn from(response: ErrorResponse) -> Self {
        // The mapper only produces 400, 401, and 403
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        Self {
            status,
            body: ErrorBody {
                message: response.message,
                identifier: response.identifier,
            },
        }
    }
}

impl From<VerificationError> for AuthxError {
    fn from(err: VerificationError) -> Self {
        Self::from(err.to_response())
    }
}

impl IntoResponse for AuthxError {
    fn into_response(self) -> Response {
        let body = match serde_json::to_vec(&self.body) {
            Ok(body) => body,
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };

        let mut resp = Response::new(Body::from(body));
        *resp.status_mut() = self.status;
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let www_authenticate = match self.status {
            StatusCode::UNAUTHORIZED => Some(challenge("invalid_token", &self.body.message)),
            StatusCode::FORBIDDEN => Some(challenge("insufficient_scope", &self.body.message)),
            _ => None,
        };

        if let Some(Ok(value)) = www_authenticate {
            resp.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }

        resp
    }
}

fn challenge(
    error: &'static str,
    description: &str,
) -> Result<HeaderValue, header::InvalidHeaderValue> {
    if description.is_empty() {
        HeaderValue::try_from(format!(r#"Bearer error="{error}""#))
    } else {
        HeaderValue::try_from(format!(
            r#"Bearer error="{error}" error_description="{}""#,
            description.escape_default()
        ))
    }
}
