//! Client credentials and the identity provider's token endpoint

use std::fmt;

use aliri_braid::braid;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use turnstile::jwt::Audience;
use url::Url;

/// A client ID
#[braid(serde)]
pub struct ClientId;

/// A client secret
///
/// Only revealed under the alternate format, and then only the first few
/// characters unless a width is given.
#[braid(serde, debug = "owned", display = "owned", ord = "omit")]
pub struct ClientSecret;

impl fmt::Debug for ClientSecretRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            limited_reveal(&self.0, &mut *f, 5)?;
            f.write_str("\"")
        } else {
            f.write_str("***CLIENT SECRET***")
        }
    }
}

impl fmt::Display for ClientSecretRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            limited_reveal(&self.0, &mut *f, usize::MAX)
        } else {
            f.write_str("***CLIENT SECRET***")
        }
    }
}

fn limited_reveal(secret: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if secret.chars().count() <= max_len {
        return f.write_str(secret);
    }

    if max_len <= 1 {
        return f.write_str("…");
    }

    let cut = secret
        .char_indices()
        .nth(max_len - 1)
        .map_or(secret.len(), |(idx, _)| idx);
    f.write_str(&secret[..cut])?;
    f.write_str("…")
}

/// What the service presents to the identity provider
#[derive(Clone, Debug)]
pub struct ClientCredentials {
    /// The OAuth2 flow, usually `client_credentials`
    pub grant_type: String,
    /// The registered client
    pub client_id: ClientId,
    /// The client's secret
    pub client_secret: ClientSecret,
    /// The API the token is requested for
    pub audience: Audience,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

impl<'a> From<&'a ClientCredentials> for TokenRequest<'a> {
    fn from(credentials: &'a ClientCredentials) -> Self {
        Self {
            grant_type: &credentials.grant_type,
            client_id: credentials.client_id.as_str(),
            client_secret: credentials.client_secret.as_str(),
            audience: credentials.audience.as_str(),
        }
    }
}

/// The identity provider did not hand out a token
#[derive(Debug, Error)]
pub enum TokenRequestError {
    /// The token endpoint could not be reached
    #[error("error sending request to the token endpoint")]
    RequestSend(#[source] reqwest::Error),

    /// The token endpoint refused the request
    #[error("token endpoint answered with status {status}: {body}")]
    Rejected {
        /// The status of the answer
        status: u16,
        /// The body of the answer, as text
        body: String,
    },

    /// The answer could not be read
    #[error("error reading the token response")]
    BodyRead(#[source] reqwest::Error),

    /// The answer was not a JSON document
    #[error("token response is not valid JSON")]
    TokenBody(#[from] serde_json::Error),
}

/// Requests access tokens with the client credentials flow
#[derive(Clone, Debug)]
pub struct TokenClient {
    client: reqwest::Client,
    token_url: Url,
    credentials: ClientCredentials,
}

impl TokenClient {
    /// Constructs a client for the given token endpoint
    pub fn new(client: reqwest::Client, token_url: Url, credentials: ClientCredentials) -> Self {
        Self {
            client,
            token_url,
            credentials,
        }
    }

    /// Requests a token, returning the identity provider's JSON answer as is
    ///
    /// The credentials are sent as URL-encoded form data.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint cannot be reached, answers with a non-success
    /// status, or answers with something other than JSON.
    #[tracing::instrument(
        err,
        skip(self),
        fields(
            token_url = %self.token_url,
            credentials.grant_type = %self.credentials.grant_type,
            credentials.client_id = %self.credentials.client_id,
            credentials.audience = %self.credentials.audience,
        ),
    )]
    pub async fn request_token(&self) -> Result<Value, TokenRequestError> {
        tracing::trace!("requesting token from identity provider");

        let resp = self
            .client
            .post(self.token_url.clone())
            .form(&TokenRequest::from(&self.credentials))
            .send()
            .await
            .map_err(TokenRequestError::RequestSend)?;

        let status = resp.status();
        tracing::debug!(
            http.status_code = status.as_u16(),
            "received token response from identity provider"
        );

        if !status.is_success() {
            let body = resp.text().await.map_err(TokenRequestError::BodyRead)?;
            return Err(TokenRequestError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await.map_err(TokenRequestError::BodyRead)?;
        let token = serde_json::from_slice(&body)?;

        tracing::info!("received new token");
        Ok(token)
    }
}
