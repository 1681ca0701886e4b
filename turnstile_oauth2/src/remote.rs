use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use turnstile::Jwks;
use url::Url;

use crate::{FetchError, Fetched, JwksSource};

/// A key set published over HTTP
///
/// Requests are conditional once the endpoint has handed out an `ETag`.
#[derive(Clone, Debug)]
pub struct RemoteJwks {
    url: Url,
    client: Client,
    name: String,
}

impl RemoteJwks {
    /// A source for the key set at `url`, using a dedicated HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(url: Url) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("turnstile_oauth2/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(url, client))
    }

    /// A source for the key set at `url`, sharing an existing HTTP client
    pub fn with_client(url: Url, client: Client) -> Self {
        let name = match url.host_str() {
            Some(host) => format!("JWKS at {host}"),
            None => "JWKS".to_owned(),
        };

        Self { url, client, name }
    }

    /// The key set location
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl JwksSource for RemoteJwks {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, etag: Option<&str>) -> Result<Fetched, FetchError> {
        let mut request = self.client.get(self.url.clone());
        if let Some(etag) = etag {
            request = request.header(header::IF_NONE_MATCH, etag);
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::Unreachable(Box::new(err)))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(Fetched::NotModified);
        } else if !status.is_success() {
            tracing::debug!(
                jwks.url = %self.url,
                http.status_code = status.as_u16(),
                "unexpected JWKS response status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Unreachable(Box::new(err)))?;

        let jwks: Jwks =
            serde_json::from_slice(&body).map_err(|err| FetchError::Malformed(Box::new(err)))?;

        Ok(Fetched::Updated { jwks, etag })
    }
}
