use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// A single HTTP header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The header name
    pub key: String,
    /// The header value
    pub value: String,
}

/// One side of a captured exchange
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or address
    pub host: String,
    /// Port number
    pub port: u16,
}

/// A captured HTTP request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLog {
    /// `http` or `https`
    pub scheme: String,
    /// The protocol version, such as `1.1`
    pub http_version: String,
    /// The request method
    pub method: String,
    /// The receiving side
    pub server: Endpoint,
    /// The sending side
    pub client: Endpoint,
    /// The requested URL
    pub url: Url,
    /// The request headers, in the order they were sent
    pub headers: Vec<Header>,
    /// The request body, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A partial update to a [`TrafficLog`]
///
/// Absent fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficLogPatch {
    /// New scheme
    pub scheme: Option<String>,
    /// New protocol version
    pub http_version: Option<String>,
    /// New request method
    pub method: Option<String>,
    /// New receiving side
    pub server: Option<Endpoint>,
    /// New sending side
    pub client: Option<Endpoint>,
    /// New requested URL
    pub url: Option<Url>,
    /// Replacement headers
    pub headers: Option<Vec<Header>>,
    /// New request body
    pub body: Option<String>,
}

/// A traffic log field holds a value that is not allowed
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field} must be an http or https URL")]
pub struct InvalidTrafficLog {
    /// The offending field
    pub field: &'static str,
}

fn check_url(url: &Url) -> Result<(), InvalidTrafficLog> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(InvalidTrafficLog { field: "url" }),
    }
}

impl TrafficLog {
    /// Checks the fields a JSON schema cannot express
    ///
    /// # Errors
    ///
    /// Fails if the URL is not an `http` or `https` URL.
    pub fn validate(&self) -> Result<(), InvalidTrafficLog> {
        check_url(&self.url)
    }

    /// Overwrites every field the patch carries
    pub fn apply(&mut self, patch: TrafficLogPatch) {
        let TrafficLogPatch {
            scheme,
            http_version,
            method,
            server,
            client,
            url,
            headers,
            body,
        } = patch;

        if let Some(scheme) = scheme {
            self.scheme = scheme;
        }
        if let Some(http_version) = http_version {
            self.http_version = http_version;
        }
        if let Some(method) = method {
            self.method = method;
        }
        if let Some(server) = server {
            self.server = server;
        }
        if let Some(client) = client {
            self.client = client;
        }
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(headers) = headers {
            self.headers = headers;
        }
        if body.is_some() {
            self.body = body;
        }
    }
}

impl TrafficLogPatch {
    /// Checks the fields a JSON schema cannot express
    ///
    /// # Errors
    ///
    /// Fails if a URL is given that is not an `http` or `https` URL.
    pub fn validate(&self) -> Result<(), InvalidTrafficLog> {
        self.url.as_ref().map_or(Ok(()), check_url)
    }
}
