//! Settings for both services, read from flags or the environment

use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use turnstile::{
    jwa,
    jwt::{Audience, Issuer},
};
use turnstile_oauth2::VerifierConfig;
use url::Url;

use crate::credentials::{ClientCredentials, ClientId, ClientSecret};

/// Settings for the auth service
#[derive(Clone, Debug, Parser)]
#[command(name = "auth-service", version, about = "Issues and verifies bearer tokens")]
pub struct AuthServiceConfig {
    /// The address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,

    /// The identity provider's token request URL
    #[arg(long, env = "TOKEN_ENDPOINT")]
    pub token_endpoint: Url,

    /// The identity provider's authorization URL, reported at startup
    #[arg(long, env = "AUTHORIZE_ENDPOINT")]
    pub authorize_endpoint: Option<Url>,

    /// Where the identity provider publishes its signing keys
    #[arg(long, env = "JWKS_ENDPOINT")]
    pub jwks_endpoint: Url,

    /// The grant type used when requesting tokens
    #[arg(long, env = "GRANT_TYPE", default_value = "client_credentials")]
    pub grant_type: String,

    /// The client ID presented to the identity provider
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: ClientId,

    /// The client secret presented to the identity provider
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: ClientSecret,

    /// The audience tokens are requested for and must be issued to
    #[arg(long, env = "AUDIENCE")]
    pub audience: Audience,

    /// The issuer tokens must come from
    #[arg(long, env = "ISSUER")]
    pub issuer: Issuer,

    /// The only algorithm tokens may be signed with
    #[arg(long, env = "ALGORITHM", default_value = "RS256")]
    pub algorithm: jwa::Algorithm,

    /// How long to wait for the key set, in seconds
    #[arg(long, env = "JWKS_FETCH_TIMEOUT_SECS", default_value_t = 5)]
    pub jwks_fetch_timeout_secs: u64,
}

impl AuthServiceConfig {
    /// What the verifier expects of admitted tokens
    pub fn verifier(&self) -> VerifierConfig {
        VerifierConfig {
            audience: self.audience.clone(),
            issuer: self.issuer.clone(),
            algorithm: self.algorithm,
            jwks_url: self.jwks_endpoint.to_string(),
            fetch_timeout: Duration::from_secs(self.jwks_fetch_timeout_secs),
        }
    }

    /// What the service presents to the token endpoint
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            grant_type: self.grant_type.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            audience: self.audience.clone(),
        }
    }
}

/// Settings for the traffic-log service
#[derive(Clone, Debug, Parser)]
#[command(
    name = "traffic-log-service",
    version,
    about = "Stores captured HTTP traffic behind the auth service"
)]
pub struct TrafficLogServiceConfig {
    /// The address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8001")]
    pub listen_addr: SocketAddr,

    /// The base URL of the auth service
    #[arg(long, env = "AUTH_SERVICE_URL")]
    pub auth_service_url: Url,

    /// How long to wait for an authorization decision, in seconds
    #[arg(long, env = "AUTH_SERVICE_TIMEOUT_SECS", default_value_t = 5)]
    pub auth_service_timeout_secs: u64,
}

impl TrafficLogServiceConfig {
    /// How long to wait for an authorization decision
    pub fn auth_service_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_service_timeout_secs)
    }
}
