#![allow(dead_code)]

use std::time::Duration;

use turnstile::{
    clock::{System, UnixTime},
    jwa,
    jwt::{Audience, Claims, Headers, Issuer},
    Jwt,
};
use turnstile_oauth2::VerifierConfig;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const KEY_ID: &str = "turnstile-test-rsa";
pub const AUDIENCE: &str = "api://orders";
pub const ISSUER: &str = "https://issuer.example/";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

pub const JWKS: &str = include_str!("../../../turnstile/data/rsa/jwks.json");
const PRIVATE_KEY: &[u8] = include_bytes!("../../../turnstile/data/rsa/private.pk8");

pub fn private_key() -> jwa::rsa::PrivateKey {
    jwa::rsa::PrivateKey::from_pkcs8_der(PRIVATE_KEY).expect("fixture key is valid")
}

pub fn jwks_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), JWKS_PATH)
}

pub fn serve_jwks() -> Mock {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
}

pub fn config(server: &MockServer) -> VerifierConfig {
    VerifierConfig {
        audience: Audience::from_static(AUDIENCE),
        issuer: Issuer::from_static(ISSUER),
        algorithm: jwa::Algorithm::RS256,
        jwks_url: jwks_url(server),
        fetch_timeout: Duration::from_secs(2),
    }
}

/// Claims that pass every registered check for five minutes
pub fn valid_claims() -> Claims {
    Claims::new()
        .with_audience(Audience::from_static(AUDIENCE))
        .with_issuer(Issuer::from_static(ISSUER))
        .with_subject("client-7@clients")
        .with_future_expiration_from_clock(300, &System)
}

pub fn mint(claims: &Claims) -> Jwt {
    mint_with_kid(claims, KEY_ID)
}

pub fn mint_with_kid(claims: &Claims, kid: &'static str) -> Jwt {
    claims
        .sign(
            &Headers::new(jwa::Algorithm::RS256).with_key_id(kid),
            &private_key(),
        )
        .expect("fixture key signs RS256")
}

pub fn expired(claims: Claims) -> Claims {
    claims.with_expiration(UnixTime(1_600_000_000))
}
