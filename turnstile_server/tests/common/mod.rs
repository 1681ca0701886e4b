#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use clap::Parser;
use color_eyre::Result;
use http_body_util::BodyExt;
use serde_json::Value;
use turnstile::{
    clock::System,
    jwa,
    jwt::{Audience, Claims, Headers, Issuer},
};
use turnstile_server::config::AuthServiceConfig;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const KEY_ID: &str = "turnstile-test-rsa";
pub const AUDIENCE: &str = "api://traffic-logs";
pub const ISSUER: &str = "https://issuer.example/";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";
pub const TOKEN_PATH: &str = "/oauth/token";

const JWKS: &str = include_str!("../../../turnstile/data/rsa/jwks.json");
const PRIVATE_KEY: &[u8] = include_bytes!("../../../turnstile/data/rsa/private.pk8");

pub fn serve_jwks() -> Mock {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
}

/// Configuration pointing both identity provider endpoints at `idp`
pub fn auth_config(idp: &MockServer) -> Result<AuthServiceConfig> {
    let token_endpoint = format!("{}{}", idp.uri(), TOKEN_PATH);
    let jwks_endpoint = format!("{}{}", idp.uri(), JWKS_PATH);

    Ok(AuthServiceConfig::try_parse_from([
        "auth-service",
        "--token-endpoint",
        &token_endpoint,
        "--jwks-endpoint",
        &jwks_endpoint,
        "--client-id",
        "reporting",
        "--client-secret",
        "s3cr3t-value",
        "--audience",
        AUDIENCE,
        "--issuer",
        ISSUER,
        "--jwks-fetch-timeout-secs",
        "2",
    ])?)
}

pub fn claims(scope: &str) -> Claims {
    Claims::new()
        .with_audience(Audience::from_static(AUDIENCE))
        .with_issuer(Issuer::from_static(ISSUER))
        .with_subject("reporting@clients")
        .with_future_expiration_from_clock(300, &System)
        .with_claim("scope", scope)
        .with_claim("permissions", Value::Array(Vec::new()))
}

pub fn mint(claims: &Claims) -> String {
    let key = jwa::rsa::PrivateKey::from_pkcs8_der(PRIVATE_KEY).expect("fixture key is valid");
    claims
        .sign(&Headers::new(jwa::Algorithm::RS256).with_key_id(KEY_ID), &key)
        .expect("fixture key signs RS256")
        .as_str()
        .to_owned()
}

pub fn request(
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<&Value>,
) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
    }

    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(body)?)
        }
        None => Body::empty(),
    };

    Ok(builder.body(body)?)
}

pub async fn body_json(resp: Response) -> Result<Value> {
    let bytes = resp.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}
