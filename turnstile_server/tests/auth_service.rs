use axum::{
    http::{header, StatusCode},
    Router,
};
use color_eyre::Result;
use serde_json::json;
use tower::ServiceExt;
use turnstile::clock::UnixTime;
use turnstile_server::auth::{self, AuthState};
use wiremock::{
    matchers::{body_string_contains, header as has_header, method, path},
    Mock, MockServer, ResponseTemplate,
};

mod common;

async fn app(idp: &MockServer) -> Result<Router> {
    let config = common::auth_config(idp)?;
    Ok(auth::router(AuthState::from_config(&config)?))
}

#[tokio::test]
async fn echo() -> Result<()> {
    let idp = MockServer::start().await;
    let resp = app(&idp)
        .await?
        .oneshot(common::request("GET", "/auth/echo", None, None)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        common::body_json(resp).await?,
        json!({ "message": "Echo method" })
    );
    Ok(())
}

#[tokio::test]
async fn token_is_passed_through() -> Result<()> {
    let idp = MockServer::start().await;
    let issued = json!({
        "access_token": "eyJhbGciOiJSUzI1NiJ9.e30.c2ln",
        "token_type": "Bearer",
        "expires_in": 86400,
    });
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .and(has_header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=reporting"))
        .and(body_string_contains("client_secret=s3cr3t-value"))
        .and(body_string_contains("audience=api%3A%2F%2Ftraffic-logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&issued))
        .expect(1)
        .mount(&idp)
        .await;

    let resp = app(&idp)
        .await?
        .oneshot(common::request("POST", "/auth/token", None, None)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(common::body_json(resp).await?, issued);
    Ok(())
}

#[tokio::test]
async fn refused_token_request_is_a_bad_gateway() -> Result<()> {
    let idp = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "access_denied" })),
        )
        .mount(&idp)
        .await;

    let resp = app(&idp)
        .await?
        .oneshot(common::request("POST", "/auth/token", None, None)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_json(resp).await?;
    assert!(body["message"].is_string());
    assert!(!body.to_string().contains("s3cr3t"));
    Ok(())
}

#[tokio::test]
async fn authorize_returns_verified_claims() -> Result<()> {
    let idp = MockServer::start().await;
    common::serve_jwks().expect(1).mount(&idp).await;
    let claims = common::claims("traffic_logs:read traffic_logs:write");
    let token = common::mint(&claims);

    let app = app(&idp).await?;
    for scopes in ["traffic_logs:read", "traffic_logs:read%20traffic_logs:write"] {
        let uri = format!("/auth/authorize?access_token={token}&scopes={scopes}");
        let resp = app
            .clone()
            .oneshot(common::request("POST", &uri, None, None)?)
            .await?;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            common::body_json(resp).await?,
            serde_json::to_value(&claims)?
        );
    }
    Ok(())
}

#[tokio::test]
async fn authorize_without_token_is_a_bad_request() -> Result<()> {
    let idp = MockServer::start().await;
    common::serve_jwks().expect(0).mount(&idp).await;

    let resp = app(&idp)
        .await?
        .oneshot(common::request(
            "POST",
            "/auth/authorize?scopes=traffic_logs:read",
            None,
            None,
        )?)
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        common::body_json(resp).await?,
        json!({ "message": "missing access token", "identifier": "access_token" })
    );
    Ok(())
}

#[tokio::test]
async fn authorize_reports_insufficient_scope() -> Result<()> {
    let idp = MockServer::start().await;
    common::serve_jwks().mount(&idp).await;
    let token = common::mint(&common::claims("traffic_logs:read"));

    let uri = format!("/auth/authorize?access_token={token}&scopes=traffic_logs:write");
    let resp = app(&idp)
        .await?
        .oneshot(common::request("POST", &uri, None, None)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(
        common::body_json(resp).await?["identifier"],
        "traffic_logs:write"
    );
    Ok(())
}

#[tokio::test]
async fn authorize_reports_missing_permission() -> Result<()> {
    let idp = MockServer::start().await;
    common::serve_jwks().mount(&idp).await;
    let claims =
        common::claims("traffic_logs:write").with_claim("permissions", json!(["logs:export"]));
    let token = common::mint(&claims);

    let uri = format!("/auth/authorize?access_token={token}&permissions=logs:export,logs:purge");
    let resp = app(&idp)
        .await?
        .oneshot(common::request("POST", &uri, None, None)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::body_json(resp).await?["identifier"], "logs:purge");
    Ok(())
}

#[tokio::test]
async fn authorize_rejects_expired_token() -> Result<()> {
    let idp = MockServer::start().await;
    common::serve_jwks().mount(&idp).await;
    let token = common::mint(
        &common::claims("traffic_logs:read").with_expiration(UnixTime(1_600_000_000)),
    );

    let uri = format!("/auth/authorize?access_token={token}");
    let resp = app(&idp)
        .await?
        .oneshot(common::request("POST", &uri, None, None)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(resp).await?["identifier"], "exp");
    Ok(())
}

#[tokio::test]
async fn authorize_rejects_invalid_scope_list() -> Result<()> {
    let idp = MockServer::start().await;
    common::serve_jwks().expect(0).mount(&idp).await;
    let token = common::mint(&common::claims("traffic_logs:read"));

    let uri = format!("/auth/authorize?access_token={token}&scopes=traffic_logs:read%20a%22b");
    let resp = app(&idp)
        .await?
        .oneshot(common::request("POST", &uri, None, None)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_json(resp).await?["identifier"], "scopes");
    Ok(())
}
