use color_eyre::Result;
use serde_json::json;
use turnstile::{
    clock::{TestClock, UnixTime},
    jwa,
    jwt::Headers,
    JwtRef,
};
use turnstile_oauth2::{
    AuthorizationRequirement, ErrorResponse, StatusKind, VerificationError, Verifier,
};
use wiremock::MockServer;

mod common;

fn verifier(server: &MockServer) -> Result<Verifier> {
    Ok(Verifier::new(common::config(server))?)
}

#[tokio::test]
async fn valid_token_yields_claims_unchanged() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().expect(1).mount(&server).await;

    let claims = common::valid_claims()
        .with_claim("scope", "orders:read")
        .with_claim("tenant", json!({ "id": 42, "tags": ["eu", "beta"] }));
    let token = common::mint(&claims);
    let requirement = AuthorizationRequirement::new().with_scopes_str("orders:read")?;

    let verified = verifier(&server)?.verify(&token, &requirement).await?;

    assert_eq!(verified, claims);
    Ok(())
}

#[tokio::test]
async fn malformed_token_never_reaches_the_key_set() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().expect(0).mount(&server).await;

    let verifier = verifier(&server)?;
    for raw in ["", "not-a-jwt", "a.b", "e30.e30.e30.e30", "%%%.e30.sig"] {
        let err = verifier
            .verify(JwtRef::from_str(raw), &AuthorizationRequirement::new())
            .await
            .unwrap_err();

        assert!(
            matches!(err, VerificationError::MalformedToken { .. }),
            "{raw:?} gave {err:?}"
        );
        assert_eq!(err.status_kind(), StatusKind::BadRequest);
    }
    Ok(())
}

#[tokio::test]
async fn expired_token_is_unauthorized() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().mount(&server).await;

    let token = common::mint(&common::expired(common::valid_claims()));
    let err = verifier(&server)?
        .verify(&token, &AuthorizationRequirement::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        VerificationError::SignatureOrClaimInvalid {
            claim: Some("exp"),
            ..
        }
    ));
    assert_eq!(err.status_kind(), StatusKind::Unauthorized);
    Ok(())
}

#[tokio::test]
async fn expiry_is_exact_to_the_second() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().mount(&server).await;

    let claims = common::valid_claims().with_expiration(UnixTime(2_000_000_000));
    let token = common::mint(&claims);
    let verifier = verifier(&server)?;
    let requirement = AuthorizationRequirement::new();

    let before = TestClock::new(UnixTime(1_999_999_999));
    assert!(verifier
        .verify_with_clock(&token, &requirement, &before)
        .await
        .is_ok());

    let at = TestClock::new(UnixTime(2_000_000_000));
    assert!(verifier
        .verify_with_clock(&token, &requirement, &at)
        .await
        .is_err());
    Ok(())
}

#[tokio::test]
async fn unknown_key_id_is_unauthorized_and_named() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().expect(1).mount(&server).await;

    let token = common::mint_with_kid(&common::valid_claims(), "rotated-away");
    let err = verifier(&server)?
        .verify(&token, &AuthorizationRequirement::new())
        .await
        .unwrap_err();

    let response = ErrorResponse::from(err);
    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(response.identifier.as_deref(), Some("rotated-away"));
    Ok(())
}

#[tokio::test]
async fn header_without_kid_is_unauthorized_without_fetching() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().expect(0).mount(&server).await;

    let token = common::valid_claims().sign(
        &Headers::new(jwa::Algorithm::RS256),
        &common::private_key(),
    )?;
    let err = verifier(&server)?
        .verify(&token, &AuthorizationRequirement::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        VerificationError::KeyResolutionFailure {
            message: "token header does not name a signing key".into(),
            key_id: None,
        }
    );
    Ok(())
}

#[tokio::test]
async fn tampered_payload_fails_signature() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().mount(&server).await;

    let token = common::mint(&common::valid_claims().with_claim("scope", "orders:read"));
    let forged = common::mint(&common::valid_claims().with_claim("scope", "orders:admin"));

    let mut parts = token.as_str().split('.');
    let mut forged_parts = forged.as_str().split('.');
    let spliced = format!(
        "{}.{}.{}",
        parts.next().unwrap_or_default(),
        forged_parts.nth(1).unwrap_or_default(),
        parts.nth(1).unwrap_or_default(),
    );

    let err = verifier(&server)?
        .verify(JwtRef::from_str(&spliced), &AuthorizationRequirement::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        VerificationError::SignatureOrClaimInvalid { claim: None, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn wrong_audience_is_rejected_before_authorization() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().mount(&server).await;

    let claims = common::valid_claims()
        .with_claim("aud", json!(["api://billing", "api://reports"]))
        .with_claim("scope", "orders:read");
    let requirement = AuthorizationRequirement::new().with_scopes_str("admin")?;

    let err = verifier(&server)?
        .verify(&common::mint(&claims), &requirement)
        .await
        .unwrap_err();

    assert_eq!(err.identifier(), Some("aud"));
    assert_eq!(err.status_kind(), StatusKind::Unauthorized);
    Ok(())
}

#[tokio::test]
async fn missing_scope_is_forbidden() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().mount(&server).await;

    let token = common::mint(&common::valid_claims().with_claim("scope", "read write"));
    let requirement = AuthorizationRequirement::new().with_scopes_str("read admin")?;

    let err = verifier(&server)?
        .verify(&token, &requirement)
        .await
        .unwrap_err();

    let response = err.to_response();
    assert_eq!(response.status, StatusKind::Forbidden);
    assert_eq!(response.identifier.as_deref(), Some("admin"));
    Ok(())
}

#[tokio::test]
async fn missing_permissions_claim_is_a_bad_request() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().mount(&server).await;

    let token = common::mint(&common::valid_claims().with_claim("scope", "orders:read"));
    let requirement = AuthorizationRequirement::from_static("orders:read", &["orders:delete"]);

    let err = verifier(&server)?
        .verify(&token, &requirement)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        VerificationError::MissingClaim {
            claim: "permissions"
        }
    );
    assert_eq!(err.status_kind(), StatusKind::BadRequest);
    Ok(())
}

#[tokio::test]
async fn clones_share_one_key_cache() -> Result<()> {
    let server = MockServer::start().await;
    common::serve_jwks().expect(1).mount(&server).await;

    let first = verifier(&server)?;
    let second = first.clone();
    let token = common::mint(&common::valid_claims());

    first.verify(&token, &AuthorizationRequirement::new()).await?;
    second.verify(&token, &AuthorizationRequirement::new()).await?;
    Ok(())
}
