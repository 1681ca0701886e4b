use turnstile::{
    clock::{Clock, System},
    jwa,
    jwt::{AudienceRef, Claims, CoreValidator, IssuerRef},
    Jwk, JwtRef,
};

use crate::VerificationError;

/// Verifies a token against a resolved key and the expected registered claims
///
/// Checks run in a fixed order and stop at the first failure: structure,
/// signature under `algorithm`, expiration, not-before, audience, issuer, and
/// finally the header's declared algorithm. Expiration is strict; a token is
/// rejected from the second named in its `exp` claim.
///
/// # Errors
///
/// * [`VerificationError::MalformedToken`] if the token cannot be split and
///   decoded
/// * [`VerificationError::SignatureOrClaimInvalid`] naming the first failed
///   check otherwise
pub fn validate(
    token: &JwtRef,
    key: &Jwk,
    audience: &AudienceRef,
    issuer: &IssuerRef,
    algorithm: jwa::Algorithm,
) -> Result<Claims, VerificationError> {
    validate_with_clock(token, key, audience, issuer, algorithm, &System)
}

/// Verifies a token as [`validate()`] does, reading the time from `clock`
///
/// # Errors
///
/// See [`validate()`].
pub fn validate_with_clock<C: Clock>(
    token: &JwtRef,
    key: &Jwk,
    audience: &AudienceRef,
    issuer: &IssuerRef,
    algorithm: jwa::Algorithm,
    clock: &C,
) -> Result<Claims, VerificationError> {
    let validator = CoreValidator::new(algorithm)
        .require_audience(audience.to_owned())
        .require_issuer(issuer.to_owned());

    let claims = token
        .decompose()?
        .verify_with_clock(key, &validator, clock)?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use turnstile::{
        b64::Base64Url,
        clock::{TestClock, UnixTime},
        jwt::{Audience, Headers, Issuer},
    };

    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn secret() -> jwa::Hmac {
        jwa::Hmac::new(Base64Url::from_raw(b"correct horse battery staple".to_vec()))
    }

    fn claims() -> Claims {
        Claims::new()
            .with_audience(Audience::from_static("api://orders"))
            .with_issuer(Issuer::from_static("https://issuer.example/"))
            .with_expiration(UnixTime(NOW + 60))
            .with_claim("scope", "orders:read")
    }

    fn check(token: &JwtRef) -> Result<Claims, VerificationError> {
        validate_with_clock(
            token,
            &Jwk::from(secret()),
            AudienceRef::from_str("api://orders"),
            IssuerRef::from_str("https://issuer.example/"),
            jwa::Algorithm::HS256,
            &TestClock::new(UnixTime(NOW)),
        )
    }

    #[test]
    fn accepts_and_returns_full_claims() -> Result<()> {
        let token = claims().sign(&Headers::new(jwa::Algorithm::HS256), &secret())?;

        assert_eq!(check(&token)?, claims());
        Ok(())
    }

    #[test]
    fn garbage_is_malformed() {
        for raw in ["", "abc", "a.b", "a.b.c.d", "!!!.@@@.###"] {
            let err = check(JwtRef::from_str(raw)).unwrap_err();
            assert!(
                matches!(err, VerificationError::MalformedToken { .. }),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn expired_token_names_exp() -> Result<()> {
        let token = claims()
            .with_expiration(UnixTime(NOW))
            .sign(&Headers::new(jwa::Algorithm::HS256), &secret())?;

        let err = check(&token).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::SignatureOrClaimInvalid {
                claim: Some("exp"),
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn wrong_key_is_a_signature_failure() -> Result<()> {
        let other = jwa::Hmac::new(Base64Url::from_raw(b"another secret".to_vec()));
        let token = claims().sign(&Headers::new(jwa::Algorithm::HS256), &other)?;

        let err = check(&token).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::SignatureOrClaimInvalid { claim: None, .. }
        ));
        Ok(())
    }

    #[test]
    fn audience_and_issuer_are_enforced() -> Result<()> {
        let headers = Headers::new(jwa::Algorithm::HS256);

        let token = claims()
            .with_audience(Audience::from_static("api://billing"))
            .sign(&headers, &secret())?;
        assert_eq!(check(&token).unwrap_err().identifier(), Some("aud"));

        let token = claims()
            .with_issuer(Issuer::from_static("https://elsewhere.example/"))
            .sign(&headers, &secret())?;
        assert_eq!(check(&token).unwrap_err().identifier(), Some("iss"));
        Ok(())
    }
}
