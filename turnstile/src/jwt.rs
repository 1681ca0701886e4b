//! JSON Web Tokens (JWT)
//!
//! The specification for JSON Web Tokens can be found in [RFC7519][].
//!
//! A token is handled in two stages. [`JwtRef::decompose()`] performs the
//! structural parse, exposing only the untrusted header so that a caller can
//! select a verification key. [`Decomposed::verify()`] then checks the
//! signature and runs the [`CoreValidator`] over the claims, yielding
//! [`Claims`] only when every check passes.
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

use std::{fmt, time::Duration};

use aliri_braid::braid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    b64::Base64Url,
    clock::{Clock, System, UnixTime},
    error, jwa, jwk, jws,
};

/// An audience
#[braid(serde, ref_doc = "A borrowed reference to an [`Audience`]")]
pub struct Audience;

/// An issuer of JWTs
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// A JSON Web Token
///
/// This type provides custom implementations of [`Display`][JwtRef#impl-Display] and
/// [`Debug`][JwtRef#impl-Debug] to prevent unintentional disclosures of sensitive values.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ord = "omit",
    ref_doc = "\
    A borrowed reference to a JSON Web Token ([`Jwt`])\n\
    \n\
    This type provides custom implementations of [`Display`][Self#impl-Display] and \
    [`Debug`][Self#impl-Debug] to prevent unintentional disclosures of sensitive values."
)]
#[must_use]
pub struct Jwt;

impl Jwt {
    /// Constructs a new JWT from a header and claims, signed by `signer`
    ///
    /// # Errors
    ///
    /// * If the header names an algorithm that is not supported
    /// * If serialization of either the header or claims fails
    /// * If the signer cannot produce signatures for the header's algorithm
    pub fn try_from_parts_with_signature<S>(
        headers: &Headers,
        claims: &Claims,
        signer: &S,
    ) -> Result<Self, error::JwtSigningError>
    where
        S: jws::Signer<Algorithm = jwa::Algorithm>,
        error::SigningError: From<S::Error>,
    {
        let alg: jwa::Algorithm = headers
            .alg()
            .parse()
            .map_err(|e| error::SigningError::Unexpected(error::unexpected(e)))?;

        let h_raw =
            Base64Url::from_raw(serde_json::to_vec(headers).map_err(error::malformed_jwt_header)?);
        let p_raw =
            Base64Url::from_raw(serde_json::to_vec(claims).map_err(error::malformed_jwt_payload)?);

        let mut message = format!("{}.{}", h_raw, p_raw);

        let signature = signer
            .sign(alg, message.as_bytes())
            .map_err(error::SigningError::from)?;

        message.push('.');
        message.push_str(&Base64Url::from_raw(signature).to_string());

        Ok(Self::new(message))
    }
}

macro_rules! expect_three {
    ($iter:expr) => {{
        let mut i = $iter;
        match (i.next(), i.next(), i.next(), i.next()) {
            (Some(first), Some(second), Some(third), None) => Some((first, second, third)),
            _ => None,
        }
    }};
}

impl JwtRef {
    /// Splits the token into its three segments and decodes them
    ///
    /// Only the header is parsed as JSON at this stage. The payload is decoded
    /// but its contents are not interpreted until the signature is verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the token does not have exactly three segments, if
    /// any segment is not valid base64url, or if the header is not a JSON
    /// object carrying an `alg` string.
    pub fn decompose(&self) -> Result<Decomposed<'_>, error::JwtVerifyError> {
        let (h_str, p_str, s_str) =
            expect_three!(self.as_str().split('.')).ok_or_else(error::malformed_jwt)?;

        let h_raw = Base64Url::from_encoded(h_str).map_err(error::malformed_jwt_header)?;
        let payload = Base64Url::from_encoded(p_str).map_err(error::malformed_jwt_payload)?;
        let signature = Base64Url::from_encoded(s_str).map_err(error::malformed_jwt_signature)?;

        let header: Headers =
            serde_json::from_slice(h_raw.as_slice()).map_err(error::malformed_jwt_header)?;

        let message = &self.as_str()[..h_str.len() + 1 + p_str.len()];

        Ok(Decomposed {
            header,
            message,
            payload,
            signature,
        })
    }

    /// Verifies the token against a particular key and validator
    ///
    /// If the key must be chosen based on the header, use [`decompose()`][Self::decompose]
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, the signature does not
    /// match, or the claims are rejected.
    pub fn verify<V>(&self, key: &V, validator: &CoreValidator) -> Result<Claims, error::JwtVerifyError>
    where
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
    {
        self.decompose()?.verify(key, validator)
    }
}

/// A structurally valid JWT whose contents have not been verified
///
/// This structure is suitable for inspection to determine which key
/// should be used to verify the JWT.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Decomposed<'a> {
    header: Headers,
    message: &'a str,
    payload: Base64Url,
    signature: Base64Url,
}

impl<'a> Decomposed<'a> {
    /// Verifies the signature and claims using the system clock
    ///
    /// # Errors
    ///
    /// Returns an error if the signature does not match under the
    /// validator's algorithm, if the payload is not a JSON object, or if the
    /// claims are rejected.
    pub fn verify<V>(self, key: &V, validator: &CoreValidator) -> Result<Claims, error::JwtVerifyError>
    where
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
    {
        self.verify_with_clock(key, validator, &System)
    }

    /// Verifies the signature and claims against a specific clock
    ///
    /// # Errors
    ///
    /// See [`verify()`][Self::verify].
    pub fn verify_with_clock<V, C>(
        self,
        key: &V,
        validator: &CoreValidator,
        clock: &C,
    ) -> Result<Claims, error::JwtVerifyError>
    where
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
        C: Clock,
    {
        key.verify(
            validator.algorithm(),
            self.message.as_bytes(),
            self.signature.as_slice(),
        )?;

        let claims: Map<String, Value> =
            serde_json::from_slice(self.payload.as_slice()).map_err(error::malformed_jwt_payload)?;
        let claims = Claims(claims);

        validator.validate_with_clock(&self.header, &claims, clock)?;

        Ok(claims)
    }

    /// The key ID named in the header
    ///
    /// **WARNING:** *This value has not been verified.* It is only suitable
    /// for choosing which key to verify the token with.
    #[must_use]
    pub fn kid(&self) -> Option<&jwk::KeyIdRef> {
        self.header.kid()
    }

    /// The untrusted header of the JWT
    ///
    /// **WARNING:** *This header has not been verified and should not be trusted.*
    /// An adversary can place arbitrary data into the header and payload of a JWT.
    pub fn untrusted_header(&self) -> &Headers {
        &self.header
    }

    /// The untrusted signing input of the JWT
    ///
    /// This contains the encoded header and payload, separated by a `.`.
    #[must_use]
    pub fn untrusted_message(&self) -> &'a str {
        self.message
    }

    /// The raw signature of the JWT
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        self.signature.as_slice()
    }
}

/// By default, this type holds potentially sensitive information. It will
/// only print its contents under the alternate format, i.e. `{:#?}`, and even
/// then omits the signature unless a width is given, i.e. `{:#25?}`.
///
/// If not specified, a placeholder value will be printed out instead.
///
/// # Example
///
/// ```
/// # use turnstile::jwt::JwtRef;
/// #
/// let token = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.2N5yyY2UjqlUKSSCpFVWzfixfBRTWahiN2PrUuiuxbE");
///
/// assert_eq!(format!("{:?}", token), "***JWT***");
/// assert_eq!(format!("{:#?}", token), "\"eyJhbGciOiJIUzI1NiJ9.e30.…\"");
/// assert_eq!(format!("{:#5?}", token), "\"eyJhbGciOiJIUzI1NiJ9.e30.2N5y…\"");
/// ```
impl fmt::Debug for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            reveal_unsigned(&self.0, &mut *f, 0)?;
            f.write_str("\"")
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// By default, this type holds potentially sensitive information. It will
/// only print its contents under the alternate format, i.e. `{:#}`, which
/// prints the whole token unless a width is given to elide part of the
/// signature, i.e. `{:#10}`.
///
/// # Example
///
/// ```
/// # use turnstile::jwt::JwtRef;
/// #
/// let token = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.2N5yyY2UjqlUKSSCpFVWzfixfBRTWahiN2PrUuiuxbE");
///
/// assert_eq!(format!("{}", token), "***JWT***");
/// assert_eq!(format!("{:#}", token), token.as_str());
/// assert_eq!(format!("{:#5}", token), "eyJhbGciOiJIUzI1NiJ9.e30.2N5y…");
/// ```
impl fmt::Display for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            reveal_unsigned(&self.0, &mut *f, usize::MAX)
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// Writes everything up to the last `.` verbatim, then at most `width`
/// characters of the remainder
fn reveal_unsigned(token: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let (signed, signature) = match token.rfind('.') {
        Some(idx) => token.split_at(idx + 1),
        None => ("", token),
    };

    f.write_str(signed)?;

    let max_len = f.width().unwrap_or(default_len);
    if signature.chars().count() <= max_len {
        return f.write_str(signature);
    }

    if max_len <= 1 {
        return f.write_str("…");
    }

    let cut = signature
        .char_indices()
        .nth(max_len - 1)
        .map_or(signature.len(), |(idx, _)| idx);
    f.write_str(&signature[..cut])?;
    f.write_str("…")
}

/// The JOSE header of a token
///
/// The algorithm is retained exactly as it appears in the token so that a
/// mismatch can be reported by the validator instead of failing the parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Headers {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<jwk::KeyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl Headers {
    /// Headers for a token signed with `alg`
    pub fn new(alg: jwa::Algorithm) -> Self {
        Self {
            alg: alg.name().to_owned(),
            kid: None,
            typ: Some("JWT".to_owned()),
        }
    }

    /// Names the key the token is signed with
    pub fn with_key_id(self, kid: impl Into<jwk::KeyId>) -> Self {
        Self {
            kid: Some(kid.into()),
            ..self
        }
    }

    /// The `alg` header, verbatim
    #[must_use]
    pub fn alg(&self) -> &str {
        &self.alg
    }

    /// The `kid` header
    #[must_use]
    pub fn kid(&self) -> Option<&jwk::KeyIdRef> {
        self.kid.as_deref()
    }

    /// The `typ` header
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }
}

/// The full set of claims carried by a token
///
/// Registered claims are read through typed accessors. Every other claim is
/// retained as raw JSON so that the complete claim map can be handed back to
/// callers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// An empty claim set
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// A claim by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether a claim is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// A view of the whole claim map
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwraps the claim map
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// The `iss` claim, if it is a string
    #[must_use]
    pub fn iss(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }

    /// The `sub` claim, if it is a string
    #[must_use]
    pub fn sub(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// The `exp` claim
    ///
    /// # Errors
    ///
    /// Returns an error if the claim is present but not a number.
    pub fn exp(&self) -> Result<Option<UnixTime>, error::ClaimsRejected> {
        self.numeric_date("exp")
    }

    /// The `nbf` claim
    ///
    /// # Errors
    ///
    /// Returns an error if the claim is present but not a number.
    pub fn nbf(&self) -> Result<Option<UnixTime>, error::ClaimsRejected> {
        self.numeric_date("nbf")
    }

    /// The `aud` claim, which may be a single string or an array of strings
    ///
    /// # Errors
    ///
    /// Returns an error if the claim is present but of any other shape.
    pub fn aud(&self) -> Result<Vec<&AudienceRef>, error::ClaimsRejected> {
        match self.get("aud") {
            None => Ok(Vec::new()),
            Some(Value::String(aud)) => Ok(vec![AudienceRef::from_str(aud)]),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(AudienceRef::from_str)
                        .ok_or(error::ClaimsRejected::InvalidClaimType("aud"))
                })
                .collect(),
            Some(_) => Err(error::ClaimsRejected::InvalidClaimType("aud")),
        }
    }

    fn numeric_date(&self, name: &'static str) -> Result<Option<UnixTime>, error::ClaimsRejected> {
        let value = match self.get(name) {
            Some(v) => v,
            None => return Ok(None),
        };

        if let Some(secs) = value.as_u64() {
            return Ok(Some(UnixTime(secs)));
        }

        match value.as_f64() {
            // Fractional and pre-epoch dates are truncated into range
            Some(secs) if secs.is_finite() => Ok(Some(UnixTime(secs.max(0.0) as u64))),
            _ => Err(error::ClaimsRejected::InvalidClaimType(name)),
        }
    }

    /// Sets an arbitrary claim
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Sets the `iss` claim
    pub fn with_issuer(self, iss: impl Into<Issuer>) -> Self {
        self.with_claim("iss", iss.into().take())
    }

    /// Sets the `aud` claim to a single audience
    pub fn with_audience(self, aud: impl Into<Audience>) -> Self {
        self.with_claim("aud", aud.into().take())
    }

    /// Sets the `sub` claim
    pub fn with_subject(self, sub: impl Into<String>) -> Self {
        self.with_claim("sub", sub.into())
    }

    /// Sets the `exp` claim
    pub fn with_expiration(self, exp: UnixTime) -> Self {
        self.with_claim("exp", exp.0)
    }

    /// Sets the `exp` claim to `secs` seconds after the clock's current time
    pub fn with_future_expiration_from_clock<C: Clock>(self, secs: u64, clock: &C) -> Self {
        let exp = UnixTime(clock.now().0.saturating_add(secs));
        self.with_expiration(exp)
    }

    /// Signs the claims, producing a token
    ///
    /// # Errors
    ///
    /// See [`Jwt::try_from_parts_with_signature()`].
    pub fn sign<S>(&self, headers: &Headers, signer: &S) -> Result<Jwt, error::JwtSigningError>
    where
        S: jws::Signer<Algorithm = jwa::Algorithm>,
        error::SigningError: From<S::Error>,
    {
        Jwt::try_from_parts_with_signature(headers, self, signer)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Claims> for Map<String, Value> {
    fn from(claims: Claims) -> Self {
        claims.0
    }
}

/// Checks the registered claims of a token whose signature has been verified
///
/// Checks run in a fixed order and stop at the first failure:
///
/// 1. expiration (`exp`), which must be present unless ignored
/// 2. not-before (`nbf`), only when present
/// 3. audience (`aud`), when an audience is required
/// 4. issuer (`iss`), when an issuer is required
/// 5. the header's `alg` against the expected algorithm
///
/// No leeway is granted on temporal claims unless configured.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct CoreValidator {
    algorithm: jwa::Algorithm,
    audience: Option<Audience>,
    issuer: Option<Issuer>,
    leeway: Duration,
    validate_exp: bool,
    validate_nbf: bool,
}

impl CoreValidator {
    /// A validator expecting tokens signed with `algorithm`
    pub fn new(algorithm: jwa::Algorithm) -> Self {
        Self {
            algorithm,
            audience: None,
            issuer: None,
            leeway: Duration::ZERO,
            validate_exp: true,
            validate_nbf: true,
        }
    }

    /// The expected signing algorithm
    #[must_use]
    pub fn algorithm(&self) -> jwa::Algorithm {
        self.algorithm
    }

    /// Requires `aud` to name this audience
    pub fn require_audience(self, audience: impl Into<Audience>) -> Self {
        Self {
            audience: Some(audience.into()),
            ..self
        }
    }

    /// Requires `iss` to equal this issuer
    pub fn require_issuer(self, issuer: impl Into<Issuer>) -> Self {
        Self {
            issuer: Some(issuer.into()),
            ..self
        }
    }

    /// Grants a grace period on the temporal claims
    pub fn with_leeway(self, leeway: Duration) -> Self {
        Self { leeway, ..self }
    }

    /// Grants a grace period, in seconds, on the temporal claims
    pub fn with_leeway_secs(self, secs: u64) -> Self {
        self.with_leeway(Duration::from_secs(secs))
    }

    /// Skips the `exp` check entirely
    pub fn ignore_expiration(self) -> Self {
        Self {
            validate_exp: false,
            ..self
        }
    }

    /// Skips the `nbf` check entirely
    pub fn ignore_not_before(self) -> Self {
        Self {
            validate_nbf: false,
            ..self
        }
    }

    /// Validates the header and claims against the system clock
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub fn validate(&self, header: &Headers, claims: &Claims) -> Result<(), error::ClaimsRejected> {
        self.validate_with_clock(header, claims, &System)
    }

    /// Validates the header and claims against a specific clock
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub fn validate_with_clock<C: Clock>(
        &self,
        header: &Headers,
        claims: &Claims,
        clock: &C,
    ) -> Result<(), error::ClaimsRejected> {
        let now = clock.now().0;
        let leeway = self.leeway.as_secs();

        if self.validate_exp {
            match claims.exp()? {
                Some(exp) if exp.0 <= now.saturating_sub(leeway) => {
                    return Err(error::ClaimsRejected::TokenExpired)
                }
                Some(_) => {}
                None => return Err(error::ClaimsRejected::MissingRequiredClaim("exp")),
            }
        }

        if self.validate_nbf {
            if let Some(nbf) = claims.nbf()? {
                if nbf.0 > now.saturating_add(leeway) {
                    return Err(error::ClaimsRejected::TokenNotYetValid);
                }
            }
        }

        if let Some(expected) = &self.audience {
            let aud = claims.aud()?;
            if aud.is_empty() {
                return Err(error::ClaimsRejected::MissingRequiredClaim("aud"));
            }

            if !aud.iter().any(|a| a.as_str() == expected.as_str()) {
                return Err(error::ClaimsRejected::InvalidAudience);
            }
        }

        if let Some(expected) = &self.issuer {
            match claims.get("iss") {
                Some(Value::String(iss)) if iss == expected.as_str() => {}
                Some(_) => return Err(error::ClaimsRejected::InvalidIssuer),
                None => return Err(error::ClaimsRejected::MissingRequiredClaim("iss")),
            }
        }

        if header.alg() != self.algorithm.name() {
            return Err(error::ClaimsRejected::InvalidAlgorithm);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::{clock::TestClock, jws::Signer, test::rsa};

    const NOW: UnixTime = UnixTime(1_700_000_100);

    fn hmac() -> jwa::Hmac {
        jwa::Hmac::new(Base64Url::from_raw(b"correct horse battery staple".to_vec()))
    }

    fn validator() -> CoreValidator {
        CoreValidator::new(jwa::Algorithm::HS256)
            .require_audience(Audience::from_static("api://orders"))
            .require_issuer(Issuer::from_static("https://issuer.example/"))
    }

    fn good_claims() -> Claims {
        Claims::new()
            .with_issuer(Issuer::from_static("https://issuer.example/"))
            .with_audience(Audience::from_static("api://orders"))
            .with_subject("client-42@clients")
            .with_expiration(UnixTime(NOW.0 + 60))
            .with_claim("scope", "orders:read")
    }

    fn mint(claims: &Claims) -> Jwt {
        claims
            .sign(&Headers::new(jwa::Algorithm::HS256).with_key_id("k1"), &hmac())
            .unwrap()
    }

    fn check(token: &JwtRef) -> Result<Claims, error::JwtVerifyError> {
        token
            .decompose()?
            .verify_with_clock(&hmac(), &validator(), &TestClock::new(NOW))
    }

    fn rejection(token: &JwtRef) -> error::ClaimsRejected {
        match check(token) {
            Err(error::JwtVerifyError::ClaimsRejected(r)) => r,
            other => panic!("expected claims rejection, got {:?}", other),
        }
    }

    #[test]
    fn accepts_well_formed_token() -> Result<()> {
        let token = mint(&good_claims());

        let decomposed = token.decompose()?;
        assert_eq!(decomposed.kid(), Some(jwk::KeyIdRef::from_static("k1")));
        assert_eq!(decomposed.untrusted_header().typ(), Some("JWT"));

        let claims = check(&token)?;
        assert_eq!(claims, good_claims());
        assert_eq!(claims.get("scope"), Some(&Value::from("orders:read")));
        Ok(())
    }

    #[test]
    fn verifies_rs256_fixture() -> Result<()> {
        let validator = CoreValidator::new(jwa::Algorithm::RS256)
            .require_audience(Audience::from_static(rsa::AUDIENCE))
            .require_issuer(Issuer::from_static(rsa::ISSUER));

        let claims = rsa::token().decompose()?.verify_with_clock(
            &rsa::jwk(),
            &validator,
            &TestClock::new(NOW),
        )?;

        assert_eq!(claims.sub(), Some("client-42@clients"));
        assert_eq!(claims.exp()?, Some(UnixTime(4_102_444_800)));
        assert_eq!(
            claims.get("permissions"),
            Some(&serde_json::json!(["orders:read"]))
        );
        Ok(())
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for raw in ["abc", "a.b", "a.b.c.d", "eyJhbGciOiJIUzI1NiJ9.e30.c2ln.extra"] {
            let err = JwtRef::from_str(raw).decompose().unwrap_err();
            assert!(
                matches!(err, error::JwtVerifyError::MalformedToken(_)),
                "{}: {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn rejects_undecodable_segments() {
        let err = JwtRef::from_str("not*base64.e30.c2ln").decompose().unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::MalformedTokenHeader(_)));

        let err = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e3@.c2ln")
            .decompose()
            .unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::MalformedTokenPayload(_)));

        let err = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.c2l*")
            .decompose()
            .unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::MalformedTokenSignature(_)));

        // `{"typ":"JWT"}` lacks `alg`
        let err = JwtRef::from_str("eyJ0eXAiOiJKV1QifQ.e30.c2ln")
            .decompose()
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn rejects_tampered_payload() -> Result<()> {
        let token = mint(&good_claims());
        let forged = mint(&good_claims().with_claim("scope", "orders:admin"));

        let (head, _) = token.as_str().split_once('.').unwrap();
        let (_, rest) = forged.as_str().split_once('.').unwrap();
        let (forged_payload, _) = rest.split_once('.').unwrap();
        let signature = token.as_str().rsplit('.').next().unwrap();
        let spliced = format!("{}.{}.{}", head, forged_payload, signature);

        let err = check(JwtRef::from_str(&spliced)).unwrap_err();
        assert!(matches!(
            err,
            error::JwtVerifyError::JwkVerifyError(e) if e.is_signature_mismatch()
        ));
        Ok(())
    }

    #[test]
    fn non_object_payload_is_malformed_after_signature_check() {
        let key = hmac();
        let header = Base64Url::from_raw(br#"{"alg":"HS256"}"#.to_vec());
        let payload = Base64Url::from_raw(b"[1,2,3]".to_vec());
        let message = format!("{}.{}", header, payload);
        let sig = Base64Url::from_raw(key.sign(jwa::Algorithm::HS256, message.as_bytes()).unwrap());
        let token = format!("{}.{}", message, sig);

        let err = check(JwtRef::from_str(&token)).unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::MalformedTokenPayload(_)));
    }

    #[test]
    fn expiry_is_strict() {
        let at_now = mint(&good_claims().with_expiration(NOW));
        assert_eq!(rejection(&at_now), error::ClaimsRejected::TokenExpired);

        let one_later = mint(&good_claims().with_expiration(UnixTime(NOW.0 + 1)));
        assert!(check(&one_later).is_ok());
    }

    #[test]
    fn missing_expiry_is_rejected() {
        let mut claims = good_claims().into_inner();
        claims.remove("exp");
        let token = mint(&Claims::from(claims));

        assert_eq!(
            rejection(&token),
            error::ClaimsRejected::MissingRequiredClaim("exp")
        );
    }

    #[test]
    fn fractional_expiry_is_accepted() {
        let token = mint(&good_claims().with_claim("exp", NOW.0 as f64 + 30.5));
        assert!(check(&token).is_ok());

        let token = mint(&good_claims().with_claim("exp", "tomorrow"));
        assert_eq!(rejection(&token), error::ClaimsRejected::InvalidClaimType("exp"));
    }

    #[test]
    fn signing_with_unsupported_header_algorithm_fails() -> Result<()> {
        let headers: Headers = serde_json::from_value(serde_json::json!({ "alg": "none" }))?;
        let err = good_claims().sign(&headers, &hmac()).unwrap_err();

        assert!(matches!(
            err,
            error::JwtSigningError::SigningError(error::SigningError::Unexpected(_))
        ));
        Ok(())
    }

    #[test]
    fn leeway_extends_expiry() -> Result<()> {
        let token = mint(&good_claims().with_expiration(UnixTime(NOW.0 - 5)));
        let lenient = validator().with_leeway_secs(10);

        let claims = token
            .decompose()?
            .verify_with_clock(&hmac(), &lenient, &TestClock::new(NOW))?;

        assert_eq!(claims.exp()?, Some(UnixTime(NOW.0 - 5)));
        Ok(())
    }

    #[test]
    fn future_not_before_is_rejected() {
        let token = mint(&good_claims().with_claim("nbf", NOW.0 + 30));
        assert_eq!(rejection(&token), error::ClaimsRejected::TokenNotYetValid);
    }

    #[test]
    fn audience_may_be_an_array() {
        let token = mint(&good_claims().with_claim(
            "aud",
            serde_json::json!(["api://billing", "api://orders"]),
        ));
        assert!(check(&token).is_ok());

        let token = mint(&good_claims().with_claim("aud", serde_json::json!(["api://billing"])));
        assert_eq!(rejection(&token), error::ClaimsRejected::InvalidAudience);
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let token = mint(&good_claims().with_issuer(Issuer::from_static("https://evil.example/")));
        assert_eq!(rejection(&token), error::ClaimsRejected::InvalidIssuer);
    }

    #[test]
    fn expiry_is_reported_before_audience() {
        let token = mint(
            &good_claims()
                .with_expiration(UnixTime(NOW.0 - 1))
                .with_audience(Audience::from_static("api://billing")),
        );
        assert_eq!(rejection(&token), error::ClaimsRejected::TokenExpired);
    }

    #[test]
    fn audience_is_reported_before_issuer() {
        let token = mint(
            &good_claims()
                .with_audience(Audience::from_static("api://billing"))
                .with_issuer(Issuer::from_static("https://evil.example/")),
        );
        assert_eq!(rejection(&token), error::ClaimsRejected::InvalidAudience);
    }

    #[test]
    fn header_algorithm_must_match_expected() {
        let key = hmac();
        let header = Base64Url::from_raw(br#"{"alg":"HS512","kid":"k1"}"#.to_vec());
        let payload = Base64Url::from_raw(serde_json::to_vec(&good_claims()).unwrap());
        let message = format!("{}.{}", header, payload);
        let sig = Base64Url::from_raw(key.sign(jwa::Algorithm::HS256, message.as_bytes()).unwrap());
        let token = format!("{}.{}", message, sig);

        assert_eq!(
            rejection(JwtRef::from_str(&token)),
            error::ClaimsRejected::InvalidAlgorithm
        );
    }

    #[test]
    fn redacts_by_default() {
        let token = mint(&good_claims());
        assert_eq!(format!("{:?}", token), "***JWT***");
        assert_eq!(format!("{}", token), "***JWT***");
        assert_eq!(format!("{:#}", token), token.as_str());

        let elided = format!("{:#1}", token);
        assert!(elided.ends_with(".…"));
    }
}
