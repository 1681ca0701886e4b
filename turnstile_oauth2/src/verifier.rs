use std::{sync::Arc, time::Duration};

use turnstile::{
    clock::{Clock, System},
    jwa,
    jwt::{Audience, Claims, CoreValidator, Issuer},
    JwtRef,
};

use crate::{authorize, AuthorizationRequirement, KeyResolver, VerificationError};

/// What a [`Verifier`] expects of the tokens it admits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifierConfig {
    /// The audience that must appear in `aud`
    pub audience: Audience,
    /// The issuer that must appear in `iss`
    pub issuer: Issuer,
    /// The only algorithm tokens may be signed with
    pub algorithm: jwa::Algorithm,
    /// Where the signing keys are published
    pub jwks_url: String,
    /// How long to wait for the key set before giving up
    pub fetch_timeout: Duration,
}

/// A [`Verifier`] could not be built from its configuration
#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
#[derive(Debug, thiserror::Error)]
pub enum InvalidConfig {
    /// The JWKS URL is not a valid absolute URL
    #[error("invalid JWKS URL")]
    JwksUrl(#[from] url::ParseError),

    /// The HTTP client could not be initialized
    #[error("unable to initialize HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug)]
struct Inner {
    resolver: KeyResolver,
    validator: CoreValidator,
}

/// Runs the full verification pipeline for bearer tokens
///
/// Resolves the signing key named by the token, checks the signature and
/// registered claims, then applies an [`AuthorizationRequirement`]. The
/// verifier is cheap to clone; clones share a single key cache.
#[derive(Clone, Debug)]
#[must_use]
pub struct Verifier {
    inner: Arc<Inner>,
}

impl Verifier {
    /// Constructs a verifier that fetches keys from `config.jwks_url`
    ///
    /// No request is made until the first token needs a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not usable or the HTTP client cannot be
    /// built.
    #[cfg(feature = "reqwest")]
    #[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
    pub fn new(config: VerifierConfig) -> Result<Self, InvalidConfig> {
        let url = url::Url::parse(&config.jwks_url)?;
        let source = crate::RemoteJwks::new(url)?;
        let resolver = KeyResolver::with_source(source).with_fetch_timeout(config.fetch_timeout);
        Ok(Self::with_resolver(&config, resolver))
    }

    /// Constructs a verifier around an existing key resolver
    ///
    /// `config.jwks_url` and `config.fetch_timeout` are not consulted.
    pub fn with_resolver(config: &VerifierConfig, resolver: KeyResolver) -> Self {
        let validator = CoreValidator::new(config.algorithm)
            .require_audience(config.audience.clone())
            .require_issuer(config.issuer.clone());

        Self {
            inner: Arc::new(Inner {
                resolver,
                validator,
            }),
        }
    }

    /// The key resolver backing this verifier
    #[must_use]
    pub fn resolver(&self) -> &KeyResolver {
        &self.inner.resolver
    }

    /// Verifies `token` and checks it against `requirement`
    ///
    /// # Errors
    ///
    /// Returns the first failure along the pipeline. A token whose header
    /// names no key fails key resolution without consulting the key set.
    pub async fn verify(
        &self,
        token: &JwtRef,
        requirement: &AuthorizationRequirement,
    ) -> Result<Claims, VerificationError> {
        self.verify_with_clock(token, requirement, &System).await
    }

    /// Verifies `token` as [`verify()`](Self::verify) does, reading the time
    /// from `clock`
    ///
    /// # Errors
    ///
    /// See [`verify()`](Self::verify).
    pub async fn verify_with_clock<C: Clock + Sync>(
        &self,
        token: &JwtRef,
        requirement: &AuthorizationRequirement,
        clock: &C,
    ) -> Result<Claims, VerificationError> {
        let decomposed = token.decompose()?;

        let kid = decomposed
            .kid()
            .ok_or_else(|| VerificationError::KeyResolutionFailure {
                message: "token header does not name a signing key".into(),
                key_id: None,
            })?;

        let key = self.inner.resolver.resolve(kid).await?;
        let claims = decomposed.verify_with_clock(&key, &self.inner.validator, clock)?;

        authorize(claims, requirement)
    }
}
