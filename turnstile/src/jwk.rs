//! JSON Web Keys (JWK)
//!
//! The specification for JSON Web Keys can be found in [RFC7517][].
//! Only public verification material (and HMAC secrets) can be held in a
//! [`Jwk`]; private signing keys live in the [`jwa`] submodules.
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use aliri_braid::braid;
use serde::{Deserialize, Serialize};

use crate::{error, jwa, jws};

/// An identifier for a JWK, carried in a token header as `kid`
#[braid(serde, ref_doc = "A borrowed reference to a JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// A JSON Web Key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Jwk {
    #[serde(rename = "kid", default, skip_serializing_if = "Option::is_none")]
    key_id: Option<KeyId>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<jwa::Algorithm>,

    #[serde(flatten)]
    key: Key,
}

impl Jwk {
    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The declared usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The algorithm the key is pinned to, if any
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// The key material
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Whether the key may be used to verify signatures made with `alg`
    #[must_use]
    pub fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        use jws::Verifier;

        self.usage.map_or(true, |u| u == alg.to_usage())
            && self.algorithm.map_or(true, |a| a == alg)
            && self.key.can_verify(alg)
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            key_id: Some(kid.into()),
            ..self
        }
    }

    /// Sets the key's usage
    pub fn with_usage(self, usage: jwa::Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Pins the algorithm, along with the usage consistent with it
    pub fn with_algorithm(self, alg: jwa::Algorithm) -> Self {
        Self {
            algorithm: Some(alg),
            usage: Some(alg.to_usage()),
            ..self
        }
    }
}

impl From<Key> for Jwk {
    fn from(key: Key) -> Self {
        Self {
            key_id: None,
            usage: None,
            algorithm: None,
            key,
        }
    }
}

impl From<jwa::rsa::PublicKey> for Jwk {
    fn from(key: jwa::rsa::PublicKey) -> Self {
        Self::from(Key::Rsa(key))
    }
}

impl From<jwa::ec::PublicKey> for Jwk {
    fn from(key: jwa::ec::PublicKey) -> Self {
        Self::from(Key::EllipticCurve(key))
    }
}

impl From<jwa::Hmac> for Jwk {
    fn from(key: jwa::Hmac) -> Self {
        Self::from(Key::Hmac(key))
    }
}

impl jws::Verifier for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.is_compatible(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if let Some(usage) = self.usage {
            if usage != alg.to_usage() {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        if let Some(pinned) = self.algorithm {
            if pinned != alg {
                return Err(error::incompatible_algorithm(alg).into());
            }
        }

        self.key.verify(alg, data, signature)
    }
}

/// Key material, discriminated by the `kty` member
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
#[non_exhaustive]
pub enum Key {
    /// An RSA public key
    #[serde(rename = "RSA")]
    Rsa(jwa::rsa::PublicKey),

    /// An elliptic curve public key
    #[serde(rename = "EC")]
    EllipticCurve(jwa::ec::PublicKey),

    /// A symmetric secret
    #[serde(rename = "oct")]
    Hmac(jwa::Hmac),
}

impl From<jwa::rsa::PublicKey> for Key {
    fn from(key: jwa::rsa::PublicKey) -> Self {
        Self::Rsa(key)
    }
}

impl From<jwa::ec::PublicKey> for Key {
    fn from(key: jwa::ec::PublicKey) -> Self {
        Self::EllipticCurve(key)
    }
}

impl From<jwa::Hmac> for Key {
    fn from(key: jwa::Hmac) -> Self {
        Self::Hmac(key)
    }
}

impl jws::Verifier for Key {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        match self {
            Self::Rsa(k) => k.can_verify(alg),
            Self::EllipticCurve(k) => k.can_verify(alg),
            Self::Hmac(k) => k.can_verify(alg),
        }
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        match self {
            Self::Rsa(k) => k.verify(alg, data, signature),
            Self::EllipticCurve(k) => k.verify(alg, data, signature),
            Self::Hmac(k) => k.verify(alg, data, signature),
        }
    }
}
