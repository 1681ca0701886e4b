//! HMAC signatures over shared secrets

use std::{convert::TryFrom, fmt};

use ring::rand::SecureRandom;
use serde::{Deserialize, Serialize};

use crate::{b64::Base64Url, error, jwa, jws};

/// HMAC shared secret
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Hmac {
    #[serde(rename = "k")]
    secret: Base64Url,
}

impl fmt::Debug for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Hmac { secret }")
    }
}

impl Hmac {
    /// HMAC using the provided secret
    pub fn new(secret: impl Into<Base64Url>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Generates a new random secret sized for the algorithm
    ///
    /// # Errors
    ///
    /// The system random number generator failed.
    pub fn generate(alg: SigningAlgorithm) -> Result<Self, error::Unexpected> {
        let rng = ring::rand::SystemRandom::new();
        let mut secret = Base64Url::from_raw(vec![0; alg.signature_size()]);

        rng.fill(secret.as_mut_slice())
            .map_err(|_| error::unexpected("random number generator failure"))?;

        Ok(Self { secret })
    }

    fn ring_key(&self, alg: SigningAlgorithm) -> ring::hmac::Key {
        ring::hmac::Key::new(alg.into_ring_algorithm(), self.secret.as_slice())
    }
}

/// HMAC signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl SigningAlgorithm {
    /// The size in bytes of an HMAC signature
    #[must_use]
    pub fn signature_size(self) -> usize {
        match self {
            Self::HS256 => 256 / 8,
            Self::HS384 => 384 / 8,
            Self::HS512 => 512 / 8,
        }
    }

    fn into_ring_algorithm(self) -> ring::hmac::Algorithm {
        match self {
            Self::HS256 => ring::hmac::HMAC_SHA256,
            Self::HS384 => ring::hmac::HMAC_SHA384,
            Self::HS512 => ring::hmac::HMAC_SHA512,
        }
    }
}

impl From<SigningAlgorithm> for jwa::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Self::HS256,
            SigningAlgorithm::HS384 => Self::HS384,
            SigningAlgorithm::HS512 => Self::HS512,
        }
    }
}

impl TryFrom<jwa::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jwa::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwa::Algorithm::HS256 => Ok(Self::HS256),
            jwa::Algorithm::HS384 => Ok(Self::HS384),
            jwa::Algorithm::HS512 => Ok(Self::HS512),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl jws::Signer for Hmac {
    type Algorithm = jwa::Algorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        SigningAlgorithm::try_from(alg).is_ok()
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let alg = SigningAlgorithm::try_from(alg)?;
        let digest = ring::hmac::sign(&self.ring_key(alg), data);
        Ok(digest.as_ref().to_owned())
    }
}

impl jws::Verifier for Hmac {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        SigningAlgorithm::try_from(alg).is_ok()
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let alg = SigningAlgorithm::try_from(alg)?;
        ring::hmac::verify(&self.ring_key(alg), data, signature)
            .map_err(|_| error::signature_mismatch())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::{Signer, Verifier};

    #[test]
    fn verifies_own_signature() {
        let key = Hmac::new(Base64Url::from_raw(b"shared secret".to_vec()));
        let sig = key.sign(jwa::Algorithm::HS384, b"message").unwrap();
        assert_eq!(sig.len(), 48);

        key.verify(jwa::Algorithm::HS384, b"message", &sig).unwrap();
        let err = key
            .verify(jwa::Algorithm::HS384, b"massage", &sig)
            .unwrap_err();
        assert!(err.is_signature_mismatch());
    }

    #[test]
    fn refuses_asymmetric_algorithms() {
        let key = Hmac::generate(SigningAlgorithm::HS256).unwrap();
        assert!(!key.can_verify(jwa::Algorithm::RS256));

        let err = key.verify(jwa::Algorithm::RS256, b"m", b"s").unwrap_err();
        assert!(err.is_incompatible_alg());
    }

    #[test]
    fn debug_hides_secret() {
        let key = Hmac::new(Base64Url::from_raw(b"hunter2".to_vec()));
        assert_eq!(format!("{:?}", key), "Hmac { secret }");
    }
}
