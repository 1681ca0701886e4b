//! RSA signatures (PKCS#1 v1.5 and PSS)

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::{b64::Base64Url, error, jwa, jws};

#[cfg(feature = "private-keys")]
mod private;

#[cfg(feature = "private-keys")]
#[cfg_attr(docsrs, doc(cfg(feature = "private-keys")))]
pub use private::PrivateKey;

/// Smallest modulus accepted, in bytes
const MIN_MODULUS_LEN: usize = 2048 / 8;

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyDto")]
pub struct PublicKey {
    /// The public modulus
    #[serde(rename = "n")]
    modulus: Base64Url,

    /// The public exponent
    #[serde(rename = "e")]
    exponent: Base64Url,
}

impl PublicKey {
    /// Constructs a public key from the modulus and exponent
    ///
    /// # Errors
    ///
    /// Returns an error if the modulus is shorter than 2048 bits.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let modulus = modulus.into();
        let exponent = exponent.into();

        let significant = modulus.iter().skip_while(|b| **b == 0).count();
        if significant < MIN_MODULUS_LEN {
            return Err(error::key_rejected("key modulus must be at least 2048 bits"));
        }

        if exponent.is_empty() {
            return Err(error::key_rejected("key exponent must not be empty"));
        }

        Ok(Self { modulus, exponent })
    }

    /// The public key's modulus
    #[must_use]
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    /// The public key's exponent
    #[must_use]
    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }
}

impl jws::Verifier for PublicKey {
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
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.verification_params(), data, signature)
            .map_err(|_| error::signature_mismatch())?;
        Ok(())
    }
}

impl TryFrom<PublicKeyDto> for PublicKey {
    type Error = error::KeyRejected;

    fn try_from(dto: PublicKeyDto) -> Result<Self, Self::Error> {
        Self::from_components(dto.modulus, dto.exponent)
    }
}

#[derive(Deserialize)]
struct PublicKeyDto {
    #[serde(rename = "n")]
    modulus: Base64Url,

    #[serde(rename = "e")]
    exponent: Base64Url,
}

/// RSA signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
    PS256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
    PS384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
    PS512,
}

impl SigningAlgorithm {
    fn verification_params(self) -> &'static ring::signature::RsaParameters {
        match self {
            Self::RS256 => &ring::signature::RSA_PKCS1_2048_8192_SHA256,
            Self::RS384 => &ring::signature::RSA_PKCS1_2048_8192_SHA384,
            Self::RS512 => &ring::signature::RSA_PKCS1_2048_8192_SHA512,
            Self::PS256 => &ring::signature::RSA_PSS_2048_8192_SHA256,
            Self::PS384 => &ring::signature::RSA_PSS_2048_8192_SHA384,
            Self::PS512 => &ring::signature::RSA_PSS_2048_8192_SHA512,
        }
    }

    #[cfg(feature = "private-keys")]
    fn signing_padding(self) -> &'static dyn ring::signature::RsaEncoding {
        match self {
            Self::RS256 => &ring::signature::RSA_PKCS1_SHA256,
            Self::RS384 => &ring::signature::RSA_PKCS1_SHA384,
            Self::RS512 => &ring::signature::RSA_PKCS1_SHA512,
            Self::PS256 => &ring::signature::RSA_PSS_SHA256,
            Self::PS384 => &ring::signature::RSA_PSS_SHA384,
            Self::PS512 => &ring::signature::RSA_PSS_SHA512,
        }
    }
}

impl From<SigningAlgorithm> for jwa::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::RS256 => Self::RS256,
            SigningAlgorithm::RS384 => Self::RS384,
            SigningAlgorithm::RS512 => Self::RS512,
            SigningAlgorithm::PS256 => Self::PS256,
            SigningAlgorithm::PS384 => Self::PS384,
            SigningAlgorithm::PS512 => Self::PS512,
        }
    }
}

impl TryFrom<jwa::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jwa::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwa::Algorithm::RS256 => Ok(Self::RS256),
            jwa::Algorithm::RS384 => Ok(Self::RS384),
            jwa::Algorithm::RS512 => Ok(Self::RS512),
            jwa::Algorithm::PS256 => Ok(Self::PS256),
            jwa::Algorithm::PS384 => Ok(Self::PS384),
            jwa::Algorithm::PS512 => Ok(Self::PS512),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}
