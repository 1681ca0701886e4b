//! ECDSA signatures over the NIST prime curves

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::{b64::Base64Url, error, jwa, jws};

#[cfg(feature = "private-keys")]
mod private;

#[cfg(feature = "private-keys")]
#[cfg_attr(docsrs, doc(cfg(feature = "private-keys")))]
pub use private::PrivateKey;

/// Supported curves
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Curve {
    /// NIST P-256
    #[serde(rename = "P-256")]
    P256,
    /// NIST P-384
    #[serde(rename = "P-384")]
    P384,
}

impl Curve {
    /// Length in bytes of one affine coordinate
    #[must_use]
    pub const fn coordinate_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }
}

/// Elliptic curve public key
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyDto")]
pub struct PublicKey {
    #[serde(rename = "crv")]
    curve: Curve,
    x: Base64Url,
    y: Base64Url,
}

impl PublicKey {
    /// Constructs a public key from its affine coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate has the wrong length for the curve.
    pub fn from_coordinates(
        curve: Curve,
        x: impl Into<Base64Url>,
        y: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let x = x.into();
        let y = y.into();
        let len = curve.coordinate_len();

        if x.len() != len || y.len() != len {
            return Err(error::key_rejected("coordinate length does not match curve"));
        }

        Ok(Self { curve, x, y })
    }

    /// The curve this key lies on
    #[must_use]
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// SEC1 uncompressed point encoding
    fn uncompressed_point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + self.x.len() + self.y.len());
        point.push(0x04);
        point.extend_from_slice(&self.x);
        point.extend_from_slice(&self.y);
        point
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        SigningAlgorithm::try_from(alg).map_or(false, |a| a.curve() == self.curve)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let signing_alg = SigningAlgorithm::try_from(alg)?;
        if signing_alg.curve() != self.curve {
            return Err(error::incompatible_algorithm(alg).into());
        }

        let point = self.uncompressed_point();
        let pk =
            ring::signature::UnparsedPublicKey::new(signing_alg.verification_params(), &point);

        pk.verify(data, signature)
            .map_err(|_| error::signature_mismatch())?;
        Ok(())
    }
}

impl TryFrom<PublicKeyDto> for PublicKey {
    type Error = error::KeyRejected;

    fn try_from(dto: PublicKeyDto) -> Result<Self, Self::Error> {
        Self::from_coordinates(dto.curve, dto.x, dto.y)
    }
}

#[derive(Deserialize)]
struct PublicKeyDto {
    #[serde(rename = "crv")]
    curve: Curve,
    x: Base64Url,
    y: Base64Url,
}

/// ECDSA signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
}

impl SigningAlgorithm {
    /// The curve this algorithm operates on
    #[must_use]
    pub const fn curve(self) -> Curve {
        match self {
            Self::ES256 => Curve::P256,
            Self::ES384 => Curve::P384,
        }
    }

    fn verification_params(self) -> &'static ring::signature::EcdsaVerificationAlgorithm {
        match self {
            Self::ES256 => &ring::signature::ECDSA_P256_SHA256_FIXED,
            Self::ES384 => &ring::signature::ECDSA_P384_SHA384_FIXED,
        }
    }

    #[cfg(feature = "private-keys")]
    fn signing_params(self) -> &'static ring::signature::EcdsaSigningAlgorithm {
        match self {
            Self::ES256 => &ring::signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            Self::ES384 => &ring::signature::ECDSA_P384_SHA384_FIXED_SIGNING,
        }
    }
}

impl From<SigningAlgorithm> for jwa::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::ES256 => Self::ES256,
            SigningAlgorithm::ES384 => Self::ES384,
        }
    }
}

impl TryFrom<jwa::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jwa::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwa::Algorithm::ES256 => Ok(Self::ES256),
            jwa::Algorithm::ES384 => Ok(Self::ES384),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}
