use std::{convert::TryFrom, fmt, sync::Arc};

use ring::signature::{EcdsaKeyPair, KeyPair};

use super::{Curve, PublicKey, SigningAlgorithm};
use crate::{error, jwa, jws};

/// Elliptic curve private key, used to mint tokens
#[derive(Clone)]
pub struct PrivateKey {
    alg: SigningAlgorithm,
    public_key: PublicKey,
    key_pair: Arc<EcdsaKeyPair>,
}

impl PrivateKey {
    /// Generates a new key pair on the given curve
    ///
    /// # Errors
    ///
    /// The system random number generator failed.
    pub fn generate(curve: Curve) -> Result<Self, error::Unexpected> {
        let alg = match curve {
            Curve::P256 => SigningAlgorithm::ES256,
            Curve::P384 => SigningAlgorithm::ES384,
        };

        let rng = ring::rand::SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg.signing_params(), &rng)
            .map_err(|_| error::unexpected("key generation failed"))?;

        Self::from_pkcs8_der(alg, pkcs8.as_ref()).map_err(error::unexpected)
    }

    /// Imports a DER-encoded PKCS#8 private key for use with `alg`
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a key on the algorithm's curve.
    pub fn from_pkcs8_der(alg: SigningAlgorithm, der: &[u8]) -> Result<Self, error::KeyRejected> {
        let rng = ring::rand::SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(alg.signing_params(), der, &rng)
            .map_err(|e| error::key_rejected(e.to_string()))?;

        let curve = alg.curve();
        let len = curve.coordinate_len();
        let point = key_pair.public_key().as_ref();
        if point.len() != 1 + 2 * len {
            return Err(error::key_rejected("unexpected public point encoding"));
        }

        let public_key =
            PublicKey::from_coordinates(curve, &point[1..=len], &point[len + 1..])?;

        Ok(Self {
            alg,
            public_key,
            key_pair: Arc::new(key_pair),
        })
    }

    /// The matching public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl jws::Signer for PrivateKey {
    type Algorithm = jwa::Algorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        SigningAlgorithm::try_from(alg).map_or(false, |a| a == self.alg)
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if SigningAlgorithm::try_from(alg)? != self.alg {
            return Err(error::incompatible_algorithm(alg).into());
        }

        let sig = self
            .key_pair
            .sign(&ring::rand::SystemRandom::new(), data)
            .map_err(|e| error::unexpected(e.to_string()))?;

        Ok(sig.as_ref().to_owned())
    }
}
