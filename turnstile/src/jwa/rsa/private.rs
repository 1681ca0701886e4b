use std::{convert::TryFrom, fmt, sync::Arc};

use ring::signature::RsaKeyPair;

use super::SigningAlgorithm;
use crate::{error, jwa, jws};

/// RSA private key, used to mint tokens
#[derive(Clone)]
pub struct PrivateKey {
    key_pair: Arc<RsaKeyPair>,
}

impl PrivateKey {
    /// Imports a DER-encoded PKCS#8 private key
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid RSA key pair.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, error::KeyRejected> {
        let key_pair = RsaKeyPair::from_pkcs8(der).map_err(|e| error::key_rejected(e.to_string()))?;

        Ok(Self {
            key_pair: Arc::new(key_pair),
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("PrivateKey { rsa }")
    }
}

impl jws::Signer for PrivateKey {
    type Algorithm = jwa::Algorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        SigningAlgorithm::try_from(alg).is_ok()
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let alg = SigningAlgorithm::try_from(alg)?;
        let mut buf = vec![0; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                alg.signing_padding(),
                &ring::rand::SystemRandom::new(),
                data,
                &mut buf,
            )
            .map_err(|e| error::unexpected(e.to_string()))?;

        Ok(buf)
    }
}
