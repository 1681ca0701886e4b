//! JSON Web Signature (JWS) signing and verification traits
//!
//! The specification for JSON Web Signatures can be found in [RFC7515][].
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

/// A type capable of checking a signature over a message
pub trait Verifier {
    /// The algorithm family this verifier understands
    type Algorithm;

    /// The error returned when verification fails
    type Error;

    /// Whether the verifier can check signatures made with `alg`
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Verifies `signature` over `data`
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm cannot be used with this verifier
    /// or if the signature does not match.
    fn verify(&self, alg: Self::Algorithm, data: &[u8], signature: &[u8])
        -> Result<(), Self::Error>;
}

/// A type capable of producing signatures
pub trait Signer {
    /// The algorithm family this signer understands
    type Algorithm;

    /// The error returned when signing fails
    type Error;

    /// Whether the signer can produce signatures with `alg`
    fn can_sign(&self, alg: Self::Algorithm) -> bool;

    /// Signs `data`
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm cannot be used with this signer.
    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

impl<T: Verifier + ?Sized> Verifier for &'_ T {
    type Algorithm = T::Algorithm;
    type Error = T::Error;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        T::can_verify(self, alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        T::verify(self, alg, data, signature)
    }
}

impl<T: Signer + ?Sized> Signer for &'_ T {
    type Algorithm = T::Algorithm;
    type Error = T::Error;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        T::can_sign(self, alg)
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        T::sign(self, alg, data)
    }
}
