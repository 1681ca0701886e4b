//! Base64url-encoded byte buffers
//!
//! JOSE encodes every binary value with the URL-safe alphabet and without
//! padding. Decoding here is tolerant of trailing padding, since some key
//! providers emit it in their key sets.

use std::{fmt, ops::Deref};

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The value was not valid base64url
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_copy_implementations)]
#[error("invalid base64url data")]
pub struct InvalidBase64Data {
    #[source]
    source: base64::DecodeError,
}

/// An owned byte buffer that serializes as base64url
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Wraps raw, unencoded bytes
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decodes a base64url string
    ///
    /// # Errors
    ///
    /// Returns an error if the string contains characters outside the
    /// URL-safe alphabet or has an impossible length.
    pub fn from_encoded(encoded: impl AsRef<[u8]>) -> Result<Self, InvalidBase64Data> {
        URL_SAFE
            .decode(encoded)
            .map(Self)
            .map_err(|source| InvalidBase64Data { source })
    }

    /// The raw bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// The raw bytes, mutably
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Unwraps the raw bytes
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Length of this buffer once encoded
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        Self::calc_encoded_len(self.0.len())
    }

    /// Length of an encoding of `len` raw bytes, without padding
    #[must_use]
    pub const fn calc_encoded_len(len: usize) -> usize {
        (len * 4 + 2) / 3
    }
}

impl Deref for Base64Url {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for Base64Url {
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl From<&'_ [u8]> for Base64Url {
    fn from(raw: &[u8]) -> Self {
        Self(raw.to_vec())
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&URL_SAFE.encode(&self.0))
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Base64Url(\"{}\")", self)
    }
}

impl Serialize for Base64Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Base64Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::from_encoded(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
