//! JSON Web Algorithms (JWA)
//!
//! The specifications for these algorithms can be found in [RFC7518][].
//! Only the signature algorithms are implemented.
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error;

pub mod ec;
pub mod hmac;
pub mod rsa;

#[doc(inline)]
pub use hmac::Hmac;

/// A JWS signature algorithm
///
/// This list may be expanded in the future.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum Algorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
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
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
}

impl Algorithm {
    /// The registered name of the algorithm, as it appears in `alg`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
        }
    }

    /// The usage a key must allow to be used with this algorithm
    pub const fn to_usage(self) -> Usage {
        Usage::Signing
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnknownAlgorithm;

    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        match value {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            "PS256" => Ok(Self::PS256),
            "PS384" => Ok(Self::PS384),
            "PS512" => Ok(Self::PS512),
            "ES256" => Ok(Self::ES256),
            "ES384" => Ok(Self::ES384),
            _ => Err(error::unknown_algorithm(value)),
        }
    }
}

impl FromStr for Algorithm {
    type Err = error::UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

/// The intended use for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[must_use]
pub enum Usage {
    /// The key is intended for signing and verification
    #[serde(rename = "sig")]
    Signing,

    /// The key is intended for encryption
    #[serde(rename = "enc")]
    Encryption,
}
