//! JOSE building blocks for verifying bearer tokens issued by an external
//! identity provider.
//!
//! The crate covers the pieces of the JOSE family needed to check a signed
//! access token:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Key (JWK) and key sets: [RFC7517][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Encryption (JWE) is not supported.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use turnstile::{b64::Base64Url, jwa, jwk, jwt, Jwk, Jwks, JwtRef};
//!
//! let token = JwtRef::from_str(concat!(
//!     "eyJhbGciOiJIUzI1NiIsImtpZCI6InRlc3Qga2V5In0.",
//!     "eyJzdWIiOiJnYXRla2VlcGVyIiwiYXVkIjoibXlfYXBpIiwiaXNzIjoiYXV0aG9yaXR5In0.",
//!     "6zvld8XUDAtzkFlxyYFJVvAwjcSg9NiKJbtZcxJLlkQ"
//! ));
//!
//! let key = Jwk::from(jwa::Hmac::new(Base64Url::from_raw(b"test".to_vec())))
//!     .with_algorithm(jwa::Algorithm::HS256)
//!     .with_key_id(jwk::KeyId::from_static("test key"));
//!
//! let mut keys = Jwks::default();
//! keys.add_key(key);
//!
//! let validator = jwt::CoreValidator::new(jwa::Algorithm::HS256)
//!     .ignore_expiration()
//!     .require_audience(jwt::Audience::from_static("my_api"))
//!     .require_issuer(jwt::Issuer::from_static("authority"));
//!
//! let decomposed = token.decompose().unwrap();
//! let key = keys.get_key_by_id(decomposed.kid().unwrap()).unwrap();
//!
//! let claims = decomposed.verify(key, &validator).expect("JWT was invalid");
//! assert_eq!(claims.get("sub").and_then(|v| v.as_str()), Some("gatekeeper"));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod b64;
pub mod clock;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod jwt;


#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{Claims, Jwt, JwtRef};
