use serde::{Deserialize, Serialize};

use crate::{jwk, Jwk};

/// A JSON Web Key Set (JWKS)
///
/// Entries that cannot be understood (unknown key types, encryption
/// algorithms, malformed key material) are dropped while parsing rather than
/// failing the whole set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// A view of the keys in this set
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// The number of usable keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no usable keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Gets the key published under `kid`
    ///
    /// When more than one key shares the identifier, the first one listed wins.
    #[must_use]
    pub fn get_key_by_id(&self, kid: &jwk::KeyIdRef) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.key_id() == Some(kid))
    }

    /// Whether a key is published under `kid`
    #[must_use]
    pub fn contains_key_id(&self, kid: &jwk::KeyIdRef) -> bool {
        self.get_key_by_id(kid).is_some()
    }
}

impl FromIterator<Jwk> for Jwks {
    fn from_iter<T: IntoIterator<Item = Jwk>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct LenientKeysVisitor;

    impl<'de> serde::de::Visitor<'de> for LenientKeysVisitor {
        type Value = Vec<Jwk>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of JWK objects")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut keys = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            let mut index = 0_usize;

            while let Some(raw) = seq.next_element::<serde_json::Value>()? {
                match Jwk::deserialize(&raw) {
                    Ok(jwk) => keys.push(jwk),
                    Err(error) => {
                        tracing::warn!(
                            jwks.idx = index,
                            jwk.kid = ?raw.get("kid"),
                            jwk.kty = ?raw.get("kty"),
                            jwk.alg = ?raw.get("alg"),
                            %error,
                            "ignoring unusable JWK"
                        );
                    }
                }
                index += 1;
            }

            Ok(keys)
        }
    }

    deserializer.deserialize_seq(LenientKeysVisitor)
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use tracing_test::traced_test;

    use super::*;
    use crate::{jwa, jws::Verifier, test::rsa};

    #[test]
    #[traced_test]
    fn skips_keys_it_cannot_use() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(rsa::JWKS)?;

        assert_eq!(jwks.len(), 1);
        assert!(jwks.contains_key_id(jwk::KeyIdRef::from_static(rsa::KEY_ID)));
        assert!(!jwks.contains_key_id(jwk::KeyIdRef::from_static("encryption-only")));
        assert!(logs_contain("ignoring unusable JWK"));
        Ok(())
    }

    #[test]
    fn empty_objects_are_skipped() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(r#"{"keys":[{}, {"kid":"1","use":"enc"}]}"#)?;
        assert!(jwks.is_empty());
        Ok(())
    }

    #[test]
    fn missing_keys_member_is_an_error() {
        assert!(serde_json::from_str::<Jwks>(r#"{"kid":"1"}"#).is_err());
        assert!(serde_json::from_str::<Jwks>(r#"{"keys":{}}"#).is_err());
    }

    #[test]
    fn first_key_with_duplicate_id_wins() -> Result<()> {
        use crate::jws::Signer;

        let first = jwa::Hmac::new(crate::b64::Base64Url::from_raw(b"first".to_vec()));
        let second = jwa::Hmac::new(crate::b64::Base64Url::from_raw(b"second".to_vec()));
        let sig = first.sign(jwa::Algorithm::HS256, b"m")?;

        let jwks: Jwks = vec![
            Jwk::from(first).with_key_id(jwk::KeyId::from_static("dup")),
            Jwk::from(second).with_key_id(jwk::KeyId::from_static("dup")),
        ]
        .into_iter()
        .collect();

        let found = jwks
            .get_key_by_id(jwk::KeyIdRef::from_static("dup"))
            .expect("key is present");
        found.verify(jwa::Algorithm::HS256, b"m", &sig)?;
        Ok(())
    }
}
