use std::collections::HashSet;

use aliri_braid::braid;
use serde_json::Value;
use thiserror::Error;
use turnstile::Claims;

use crate::VerificationError;

/// A single OAuth2 scope token
///
/// Scope tokens are non-empty and drawn from the printable ASCII characters
/// other than space, `"`, and `\`, as defined in [RFC6749 §3.3][rfc].
///
/// [rfc]: https://datatracker.ietf.org/doc/html/rfc6749#section-3.3
#[braid(
    serde,
    validator,
    ref_doc = "A borrowed reference to an OAuth2 scope token ([`ScopeToken`])"
)]
pub struct ScopeToken;

/// The string is not a valid scope token
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[allow(missing_copy_implementations)]
pub enum InvalidScopeToken {
    /// Scope tokens cannot be empty
    #[error("scope token cannot be empty")]
    EmptyString,

    /// The character is not allowed in a scope token
    #[error("invalid scope token byte at position {position}: 0x{value:02x}")]
    InvalidCharacter {
        /// Byte offset of the character
        position: usize,
        /// The offending byte
        value: u8,
    },
}

impl From<std::convert::Infallible> for InvalidScopeToken {
    fn from(x: std::convert::Infallible) -> Self {
        match x {}
    }
}

impl aliri_braid::Validator for ScopeToken {
    type Error = InvalidScopeToken;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if s.is_empty() {
            return Err(InvalidScopeToken::EmptyString);
        }

        match s
            .bytes()
            .enumerate()
            .find(|(_, b)| !matches!(b, 0x21 | 0x23..=0x5B | 0x5D..=0x7E))
        {
            Some((position, value)) => Err(InvalidScopeToken::InvalidCharacter { position, value }),
            None => Ok(()),
        }
    }
}

/// A named permission, as found in a token's `permissions` claim
#[braid(serde, ref_doc = "A borrowed reference to a [`Permission`]")]
pub struct Permission;

/// What a caller must hold to be admitted to an endpoint
///
/// Requirements come from route configuration, never from the token. Both
/// sets keep the order in which they were declared, which decides which
/// missing entry gets reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct AuthorizationRequirement {
    scopes: Vec<ScopeToken>,
    permissions: Vec<Permission>,
}

impl AuthorizationRequirement {
    /// A requirement that admits any verified token
    pub const fn new() -> Self {
        Self {
            scopes: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// Builds a requirement from string literals
    ///
    /// `scopes` is space-delimited.
    ///
    /// # Panics
    ///
    /// Panics if any of the scopes is not a valid scope token.
    pub fn from_static(scopes: &'static str, permissions: &[&'static str]) -> Self {
        let mut requirement = Self::new();

        for scope in scopes.split_whitespace() {
            requirement = requirement.require_scope(ScopeToken::from_static(scope));
        }

        for permission in permissions {
            requirement = requirement.require_permission(Permission::from_static(permission));
        }

        requirement
    }

    /// Adds a required scope
    pub fn require_scope(mut self, scope: ScopeToken) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Adds every scope in a space-delimited list
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid scope token.
    pub fn with_scopes_str(self, scopes: &str) -> Result<Self, InvalidScopeToken> {
        scopes
            .split_whitespace()
            .try_fold(self, |req, s| Ok(req.require_scope(ScopeToken::try_from(s)?)))
    }

    /// Adds a required permission
    pub fn require_permission(mut self, permission: Permission) -> Self {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
        self
    }

    /// Adds every permission from the iterator
    pub fn with_permissions<I>(self, permissions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Permission>,
    {
        permissions
            .into_iter()
            .fold(self, |req, p| req.require_permission(p.into()))
    }

    /// The required scopes, in declaration order
    #[must_use]
    pub fn scopes(&self) -> &[ScopeToken] {
        &self.scopes
    }

    /// The required permissions, in declaration order
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Whether the requirement admits any verified token
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty() && self.permissions.is_empty()
    }
}

/// Checks verified claims against a requirement
///
/// Scopes are checked before permissions. The `scope` claim must be a
/// space-delimited string and the `permissions` claim an array of strings,
/// but only when the requirement asks for entries of that kind. The first
/// missing entry, in the requirement's declared order, is reported.
///
/// The claims are handed back unchanged on success.
///
/// # Errors
///
/// * [`VerificationError::MissingClaim`] if a needed claim is absent or malformed
/// * [`VerificationError::InsufficientScope`] naming the first scope not granted
/// * [`VerificationError::InsufficientPermission`] naming the first permission not granted
pub fn authorize(
    claims: Claims,
    requirement: &AuthorizationRequirement,
) -> Result<Claims, VerificationError> {
    if !requirement.scopes.is_empty() {
        let held: HashSet<&str> = match claims.get("scope") {
            Some(Value::String(scope)) => scope.split(' ').collect(),
            _ => return Err(VerificationError::MissingClaim { claim: "scope" }),
        };

        if let Some(missing) = requirement
            .scopes
            .iter()
            .find(|s| !held.contains(s.as_str()))
        {
            return Err(VerificationError::InsufficientScope {
                scope: missing.clone(),
            });
        }
    }

    if !requirement.permissions.is_empty() {
        let held: HashSet<&str> = match claims.get("permissions") {
            Some(Value::Array(items)) => items
                .iter()
                .map(Value::as_str)
                .collect::<Option<_>>()
                .ok_or(VerificationError::MissingClaim {
                    claim: "permissions",
                })?,
            _ => {
                return Err(VerificationError::MissingClaim {
                    claim: "permissions",
                })
            }
        };

        if let Some(missing) = requirement
            .permissions
            .iter()
            .find(|p| !held.contains(p.as_str()))
        {
            return Err(VerificationError::InsufficientPermission {
                permission: missing.clone(),
            });
        }
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => Claims::from(map),
            _ => panic!("claims must be an object"),
        }
    }

    #[test]
    fn empty_requirement_admits_anything() {
        let c = claims(json!({ "sub": "anyone" }));
        assert_eq!(authorize(c.clone(), &AuthorizationRequirement::new()), Ok(c));
    }

    #[test]
    fn reports_first_missing_scope() {
        let c = claims(json!({ "scope": "read write" }));
        let req = AuthorizationRequirement::from_static("read admin", &[]);

        assert_eq!(
            authorize(c, &req),
            Err(VerificationError::InsufficientScope {
                scope: ScopeToken::from_static("admin")
            })
        );
    }

    #[test]
    fn declared_order_decides_which_scope_is_reported() {
        let c = claims(json!({ "scope": "read" }));
        let req = AuthorizationRequirement::from_static("delete admin", &[]);

        let err = authorize(c, &req).unwrap_err();
        assert_eq!(err.identifier(), Some("delete"));
    }

    #[test]
    fn scope_claim_must_be_a_string() {
        let req = AuthorizationRequirement::from_static("read", &[]);

        for c in [json!({}), json!({ "scope": ["read"] }), json!({ "scope": 7 })] {
            assert_eq!(
                authorize(claims(c), &req),
                Err(VerificationError::MissingClaim { claim: "scope" })
            );
        }
    }

    #[test]
    fn scope_split_is_on_single_spaces() {
        let c = claims(json!({ "scope": "read\twrite" }));
        let req = AuthorizationRequirement::from_static("write", &[]);

        assert!(authorize(c, &req).is_err());
    }

    #[test]
    fn missing_permissions_claim() {
        let c = claims(json!({ "scope": "read" }));
        let req = AuthorizationRequirement::new().require_permission(Permission::from_static("p1"));

        assert_eq!(
            authorize(c, &req),
            Err(VerificationError::MissingClaim {
                claim: "permissions"
            })
        );
    }

    #[test]
    fn permissions_must_all_be_strings() {
        let c = claims(json!({ "permissions": ["p1", 2] }));
        let req = AuthorizationRequirement::from_static("", &["p1"]);

        assert_eq!(
            authorize(c, &req),
            Err(VerificationError::MissingClaim {
                claim: "permissions"
            })
        );
    }

    #[test]
    fn reports_first_missing_permission() {
        let c = claims(json!({ "permissions": ["p1", "p3"] }));
        let req = AuthorizationRequirement::from_static("", &["p1", "p2", "p3"]);

        assert_eq!(
            authorize(c, &req),
            Err(VerificationError::InsufficientPermission {
                permission: Permission::from_static("p2")
            })
        );
    }

    #[test]
    fn scope_failure_is_reported_before_permissions() {
        let c = claims(json!({ "scope": "read" }));
        let req = AuthorizationRequirement::from_static("admin", &["p1"]);

        assert!(matches!(
            authorize(c, &req),
            Err(VerificationError::InsufficientScope { .. })
        ));
    }

    #[test]
    fn returns_claims_unchanged() {
        let c = claims(json!({
            "scope": "orders:read orders:write",
            "permissions": ["orders:read"],
            "custom": { "nested": [1, 2, 3] },
        }));
        let req = AuthorizationRequirement::from_static("orders:write", &["orders:read"]);

        assert_eq!(authorize(c.clone(), &req), Ok(c));
    }

    #[test]
    fn scope_tokens_are_validated() {
        assert!(ScopeToken::try_from("orders:read").is_ok());
        assert_eq!(
            ScopeToken::try_from(""),
            Err(InvalidScopeToken::EmptyString)
        );
        assert!(matches!(
            ScopeToken::try_from("has\"quote"),
            Err(InvalidScopeToken::InvalidCharacter { position: 3, .. })
        ));

        assert!(AuthorizationRequirement::new()
            .with_scopes_str("ok not\\ok")
            .is_err());
    }

    #[test]
    fn duplicates_collapse() {
        let req = AuthorizationRequirement::new()
            .with_scopes_str("a b a")
            .unwrap()
            .with_permissions(["x", "x"]);

        assert_eq!(req.scopes().len(), 2);
        assert_eq!(req.permissions().len(), 1);
    }
}
