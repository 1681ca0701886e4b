//! Extractors that assert a presented token satisfies an endpoint's requirement

/// Constructs an extractor that verifies the request's bearer token against
/// a fixed requirement
///
/// The simplest guard requires a single scope:
///
/// ```
/// use turnstile_axum::requirement_guard;
///
/// requirement_guard!(ReadOrders; "orders:read");
/// ```
///
/// Several scopes are space-separated, and all of them must be granted:
///
/// ```
/// use turnstile_axum::requirement_guard;
///
/// requirement_guard!(pub ManageOrders; "orders:read orders:write");
/// ```
///
/// Required permissions follow the scopes:
///
/// ```
/// use turnstile_axum::requirement_guard;
///
/// requirement_guard!(DeleteOrders; "orders:write"; permissions = ["orders:delete"]);
/// ```
///
/// The guard finds the [`AuthGate`](crate::AuthGate) through the router
/// state. On success it holds the verified claims; on failure the request is
/// rejected with the matching [`AuthxError`](crate::AuthxError).
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use turnstile_axum::{requirement_guard, AuthGate};
///
/// requirement_guard!(ReadOrders; "orders:read");
///
/// async fn list_orders(ReadOrders(claims): ReadOrders) -> String {
///     format!("orders for {}", claims.sub().unwrap_or("anonymous"))
/// }
///
/// fn router(gate: AuthGate) -> Router {
///     Router::new()
///         .route("/orders", get(list_orders))
///         .with_state(gate)
/// }
/// ```
#[macro_export]
macro_rules! requirement_guard {
    ($vis:vis $i:ident; $scopes:literal) => {
        $crate::requirement_guard!($vis $i; $scopes; permissions = []);
    };
    ($vis:vis $i:ident; $scopes:literal; permissions = [$($permission:literal),* $(,)?]) => {
        #[doc = concat!("Admits requests whose bearer token grants `", $scopes, "`")]
        #[derive(Clone, Debug)]
        $vis struct $i(pub $crate::__private::Claims);

        impl $i {
            /// Consumes the guard, returning the verified claims
            #[allow(dead_code)]
            $vis fn into_claims(self) -> $crate::__private::Claims {
                self.0
            }

            /// The verified claims
            #[allow(dead_code)]
            $vis fn claims(&self) -> &$crate::__private::Claims {
                &self.0
            }
        }

        impl $crate::EndpointRequirement for $i {
            fn requirement() -> &'static $crate::__private::AuthorizationRequirement {
                static REQUIREMENT: $crate::__private::OnceCell<
                    $crate::__private::AuthorizationRequirement,
                > = $crate::__private::OnceCell::new();
                REQUIREMENT.get_or_init(|| {
                    $crate::__private::AuthorizationRequirement::from_static(
                        $scopes,
                        &[$($permission),*],
                    )
                })
            }
        }

        #[$crate::__private::async_trait]
        impl<S> $crate::__private::FromRequestParts<S> for $i
        where
            S: Send + Sync,
            $crate::AuthGate: $crate::__private::FromRef<S>,
        {
            type Rejection = $crate::AuthxError;

            async fn from_request_parts(
                parts: &mut $crate::__private::Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                $crate::__private::from_request(
                    parts,
                    state,
                    <Self as $crate::EndpointRequirement>::requirement(),
                )
                .await
                .map(Self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::EndpointRequirement;

    requirement_guard!(ReadOnly; "orders:read");
    requirement_guard!(pub(crate) Deleter; "orders:read orders:write"; permissions = ["orders:delete", "orders:delete",]);

    #[test]
    fn builds_static_requirements() {
        let read = ReadOnly::requirement();
        assert_eq!(read.scopes().len(), 1);
        assert!(read.permissions().is_empty());

        let delete = Deleter::requirement();
        assert_eq!(delete.scopes().len(), 2);
        assert_eq!(delete.permissions().len(), 1);
        assert_eq!(delete.permissions()[0].as_str(), "orders:delete");
    }
}
