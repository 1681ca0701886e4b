use std::{error::Error as StdError, fmt, sync::Arc, time::Duration};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use thiserror::Error;
use turnstile::{jwk::KeyIdRef, Jwk, Jwks};

use crate::VerificationError;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of a successful key set fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched {
    /// A new key set, replacing the current one
    Updated {
        /// The keys
        jwks: Jwks,
        /// Entity tag to send with the next conditional request
        etag: Option<String>,
    },
    /// The source reports the current key set is still up to date
    NotModified,
}

/// A key set could not be fetched
///
/// The displayed message is a fixed description. The underlying cause, when
/// there is one, is only available through [`source()`](StdError::source).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source did not answer in time
    #[error("timed out waiting for the key set")]
    Timeout,

    /// The source could not be reached
    #[error("key set source is unreachable")]
    Unreachable(#[source] Box<dyn StdError + Send + Sync>),

    /// The source answered with a non-success status
    #[error("key set source answered with status {status}")]
    Status {
        /// The status code received
        status: u16,
    },

    /// The source answered with something that is not a key set
    #[error("key set payload could not be parsed")]
    Malformed(#[source] Box<dyn StdError + Send + Sync>),
}

/// Somewhere a JSON Web Key Set can be fetched from
#[async_trait]
pub trait JwksSource: Send + Sync + fmt::Debug {
    /// A logical name for the source, used in failure messages
    fn name(&self) -> &str;

    /// Fetches the current key set
    ///
    /// `etag` is the entity tag of the set currently held, if the previous
    /// fetch produced one.
    async fn fetch(&self, etag: Option<&str>) -> Result<Fetched, FetchError>;
}

#[async_trait]
impl<T> JwksSource for Arc<T>
where
    T: JwksSource + ?Sized,
{
    fn name(&self) -> &str {
        T::name(self)
    }

    async fn fetch(&self, etag: Option<&str>) -> Result<Fetched, FetchError> {
        T::fetch(self, etag).await
    }
}

#[derive(Debug, Default)]
struct Cached {
    jwks: Jwks,
    etag: Option<String>,
}

/// Resolves signing keys by key ID from a cached, refreshable key set
///
/// The cache starts out empty and is filled on the first miss. Each miss
/// triggers one refresh from the source followed by one retry; there is no
/// background refresh. A refresh replaces the whole key set at once, so
/// concurrent readers see either the old set or the new one.
#[derive(Debug)]
pub struct KeyResolver {
    cache: ArcSwap<Cached>,
    source: Option<Box<dyn JwksSource>>,
    fetch_timeout: Duration,
}

impl KeyResolver {
    /// A resolver that fetches keys from `source` when needed
    pub fn with_source(source: impl JwksSource + 'static) -> Self {
        Self {
            cache: ArcSwap::from_pointee(Cached::default()),
            source: Some(Box::new(source)),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// A resolver over a fixed key set
    ///
    /// Refreshing such a resolver does nothing.
    pub fn from_jwks(jwks: Jwks) -> Self {
        Self {
            cache: ArcSwap::from_pointee(Cached { jwks, etag: None }),
            source: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Bounds how long a single fetch may take
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The logical name of the key set source
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source
            .as_deref()
            .map_or("static key set", |source| source.name())
    }

    /// A snapshot of the current key set
    #[must_use]
    pub fn current(&self) -> Jwks {
        self.cache.load().jwks.clone()
    }

    /// Replaces the current key set
    pub fn set_jwks(&self, jwks: Jwks) {
        self.cache.store(Arc::new(Cached { jwks, etag: None }));
    }

    /// Fetches the key set from the source and replaces the cache
    ///
    /// No retries are attempted. If the fetch fails, the current key set is
    /// left as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unreachable, times out, answers with
    /// a non-success status, or answers with something that is not a key set.
    #[tracing::instrument(skip(self), fields(jwks.source = tracing::field::Empty))]
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let Some(source) = &self.source else {
            return Ok(());
        };

        tracing::Span::current().record("jwks.source", source.name());
        tracing::debug!("refreshing JWKS");

        let etag = self.cache.load().etag.clone();
        let fetched = tokio::time::timeout(self.fetch_timeout, source.fetch(etag.as_deref()))
            .await
            .unwrap_or(Err(FetchError::Timeout));

        match fetched {
            Ok(Fetched::Updated { jwks, etag }) => {
                let keys = jwks.len() as u64;
                self.cache.store(Arc::new(Cached { jwks, etag }));
                tracing::info!(jwks.keys = keys, "JWKS refreshed");
                Ok(())
            }
            Ok(Fetched::NotModified) => {
                tracing::debug!("JWKS not modified");
                Ok(())
            }
            Err(err) => {
                let error: &dyn StdError = &err;
                tracing::warn!(error, "JWKS refresh failed");
                Err(err)
            }
        }
    }

    /// Finds the signing key published under `kid`
    ///
    /// A cache hit returns without touching the source. On a miss the key set
    /// is refreshed once and the lookup retried.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeyResolutionFailure`] if the refresh
    /// fails or the key is still absent afterwards.
    pub async fn resolve(&self, kid: &KeyIdRef) -> Result<Jwk, VerificationError> {
        if let Some(key) = self.cached(kid) {
            return Ok(key);
        }

        tracing::debug!(jwk.kid = %kid, "signing key not cached");

        if let Err(err) = self.refresh().await {
            return Err(VerificationError::KeyResolutionFailure {
                message: format!(
                    "unable to refresh key set from {}: {}",
                    self.source_name(),
                    err
                ),
                key_id: Some(kid.to_owned()),
            });
        }

        self.cached(kid).ok_or_else(|| {
            tracing::debug!(jwk.kid = %kid, "signing key unknown after refresh");
            VerificationError::KeyResolutionFailure {
                message: format!(
                    "no signing key with id '{}' in key set from {}",
                    kid,
                    self.source_name()
                ),
                key_id: Some(kid.to_owned()),
            }
        })
    }

    fn cached(&self, kid: &KeyIdRef) -> Option<Jwk> {
        self.cache.load().jwks.get_key_by_id(kid).cloned()
    }
}
