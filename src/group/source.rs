use std::future::Future;

use futures::future::BoxFuture;

use crate::error::CacheError;

/// The authoritative data source behind a group.
///
/// Invoked on a cache miss when no remote peer owns the key (or the peer
/// fetch failed). A missing key should be reported as
/// [`CacheError::NotFound`]; any other failure as [`CacheError::Loader`].
pub trait Loader: Send + Sync {
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Vec<u8>, CacheError>>;
}

/// Adapter letting a plain async closure act as a [`Loader`].
///
/// ```ignore
/// let loader = LoaderFn::new(|key: String| async move {
///     db.fetch(&key).await.ok_or(CacheError::NotFound(key))
/// });
/// ```
pub struct LoaderFn<F>(F);

impl<F, Fut> LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>, CacheError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>, CacheError>> + Send + 'static,
{
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Vec<u8>, CacheError>> {
        Box::pin((self.0)(key.to_string()))
    }
}
