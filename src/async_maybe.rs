//! Optional values that are still being computed.

use std::fmt;
use std::future::{Future, IntoFuture};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::maybe::Maybe;

/// A [`Maybe<T>`] that becomes available once a future resolves.
///
/// A `nothing()` instance short-circuits: binders and factories chained onto
/// it are applied without awaiting anything.
pub struct AsyncMaybe<T> {
    future: Option<BoxFuture<'static, Maybe<T>>>,
}

impl<T: Send + 'static> AsyncMaybe<T> {
    /// Wrap a future producing a `Maybe`.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Maybe<T>> + Send + 'static,
    {
        Self {
            future: Some(future.boxed()),
        }
    }

    /// An already resolved, empty value.
    pub fn nothing() -> Self {
        Self { future: None }
    }

    /// Returns `true` if this value is known to be empty without awaiting.
    pub fn is_known_nothing(&self) -> bool {
        self.future.is_none()
    }

    /// Bind the eventual value with a synchronous `binder`.
    pub fn map<U, F>(self, binder: F) -> AsyncMaybe<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Maybe<U> + Send + 'static,
    {
        match self.future {
            Some(future) => AsyncMaybe::new(async move { future.await.map(binder) }),
            None => AsyncMaybe::nothing(),
        }
    }

    /// Bind the eventual value with an asynchronous `binder`.
    pub fn map_async<U, F, Fut>(self, binder: F) -> AsyncMaybe<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Maybe<U>> + Send + 'static,
    {
        match self.future {
            Some(future) => AsyncMaybe::new(async move {
                match future.await.into_option() {
                    Some(value) => binder(value).await,
                    None => Maybe::nothing(),
                }
            }),
            None => AsyncMaybe::nothing(),
        }
    }

    /// Await the value.
    pub async fn resolve(self) -> Maybe<T> {
        match self.future {
            Some(future) => future.await,
            None => Maybe::nothing(),
        }
    }

    /// The eventual value, or `alternative`.
    pub async fn or_else(self, alternative: T) -> T {
        self.resolve().await.or_else(alternative)
    }

    /// The eventual value, or the result of `alternative_factory`.
    pub async fn or_else_with<F>(self, alternative_factory: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.resolve().await.or_else_with(alternative_factory)
    }

    /// The eventual value, or the awaited result of `alternative_factory`.
    pub async fn or_else_async<F, Fut>(self, alternative_factory: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.resolve().await.or_else_async(alternative_factory).await
    }
}

impl<T: Send + 'static> Default for AsyncMaybe<T> {
    fn default() -> Self {
        Self::nothing()
    }
}

impl<T: Send + 'static> From<Maybe<T>> for AsyncMaybe<T> {
    fn from(maybe: Maybe<T>) -> Self {
        if maybe.has_value() {
            Self::new(futures::future::ready(maybe))
        } else {
            Self::nothing()
        }
    }
}

impl<T: Send + 'static> IntoFuture for AsyncMaybe<T> {
    type Output = Maybe<T>;
    type IntoFuture = BoxFuture<'static, Maybe<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.resolve().boxed()
    }
}

impl<T> fmt::Debug for AsyncMaybe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.future {
            Some(_) => f.write_str("AsyncMaybe(<pending>)"),
            None => f.write_str("AsyncMaybe(Nothing)"),
        }
    }
}
