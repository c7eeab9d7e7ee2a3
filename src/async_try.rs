//! The asynchronous pipeline builder.

use std::error::Error as StdError;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::execution::Execution;
use crate::fault::{ContractError, ErrorKind, Fault};
use crate::frame::{
    erase, take_input, AsyncAction, AsyncFrames, AsyncHandler, CatchClause, Frame, FrameKind,
    Matcher, Value,
};
use crate::maybe::Maybe;

/// A deferred sequence of steps and catch clauses, some of which suspend.
///
/// `AsyncTry` follows the same rules as [`Try`](crate::Try); steps and
/// handlers are awaited one at a time, in the order they were added. A
/// synchronous pipeline becomes an `AsyncTry` as soon as an asynchronous
/// step or handler is appended to it, and keeps the behavior of every frame
/// it already had.
///
/// ```
/// use trywise::{ErrorKind, Fault, Try};
///
/// async fn fetch(id: u32) -> Result<String, Fault> {
///     Err(Fault::new(ErrorKind::Timeout, format!("fetching {id} timed out")))
/// }
///
/// let pipeline = Try::of(|| Ok(7))
///     .then_async(fetch)
///     .catch_kind(ErrorKind::Cancelled, |_| Ok("cached".to_owned()));
///
/// let result = futures::executor::block_on(pipeline.execute_async()).unwrap();
/// assert_eq!(result.or_else(String::new()), "cached");
/// ```
pub struct AsyncTry<T> {
    frames: AsyncFrames,
    _output: PhantomData<fn() -> T>,
}

impl<T> AsyncTry<T> {
    pub(crate) fn from_frames(frames: AsyncFrames) -> Self {
        Self {
            frames,
            _output: PhantomData,
        }
    }

    /// Number of frames in the pipeline.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frames were added.
    pub fn is_empty(&self) -> bool {
        self.frames.len() == 0
    }

    /// The kind of every frame, in the order they were added.
    pub fn frame_kinds(&self) -> Vec<FrameKind> {
        self.frames.kinds()
    }

    fn push_action<U, F>(&self, action: F) -> AsyncTry<U>
    where
        F: Fn(Option<Value>) -> BoxFuture<'static, Result<Value, Fault>> + Send + Sync + 'static,
    {
        let action: AsyncAction = Arc::new(action);
        AsyncTry::from_frames(self.frames.add(Frame::Action(action)))
    }

    fn push_catch<F>(&self, matcher: Matcher, handler: F) -> Self
    where
        F: Fn(Fault) -> BoxFuture<'static, Result<Value, Fault>> + Send + Sync + 'static,
    {
        let handler: AsyncHandler = Arc::new(handler);
        Self::from_frames(
            self.frames
                .add(Frame::Catch(CatchClause::new(matcher, handler))),
        )
    }
}

impl<T: Send + 'static> AsyncTry<T> {
    /// Start a pipeline from the asynchronous `action`.
    pub fn of<F, Fut>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        AsyncTry::<()>::default().then_async_with(action)
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Append a synchronous step that turns the previous result into a `U`.
    pub fn then<U, F>(&self, binder: F) -> AsyncTry<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U, Fault> + Send + Sync + 'static,
    {
        self.push_action(move |previous| {
            let result = take_input::<T>(previous).and_then(&binder).map(erase);
            future::ready(result).boxed()
        })
    }

    /// Append a synchronous step that ignores the previous result.
    pub fn then_with<U, F>(&self, factory: F) -> AsyncTry<U>
    where
        U: Send + 'static,
        F: Fn() -> Result<U, Fault> + Send + Sync + 'static,
    {
        self.push_action(move |_| future::ready(factory().map(erase)).boxed())
    }

    /// Append an asynchronous step that turns the previous result into a `U`.
    pub fn then_async<U, F, Fut>(&self, binder: F) -> AsyncTry<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, Fault>> + Send + 'static,
    {
        self.push_action(move |previous| match take_input::<T>(previous) {
            Ok(input) => binder(input).map(|result| result.map(erase)).boxed(),
            Err(fault) => future::ready(Err(fault)).boxed(),
        })
    }

    /// Append an asynchronous step that ignores the previous result.
    pub fn then_async_with<U, F, Fut>(&self, factory: F) -> AsyncTry<U>
    where
        U: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, Fault>> + Send + 'static,
    {
        self.push_action(move |_| factory().map(|result| result.map(erase)).boxed())
    }

    // ------------------------------------------------------------------------
    // Catch clauses
    // ------------------------------------------------------------------------

    /// Recover from faults wrapping an `E` with a synchronous handler.
    pub fn catch<E, F>(&self, handler: F) -> Self
    where
        E: StdError + Send + Sync + 'static,
        F: Fn(E) -> Result<T, Fault> + Send + Sync + 'static,
    {
        self.push_catch(Matcher::of_type::<E>(), move |fault| {
            let result = fault.downcast::<E>().and_then(&handler).map(erase);
            future::ready(result).boxed()
        })
    }

    /// Recover from faults whose kind is-a `kind` with a synchronous handler.
    pub fn catch_kind<F>(&self, kind: ErrorKind, handler: F) -> Self
    where
        F: Fn(Fault) -> Result<T, Fault> + Send + Sync + 'static,
    {
        self.push_catch(Matcher::Kind(kind), move |fault| {
            future::ready(handler(fault).map(erase)).boxed()
        })
    }

    /// Like [`catch_kind`](Self::catch_kind), with the kind given by name.
    ///
    /// Fails with [`ContractError::InvalidType`] if `name` is not an
    /// [`ErrorKind`].
    pub fn catch_named<F>(&self, name: &str, handler: F) -> Result<Self, ContractError>
    where
        F: Fn(Fault) -> Result<T, Fault> + Send + Sync + 'static,
    {
        let kind = name.parse::<ErrorKind>()?;
        Ok(self.catch_kind(kind, handler))
    }

    /// Recover from faults wrapping an `E` with an asynchronous handler.
    pub fn catch_async<E, F, Fut>(&self, handler: F) -> Self
    where
        E: StdError + Send + Sync + 'static,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        self.push_catch(Matcher::of_type::<E>(), move |fault| {
            match fault.downcast::<E>() {
                Ok(error) => handler(error).map(|result| result.map(erase)).boxed(),
                Err(fault) => future::ready(Err(fault)).boxed(),
            }
        })
    }

    /// Recover from faults whose kind is-a `kind` with an asynchronous
    /// handler.
    pub fn catch_kind_async<F, Fut>(&self, kind: ErrorKind, handler: F) -> Self
    where
        F: Fn(Fault) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        self.push_catch(Matcher::Kind(kind), move |fault| {
            handler(fault).map(|result| result.map(erase)).boxed()
        })
    }

    /// Like [`catch_kind_async`](Self::catch_kind_async), with the kind given
    /// by name.
    ///
    /// Fails with [`ContractError::InvalidType`] if `name` is not an
    /// [`ErrorKind`].
    pub fn catch_named_async<F, Fut>(&self, name: &str, handler: F) -> Result<Self, ContractError>
    where
        F: Fn(Fault) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        let kind = name.parse::<ErrorKind>()?;
        Ok(self.catch_kind_async(kind, handler))
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Run the pipeline, awaiting each frame in turn.
    ///
    /// Same outcomes as [`Try::execute`](crate::Try::execute).
    pub async fn execute_async(&self) -> Result<Maybe<T>, Fault> {
        Execution::new(&self.frames).run_async().await.finish::<T>()
    }
}

impl<T> Clone for AsyncTry<T> {
    fn clone(&self) -> Self {
        Self::from_frames(self.frames.clone())
    }
}

impl<T> Default for AsyncTry<T> {
    fn default() -> Self {
        Self::from_frames(AsyncFrames::default())
    }
}

impl<T> fmt::Debug for AsyncTry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTry")
            .field("frames", &self.frames.kinds())
            .finish()
    }
}

impl<T: Send + 'static> IntoFuture for AsyncTry<T> {
    type Output = Result<Maybe<T>, Fault>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        async move { self.execute_async().await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync_try::Try;

    #[tokio::test]
    async fn runs_mixed_steps_in_order() {
        let pipeline = AsyncTry::of(|| async { Ok(2) })
            .then(|x| Ok(x * 10))
            .then_async(|x| async move { Ok(format!("{x}!")) });
        assert_eq!(pipeline.len(), 3);
        assert_eq!(
            pipeline.execute_async().await.expect("ok"),
            Maybe::from_value("20!".to_owned())
        );
    }

    #[tokio::test]
    async fn builder_is_awaitable_and_reusable() {
        let pipeline = AsyncTry::of(|| async { Ok(7) });
        assert_eq!(pipeline.clone().await.expect("ok"), Maybe::from_value(7));
        assert_eq!(pipeline.await.expect("ok"), Maybe::from_value(7));
    }

    #[tokio::test]
    async fn async_handler_recovers() {
        let pipeline = AsyncTry::<i32>::of(|| async { Err(Fault::cancelled("stop")) })
            .catch_kind_async(ErrorKind::Cancelled, |fault| async move {
                Ok(fault.to_string().len() as i32)
            });
        assert_eq!(pipeline.await.expect("recovered"), Maybe::from_value(4));
    }

    #[tokio::test]
    async fn unknown_category_name_fails_immediately() {
        let result = AsyncTry::of(|| async { Ok(1) })
            .catch_named_async("Bogus", |_| async { Ok(0) });
        assert!(matches!(result, Err(ContractError::InvalidType { .. })));
    }

    #[tokio::test]
    async fn default_pipeline_is_empty() {
        let empty = AsyncTry::<u8>::default();
        assert!(empty.is_empty());
        assert_eq!(empty.await.expect("ok"), Maybe::nothing());
    }

    #[tokio::test]
    async fn catch_only_pipeline_is_nothing() {
        let pipeline = AsyncTry::<i32>::default()
            .catch_kind(ErrorKind::Any, |_| Ok(1))
            .catch_kind_async(ErrorKind::Any, |_| async { Ok(2) });
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.await.expect("ok"), Maybe::nothing());
    }

    #[tokio::test]
    async fn failing_sync_handler_propagates_after_promotion() {
        let pipeline = Try::<i32>::of(|| Err(Fault::new(ErrorKind::Io, "disk")))
            .catch_kind(ErrorKind::Io, |_| Err(Fault::new(ErrorKind::Format, "handler")))
            .catch_kind(ErrorKind::Any, |_| Ok(0))
            .into_async();

        let fault = pipeline.await.expect_err("handler failed");
        assert_eq!(fault.kind(), ErrorKind::Format);
        assert_eq!(fault.to_string(), "handler");
    }
}
