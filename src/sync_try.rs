//! The synchronous pipeline builder.

use std::error::Error as StdError;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, Ready};

use crate::async_try::AsyncTry;
use crate::execution::Execution;
use crate::fault::{ContractError, ErrorKind, Fault};
use crate::frame::{
    erase, take_input, CatchClause, Frame, FrameKind, Matcher, SyncAction, SyncFrames,
    SyncHandler, Value,
};
use crate::maybe::Maybe;

/// A deferred, synchronous sequence of fallible steps and catch clauses.
///
/// Building a `Try` runs nothing. Every builder method returns a new
/// pipeline and leaves the receiver untouched, so a common prefix can be
/// forked into several pipelines:
///
/// ```
/// use trywise::{ErrorKind, Try};
///
/// let parsed = Try::of(|| Ok("42".to_owned())).then(|s| Ok(s.parse::<i32>()?));
/// let doubled = parsed.then(|x| Ok(x * 2));
/// let safe = doubled.catch_kind(ErrorKind::Format, |_| Ok(0));
///
/// assert_eq!(safe.execute().unwrap().or_else(-1), 84);
/// assert_eq!(parsed.execute().unwrap().or_else(-1), 42);
/// ```
///
/// [`execute`](Try::execute) walks the frames in order. The first fault
/// raised by a step goes to the first later catch clause that accepts it; the
/// handler's value becomes the result and nothing after it runs. A fault that
/// no clause accepts is returned as is.
pub struct Try<T> {
    frames: SyncFrames,
    _output: PhantomData<fn() -> T>,
}

impl<T> Try<T> {
    pub(crate) fn from_frames(frames: SyncFrames) -> Self {
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

    fn push_action<U, F>(&self, action: F) -> Try<U>
    where
        F: Fn(Option<Value>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let action: SyncAction = Arc::new(action);
        Try::from_frames(self.frames.add(Frame::Action(action)))
    }

    fn push_catch<F>(&self, matcher: Matcher, handler: F) -> Self
    where
        F: Fn(Fault) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let handler: SyncHandler = Arc::new(handler);
        Self::from_frames(
            self.frames
                .add(Frame::Catch(CatchClause::new(matcher, handler))),
        )
    }
}

impl<T: Send + 'static> Try<T> {
    /// Start a pipeline from `action`.
    pub fn of<F>(action: F) -> Self
    where
        F: Fn() -> Result<T, Fault> + Send + Sync + 'static,
    {
        Try::<()>::default().then_with(action)
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Append a step that turns the previous result into a `U`.
    pub fn then<U, F>(&self, binder: F) -> Try<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U, Fault> + Send + Sync + 'static,
    {
        self.push_action(move |previous| binder(take_input::<T>(previous)?).map(erase))
    }

    /// Append a step that ignores the previous result.
    pub fn then_with<U, F>(&self, factory: F) -> Try<U>
    where
        U: Send + 'static,
        F: Fn() -> Result<U, Fault> + Send + Sync + 'static,
    {
        self.push_action(move |_| factory().map(erase))
    }

    /// Append an asynchronous step, promoting the pipeline to an [`AsyncTry`].
    pub fn then_async<U, F, Fut>(&self, binder: F) -> AsyncTry<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, Fault>> + Send + 'static,
    {
        self.to_async().then_async(binder)
    }

    /// Append an asynchronous step that ignores the previous result,
    /// promoting the pipeline to an [`AsyncTry`].
    pub fn then_async_with<U, F, Fut>(&self, factory: F) -> AsyncTry<U>
    where
        U: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, Fault>> + Send + 'static,
    {
        self.to_async().then_async_with(factory)
    }

    // ------------------------------------------------------------------------
    // Catch clauses
    // ------------------------------------------------------------------------

    /// Recover from faults wrapping an `E`.
    ///
    /// Only the concrete type `E` matches; use [`catch_kind`](Self::catch_kind)
    /// to match a whole category.
    pub fn catch<E, F>(&self, handler: F) -> Self
    where
        E: StdError + Send + Sync + 'static,
        F: Fn(E) -> Result<T, Fault> + Send + Sync + 'static,
    {
        self.push_catch(
            Matcher::of_type::<E>(),
            move |fault: Fault| handler(fault.downcast::<E>()?).map(erase),
        )
    }

    /// Recover from faults whose kind is-a `kind`.
    pub fn catch_kind<F>(&self, kind: ErrorKind, handler: F) -> Self
    where
        F: Fn(Fault) -> Result<T, Fault> + Send + Sync + 'static,
    {
        self.push_catch(
            Matcher::Kind(kind),
            move |fault| handler(fault).map(erase),
        )
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

    /// Asynchronous [`catch`](Self::catch), promoting the pipeline.
    pub fn catch_async<E, F, Fut>(&self, handler: F) -> AsyncTry<T>
    where
        E: StdError + Send + Sync + 'static,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        self.to_async().catch_async(handler)
    }

    /// Asynchronous [`catch_kind`](Self::catch_kind), promoting the pipeline.
    pub fn catch_kind_async<F, Fut>(&self, kind: ErrorKind, handler: F) -> AsyncTry<T>
    where
        F: Fn(Fault) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        self.to_async().catch_kind_async(kind, handler)
    }

    /// Asynchronous [`catch_named`](Self::catch_named), promoting the
    /// pipeline.
    pub fn catch_named_async<F, Fut>(
        &self,
        name: &str,
        handler: F,
    ) -> Result<AsyncTry<T>, ContractError>
    where
        F: Fn(Fault) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        self.to_async().catch_named_async(name, handler)
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Run the pipeline.
    ///
    /// Returns the last step's result, a handler's recovered value, or
    /// nothing if the pipeline holds no steps. A fault no catch clause
    /// accepts is returned unchanged.
    pub fn execute(&self) -> Result<Maybe<T>, Fault> {
        Execution::new(&self.frames).run().finish::<T>()
    }

    /// Convert into an equivalent [`AsyncTry`].
    pub fn into_async(self) -> AsyncTry<T> {
        self.to_async()
    }

    fn to_async(&self) -> AsyncTry<T> {
        AsyncTry::from_frames(self.frames.to_async())
    }
}

impl<T> Clone for Try<T> {
    fn clone(&self) -> Self {
        Self::from_frames(self.frames.clone())
    }
}

impl<T> Default for Try<T> {
    fn default() -> Self {
        Self::from_frames(SyncFrames::default())
    }
}

impl<T> fmt::Debug for Try<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Try")
            .field("frames", &self.frames.kinds())
            .finish()
    }
}

impl<T: Send + 'static> From<Try<T>> for AsyncTry<T> {
    fn from(pipeline: Try<T>) -> Self {
        pipeline.into_async()
    }
}

impl<T: Send + 'static> IntoFuture for Try<T> {
    type Output = Result<Maybe<T>, Fault>;
    type IntoFuture = Ready<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        future::ready(self.execute())
    }
}
