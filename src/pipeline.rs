//! A common interface over both pipeline builders.

use async_trait::async_trait;

use crate::async_try::AsyncTry;
use crate::fault::Fault;
use crate::frame::FrameKind;
use crate::maybe::Maybe;
use crate::sync_try::Try;

/// Anything that can be run as a pipeline producing a `Maybe<Output>`.
///
/// Implemented by [`Try`] and [`AsyncTry`], so synchronous and asynchronous
/// pipelines can be stored and run side by side:
///
/// ```
/// use trywise::{AsyncTry, Pipeline, Try};
///
/// let pipelines: Vec<Box<dyn Pipeline<Output = i32>>> = vec![
///     Box::new(Try::of(|| Ok(1))),
///     Box::new(AsyncTry::of(|| async { Ok(2) })),
/// ];
///
/// futures::executor::block_on(async {
///     let mut total = 0;
///     for pipeline in &pipelines {
///         total += pipeline.run().await.unwrap().or_else(0);
///     }
///     assert_eq!(total, 3);
/// });
/// ```
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// The type of a successful result.
    type Output: Send + 'static;

    /// Run every frame and return the outcome.
    async fn run(&self) -> Result<Maybe<Self::Output>, Fault>;

    /// The kind of every frame, in order.
    fn frame_kinds(&self) -> Vec<FrameKind>;

    /// Returns `true` if frames are awaited rather than called.
    fn is_async(&self) -> bool;
}

#[async_trait]
impl<T: Send + 'static> Pipeline for Try<T> {
    type Output = T;

    async fn run(&self) -> Result<Maybe<T>, Fault> {
        self.execute()
    }

    fn frame_kinds(&self) -> Vec<FrameKind> {
        Try::frame_kinds(self)
    }

    fn is_async(&self) -> bool {
        false
    }
}

#[async_trait]
impl<T: Send + 'static> Pipeline for AsyncTry<T> {
    type Output = T;

    async fn run(&self) -> Result<Maybe<T>, Fault> {
        self.execute_async().await
    }

    fn frame_kinds(&self) -> Vec<FrameKind> {
        AsyncTry::frame_kinds(self)
    }

    fn is_async(&self) -> bool {
        true
    }
}
