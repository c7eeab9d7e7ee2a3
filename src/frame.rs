//! Frames and frame sequences.
//!
//! A pipeline is an ordered list of frames. Each frame is either an action
//! (turn the previous result into a new one) or a catch clause (an error
//! category paired with a recovery handler).
//!
//! [`Frames`] is immutable: [`Frames::add`] returns a new sequence and leaves
//! the receiver untouched, so builders can fork from a shared prefix. The
//! same generic sequence serves both execution modes; only the action and
//! handler representations differ ([`SyncFrames`] vs [`AsyncFrames`]).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::fault::{ErrorKind, Fault};

/// A type-erased intermediate result flowing between frames.
pub(crate) type Value = Box<dyn Any + Send>;

/// Synchronous action: previous result (if any) to next result.
pub(crate) type SyncAction = Arc<dyn Fn(Option<Value>) -> Result<Value, Fault> + Send + Sync>;

/// Synchronous catch handler: fault to replacement result.
pub(crate) type SyncHandler = Arc<dyn Fn(Fault) -> Result<Value, Fault> + Send + Sync>;

/// Asynchronous action.
pub(crate) type AsyncAction =
    Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, Result<Value, Fault>> + Send + Sync>;

/// Asynchronous catch handler.
pub(crate) type AsyncHandler =
    Arc<dyn Fn(Fault) -> BoxFuture<'static, Result<Value, Fault>> + Send + Sync>;

/// Box a stage result for the next frame.
pub(crate) fn erase<T: Send + 'static>(value: T) -> Value {
    Box::new(value)
}

/// Take the previous stage's result as a `T`.
///
/// Fails with an `InvalidOperation` fault when no action ran before or its
/// result has another type.
pub(crate) fn take_input<T: 'static>(previous: Option<Value>) -> Result<T, Fault> {
    match previous {
        Some(value) => value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Fault::missing_input::<T>(true)),
        None => Err(Fault::missing_input::<T>(false)),
    }
}

/// Frame sequence of a [`Try`](crate::Try).
pub(crate) type SyncFrames = Frames<SyncAction, SyncHandler>;

/// Frame sequence of an [`AsyncTry`](crate::AsyncTry).
pub(crate) type AsyncFrames = Frames<AsyncAction, AsyncHandler>;

/// Whether a frame transforms values or recovers from faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// Produces the next result from the previous one.
    Action,
    /// Recovers from a matching fault raised by an earlier action.
    CatchClause,
}

// ============================================================================
// Catch Clauses
// ============================================================================

/// Decides which faults a catch clause accepts.
#[derive(Clone, Copy)]
pub(crate) enum Matcher {
    /// Faults whose kind is-a the given kind.
    Kind(ErrorKind),
    /// Faults wrapping one concrete error type.
    Type {
        name: &'static str,
        test: fn(&Fault) -> bool,
    },
}

impl Matcher {
    /// Match faults wrapping an `E`.
    pub(crate) fn of_type<E: std::error::Error + 'static>() -> Self {
        Self::Type {
            name: std::any::type_name::<E>(),
            test: Fault::is::<E>,
        }
    }

    pub(crate) fn accepts(&self, fault: &Fault) -> bool {
        match self {
            Self::Kind(kind) => fault.kind().is_a(*kind),
            Self::Type { test, .. } => test(fault),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => write!(f, "Kind({kind})"),
            Self::Type { name, .. } => write!(f, "Type({name})"),
        }
    }
}

/// An error matcher paired with a handler.
#[derive(Clone)]
pub(crate) struct CatchClause<H> {
    matcher: Matcher,
    handler: H,
}

impl<H> CatchClause<H> {
    pub(crate) fn new(matcher: Matcher, handler: H) -> Self {
        Self { matcher, handler }
    }

    pub(crate) fn matcher(&self) -> Matcher {
        self.matcher
    }

    pub(crate) fn handler(&self) -> &H {
        &self.handler
    }

    /// Whether this clause can handle `fault`.
    pub(crate) fn can_handle(&self, fault: &Fault) -> bool {
        self.matcher().accepts(fault)
    }
}

impl CatchClause<SyncHandler> {
    /// Lift the handler into the asynchronous representation. It still runs
    /// synchronously when invoked.
    pub(crate) fn to_async(&self) -> CatchClause<AsyncHandler> {
        let handler = self.handler.clone();
        CatchClause {
            matcher: self.matcher,
            handler: Arc::new(move |fault: Fault| future::ready(handler(fault)).boxed()),
        }
    }
}

// ============================================================================
// Frames
// ============================================================================

/// A single pipeline step.
#[derive(Clone)]
pub(crate) enum Frame<A, H> {
    Action(A),
    Catch(CatchClause<H>),
}

impl<A, H> Frame<A, H> {
    pub(crate) fn kind(&self) -> FrameKind {
        match self {
            Self::Action(_) => FrameKind::Action,
            Self::Catch(_) => FrameKind::CatchClause,
        }
    }
}

impl Frame<SyncAction, SyncHandler> {
    pub(crate) fn to_async(&self) -> Frame<AsyncAction, AsyncHandler> {
        match self {
            Self::Action(action) => {
                let action = action.clone();
                Frame::Action(Arc::new(move |previous: Option<Value>| {
                    future::ready(action(previous)).boxed()
                }))
            }
            Self::Catch(clause) => Frame::Catch(clause.to_async()),
        }
    }
}

/// An immutable, ordered sequence of frames.
pub(crate) struct Frames<A, H> {
    frames: Arc<[Frame<A, H>]>,
}

impl<A, H> Frames<A, H> {
    /// Number of frames.
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// The action at `index`, if that frame is an action.
    pub(crate) fn action_at(&self, index: usize) -> Option<&A> {
        match self.frames.get(index)? {
            Frame::Action(action) => Some(action),
            Frame::Catch(_) => None,
        }
    }

    /// Frame kinds in order.
    pub(crate) fn kinds(&self) -> Vec<FrameKind> {
        self.frames.iter().map(Frame::kind).collect()
    }

    /// Index of the first action strictly after `after` (`None` scans from
    /// the start), or `len()` if there is none.
    pub(crate) fn find_next_action_index(&self, after: Option<usize>) -> usize {
        let start = after.map_or(0, |index| index + 1);
        (start..self.frames.len())
            .find(|&index| matches!(self.frames[index], Frame::Action(_)))
            .unwrap_or(self.frames.len())
    }

    /// First catch clause strictly after `after` that accepts `fault`.
    ///
    /// Clauses are tried in append order; the first compatible one wins even
    /// if a later one is more specific.
    pub(crate) fn find_next_matching_handler(
        &self,
        fault: &Fault,
        after: usize,
    ) -> Option<(usize, &CatchClause<H>)> {
        self.frames
            .iter()
            .enumerate()
            .skip(after + 1)
            .find_map(|(index, frame)| match frame {
                Frame::Catch(clause) if clause.can_handle(fault) => Some((index, clause)),
                _ => None,
            })
    }
}

impl<A: Clone, H: Clone> Frames<A, H> {
    /// A new sequence with `frame` appended; `self` is unchanged.
    pub(crate) fn add(&self, frame: Frame<A, H>) -> Self {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.extend(self.frames.iter().cloned());
        frames.push(frame);
        Self {
            frames: frames.into(),
        }
    }
}

impl SyncFrames {
    /// The equivalent asynchronous sequence. Order and kinds are preserved.
    pub(crate) fn to_async(&self) -> AsyncFrames {
        Frames {
            frames: self.frames.iter().map(Frame::to_async).collect(),
        }
    }
}

impl<A, H> Clone for Frames<A, H> {
    fn clone(&self) -> Self {
        Self {
            frames: Arc::clone(&self.frames),
        }
    }
}

impl<A, H> Default for Frames<A, H> {
    fn default() -> Self {
        Self {
            frames: Arc::from(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(value: i32) -> Frame<SyncAction, SyncHandler> {
        Frame::Action(Arc::new(move |_: Option<Value>| {
            Ok(Box::new(value) as Value)
        }))
    }

    fn catch(kind: ErrorKind, value: i32) -> Frame<SyncAction, SyncHandler> {
        Frame::Catch(CatchClause::new(
            Matcher::Kind(kind),
            Arc::new(move |_: Fault| Ok(Box::new(value) as Value)),
        ))
    }

    fn frames(list: Vec<Frame<SyncAction, SyncHandler>>) -> SyncFrames {
        list.into_iter()
            .fold(SyncFrames::default(), |frames, frame| frames.add(frame))
    }

    fn recovered(clause: &CatchClause<SyncHandler>) -> i32 {
        let value = (clause.handler())(Fault::new(ErrorKind::Any, "x")).expect("handler");
        *value.downcast::<i32>().expect("i32")
    }

    #[test]
    fn add_leaves_original_untouched() {
        let base = frames(vec![action(1)]);
        let longer = base.add(catch(ErrorKind::Any, 0));
        assert_eq!(base.len(), 1);
        assert_eq!(longer.kinds(), vec![FrameKind::Action, FrameKind::CatchClause]);
    }

    #[test]
    fn next_action_skips_catch_clauses() {
        let seq = frames(vec![
            catch(ErrorKind::Any, 0),
            action(1),
            catch(ErrorKind::Any, 0),
            catch(ErrorKind::Any, 0),
            action(2),
        ]);
        assert_eq!(seq.find_next_action_index(None), 1);
        assert_eq!(seq.find_next_action_index(Some(1)), 4);
        assert_eq!(seq.find_next_action_index(Some(4)), seq.len());
    }

    #[test]
    fn next_action_on_empty_and_catch_only() {
        assert_eq!(SyncFrames::default().find_next_action_index(None), 0);
        let seq = frames(vec![catch(ErrorKind::Any, 0)]);
        assert_eq!(seq.find_next_action_index(None), 1);
    }

    #[test]
    fn handler_lookup_starts_after_failure() {
        let seq = frames(vec![
            catch(ErrorKind::Arithmetic, 10),
            action(1),
            catch(ErrorKind::Argument, 20),
            catch(ErrorKind::Arithmetic, 30),
        ]);
        let fault = Fault::new(ErrorKind::Overflow, "overflow");

        let (index, clause) = seq.find_next_matching_handler(&fault, 1).expect("match");
        assert_eq!(index, 3);
        assert_eq!(recovered(clause), 30);

        assert!(seq.find_next_matching_handler(&fault, 3).is_none());
    }

    #[test]
    fn earlier_broad_clause_beats_later_specific_one() {
        let seq = frames(vec![
            action(1),
            catch(ErrorKind::Any, 1),
            catch(ErrorKind::DivideByZero, 2),
        ]);
        let fault = Fault::new(ErrorKind::DivideByZero, "div");
        let (index, clause) = seq.find_next_matching_handler(&fault, 0).expect("match");
        assert_eq!(index, 1);
        assert_eq!(recovered(clause), 1);
    }

    #[test]
    fn type_matcher_checks_wrapped_error() {
        let parse_error = "x".parse::<i32>().unwrap_err();
        let fault = Fault::from(parse_error);
        assert!(Matcher::of_type::<std::num::ParseIntError>().accepts(&fault));
        assert!(!Matcher::of_type::<std::io::Error>().accepts(&fault));
    }

    #[test]
    fn take_input_rejects_missing_or_mistyped_results() {
        assert_eq!(take_input::<i32>(Some(erase(4))).expect("i32"), 4);

        let fault = take_input::<i32>(None).unwrap_err();
        assert_eq!(fault.kind(), ErrorKind::InvalidOperation);
        assert!(fault.to_string().contains("no previous result"));

        let fault = take_input::<i32>(Some(erase("four"))).unwrap_err();
        assert!(fault.to_string().contains("not of type `i32`"));
    }

    #[tokio::test]
    async fn to_async_preserves_order_and_behavior() {
        let sync = frames(vec![action(7), catch(ErrorKind::Io, 8)]);
        let promoted = sync.to_async();
        assert_eq!(promoted.kinds(), sync.kinds());

        let first = promoted.action_at(0).expect("action");
        let value = first(None).await.expect("ok");
        assert_eq!(*value.downcast::<i32>().expect("i32"), 7);

        let fault = Fault::new(ErrorKind::Io, "disk");
        let (_, clause) = promoted
            .find_next_matching_handler(&fault, 0)
            .expect("match");
        let value = (clause.handler())(fault).await.expect("ok");
        assert_eq!(*value.downcast::<i32>().expect("i32"), 8);
    }
}
