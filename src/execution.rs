//! The pipeline execution engine.
//!
//! [`Execution`] is a small state machine over a frame sequence. It owns all
//! of the sequencing logic: which action runs next, which catch clause (if
//! any) receives a fault, and how the run ends. The two drivers,
//! [`Execution::run`] and [`Execution::run_async`], only invoke the frame
//! callables and feed their outcomes back, so synchronous and asynchronous
//! pipelines follow exactly the same rules.
//!
//! A run ends in one of three ways:
//!
//! - every action completed: the last action's result is returned (or
//!   nothing, if the sequence held no actions),
//! - an action failed and a later catch clause accepted the fault: the
//!   handler's value is returned and no further frames run,
//! - an action failed and no later clause accepted it: the fault propagates
//!   unchanged.

use crate::fault::Fault;
use crate::frame::{
    AsyncAction, AsyncHandler, CatchClause, Frames, SyncAction, SyncHandler, Value,
};
use crate::maybe::Maybe;

// ============================================================================
// Outcome
// ============================================================================

/// How a finished run ended.
pub(crate) enum Outcome {
    /// All actions completed; holds the last result, if any action ran.
    Completed(Option<Value>),
    /// A handler produced the final value.
    Recovered(Value),
    /// A fault escapes the pipeline.
    Propagating(Fault),
}

impl Outcome {
    /// Turn the outcome into the pipeline's result.
    ///
    /// A recovered value of a different type than `T` came from a handler of
    /// an earlier stage and yields an empty result.
    pub(crate) fn finish<T: 'static>(self) -> Result<Maybe<T>, Fault> {
        match self {
            Self::Completed(None) => Ok(Maybe::nothing()),
            Self::Completed(Some(value)) => value
                .downcast::<T>()
                .map(|value| Maybe::from_value(*value))
                .map_err(|_| Fault::missing_input::<T>(true)),
            Self::Recovered(value) => Ok(value
                .downcast::<T>()
                .map_or_else(|_| Maybe::nothing(), |value| Maybe::from_value(*value))),
            Self::Propagating(fault) => Err(fault),
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

/// What a driver does next.
enum Advance<'a, A> {
    /// Invoke `action` at `index` with the previous result.
    Action {
        index: usize,
        action: &'a A,
        previous: Option<Value>,
    },
    /// The run is over.
    Finished(Outcome),
}

/// A single run over a frame sequence.
///
/// The run sits on the action at `index` until an action fails, after which
/// `outcome` holds how it ended.
pub(crate) struct Execution<'a, A, H> {
    frames: &'a Frames<A, H>,
    index: usize,
    previous: Option<Value>,
    outcome: Option<Outcome>,
}

impl<'a, A, H> Execution<'a, A, H> {
    /// Start a run positioned at the first action.
    pub(crate) fn new(frames: &'a Frames<A, H>) -> Self {
        Self {
            frames,
            index: frames.find_next_action_index(None),
            previous: None,
            outcome: None,
        }
    }

    /// The next action to invoke, or the outcome once there is none.
    fn advance(&mut self) -> Advance<'a, A> {
        if let Some(outcome) = self.outcome.take() {
            return Advance::Finished(outcome);
        }
        let frames = self.frames;
        match frames.action_at(self.index) {
            Some(action) => {
                #[cfg(feature = "tracing")]
                tracing::info!(frame = self.index, "frame.start");

                Advance::Action {
                    index: self.index,
                    action,
                    previous: self.previous.take(),
                }
            }
            None => Advance::Finished(Outcome::Completed(self.previous.take())),
        }
    }

    /// Record a successful action and move to the next one.
    fn action_completed(&mut self, index: usize, value: Value) {
        #[cfg(feature = "tracing")]
        tracing::info!(frame = index, outcome = "ok", "frame.end");

        self.index = self.frames.find_next_action_index(Some(index));
        self.previous = Some(value);
    }

    /// Record a failed action.
    ///
    /// Returns the first later clause accepting the fault, with its index and
    /// the fault to hand it, or `None` if the fault propagates.
    fn action_failed(
        &mut self,
        index: usize,
        fault: Fault,
    ) -> Option<(usize, &'a CatchClause<H>, Fault)> {
        let frames = self.frames;
        match frames.find_next_matching_handler(&fault, index) {
            Some((handler_index, clause)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    frame = index,
                    handler = handler_index,
                    matcher = ?clause.matcher(),
                    kind = %fault.kind(),
                    "catch.matched"
                );

                Some((handler_index, clause, fault))
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::error!(frame = index, kind = %fault.kind(), "catch.unmatched");

                self.outcome = Some(Outcome::Propagating(fault));
                None
            }
        }
    }

    /// Record a handler's result. Either way the run is over.
    fn handler_finished(&mut self, handler_index: usize, result: Result<Value, Fault>) {
        #[cfg(feature = "tracing")]
        {
            let outcome = if result.is_ok() { "recovered" } else { "failed" };
            tracing::info!(frame = handler_index, outcome, "frame.end");
        }
        #[cfg(not(feature = "tracing"))]
        let _ = handler_index;

        self.outcome = Some(match result {
            Ok(value) => Outcome::Recovered(value),
            Err(fault) => Outcome::Propagating(fault),
        });
    }
}

impl<'a> Execution<'a, SyncAction, SyncHandler> {
    /// Run to completion, invoking frames synchronously.
    pub(crate) fn run(mut self) -> Outcome {
        loop {
            match self.advance() {
                Advance::Action {
                    index,
                    action,
                    previous,
                } => match action(previous) {
                    Ok(value) => self.action_completed(index, value),
                    Err(fault) => {
                        if let Some((handler_index, clause, fault)) =
                            self.action_failed(index, fault)
                        {
                            let result = (clause.handler())(fault);
                            self.handler_finished(handler_index, result);
                        }
                    }
                },
                Advance::Finished(outcome) => return outcome,
            }
        }
    }
}

impl<'a> Execution<'a, AsyncAction, AsyncHandler> {
    /// Run to completion, awaiting each frame in turn.
    pub(crate) async fn run_async(mut self) -> Outcome {
        loop {
            match self.advance() {
                Advance::Action {
                    index,
                    action,
                    previous,
                } => match action(previous).await {
                    Ok(value) => self.action_completed(index, value),
                    Err(fault) => {
                        if let Some((handler_index, clause, fault)) =
                            self.action_failed(index, fault)
                        {
                            let result = (clause.handler())(fault).await;
                            self.handler_finished(handler_index, result);
                        }
                    }
                },
                Advance::Finished(outcome) => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fault::ErrorKind;
    use crate::frame::{Frame, Matcher, SyncFrames};

    fn value(x: i32) -> Value {
        Box::new(x)
    }

    fn add(n: i32) -> Frame<SyncAction, SyncHandler> {
        Frame::Action(Arc::new(move |previous: Option<Value>| {
            let x = previous
                .and_then(|v| v.downcast::<i32>().ok())
                .map_or(0, |v| *v);
            Ok(value(x + n))
        }))
    }

    fn fail(kind: ErrorKind) -> Frame<SyncAction, SyncHandler> {
        Frame::Action(Arc::new(move |_: Option<Value>| Err(Fault::new(kind, "boom"))))
    }

    fn recover(kind: ErrorKind, x: i32) -> Frame<SyncAction, SyncHandler> {
        Frame::Catch(CatchClause::new(
            Matcher::Kind(kind),
            Arc::new(move |_: Fault| Ok(value(x))),
        ))
    }

    fn build(frames: Vec<Frame<SyncAction, SyncHandler>>) -> SyncFrames {
        frames
            .into_iter()
            .fold(SyncFrames::default(), |seq, frame| seq.add(frame))
    }

    #[test]
    fn completes_with_last_action_result() {
        let frames = build(vec![add(1), recover(ErrorKind::Any, -1), add(2)]);
        let outcome = Execution::new(&frames).run();
        assert!(matches!(outcome, Outcome::Completed(Some(_))));
        assert_eq!(outcome.finish::<i32>().expect("no fault"), Maybe::from_value(3));
    }

    #[test]
    fn empty_and_catch_only_sequences_complete_empty() {
        let empty = SyncFrames::default();
        assert_eq!(
            Execution::new(&empty).run().finish::<i32>().expect("no fault"),
            Maybe::nothing()
        );

        let catch_only = build(vec![recover(ErrorKind::Any, 5)]);
        assert_eq!(
            Execution::new(&catch_only).run().finish::<i32>().expect("no fault"),
            Maybe::nothing()
        );
    }

    #[test]
    fn recovery_stops_the_pipeline() {
        let frames = build(vec![
            add(1),
            fail(ErrorKind::Overflow),
            recover(ErrorKind::Arithmetic, 40),
            add(2),
        ]);
        let outcome = Execution::new(&frames).run();
        assert!(matches!(outcome, Outcome::Recovered(_)));
        assert_eq!(outcome.finish::<i32>().expect("recovered"), Maybe::from_value(40));
    }

    #[test]
    fn unmatched_fault_propagates() {
        let frames = build(vec![fail(ErrorKind::Io), recover(ErrorKind::Arithmetic, 0)]);
        let fault = Execution::new(&frames).run().finish::<i32>().unwrap_err();
        assert_eq!(fault.kind(), ErrorKind::Io);
        assert_eq!(fault.to_string(), "boom");
    }

    #[test]
    fn recovered_value_of_other_type_is_nothing() {
        let frames = build(vec![fail(ErrorKind::Io), recover(ErrorKind::Io, 1)]);
        let result = Execution::new(&frames).run().finish::<String>();
        assert_eq!(result.expect("recovered"), Maybe::nothing());
    }

    #[test]
    fn failing_handler_ends_run_with_its_fault() {
        let failing = Frame::Catch(CatchClause::new(
            Matcher::Kind(ErrorKind::Any),
            Arc::new(|_: Fault| -> Result<Value, Fault> {
                Err(Fault::new(ErrorKind::Format, "handler"))
            }) as SyncHandler,
        ));
        let frames = build(vec![fail(ErrorKind::Io), failing, recover(ErrorKind::Any, 1)]);
        let fault = Execution::new(&frames).run().finish::<i32>().unwrap_err();
        assert_eq!(fault.kind(), ErrorKind::Format);
        assert_eq!(fault.to_string(), "handler");
    }

    #[tokio::test]
    async fn async_driver_follows_same_rules() {
        let frames = build(vec![
            add(1),
            fail(ErrorKind::DivideByZero),
            recover(ErrorKind::Any, 9),
            recover(ErrorKind::DivideByZero, 10),
        ])
        .to_async();
        let outcome = Execution::new(&frames).run_async().await;
        assert_eq!(outcome.finish::<i32>().expect("recovered"), Maybe::from_value(9));
    }
}
