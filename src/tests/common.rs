//! Common types and steps for tests.
//!
//! This module contains:
//! - `MathError`: Error types for math steps, classified into `ErrorKind`s
//! - Step functions: `divide`, `add`, `sqrt`
//! - `Calls`: A shared counter to observe how often a step or handler ran

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;


use crate::{Classify, ErrorKind, Fault};

// ============================================================================
// Error Type
// ============================================================================

/// Errors raised by math steps.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum MathError {
    /// Division by zero.
    #[error("Division by zero")]
    DivideByZero,

    /// Arithmetic overflow.
    #[error("Overflow")]
    Overflow,

    /// Square root of a negative number.
    #[error("Negative input: {0}")]
    Negative(i32),
}

impl Classify for MathError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::DivideByZero => ErrorKind::DivideByZero,
            Self::Overflow => ErrorKind::Overflow,
            Self::Negative(_) => ErrorKind::ArgumentOutOfRange,
        }
    }
}

/// An error no catch clause in the tests declares.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("Unexpected: {0}")]
pub struct Unexpected(pub &'static str);

impl Classify for Unexpected {}

// ============================================================================
// Steps
// ============================================================================

/// Divide `a` by `b`.
pub fn divide(a: i32, b: i32) -> Result<i32, Fault> {
    Ok(a.checked_div(b).ok_or(MathError::DivideByZero)?)
}

/// Add `a` and `b` with overflow check.
pub fn add(a: i32, b: i32) -> Result<i32, Fault> {
    Ok(a.checked_add(b).ok_or(MathError::Overflow)?)
}

/// Integer square root; negative input is an argument error.
pub fn sqrt(x: i32) -> Result<i32, Fault> {
    if x < 0 {
        return Err(MathError::Negative(x).into());
    }
    Ok(f64::from(x).sqrt() as i32)
}

// ============================================================================
// Call Counting
// ============================================================================

/// Counts invocations across clones.
#[derive(Clone, Default, Debug)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    /// Record one invocation.
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of recorded invocations.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
