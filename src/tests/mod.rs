//! Scenario tests for trywise pipelines.
//!
//! ## Test Organization
//!
//! - `common`: Shared errors, steps and call counters
//! - `scenarios`: End-to-end synchronous pipelines (success and recovery paths)
//! - `dispatch`: Which catch clause receives a fault
//! - `promotion`: Sync pipelines promoted to async keep their behavior
//! - `cancellation`: Timeouts and cancellation surfacing as ordinary faults
//! - `optional`: `Maybe` / `DynMaybe` laws and cross-equality
//!
//! ## Test Domain
//!
//! Most tests use a small "Math" domain:
//! - `divide`: Fails with `MathError::DivideByZero` on a zero divisor
//! - `add`: Fails with `MathError::Overflow` on `i32` overflow
//! - `sqrt`: Fails with `MathError::Negative` on a negative input

mod common;

mod cancellation;
