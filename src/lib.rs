#![deny(missing_docs)]

//! Trywise — deferred try/catch pipelines and optional values.
//!
//! # Design Goals
//!
//! Trywise turns "a sequence of operations that may fail" into plain data:
//!
//! - **Deferred execution**: building a pipeline runs nothing; `execute` does
//! - **Ordered dispatch**: a fault goes to the first later catch clause that accepts it
//! - **One engine**: synchronous and asynchronous pipelines share the same rules
//!
//! # Core Concepts
//!
//! - [`Try`] / [`AsyncTry`]: immutable pipeline builders
//! - [`Fault`] / [`ErrorKind`]: raised errors and their category hierarchy
//! - [`Maybe`]: the optional value every pipeline produces
//! - [`DynMaybe`]: a type-erased `Maybe` for heterogeneous collections
//!
//! ```
//! use trywise::{ErrorKind, Try};
//!
//! let pipeline = Try::of(|| Ok(99))
//!     .then(|x| Ok(x.to_string()))
//!     .catch_kind(ErrorKind::Arithmetic, |_| Ok("overflow".to_owned()));
//!
//! assert_eq!(pipeline.execute().unwrap().or_else(String::new()), "99");
//! ```
//!
//! # Features
//!
//! - `tracing`: emit `tracing` events as frames start, finish and fail.

// Modules
pub mod async_maybe;
pub mod async_try;
pub mod dyn_maybe;
mod execution;
pub mod fault;
mod frame;
mod macros;
pub mod maybe;
pub mod pipeline;
pub mod sync_try;

// Re-exports for convenience
pub use async_maybe::AsyncMaybe;
pub use async_try::AsyncTry;
pub use dyn_maybe::{DynMaybe, ErasedValue, TypeTag};
pub use fault::{BoxError, Classify, ContractError, ErrorKind, Fault};
pub use frame::FrameKind;
pub use maybe::Maybe;
pub use pipeline::Pipeline;
pub use sync_try::Try;

#[cfg(test)]
mod tests;
