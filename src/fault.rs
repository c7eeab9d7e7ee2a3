//! Error categories, pipeline faults and contract errors.
//!
//! Pipeline steps report failure with a [`Fault`]: the original error plus an
//! [`ErrorKind`] naming its category. Kinds form a small "is-a" hierarchy so a
//! catch clause declared for a broad category also catches its narrower ones.
//!
//! Misuse of the API itself (wrong runtime types, unknown category names,
//! reading an empty value) is reported with [`ContractError`].

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Boxed source error carried by a [`Fault`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// Error Kinds
// ============================================================================

/// Category of a raised error.
///
/// Every kind is-a [`ErrorKind::Any`]; the remaining relations are given by
/// [`ErrorKind::parent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Root category, matches every fault.
    Any,
    /// Arithmetic failure.
    Arithmetic,
    /// Division by zero. Is-a `Arithmetic`.
    DivideByZero,
    /// Numeric overflow or underflow. Is-a `Arithmetic`.
    Overflow,
    /// A supplied argument was not acceptable.
    Argument,
    /// A required argument was absent. Is-a `Argument`.
    ArgumentNull,
    /// An argument was outside its allowed range. Is-a `Argument`.
    ArgumentOutOfRange,
    /// The operation is not valid in the current state.
    InvalidOperation,
    /// The operation was cancelled.
    Cancelled,
    /// The operation ran out of time. Is-a `Cancelled`.
    Timeout,
    /// Input could not be parsed or formatted.
    Format,
    /// An I/O operation failed.
    Io,
    /// The operation is not supported.
    NotSupported,
}

impl ErrorKind {
    /// All kinds, root first.
    pub const ALL: [ErrorKind; 13] = [
        Self::Any,
        Self::Arithmetic,
        Self::DivideByZero,
        Self::Overflow,
        Self::Argument,
        Self::ArgumentNull,
        Self::ArgumentOutOfRange,
        Self::InvalidOperation,
        Self::Cancelled,
        Self::Timeout,
        Self::Format,
        Self::Io,
        Self::NotSupported,
    ];

    /// The next broader category, or `None` for [`ErrorKind::Any`].
    pub const fn parent(self) -> Option<ErrorKind> {
        match self {
            Self::Any => None,
            Self::DivideByZero | Self::Overflow => Some(Self::Arithmetic),
            Self::ArgumentNull | Self::ArgumentOutOfRange => Some(Self::Argument),
            Self::Timeout => Some(Self::Cancelled),
            Self::Arithmetic
            | Self::Argument
            | Self::InvalidOperation
            | Self::Cancelled
            | Self::Format
            | Self::Io
            | Self::NotSupported => Some(Self::Any),
        }
    }

    /// Returns `true` if `self` is `category` or one of its descendants.
    pub fn is_a(self, category: ErrorKind) -> bool {
        self.lineage().any(|kind| kind == category)
    }

    /// Iterates from `self` up to [`ErrorKind::Any`], inclusive.
    pub fn lineage(self) -> impl Iterator<Item = ErrorKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// The canonical name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Arithmetic => "Arithmetic",
            Self::DivideByZero => "DivideByZero",
            Self::Overflow => "Overflow",
            Self::Argument => "Argument",
            Self::ArgumentNull => "ArgumentNull",
            Self::ArgumentOutOfRange => "ArgumentOutOfRange",
            Self::InvalidOperation => "InvalidOperation",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Format => "Format",
            Self::Io => "Io",
            Self::NotSupported => "NotSupported",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ContractError::InvalidType {
                name: s.to_owned(),
            })
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Errors that know their own [`ErrorKind`].
///
/// Any `Classify` error converts into a [`Fault`] with `?`.
pub trait Classify {
    /// The category this error belongs to.
    fn kind(&self) -> ErrorKind {
        ErrorKind::Any
    }
}

impl Classify for std::io::Error {
    fn kind(&self) -> ErrorKind {
        match std::io::Error::kind(self) {
            std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            std::io::ErrorKind::InvalidInput => ErrorKind::Argument,
            std::io::ErrorKind::Unsupported => ErrorKind::NotSupported,
            _ => ErrorKind::Io,
        }
    }
}

impl Classify for std::num::ParseIntError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Format
    }
}

impl Classify for std::num::ParseFloatError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Format
    }
}

impl Classify for std::num::TryFromIntError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Overflow
    }
}

impl Classify for std::fmt::Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Format
    }
}

// ============================================================================
// Fault
// ============================================================================

/// An error raised by a pipeline step or handler.
///
/// Formats and chains exactly like the error it wraps; the kind is only used
/// to decide which catch clauses may handle it.
pub struct Fault {
    kind: ErrorKind,
    error: BoxError,
}

impl Fault {
    /// Create a fault of the given kind.
    ///
    /// Accepts any error type as well as plain `&str` / `String` messages.
    pub fn new(kind: ErrorKind, error: impl Into<BoxError>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// Shorthand for a [`ErrorKind::Cancelled`] fault.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message.into())
    }

    /// The category of this fault.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if the wrapped error is of type `E`.
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.error.is::<E>()
    }

    /// Borrow the wrapped error as `E`, if it is one.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    /// Take the wrapped error as `E`, or get the fault back untouched.
    pub fn downcast<E: StdError + 'static>(self) -> Result<E, Fault> {
        let kind = self.kind;
        self.error
            .downcast::<E>()
            .map(|error| *error)
            .map_err(|error| Fault { kind, error })
    }

    /// Borrow the wrapped error.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.error
    }

    /// Consume the fault and return the wrapped error.
    pub fn into_inner(self) -> BoxError {
        self.error
    }

    /// The fault raised when a step expected a previous result of type `T`.
    pub(crate) fn missing_input<T>(found: bool) -> Self {
        let reason = if found {
            format!(
                "previous result is not of type `{}`",
                type_name::<T>()
            )
        } else {
            format!("no previous result of type `{}`", type_name::<T>())
        };
        ContractError::InvalidState { reason }.into()
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("kind", &self.kind)
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}

impl<E> From<E> for Fault
where
    E: StdError + Classify + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let kind = Classify::kind(&error);
        Self::new(kind, error)
    }
}

// ============================================================================
// Contract Errors
// ============================================================================

/// Misuse of the API, reported where the offending call is made.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// An argument was not acceptable.
    #[error("Invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A name that was expected to denote an error category does not.
    #[error("`{name}` does not name an error category")]
    InvalidType {
        /// The rejected name.
        name: String,
    },

    /// The operation is not valid for the value's current state.
    #[error("Invalid state: {reason}")]
    InvalidState {
        /// Why the operation was rejected.
        reason: String,
    },
}

impl Classify for ContractError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } | Self::InvalidType { .. } => ErrorKind::Argument,
            Self::InvalidState { .. } => ErrorKind::InvalidOperation,
        }
    }
}
