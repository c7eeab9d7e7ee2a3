//! Shorthands for raising faults inside pipeline steps.
//!
//! - `fault!`: build a [`Fault`](crate::Fault) of a given kind from a format string
//! - `ensure!`: return that fault early unless a condition holds

/// Build a [`Fault`](crate::Fault) of the named [`ErrorKind`](crate::ErrorKind).
///
/// ```
/// use trywise::{fault, ErrorKind};
///
/// let fault = fault!(DivideByZero, "cannot divide {} by zero", 10);
/// assert_eq!(fault.kind(), ErrorKind::DivideByZero);
/// assert_eq!(fault.to_string(), "cannot divide 10 by zero");
/// ```
#[macro_export]
macro_rules! fault {
    ($kind:ident, $($arg:tt)+) => {
        $crate::Fault::new($crate::ErrorKind::$kind, ::std::format!($($arg)+))
    };
}

/// Return `Err(fault!(..))` from the enclosing function unless `cond` holds.
///
/// ```
/// use trywise::{ensure, ErrorKind, Fault, Try};
///
/// fn halve(x: i32) -> Result<i32, Fault> {
///     ensure!(x % 2 == 0, ArgumentOutOfRange, "{x} is odd");
///     Ok(x / 2)
/// }
///
/// let pipeline = Try::of(|| Ok(5)).then(halve);
/// assert_eq!(pipeline.execute().unwrap_err().kind(), ErrorKind::ArgumentOutOfRange);
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $kind:ident, $($arg:tt)+) => {
        if !$cond {
            return ::std::result::Result::Err($crate::fault!($kind, $($arg)+));
        }
    };
}
