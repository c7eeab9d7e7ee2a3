//! Optional values.
//!
//! [`Maybe<T>`] holds zero or one `T`. It is the terminal result of every
//! pipeline and offers monadic bind ([`Maybe::map`]) plus fallback extraction
//! ([`Maybe::or_else`] and friends).

use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::async_maybe::AsyncMaybe;
use crate::dyn_maybe::short_type_name;
use crate::fault::ContractError;

/// An immutable container holding zero or one value of type `T`.
///
/// Two `Maybe`s are equal when both are empty or both hold equal values.
/// An empty `Maybe<T>` hashes by its type, a holding one hashes exactly like
/// the value it holds.
///
/// An empty value formats as `Nothing<T>` with the short type name, through
/// `Debug` for any `T` and through `Display` when `T: Display`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Maybe<T> {
    value: Option<T>,
}

impl<T> Maybe<T> {
    /// Create a `Maybe` holding `value`.
    pub const fn from_value(value: T) -> Self {
        Self { value: Some(value) }
    }

    /// Create an empty `Maybe`.
    pub const fn nothing() -> Self {
        Self { value: None }
    }

    /// Create a `Maybe` from an `Option`; `None` becomes [`Maybe::nothing`].
    pub fn from_option(value: Option<T>) -> Self {
        Self { value }
    }

    /// Returns `true` if a value is present.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Borrow the contained value.
    ///
    /// Fails with [`ContractError::InvalidState`] on an empty `Maybe`.
    pub fn value(&self) -> Result<&T, ContractError> {
        self.value.as_ref().ok_or_else(Self::empty_read)
    }

    /// Take the contained value.
    ///
    /// Fails with [`ContractError::InvalidState`] on an empty `Maybe`.
    pub fn into_value(self) -> Result<T, ContractError> {
        self.value.ok_or_else(Self::empty_read)
    }

    /// Convert into a plain `Option`.
    pub fn into_option(self) -> Option<T> {
        self.value
    }

    /// Borrow as an `Option`.
    pub fn as_option(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Apply `binder` to the contained value, or stay empty.
    ///
    /// `binder` returns a `Maybe` itself and is never invoked on an empty
    /// value.
    pub fn map<U, F>(self, binder: F) -> Maybe<U>
    where
        F: FnOnce(T) -> Maybe<U>,
    {
        match self.value {
            Some(value) => binder(value),
            None => Maybe::nothing(),
        }
    }

    /// Asynchronous [`map`](Self::map).
    ///
    /// The returned [`AsyncMaybe`] resolves once `binder`'s future does.
    pub fn map_async<U, F, Fut>(self, binder: F) -> AsyncMaybe<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Maybe<U>> + Send + 'static,
    {
        match self.value {
            Some(value) => AsyncMaybe::new(binder(value)),
            None => AsyncMaybe::nothing(),
        }
    }

    /// The contained value, or `alternative`.
    pub fn or_else(self, alternative: T) -> T {
        self.value.unwrap_or(alternative)
    }

    /// The contained value, or the result of `alternative_factory`.
    pub fn or_else_with<F>(self, alternative_factory: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.value.unwrap_or_else(alternative_factory)
    }

    /// The contained value, or the awaited result of `alternative_factory`.
    pub async fn or_else_async<F, Fut>(self, alternative_factory: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.value {
            Some(value) => value,
            None => alternative_factory().await,
        }
    }

    /// The contained value, or `T::default()`.
    pub fn value_or_default(self) -> T
    where
        T: Default,
    {
        self.value.unwrap_or_default()
    }

    fn empty_read() -> ContractError {
        ContractError::InvalidState {
            reason: format!(
                "cannot read the value of a `Nothing<{}>`",
                short_type_name::<T>()
            ),
        }
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Self::nothing()
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        Self::from_option(value)
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(maybe: Maybe<T>) -> Self {
        maybe.value
    }
}

impl<T: Hash + 'static> Hash for Maybe<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.value {
            Some(value) => value.hash(state),
            None => TypeId::of::<T>().hash(state),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Maybe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => f.debug_tuple("Maybe").field(value).finish(),
            None => write!(f, "Nothing<{}>", short_type_name::<T>()),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Maybe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => fmt::Display::fmt(value, f),
            None => write!(f, "Nothing<{}>", short_type_name::<T>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn hash_of<H: Hash>(value: &H) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn holding_value_hashes_like_value() {
        assert_eq!(hash_of(&Maybe::from_value(123)), hash_of(&123));
    }

    #[test]
    fn empty_values_hash_by_type() {
        assert_eq!(
            hash_of(&Maybe::<i32>::nothing()),
            hash_of(&Maybe::<i32>::nothing())
        );
        assert_ne!(
            hash_of(&Maybe::<i32>::nothing()),
            hash_of(&Maybe::<u8>::nothing())
        );
    }

    #[test]
    fn display_names_empty_type() {
        assert_eq!(Maybe::from_value(7).to_string(), "7");
        assert_eq!(Maybe::<String>::nothing().to_string(), "Nothing<String>");
        assert_eq!(Maybe::<f64>::nothing().to_string(), "Nothing<f64>");
    }

    #[test]
    fn debug_names_empty_type_without_display() {
        assert_eq!(format!("{:?}", Maybe::<Vec<i32>>::nothing()), "Nothing<Vec<i32>>");
        assert_eq!(format!("{:?}", Maybe::<()>::nothing()), "Nothing<()>");
        assert_eq!(format!("{:?}", Maybe::from_value(vec![1, 2])), "Maybe([1, 2])");
        assert_eq!(format!("{:?}", Maybe::from_value(())), "Maybe(())");
    }

    #[test]
    fn reading_empty_value_is_invalid_state() {
        let err = Maybe::<i32>::nothing().value().unwrap_err();
        assert!(matches!(err, ContractError::InvalidState { .. }));
        assert_eq!(Maybe::from_value(5).into_value(), Ok(5));
    }

    #[test]
    fn serializes_as_option() {
        let json = serde_json::to_string(&Maybe::from_value(5)).expect("serialize");
        assert_eq!(json, "5");
        let json = serde_json::to_string(&Maybe::<i32>::nothing()).expect("serialize");
        assert_eq!(json, "null");

        let back: Maybe<i32> = serde_json::from_str("null").expect("deserialize");
        assert_eq!(back, Maybe::nothing());
    }
}
