//! Type-erased optional values.
//!
//! [`DynMaybe`] is the runtime-polymorphic sibling of [`Maybe<T>`]: it
//! records the nominal element type as a [`TypeTag`] and holds its value, if
//! any, behind [`ErasedValue`]. It is meant for heterogeneous collections of
//! optional values and compares equal to a `Maybe<T>` of the same type and
//! value.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::fault::ContractError;
use crate::maybe::Maybe;

/// Strip module paths from a type name: `alloc::vec::Vec<alloc::string::String>`
/// becomes `Vec<String>`.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    shorten(type_name::<T>())
}

fn shorten(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    for (i, ch) in full.char_indices() {
        if !(ch.is_alphanumeric() || ch == '_' || ch == ':') {
            push_last_segment(&mut out, &full[segment_start..i]);
            out.push(ch);
            segment_start = i + ch.len_utf8();
        }
    }
    push_last_segment(&mut out, &full[segment_start..]);
    out
}

fn push_last_segment(out: &mut String, path: &str) {
    out.push_str(path.rsplit("::").next().unwrap_or(path));
}

// ============================================================================
// Type Tags
// ============================================================================

/// Runtime identity of an element type.
///
/// Tags compare and hash by [`TypeId`] only.
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// The tag of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without module paths.
    pub fn short_name(&self) -> String {
        shorten(self.name)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

// ============================================================================
// Erased Values
// ============================================================================

/// A value whose equality, hashing and formatting survive type erasure.
///
/// Implemented for every `'static` type that is `PartialEq + Hash + Debug +
/// Send + Sync`, including `()` and collections.
pub trait ErasedValue: Any + Send + Sync + fmt::Debug {
    /// Upcast to [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Equality against another erased value; values of different types are
    /// never equal.
    fn eq_erased(&self, other: &dyn ErasedValue) -> bool;

    /// Feed this value into `state` exactly as `Hash` would.
    fn hash_erased(&self, state: &mut dyn Hasher);
}

impl<T> ErasedValue for T
where
    T: Any + Send + Sync + PartialEq + Hash + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn ErasedValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn hash_erased(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

// ============================================================================
// DynMaybe
// ============================================================================

/// A type-erased optional value tagged with its element type.
#[derive(Clone)]
pub struct DynMaybe {
    tag: TypeTag,
    value: Option<Arc<dyn ErasedValue>>,
}

impl DynMaybe {
    /// An empty value of the tagged type.
    pub fn nothing(tag: TypeTag) -> Self {
        Self { tag, value: None }
    }

    /// A value of the tagged type.
    ///
    /// Fails with [`ContractError::InvalidArgument`] if `value` is not of the
    /// tagged type.
    pub fn from_value<V: ErasedValue>(tag: TypeTag, value: V) -> Result<Self, ContractError> {
        Self::from_shared(tag, Arc::new(value))
    }

    /// Like [`from_value`](Self::from_value), for an already erased value.
    pub fn from_shared(
        tag: TypeTag,
        value: Arc<dyn ErasedValue>,
    ) -> Result<Self, ContractError> {
        let actual = Any::type_id(value.as_any());
        if actual != tag.id {
            return Err(ContractError::InvalidArgument {
                parameter: "value",
                reason: format!(
                    "a DynMaybe of type `{}` cannot hold a value of type `{:?}`",
                    tag.name, value
                ),
            });
        }
        Ok(Self {
            tag,
            value: Some(value),
        })
    }

    /// Returns `true` if a value is present.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// The element type this value was declared with.
    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    /// Borrow the contained value.
    ///
    /// Fails with [`ContractError::InvalidState`] when empty.
    pub fn value(&self) -> Result<&dyn ErasedValue, ContractError> {
        self.value
            .as_deref()
            .ok_or_else(|| ContractError::InvalidState {
                reason: format!("cannot read the value of a `Nothing<{}>`", self.tag),
            })
    }

    /// Recover the typed form.
    ///
    /// Fails with [`ContractError::InvalidArgument`] if `T` is not the tagged
    /// type.
    pub fn downcast<T: Clone + 'static>(&self) -> Result<Maybe<T>, ContractError> {
        if self.tag != TypeTag::of::<T>() {
            return Err(ContractError::InvalidArgument {
                parameter: "T",
                reason: format!(
                    "a DynMaybe of type `{}` is not a Maybe<{}>",
                    self.tag.name,
                    type_name::<T>()
                ),
            });
        }
        Ok(Maybe::from_option(self.value.as_deref().and_then(|value| {
            value.as_any().downcast_ref::<T>().cloned()
        })))
    }
}

impl<T: ErasedValue> From<Maybe<T>> for DynMaybe {
    fn from(maybe: Maybe<T>) -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            value: maybe
                .into_option()
                .map(|value| Arc::new(value) as Arc<dyn ErasedValue>),
        }
    }
}

impl PartialEq for DynMaybe {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && match (&self.value, &other.value) {
                (Some(a), Some(b)) => a.eq_erased(&**b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Eq for DynMaybe {}

impl Hash for DynMaybe {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.value {
            Some(value) => value.hash_erased(state),
            None => self.tag.id.hash(state),
        }
    }
}

impl<T> PartialEq<DynMaybe> for Maybe<T>
where
    T: PartialEq + 'static,
{
    fn eq(&self, other: &DynMaybe) -> bool {
        other.tag == TypeTag::of::<T>()
            && match (self.as_option(), &other.value) {
                (Some(a), Some(b)) => b.as_any().downcast_ref::<T>() == Some(a),
                (None, None) => true,
                _ => false,
            }
    }
}

impl<T> PartialEq<Maybe<T>> for DynMaybe
where
    T: PartialEq + 'static,
{
    fn eq(&self, other: &Maybe<T>) -> bool {
        other == self
    }
}

impl fmt::Debug for DynMaybe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => f.debug_tuple("DynMaybe").field(value).finish(),
            None => write!(f, "DynMaybe(Nothing<{}>)", self.tag),
        }
    }
}

/// A held value renders through its `Debug` form; an empty one as
/// `Nothing<T>`.
impl fmt::Display for DynMaybe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => fmt::Debug::fmt(value, f),
            None => write!(f, "Nothing<{}>", self.tag),
        }
    }
}
