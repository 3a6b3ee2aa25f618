//! brand
//!
//! Nominal typing over structurally identical values.
//!
//! Two values of the same underlying type often mean different things: a
//! customer id and an invoice id may both be `u64`, but handing one to a
//! function expecting the other is a bug the shape of the value cannot
//! catch. [`Branded`] attaches a zero-sized nominal tag to a raw value so
//! the two become distinct Rust types with no conversion path between them.
//!
//! The entire contract of this module is the *absence* of implicit
//! conversion: a `Branded<T, Tag>` is only produced by [`brand`] and only
//! gives its raw value back through [`unbrand`] (or [`Branded::raw`] for
//! borrowed access). The tag is erased at runtime; it costs nothing.
//!
//! # Example
//!
//! ```
//! use shapework::{brand, unbrand, Branded};
//!
//! enum CustomerId {}
//! enum InvoiceId {}
//!
//! let customer: Branded<u64, CustomerId> = brand(7);
//! let _invoice: Branded<u64, InvoiceId> = brand(7);
//!
//! // Same raw value, but `customer` and `_invoice` are distinct types;
//! // passing one where the other is expected fails to compile.
//! assert_eq!(unbrand(customer), 7);
//! ```

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A raw value carrying a nominal tag.
///
/// The tag is any type, typically an uninhabited enum used purely as a
/// marker. It is stored as `PhantomData` and never needs to implement
/// anything; all trait impls on `Branded` bound only the raw type.
pub struct Branded<T, Tag> {
    raw: T,
    _tag: PhantomData<fn() -> Tag>,
}

impl<T, Tag> Branded<T, Tag> {
    /// Wrap a raw value under this brand's tag.
    pub fn brand(raw: T) -> Self {
        Self {
            raw,
            _tag: PhantomData,
        }
    }

    /// Consume the brand and return the raw value.
    pub fn into_raw(self) -> T {
        self.raw
    }

    /// Borrow the raw value without removing the brand.
    pub fn raw(&self) -> &T {
        &self.raw
    }
}

/// Wrap a raw value under the tag chosen by the type parameter.
///
/// Free-function spelling of [`Branded::brand`]; the tag is usually
/// supplied by an annotation on the binding.
pub fn brand<T, Tag>(value: T) -> Branded<T, Tag> {
    Branded::brand(value)
}

/// Unwrap a branded value, returning the raw value.
pub fn unbrand<T, Tag>(branded: Branded<T, Tag>) -> T {
    branded.into_raw()
}

// Trait impls are written by hand so the tag type never picks up bounds.

impl<T: std::fmt::Debug, Tag> std::fmt::Debug for Branded<T, Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Branded").field(&self.raw).finish()
    }
}

impl<T: Clone, Tag> Clone for Branded<T, Tag> {
    fn clone(&self) -> Self {
        Self::brand(self.raw.clone())
    }
}

impl<T: Copy, Tag> Copy for Branded<T, Tag> {}

impl<T: PartialEq, Tag> PartialEq for Branded<T, Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: Eq, Tag> Eq for Branded<T, Tag> {}

impl<T: PartialOrd, Tag> PartialOrd for Branded<T, Tag> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.raw.partial_cmp(&other.raw)
    }
}

impl<T: Ord, Tag> Ord for Branded<T, Tag> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T: Hash, Tag> Hash for Branded<T, Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: Serialize, Tag> Serialize for Branded<T, Tag> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, Tag> Deserialize<'de> for Branded<T, Tag> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::brand)
    }
}
