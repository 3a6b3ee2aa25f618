//! guard
//!
//! Probe-driven narrowing predicates.
//!
//! The failure mode this module exists to prevent: a hand-written boolean
//! check (`x.kind == "circle"`) and the narrowing it is taken to justify
//! drift apart, so the check passes for values the narrowed code cannot
//! actually handle. A [`Guard`] derives its predicate from a single *probe*
//! function, so the truth value and the narrowing evidence always come from
//! the same place.
//!
//! A probe answers "does this candidate belong to the narrower shape?" by
//! returning `Some(narrowed)` or `None`. `None` is the distinguished absent
//! sentinel and is compared by variant, never by truthiness: a probe that
//! legitimately narrows to `0` or `""` returns `Some(0)` / `Some("")` and
//! the guard reports a match.
//!
//! Guards hold no state and never memoize; every call re-invokes the probe.
//!
//! # Example
//!
//! ```
//! use shapework::Guard;
//!
//! #[derive(Debug, PartialEq)]
//! enum Shape {
//!     Circle { radius: f64 },
//!     Rect { w: f64, h: f64 },
//! }
//!
//! let is_circle = Guard::from_probe(|s: &Shape| match s {
//!     Shape::Circle { radius } => Some(*radius),
//!     _ => None,
//! });
//!
//! let c = Shape::Circle { radius: 2.0 };
//! let r = Shape::Rect { w: 1.0, h: 3.0 };
//!
//! assert!(is_circle.check(&c));
//! assert!(!is_circle.check(&r));
//! assert_eq!(is_circle.narrow(&c), Some(2.0));
//! ```

use std::marker::PhantomData;

/// A narrowing predicate derived from an infallible probe.
///
/// `T` is the wide candidate type (the variant set), `U` the narrowed
/// value the probe produces on a match.
pub struct Guard<T: ?Sized, U, P> {
    probe: P,
    _types: PhantomData<fn(&T) -> Option<U>>,
}

impl<T: ?Sized, U, P> Guard<T, U, P>
where
    P: Fn(&T) -> Option<U>,
{
    /// Build a guard from a probe.
    ///
    /// The probe is the single source of truth: [`Guard::check`] is defined
    /// as "the probe found a match," nothing more.
    pub fn from_probe(probe: P) -> Self {
        Self {
            probe,
            _types: PhantomData,
        }
    }

    /// Whether the candidate belongs to the narrower shape.
    ///
    /// Equivalent to `self.narrow(candidate).is_some()`.
    pub fn check(&self, candidate: &T) -> bool {
        (self.probe)(candidate).is_some()
    }

    /// Run the probe and return the narrowed value, if any.
    pub fn narrow(&self, candidate: &T) -> Option<U> {
        (self.probe)(candidate)
    }
}

impl<T, U, P> Guard<T, U, P>
where
    P: Fn(&T) -> Option<U>,
{
    /// Consume the guard, yielding a plain closure predicate.
    ///
    /// Useful when an API wants an `Fn(&T) -> bool` rather than a guard.
    pub fn into_predicate(self) -> impl Fn(&T) -> bool {
        move |candidate: &T| (self.probe)(candidate).is_some()
    }
}

/// A narrowing predicate derived from a fallible probe.
///
/// The probe may fail on malformed input; failures propagate to the caller
/// untouched. The guard never catches, wraps, or reclassifies the probe's
/// error type.
pub struct TryGuard<T: ?Sized, U, E, P> {
    probe: P,
    _types: PhantomData<fn(&T) -> Result<Option<U>, E>>,
}

impl<T: ?Sized, U, E, P> TryGuard<T, U, E, P>
where
    P: Fn(&T) -> Result<Option<U>, E>,
{
    /// Build a guard from a fallible probe.
    pub fn from_probe(probe: P) -> Self {
        Self {
            probe,
            _types: PhantomData,
        }
    }

    /// Whether the candidate belongs to the narrower shape.
    ///
    /// # Errors
    ///
    /// Returns the probe's own error if the probe fails.
    pub fn check(&self, candidate: &T) -> Result<bool, E> {
        Ok((self.probe)(candidate)?.is_some())
    }

    /// Run the probe, returning the narrowed value or the probe's error.
    pub fn narrow(&self, candidate: &T) -> Result<Option<U>, E> {
        (self.probe)(candidate)
    }
}
