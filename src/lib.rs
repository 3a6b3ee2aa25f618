//! Shapework - structural narrowing and transformation toolkit
//!
//! A small, pure, synchronous library for working with values whose shape
//! matters more than their type: branding structurally identical values
//! apart, deriving narrowing predicates from a single source of truth,
//! reshaping mappings, and freezing value graphs against mutation.
//!
//! # Modules
//!
//! - [`brand`](mod@brand) - Nominal tags over raw values: [`Branded`] and
//!   the [`brand()`](fn@brand) / [`unbrand`] pair
//! - [`guard`] - Probe-driven narrowing predicates: [`Guard`], [`TryGuard`]
//! - [`transform`] - Pure shape transforms: [`filter_by_value`],
//!   [`merge_union`], [`pairs_to_map`], [`key_by_discriminant`]
//! - [`freeze`] - Deep, identity-preserving freezing: [`deep_freeze`]
//! - [`value`] - The dynamic value model the above share: [`Value`], [`Key`]
//!
//! # Design Principles
//!
//! - Every operation is pure and synchronous: immutable inputs in, fresh
//!   values (or read-only views) out, no shared state between calls
//! - Errors are explicit, synchronous, and never silently recovered; the
//!   only silent policies are the documented last-write-wins resolutions
//! - Narrowing evidence and narrowing predicates are never authored
//!   separately; the predicate is derived from the probe

pub mod brand;
pub mod freeze;
pub mod guard;
pub mod transform;
pub mod value;

pub use brand::{brand, unbrand, Branded};
pub use freeze::{deep_freeze, Frozen, FrozenMap, FrozenSeq, MutationRejected};
pub use guard::{Guard, TryGuard};
pub use transform::{
    filter_by_value, key_by, key_by_discriminant, key_by_discriminant_strict, merge_union,
    pairs_to_map, TransformError, Union,
};
pub use value::{Key, NativeFn, Value, ValueError};
