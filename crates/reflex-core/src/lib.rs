//! Core value layer of the reflection runtime.
//!
//! This crate provides the leaves the reflection runtime is built from:
//!
//! - [`TypeKey`] / [`TypeMeta`] / [`TypeIdent`] — deterministic type identity
//! - [`Value`] — type-erased, clonable value container with inline storage
//! - [`convert`] — the global directed value-conversion table
//! - [`inheritance`] — the pointer-cast oracle over embedding offsets
//! - [`Callable`] / [`BoundCallable`] — type-erased method descriptors
//! - [`ReflectedObject`] — non-owning erased subject handles
//! - [`ReflectError`] — the unified failure taxonomy
//!
//! Registration (conversions, value ops, inheritance edges) mutates
//! process-wide tables behind locks; queries after the registration phase
//! take read locks only.

pub mod convert;
pub mod error;
pub mod func;
pub mod inheritance;
pub mod object;
pub mod type_key;
pub mod value;

mod storage;

pub use error::{ReflectError, ReflectResult};
pub use func::{BoundCallable, Callable};
pub use object::ReflectedObject;
pub use storage::INLINE_CAPACITY;
pub use type_key::{TypeIdent, TypeKey, TypeMeta, TypeTraits};
pub use value::{Value, register_incomparable, register_ops};
