//! Reflection runtime: per-type descriptors, wrapper strategies, and the
//! view façade.
//!
//! This crate builds the introspection layer on top of `reflex-core`:
//!
//! - [`ReflectedType`] / [`registry`] — per-type singleton descriptors with
//!   lazy, guarded, idempotent registration
//! - [`Reflect`] — the opt-in structure capability (no common base type
//!   required)
//! - [`TypeBuilder`] — fluent field/method/base registration
//! - [`ValueWrapper`] family — direct-member and accessor slot strategies
//! - [`StructureWrapper`] family — record, pointer-indirection, sequence
//!   and map child enumeration, plus the separate
//!   [`StructureEditorWrapper`] capability for mutable containers
//! - [`Reflection`] — the transient view callers read, drill, and mutate
//!   through
//! - [`dump`] — the presentation-only tree printer
//!
//! Data flow: obtain a descriptor from the [`registry`], wrap a subject
//! into a [`Reflection`], and the view delegates field/method enumeration
//! to the descriptor's structure wrapper, which reads and writes members
//! through value wrappers, boxing values through `reflex_core::Value`.

pub mod builder;
pub mod dump;
pub mod registry;
pub mod reflection;
pub mod structure;
pub mod value_wrapper;

mod reflected_type;

pub use builder::TypeBuilder;
pub use dump::DumpOptions;
pub use reflected_type::{Reflect, ReflectedType};
pub use reflection::{Field, Method, Reflection};
pub use structure::{
    StructureEditorWrapper, StructureWrapper, StructureWrapperClass, StructureWrapperDefault,
    StructureWrapperMap, StructureWrapperPtr, StructureWrapperVec, default_structure,
};
pub use value_wrapper::{AccessorWrapper, FieldWrapper, SelfWrapper, ValueWrapper};
