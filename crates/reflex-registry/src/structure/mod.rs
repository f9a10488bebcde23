//! Structure-wrapper strategies: enumerate the children of a composite
//! subject.
//!
//! A [`StructureWrapper`] turns "enumerate the children of this value" into
//! uniform calls regardless of whether the underlying value is a plain
//! record, a pointer indirection, or an ordered/associative container.
//! Instances are stateless and shared; all per-call state arrives as
//! arguments (subject + the value wrapper that drilled to it).
//!
//! The separate [`StructureEditorWrapper`] capability covers mutation of
//! editable containers only — read-only composite types are never asked to
//! implement it.

pub(crate) mod class;
mod containers;
mod ptr;

pub use class::StructureWrapperClass;
pub use containers::{StructureWrapperMap, StructureWrapperVec};
pub use ptr::StructureWrapperPtr;

use std::sync::{Arc, LazyLock};

use reflex_core::{BoundCallable, ReflectResult, ReflectedObject, Value};

use crate::reflection::{Field, Method, Reflection};
use crate::value_wrapper::ValueWrapper;

/// Strategy for enumerating the children (fields/methods) of a composite
/// subject.
///
/// Every query receives the parent subject and the [`ValueWrapper`] that
/// addresses it; implementations drill through the wrapper before touching
/// the subject. All defaults model "no children".
pub trait StructureWrapper: Send + Sync {
    /// Whether the subject exposes any fields.
    fn has_fields(&self, _object: &ReflectedObject, _vw: &dyn ValueWrapper) -> bool {
        false
    }

    /// Point lookup of one field; an unknown key yields an invalid view.
    fn field(&self, _object: &ReflectedObject, _vw: &dyn ValueWrapper, _key: &Value) -> Reflection {
        Reflection::invalid()
    }

    /// All fields in the subject's natural order.
    fn fields(&self, _object: &ReflectedObject, _vw: &dyn ValueWrapper) -> Vec<Field> {
        Vec::new()
    }

    /// Whether the subject exposes any methods.
    fn has_methods(&self, _object: &ReflectedObject, _vw: &dyn ValueWrapper) -> bool {
        false
    }

    /// Point lookup of one method, bound to the subject.
    fn method(
        &self,
        _object: &ReflectedObject,
        _vw: &dyn ValueWrapper,
        _name: &str,
    ) -> Option<BoundCallable> {
        None
    }

    /// All methods, bound to the subject.
    fn methods(&self, _object: &ReflectedObject, _vw: &dyn ValueWrapper) -> Vec<Method> {
        Vec::new()
    }
}

/// The default no-children strategy: scalars, opaque blobs, and every type
/// with no richer wrapper registered.
pub struct StructureWrapperDefault;

impl StructureWrapper for StructureWrapperDefault {}

static DEFAULT_STRUCTURE: LazyLock<Arc<dyn StructureWrapper>> =
    LazyLock::new(|| Arc::new(StructureWrapperDefault));

/// The process-wide shared no-children wrapper.
///
/// Views fall back to this when neither an explicit override nor a type
/// wrapper is present, so no query ever dereferences a missing strategy.
pub fn default_structure() -> Arc<dyn StructureWrapper> {
    DEFAULT_STRUCTURE.clone()
}

/// Mutation capability for editable composite subjects.
///
/// Strictly separate from [`StructureWrapper`]: only mutable containers
/// implement it, and a type descriptor without one simply has no editor.
pub trait StructureEditorWrapper: Send + Sync {
    /// Whether entries can be appended.
    fn can_add(&self) -> bool {
        false
    }

    /// Whether entries can be inserted at a position.
    fn can_insert(&self) -> bool {
        false
    }

    /// Whether entries can be removed.
    fn can_remove(&self) -> bool {
        false
    }

    /// Whether a default-initialized entry value can be produced.
    fn can_create_value(&self) -> bool {
        false
    }

    /// Produce a default-initialized entry value.
    fn create_value(&self) -> Value {
        Value::empty()
    }

    /// Append an entry. Sequence containers ignore the key.
    fn add_field(&self, object: &ReflectedObject, key: &Value, value: Value) -> ReflectResult<()>;

    /// Insert an entry before the given position.
    fn insert_field(
        &self,
        object: &ReflectedObject,
        before: &Value,
        value: Value,
    ) -> ReflectResult<()>;

    /// Remove the entry at the given key.
    fn remove_field(&self, object: &ReflectedObject, key: &Value) -> ReflectResult<()>;
}
