//! Per-type singleton descriptors and the opt-in structure capability.
//!
//! A [`ReflectedType`] pairs a type's identity record with its structure
//! wrapper (and, for editable containers, its editor capability). Exactly
//! one instance exists per type for the process lifetime; the registry
//! creates it lazily on first request.
//!
//! [`Reflect`] is the capability trait types opt into. Every implementor
//! gets a working default (no children, static resolution); composite
//! types override `build_structure` with a
//! [`TypeBuilder`](crate::builder::TypeBuilder) recipe, and polymorphic
//! family roots override `reflected_type_of` — the only sanctioned
//! dynamic-dispatch point in the runtime. There is no common base type:
//! reflection never requires an inheritance root.

use std::collections::BTreeMap;
use std::sync::Arc;

use reflex_core::{TypeIdent, TypeKey, TypeMeta};

use crate::registry;
use crate::structure::{
    StructureEditorWrapper, StructureWrapper, StructureWrapperMap, StructureWrapperPtr,
    StructureWrapperVec, default_structure,
};

/// Per-type descriptor: identity record, permanent name, and the attached
/// strategy objects.
pub struct ReflectedType {
    meta: TypeMeta,
    permanent_name: String,
    structure: Arc<dyn StructureWrapper>,
    editor: Option<Arc<dyn StructureEditorWrapper>>,
}

impl ReflectedType {
    pub(crate) fn new(
        meta: TypeMeta,
        permanent_name: String,
        structure: Arc<dyn StructureWrapper>,
        editor: Option<Arc<dyn StructureEditorWrapper>>,
    ) -> Self {
        Self { meta, permanent_name, structure, editor }
    }

    /// Identity record of the described type.
    pub fn meta(&self) -> TypeMeta {
        self.meta
    }

    /// Identity key of the described type.
    pub fn key(&self) -> TypeKey {
        self.meta.key
    }

    /// Stable display name registered for this type.
    pub fn permanent_name(&self) -> &str {
        &self.permanent_name
    }

    /// The attached structure wrapper.
    pub fn structure(&self) -> &Arc<dyn StructureWrapper> {
        &self.structure
    }

    /// The attached editor capability, for editable containers only.
    pub fn editor(&self) -> Option<&Arc<dyn StructureEditorWrapper>> {
        self.editor.as_ref()
    }
}

impl std::fmt::Debug for ReflectedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectedType")
            .field("name", &self.permanent_name)
            .field("key", &self.meta.key)
            .finish()
    }
}

/// Opt-in structure capability.
///
/// The defaults describe a leaf: no children, no editor, static
/// resolution. Composite types override `build_structure`; polymorphic
/// family roots override `reflected_type_of` to consult their own
/// discriminant.
pub trait Reflect: TypeIdent + Sized {
    /// Stable display name for registries and dumps.
    fn permanent_name() -> &'static str {
        Self::type_name()
    }

    /// Build the structure wrapper attached to this type's descriptor.
    /// Called once, on first descriptor request.
    fn build_structure() -> Arc<dyn StructureWrapper> {
        default_structure()
    }

    /// Build the editor capability, for editable containers only.
    fn build_editor() -> Option<Arc<dyn StructureEditorWrapper>> {
        None
    }

    /// Resolve the descriptor that speaks for this particular instance.
    ///
    /// The default is static resolution. A polymorphic family root
    /// overrides this to return the descriptor of the instance's dynamic
    /// type, which lets two concrete subtypes sharing a declared pointer
    /// type report different field sets.
    fn reflected_type_of(&self) -> &'static ReflectedType {
        registry::get::<Self>()
    }
}

// === Leaf Implementations ===

macro_rules! impl_reflect_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {}
        )*
    };
}

impl_reflect_leaf! {
    (), bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, char, String,
}

// === Pointer Implementations ===

impl<P: Reflect> Reflect for *mut P {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        Arc::new(StructureWrapperPtr::<P>::new())
    }
}

impl<P: Reflect> Reflect for *const P {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        Arc::new(StructureWrapperPtr::<P>::new_const())
    }
}

// === Container Implementations ===

impl<T> Reflect for Vec<T>
where
    T: Reflect + Clone + Default,
{
    fn build_structure() -> Arc<dyn StructureWrapper> {
        // Elements resolve their own descriptors at drill time; make sure
        // one exists before the first query.
        registry::get::<T>();
        Arc::new(StructureWrapperVec::<T>::new())
    }

    fn build_editor() -> Option<Arc<dyn StructureEditorWrapper>> {
        Some(Arc::new(StructureWrapperVec::<T>::new()))
    }
}

impl<V> Reflect for BTreeMap<String, V>
where
    V: Reflect + Clone + Default,
{
    fn build_structure() -> Arc<dyn StructureWrapper> {
        registry::get::<V>();
        Arc::new(StructureWrapperMap::<V>::new())
    }

    fn build_editor() -> Option<Arc<dyn StructureEditorWrapper>> {
        Some(Arc::new(StructureWrapperMap::<V>::new()))
    }
}
