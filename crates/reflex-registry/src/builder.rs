//! Fluent structure registration for composite types.
//!
//! A [`TypeBuilder`] assembles the class structure wrapper a type attaches
//! inside its [`Reflect::build_structure`](crate::Reflect::build_structure)
//! implementation:
//!
//! ```
//! use reflex_core::{TypeIdent, TypeKey};
//! use reflex_registry::{Reflect, TypeBuilder};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Default)]
//! struct Body {
//!     mass: f32,
//!     tag: String,
//! }
//!
//! impl TypeIdent for Body {
//!     fn type_key() -> TypeKey {
//!         TypeKey::from_name("Body")
//!     }
//!     fn type_name() -> &'static str {
//!         "Body"
//!     }
//! }
//!
//! impl Reflect for Body {
//!     fn build_structure() -> Arc<dyn reflex_registry::StructureWrapper> {
//!         TypeBuilder::<Body>::new()
//!             .field("mass", |b: &mut Body| &mut b.mass)
//!             .field("tag", |b: &mut Body| &mut b.tag)
//!             .build()
//!     }
//! }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use reflex_core::{Callable, TypeIdent, TypeMeta, inheritance};

use crate::registry;
use crate::reflected_type::Reflect;
use crate::structure::{StructureWrapper, StructureWrapperClass};
use crate::structure::class::{BaseLink, FieldEntry, MethodEntry};
use crate::value_wrapper::{AccessorWrapper, FieldWrapper};

/// Builder for a composite type's class structure wrapper.
pub struct TypeBuilder<C> {
    fields: Vec<FieldEntry>,
    methods: Vec<MethodEntry>,
    bases: Vec<BaseLink>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: TypeIdent> TypeBuilder<C> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            methods: Vec::new(),
            bases: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declare a mutable direct member.
    ///
    /// The field type's descriptor is registered eagerly so drilling never
    /// meets an unknown child type.
    pub fn field<T, F>(mut self, name: &str, projection: F) -> Self
    where
        T: Reflect + Clone,
        F: for<'a> Fn(&'a mut C) -> &'a mut T + Send + Sync + Clone + 'static,
    {
        registry::get::<T>();
        self.fields.push(FieldEntry {
            name: name.to_string(),
            wrapper: Arc::new(FieldWrapper::member::<C, T, F>(projection)),
        });
        self
    }

    /// Declare a read-only direct member; writes fail with `BadOperation`.
    pub fn field_ro<T, F>(mut self, name: &str, projection: F) -> Self
    where
        T: Reflect + Clone,
        F: for<'a> Fn(&'a C) -> &'a T + Send + Sync + Clone + 'static,
    {
        registry::get::<T>();
        self.fields.push(FieldEntry {
            name: name.to_string(),
            wrapper: Arc::new(FieldWrapper::member_ro::<C, T, F>(projection)),
        });
        self
    }

    /// Declare a get-only computed property. Not drillable.
    pub fn field_getter<T, G>(mut self, name: &str, get: G) -> Self
    where
        T: Reflect + Clone,
        G: Fn(&C) -> T + Send + Sync + 'static,
    {
        registry::get::<T>();
        self.fields.push(FieldEntry {
            name: name.to_string(),
            wrapper: Arc::new(AccessorWrapper::getter::<C, T, G>(get)),
        });
        self
    }

    /// Declare a computed property with distinct get and set shapes.
    pub fn field_accessor<T, S, G, F>(mut self, name: &str, get: G, set: F) -> Self
    where
        T: Reflect + Clone,
        S: Reflect + Clone,
        G: Fn(&C) -> T + Send + Sync + 'static,
        F: Fn(&mut C, S) + Send + Sync + 'static,
    {
        registry::get::<T>();
        self.fields.push(FieldEntry {
            name: name.to_string(),
            wrapper: Arc::new(
                AccessorWrapper::getter::<C, T, G>(get).with_setter::<C, S, F>(set),
            ),
        });
        self
    }

    /// Declare a pointer-returning accessor; the produced field drills into
    /// the returned address.
    pub fn field_ptr<P, G>(mut self, name: &str, get: G) -> Self
    where
        P: Reflect,
        G: Fn(&C) -> *mut P + Send + Sync + Clone + 'static,
    {
        registry::get::<*mut P>();
        self.fields.push(FieldEntry {
            name: name.to_string(),
            wrapper: Arc::new(AccessorWrapper::pointer_getter::<C, P, G>(get)),
        });
        self
    }

    /// Declare a nullary method.
    pub fn method0<R, F>(mut self, name: &str, f: F) -> Self
    where
        R: TypeIdent + Clone,
        F: Fn(&mut C) -> R + Send + Sync + 'static,
    {
        self.methods.push(MethodEntry {
            name: name.to_string(),
            callable: Callable::from_method0(f),
        });
        self
    }

    /// Declare a unary method.
    pub fn method1<R, A1, F>(mut self, name: &str, f: F) -> Self
    where
        R: TypeIdent + Clone,
        A1: TypeIdent + Clone,
        F: Fn(&mut C, A1) -> R + Send + Sync + 'static,
    {
        self.methods.push(MethodEntry {
            name: name.to_string(),
            callable: Callable::from_method1(f),
        });
        self
    }

    /// Declare a binary method.
    pub fn method2<R, A1, A2, F>(mut self, name: &str, f: F) -> Self
    where
        R: TypeIdent + Clone,
        A1: TypeIdent + Clone,
        A2: TypeIdent + Clone,
        F: Fn(&mut C, A1, A2) -> R + Send + Sync + 'static,
    {
        self.methods.push(MethodEntry {
            name: name.to_string(),
            callable: Callable::from_method2(f),
        });
        self
    }

    /// Declare a base embedded at the given byte offset
    /// (`core::mem::offset_of!`).
    ///
    /// Records the cast-oracle edge, ensures the base descriptor exists,
    /// and links the base into this wrapper so base members appear in
    /// field/method enumeration.
    pub fn base<B: Reflect>(mut self, offset: usize) -> Self {
        inheritance::register_edge(C::type_key(), B::type_key(), offset as isize);
        registry::get::<B>();
        self.bases.push(BaseLink {
            meta: TypeMeta::of::<B>(),
            offset: offset as isize,
        });
        self
    }

    /// Finish into the shared class wrapper.
    pub fn build(self) -> Arc<dyn StructureWrapper> {
        Arc::new(StructureWrapperClass {
            fields: self.fields,
            methods: self.methods,
            bases: self.bases,
        })
    }
}

impl<C: TypeIdent> Default for TypeBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
