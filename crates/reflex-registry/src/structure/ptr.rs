//! Pointer-indirection structure wrapper.
//!
//! Dereferences the stored pointer, resolves the pointee's descriptor —
//! dynamically when the pointee family opted into polymorphic resolution —
//! and delegates every query to it. Null pointers yield no children.

use std::marker::PhantomData;

use reflex_core::{BoundCallable, ReflectedObject, TypeIdent, Value, inheritance};

use crate::reflected_type::Reflect;
use crate::reflection::{Field, Method, Reflection};
use crate::structure::StructureWrapper;
use crate::value_wrapper::{SelfWrapper, ValueWrapper};

/// Structure wrapper for `*mut P` / `*const P` slots.
pub struct StructureWrapperPtr<P> {
    konst: bool,
    _marker: PhantomData<fn() -> P>,
}

impl<P> StructureWrapperPtr<P> {
    /// Wrapper for `*mut P` slots.
    pub fn new() -> Self {
        Self { konst: false, _marker: PhantomData }
    }

    /// Wrapper for `*const P` slots; drilled subjects are readonly.
    pub fn new_const() -> Self {
        Self { konst: true, _marker: PhantomData }
    }
}

impl<P> Default for StructureWrapperPtr<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> StructureWrapperPtr<P>
where
    P: Reflect,
{
    /// Resolve the pointee subject and its (possibly dynamic) descriptor.
    ///
    /// The drilled subject arrives in one of two shapes: a slot holding
    /// the pointer (direct members), or the pointee itself (accessors that
    /// already followed the pointer).
    fn pointee(
        &self,
        object: &ReflectedObject,
        vw: &dyn ValueWrapper,
    ) -> Option<(ReflectedObject, &'static crate::reflected_type::ReflectedType)> {
        let subject = vw.value_object(object)?;
        let meta = subject.type_meta();

        let ptr: *mut P = if meta.key == <*mut P>::type_key() {
            *unsafe { subject.deref::<*mut P>() }?
        } else if meta.key == <*const P>::type_key() {
            *unsafe { subject.deref::<*const P>() }? as *mut P
        } else if meta.key == P::type_key() {
            subject.as_ptr() as *mut P
        } else {
            return None;
        };
        if ptr.is_null() {
            return None;
        }

        // The only sanctioned dynamic-dispatch point: the instance decides
        // which descriptor speaks for it.
        let rtype = unsafe { &*ptr }.reflected_type_of();

        let mut addr = ptr as *mut u8;
        if rtype.meta().key != P::type_key() {
            // The dynamic type is a subtype; shift down to its subject.
            let offset = inheritance::downcast_offset(P::type_key(), rtype.meta().key)?;
            addr = addr.wrapping_offset(offset);
        }

        let readonly = self.konst || meta.is_const() || subject.is_readonly();
        let pointee =
            unsafe { ReflectedObject::from_raw(addr, rtype.meta(), readonly) };
        Some((pointee, rtype))
    }
}

impl<P> StructureWrapper for StructureWrapperPtr<P>
where
    P: Reflect,
{
    fn has_fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> bool {
        match self.pointee(object, vw) {
            Some((pointee, rtype)) => {
                let identity = SelfWrapper::untyped(pointee.type_meta());
                rtype.structure().has_fields(&pointee, &identity)
            }
            None => false,
        }
    }

    fn field(&self, object: &ReflectedObject, vw: &dyn ValueWrapper, key: &Value) -> Reflection {
        match self.pointee(object, vw) {
            Some((pointee, rtype)) => {
                let identity = SelfWrapper::untyped(pointee.type_meta());
                rtype.structure().field(&pointee, &identity, key)
            }
            None => Reflection::invalid(),
        }
    }

    fn fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> Vec<Field> {
        match self.pointee(object, vw) {
            Some((pointee, rtype)) => {
                let identity = SelfWrapper::untyped(pointee.type_meta());
                rtype.structure().fields(&pointee, &identity)
            }
            None => Vec::new(),
        }
    }

    fn has_methods(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> bool {
        match self.pointee(object, vw) {
            Some((pointee, rtype)) => {
                let identity = SelfWrapper::untyped(pointee.type_meta());
                rtype.structure().has_methods(&pointee, &identity)
            }
            None => false,
        }
    }

    fn method(
        &self,
        object: &ReflectedObject,
        vw: &dyn ValueWrapper,
        name: &str,
    ) -> Option<BoundCallable> {
        let (pointee, rtype) = self.pointee(object, vw)?;
        let identity = SelfWrapper::untyped(pointee.type_meta());
        rtype.structure().method(&pointee, &identity, name)
    }

    fn methods(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> Vec<Method> {
        match self.pointee(object, vw) {
            Some((pointee, rtype)) => {
                let identity = SelfWrapper::untyped(pointee.type_meta());
                rtype.structure().methods(&pointee, &identity)
            }
            None => Vec::new(),
        }
    }
}
