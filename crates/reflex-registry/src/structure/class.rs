//! Class structure wrapper: declared fields, methods, and base links.
//!
//! Built once per registered composite type by the
//! [`TypeBuilder`](crate::builder::TypeBuilder). Field lookup falls back to
//! base classes; enumeration lists base members first, then the type's own,
//! matching declaration order within each level.

use std::sync::Arc;

use reflex_core::{BoundCallable, Callable, ReflectedObject, TypeMeta, Value};

use crate::registry;
use crate::reflection::{Field, Method, Reflection};
use crate::structure::StructureWrapper;
use crate::value_wrapper::{SelfWrapper, ValueWrapper};

pub(crate) struct FieldEntry {
    pub(crate) name: String,
    pub(crate) wrapper: Arc<dyn ValueWrapper>,
}

pub(crate) struct MethodEntry {
    pub(crate) name: String,
    pub(crate) callable: Callable,
}

/// One direct base link: the base's identity plus the embedding offset.
pub(crate) struct BaseLink {
    pub(crate) meta: TypeMeta,
    pub(crate) offset: isize,
}

/// Structure wrapper for declared composite types.
pub struct StructureWrapperClass {
    pub(crate) fields: Vec<FieldEntry>,
    pub(crate) methods: Vec<MethodEntry>,
    pub(crate) bases: Vec<BaseLink>,
}

impl StructureWrapperClass {
    /// Visit each base's structure wrapper with the base-shifted subject.
    ///
    /// Returns the first `Some` the visitor produces.
    fn with_bases<R>(
        &self,
        subject: &ReflectedObject,
        mut visit: impl FnMut(&ReflectedObject, &dyn ValueWrapper, &dyn StructureWrapper) -> Option<R>,
    ) -> Option<R> {
        for base in &self.bases {
            let Some(rtype) = registry::get_by_key(base.meta.key) else {
                continue;
            };
            let base_object = subject.with_offset(base.offset, base.meta);
            let identity = SelfWrapper::untyped(base.meta);
            if let Some(found) = visit(&base_object, &identity, rtype.structure().as_ref()) {
                return Some(found);
            }
        }
        None
    }

    fn key_name(key: &Value) -> Option<String> {
        key.get::<String>().ok().cloned()
    }
}

impl StructureWrapper for StructureWrapperClass {
    fn has_fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> bool {
        if !self.fields.is_empty() {
            return true;
        }
        let Some(subject) = vw.value_object(object) else {
            return false;
        };
        self.with_bases(&subject, |obj, ivw, sw| sw.has_fields(obj, ivw).then_some(()))
            .is_some()
    }

    fn field(&self, object: &ReflectedObject, vw: &dyn ValueWrapper, key: &Value) -> Reflection {
        let Some(name) = Self::key_name(key) else {
            return Reflection::invalid();
        };
        let Some(subject) = vw.value_object(object) else {
            return Reflection::invalid();
        };

        for entry in &self.fields {
            if entry.name == name {
                return Reflection::from_parts(
                    subject,
                    entry.wrapper.clone(),
                    registry::get_by_key(entry.wrapper.value_meta().key),
                );
            }
        }

        self.with_bases(&subject, |obj, ivw, sw| {
            let found = sw.field(obj, ivw, key);
            found.is_valid().then_some(found)
        })
        .unwrap_or_else(Reflection::invalid)
    }

    fn fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> Vec<Field> {
        let Some(subject) = vw.value_object(object) else {
            return Vec::new();
        };

        let mut out = Vec::new();

        // Base members come first, mirroring declaration order top-down.
        for base in &self.bases {
            if let Some(rtype) = registry::get_by_key(base.meta.key) {
                let base_object = subject.with_offset(base.offset, base.meta);
                let identity = SelfWrapper::untyped(base.meta);
                out.extend(rtype.structure().fields(&base_object, &identity));
            }
        }

        for entry in &self.fields {
            out.push(Field {
                key: Value::from(entry.name.as_str()),
                reflection: Reflection::from_parts(
                    subject,
                    entry.wrapper.clone(),
                    registry::get_by_key(entry.wrapper.value_meta().key),
                ),
            });
        }

        out
    }

    fn has_methods(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> bool {
        if !self.methods.is_empty() {
            return true;
        }
        let Some(subject) = vw.value_object(object) else {
            return false;
        };
        self.with_bases(&subject, |obj, ivw, sw| sw.has_methods(obj, ivw).then_some(()))
            .is_some()
    }

    fn method(
        &self,
        object: &ReflectedObject,
        vw: &dyn ValueWrapper,
        name: &str,
    ) -> Option<BoundCallable> {
        let subject = vw.value_object(object)?;

        for entry in &self.methods {
            if entry.name == name {
                return Some(BoundCallable::bind(entry.callable.clone(), subject));
            }
        }

        self.with_bases(&subject, |obj, ivw, sw| sw.method(obj, ivw, name))
    }

    fn methods(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> Vec<Method> {
        let Some(subject) = vw.value_object(object) else {
            return Vec::new();
        };

        let mut out = Vec::new();

        for base in &self.bases {
            if let Some(rtype) = registry::get_by_key(base.meta.key) {
                let base_object = subject.with_offset(base.offset, base.meta);
                let identity = SelfWrapper::untyped(base.meta);
                out.extend(rtype.structure().methods(&base_object, &identity));
            }
        }

        for entry in &self.methods {
            out.push(Method {
                key: entry.name.clone(),
                callable: BoundCallable::bind(entry.callable.clone(), subject),
            });
        }

        out
    }
}
