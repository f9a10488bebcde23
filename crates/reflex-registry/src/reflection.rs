//! The reflection view façade.
//!
//! A [`Reflection`] is a transient triple — subject, value wrapper, type
//! descriptor — exposing the read/enumerate surface callers work with. It
//! is either **valid** (a usable structure wrapper bound to a live
//! subject) or **invalid** (default-constructed, or the result of a failed
//! field lookup). Every read on an invalid view is a defined no-op
//! returning empty results; the user-visible contract is: check validity
//! before use.
//!
//! A view never owns its subject. The caller keeps the subject alive
//! across nested field chains.

use std::io;
use std::sync::Arc;

use reflex_core::{
    BoundCallable, ReflectError, ReflectResult, ReflectedObject, TypeMeta, Value,
};

use crate::dump::{self, DumpOptions};
use crate::registry;
use crate::reflected_type::{Reflect, ReflectedType};
use crate::structure::{StructureEditorWrapper, StructureWrapper, default_structure};
use crate::value_wrapper::{SelfWrapper, ValueWrapper};

/// One enumerated field: its key and the child view.
pub struct Field {
    /// The field's key — a name for records/maps, an index for sequences.
    pub key: Value,
    /// The child view addressing the field's slot.
    pub reflection: Reflection,
}

/// One enumerated method: its name and the subject-bound callable.
pub struct Method {
    /// The method name.
    pub key: String,
    /// The callable bound to the enumerated subject, carrying parameter
    /// and return metadata for pre-invoke validation.
    pub callable: BoundCallable,
}

/// Transient façade binding a subject, its value wrapper, and its type
/// descriptor.
#[derive(Clone)]
pub struct Reflection {
    object: Option<ReflectedObject>,
    vw: Option<Arc<dyn ValueWrapper>>,
    rtype: Option<&'static ReflectedType>,
    sw_override: Option<Arc<dyn StructureWrapper>>,
}

impl Reflection {
    /// The invalid/empty view.
    pub fn invalid() -> Self {
        Self { object: None, vw: None, rtype: None, sw_override: None }
    }

    /// Create a view over a mutable subject.
    ///
    /// The descriptor resolves through the instance hook, so polymorphic
    /// subjects report their dynamic type.
    pub fn create<T: Reflect + Clone>(subject: &mut T) -> Self {
        let rtype = registry::get_by_instance(&*subject);
        Self {
            object: Some(ReflectedObject::new(subject)),
            vw: Some(Arc::new(SelfWrapper::typed::<T>())),
            rtype: Some(rtype),
            sw_override: None,
        }
    }

    /// Create a readonly view over a shared subject.
    pub fn create_const<T: Reflect + Clone>(subject: &T) -> Self {
        let rtype = registry::get_by_instance(subject);
        Self {
            object: Some(ReflectedObject::from_ref(subject)),
            vw: Some(Arc::new(SelfWrapper::typed::<T>())),
            rtype: Some(rtype),
            sw_override: None,
        }
    }

    /// Assemble a view from parts; used by structure wrappers when
    /// producing child views.
    pub(crate) fn from_parts(
        object: ReflectedObject,
        vw: Arc<dyn ValueWrapper>,
        rtype: Option<&'static ReflectedType>,
    ) -> Self {
        Self { object: Some(object), vw: Some(vw), rtype, sw_override: None }
    }

    /// Attach an explicit structure-wrapper override.
    ///
    /// Precedence when answering structure queries: this override, then
    /// the type's own wrapper, then the shared no-children fallback.
    pub fn with_structure(mut self, sw: Arc<dyn StructureWrapper>) -> Self {
        self.sw_override = Some(sw);
        self
    }

    /// Whether this view is bound to a live subject.
    pub fn is_valid(&self) -> bool {
        matches!(&self.object, Some(o) if o.is_valid()) && self.vw.is_some()
    }

    /// Whether writes through this view are refused.
    pub fn is_readonly(&self) -> bool {
        let object_ro = matches!(&self.object, Some(o) if o.is_readonly());
        let wrapper_ro = self.vw.as_ref().map(|vw| vw.is_readonly()).unwrap_or(true);
        object_ro || wrapper_ro
    }

    /// The type descriptor bound to this view, if any.
    pub fn reflected_type(&self) -> Option<&'static ReflectedType> {
        self.rtype
    }

    /// Identity record of the viewed value.
    pub fn value_meta(&self) -> Option<TypeMeta> {
        self.vw.as_ref().map(|vw| vw.value_meta())
    }

    /// Load the viewed slot into a boxed value. Empty on an invalid view.
    pub fn get_value(&self) -> Value {
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => vw.get_value(object),
            _ => Value::empty(),
        }
    }

    /// Store a boxed value into the viewed slot.
    pub fn set_value(&self, value: Value) -> ReflectResult<()> {
        let (Some(object), Some(vw)) = (&self.object, &self.vw) else {
            return Err(ReflectError::BadOperation {
                op: "set_value",
                type_name: "<invalid view>".to_string(),
            });
        };
        if object.is_readonly() {
            return Err(ReflectError::BadOperation {
                op: "set_value",
                type_name: vw.value_meta().to_string(),
            });
        }
        vw.set_value(object, value)
    }

    /// The drilled subject this view addresses, when drillable.
    pub fn value_object(&self) -> Option<ReflectedObject> {
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => vw.value_object(object),
            _ => None,
        }
    }

    /// Structure wrapper answering this view's queries, by precedence.
    fn structure(&self) -> Arc<dyn StructureWrapper> {
        if let Some(sw) = &self.sw_override {
            return sw.clone();
        }
        if let Some(rtype) = self.rtype {
            return rtype.structure().clone();
        }
        default_structure()
    }

    /// Whether the viewed value exposes fields.
    pub fn has_fields(&self) -> bool {
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => self.structure().has_fields(object, vw.as_ref()),
            _ => false,
        }
    }

    /// Point lookup of one field. Unknown keys yield an invalid view.
    pub fn field(&self, key: impl Into<Value>) -> Reflection {
        let key = key.into();
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => self.structure().field(object, vw.as_ref(), &key),
            _ => Reflection::invalid(),
        }
    }

    /// All fields in the subject's natural order.
    pub fn fields(&self) -> Vec<Field> {
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => self.structure().fields(object, vw.as_ref()),
            _ => Vec::new(),
        }
    }

    /// Whether the viewed value exposes methods.
    pub fn has_methods(&self) -> bool {
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => self.structure().has_methods(object, vw.as_ref()),
            _ => false,
        }
    }

    /// Point lookup of one method, bound to the subject.
    pub fn method(&self, name: &str) -> Option<Method> {
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => self
                .structure()
                .method(object, vw.as_ref(), name)
                .map(|callable| Method { key: name.to_string(), callable }),
            _ => None,
        }
    }

    /// All methods, bound to the subject.
    pub fn methods(&self) -> Vec<Method> {
        match (&self.object, &self.vw) {
            (Some(object), Some(vw)) => self.structure().methods(object, vw.as_ref()),
            _ => Vec::new(),
        }
    }

    /// The editor capability of the viewed value's type, when the drilled
    /// subject is an editable container.
    pub fn editor(&self) -> Option<(Arc<dyn StructureEditorWrapper>, ReflectedObject)> {
        let subject = self.value_object()?;
        let rtype = self.rtype.or_else(|| registry::get_by_key(subject.type_meta().key))?;
        let editor = rtype.editor()?.clone();
        Some((editor, subject))
    }

    /// Dump this view's tree as text, recursing `max_level` levels deep.
    pub fn dump(&self, out: &mut dyn io::Write, max_level: usize) -> io::Result<()> {
        dump::dump(self, out, &DumpOptions { max_level, ..DumpOptions::default() })
    }
}

impl Default for Reflection {
    fn default() -> Self {
        Self::invalid()
    }
}

impl std::fmt::Debug for Reflection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_valid() {
            return write!(f, "Reflection(<invalid>)");
        }
        match self.value_meta() {
            Some(meta) => write!(f, "Reflection({meta})"),
            None => write!(f, "Reflection(?)"),
        }
    }
}
