//! Value-wrapper strategies: read/write one slot of a parent subject.
//!
//! A [`ValueWrapper`] instance never holds subject-specific state — the
//! subject arrives as an argument on every call — so one wrapper instance
//! safely serves unboundedly many subjects concurrently once registration
//! has completed.
//!
//! Three strategies:
//!
//! - [`SelfWrapper`] — identity wrapper used at view roots and when
//!   delegating into an already-drilled subject
//! - [`FieldWrapper`] — direct member access through a projection
//! - [`AccessorWrapper`] — getter/setter access for computed properties

use std::sync::Arc;

use reflex_core::{ReflectError, ReflectResult, ReflectedObject, TypeIdent, TypeMeta, Value};

/// Strategy for reading/writing one named slot of a composite subject.
pub trait ValueWrapper: Send + Sync {
    /// Identity record of the slot's value type.
    fn value_meta(&self) -> TypeMeta;

    /// Whether writes through this wrapper are refused.
    fn is_readonly(&self) -> bool {
        false
    }

    /// Load the slot into a boxed value. Infallible: an unreachable slot
    /// yields an empty value.
    fn get_value(&self, object: &ReflectedObject) -> Value;

    /// Store a boxed value into the slot.
    fn set_value(&self, object: &ReflectedObject, value: Value) -> ReflectResult<()>;

    /// Re-type the subject to the slot's sub-address for recursive descent,
    /// or `None` when the slot is not drillable.
    fn value_object(&self, object: &ReflectedObject) -> Option<ReflectedObject>;
}

type ReadFn = Arc<dyn Fn(&ReflectedObject) -> Value + Send + Sync>;
type WriteFn = Arc<dyn Fn(&ReflectedObject, Value) -> ReflectResult<()> + Send + Sync>;
type ProjectFn = Arc<dyn Fn(&ReflectedObject) -> Option<ReflectedObject> + Send + Sync>;

// ============================================================================
// SelfWrapper
// ============================================================================

/// Identity wrapper: the "slot" is the whole subject.
pub struct SelfWrapper {
    meta: TypeMeta,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
}

impl SelfWrapper {
    /// Typed identity wrapper; supports whole-subject load and store.
    pub fn typed<T: TypeIdent + Clone>() -> Self {
        let read: ReadFn = Arc::new(|object: &ReflectedObject| {
            match unsafe { object.deref::<T>() } {
                Some(v) => Value::new(v.clone()),
                None => Value::empty(),
            }
        });
        let write: WriteFn = Arc::new(|object: &ReflectedObject, value: Value| {
            if object.is_readonly() {
                return Err(ReflectError::BadOperation {
                    op: "set_value",
                    type_name: T::type_name().to_string(),
                });
            }
            let slot = unsafe { object.deref_mut::<T>() }.ok_or(ReflectError::BadOperation {
                op: "set_value",
                type_name: T::type_name().to_string(),
            })?;
            *slot = value.cast::<T>()?;
            Ok(())
        });
        Self {
            meta: TypeMeta::of::<T>(),
            read: Some(read),
            write: Some(write),
        }
    }

    /// Untyped identity wrapper for delegation into already-drilled
    /// subjects; load/store are unavailable, only drilling works.
    pub fn untyped(meta: TypeMeta) -> Self {
        Self { meta, read: None, write: None }
    }
}

impl ValueWrapper for SelfWrapper {
    fn value_meta(&self) -> TypeMeta {
        self.meta
    }

    fn is_readonly(&self) -> bool {
        self.write.is_none()
    }

    fn get_value(&self, object: &ReflectedObject) -> Value {
        match &self.read {
            Some(read) => read(object),
            None => Value::empty(),
        }
    }

    fn set_value(&self, object: &ReflectedObject, value: Value) -> ReflectResult<()> {
        match &self.write {
            Some(write) => write(object, value),
            None => Err(ReflectError::BadOperation {
                op: "set_value",
                type_name: self.meta.to_string(),
            }),
        }
    }

    fn value_object(&self, object: &ReflectedObject) -> Option<ReflectedObject> {
        object.is_valid().then_some(*object)
    }
}

// ============================================================================
// FieldWrapper — direct member access
// ============================================================================

/// Direct-member strategy built from a member projection.
///
/// `get_value` loads the member, `set_value` stores into it, and
/// `value_object` re-types the subject to the member's sub-address without
/// copying, enabling recursive descent into nested composite members.
pub struct FieldWrapper {
    meta: TypeMeta,
    readonly: bool,
    project: ProjectFn,
    read: ReadFn,
    write: WriteFn,
}

impl FieldWrapper {
    /// Wrap a mutable member of `C` with type `T`.
    pub fn member<C, T, F>(projection: F) -> Self
    where
        C: TypeIdent,
        T: TypeIdent + Clone,
        F: for<'a> Fn(&'a mut C) -> &'a mut T + Send + Sync + Clone + 'static,
    {
        let p = projection.clone();
        let project: ProjectFn = Arc::new(move |object: &ReflectedObject| {
            let subject = unsafe { object.deref_mut::<C>() }?;
            let slot = p(subject);
            Some(unsafe {
                ReflectedObject::from_raw(
                    slot as *mut T as *mut u8,
                    TypeMeta::of::<T>(),
                    object.is_readonly(),
                )
            })
        });

        let p = projection.clone();
        let read: ReadFn = Arc::new(move |object: &ReflectedObject| {
            match unsafe { object.deref_mut::<C>() } {
                Some(subject) => Value::new(p(subject).clone()),
                None => Value::empty(),
            }
        });

        let p = projection;
        let write: WriteFn = Arc::new(move |object: &ReflectedObject, value: Value| {
            let subject = unsafe { object.deref_mut::<C>() }.ok_or(ReflectError::BadOperation {
                op: "set_value",
                type_name: C::type_name().to_string(),
            })?;
            let slot = p(subject);
            store_member::<T>(slot, value)
        });

        Self {
            meta: TypeMeta::of::<T>(),
            readonly: false,
            project,
            read,
            write,
        }
    }

    /// Wrap a read-only member of `C` with type `T`.
    ///
    /// Writes fail with `BadOperation`; drilling stays available but the
    /// produced sub-object is readonly.
    pub fn member_ro<C, T, F>(projection: F) -> Self
    where
        C: TypeIdent,
        T: TypeIdent + Clone,
        F: for<'a> Fn(&'a C) -> &'a T + Send + Sync + Clone + 'static,
    {
        let p = projection.clone();
        let project: ProjectFn = Arc::new(move |object: &ReflectedObject| {
            let subject = unsafe { object.deref::<C>() }?;
            let slot = p(subject);
            Some(unsafe {
                ReflectedObject::from_raw(slot as *const T as *mut u8, TypeMeta::of::<T>(), true)
            })
        });

        let p = projection;
        let read: ReadFn = Arc::new(move |object: &ReflectedObject| {
            match unsafe { object.deref::<C>() } {
                Some(subject) => Value::new(p(subject).clone()),
                None => Value::empty(),
            }
        });

        let write: WriteFn = Arc::new(|_: &ReflectedObject, _: Value| {
            Err(ReflectError::BadOperation {
                op: "set_value",
                type_name: T::type_name().to_string(),
            })
        });

        Self {
            meta: TypeMeta::of::<T>(),
            readonly: true,
            project,
            read,
            write,
        }
    }
}

/// Store an incoming value into a typed member slot.
///
/// Exact type match assigns. Otherwise trivial members accept a raw byte
/// store from any trivial payload of the same width, surfacing a width
/// mismatch as `BadSize`; everything else is `BadCast`.
fn store_member<T: TypeIdent + Clone>(slot: &mut T, value: Value) -> ReflectResult<()> {
    if value.can_get::<T>() {
        *slot = value.get::<T>()?.clone();
        return Ok(());
    }

    let meta = TypeMeta::of::<T>();
    if meta.is_trivial() {
        if let Some(incoming) = value.type_meta() {
            if incoming.is_trivial() {
                return unsafe {
                    value.store_value(slot as *mut T as *mut u8, std::mem::size_of::<T>())
                };
            }
        }
    }

    Err(ReflectError::BadCast {
        from: value
            .type_meta()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "<empty>".to_string()),
        to: T::type_name(),
    })
}

impl ValueWrapper for FieldWrapper {
    fn value_meta(&self) -> TypeMeta {
        self.meta
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn get_value(&self, object: &ReflectedObject) -> Value {
        (self.read)(object)
    }

    fn set_value(&self, object: &ReflectedObject, value: Value) -> ReflectResult<()> {
        if self.readonly || object.is_readonly() {
            return Err(ReflectError::BadOperation {
                op: "set_value",
                type_name: self.meta.to_string(),
            });
        }
        (self.write)(object, value)
    }

    fn value_object(&self, object: &ReflectedObject) -> Option<ReflectedObject> {
        (self.project)(object)
    }
}

// ============================================================================
// AccessorWrapper — getter/setter access
// ============================================================================

/// Static-accessor strategy wrapping an optional getter and optional setter.
///
/// Get and set shapes may differ, modeling get-only computed properties and
/// asymmetric accessors. `is_readonly()` holds exactly when no setter is
/// attached.
///
/// Drilling depends on the getter's declared return shape: a by-value
/// getter yields no sub-object (not drillable), a pointer getter yields a
/// non-owning sub-object at the returned address. Reference-returning
/// getters are unrepresentable by construction — the address of a local
/// copy of a returned value would dangle as soon as the call returns, so
/// the API only admits the two safe shapes.
pub struct AccessorWrapper {
    meta: TypeMeta,
    set_meta: Option<TypeMeta>,
    get: ReadFn,
    set: Option<WriteFn>,
    object: ProjectFn,
}

impl AccessorWrapper {
    /// By-value getter; the produced field is not drillable.
    pub fn getter<C, T, G>(get: G) -> Self
    where
        C: TypeIdent,
        T: TypeIdent + Clone,
        G: Fn(&C) -> T + Send + Sync + 'static,
    {
        let read: ReadFn = Arc::new(move |object: &ReflectedObject| {
            match unsafe { object.deref::<C>() } {
                Some(subject) => Value::new(get(subject)),
                None => Value::empty(),
            }
        });
        Self {
            meta: TypeMeta::of::<T>(),
            set_meta: None,
            get: read,
            set: None,
            object: Arc::new(|_| None),
        }
    }

    /// Pointer getter; the produced field drills into the returned address
    /// without taking ownership.
    pub fn pointer_getter<C, P, G>(get: G) -> Self
    where
        C: TypeIdent,
        P: TypeIdent,
        G: Fn(&C) -> *mut P + Send + Sync + Clone + 'static,
    {
        let g = get.clone();
        let read: ReadFn = Arc::new(move |object: &ReflectedObject| {
            match unsafe { object.deref::<C>() } {
                Some(subject) => Value::new(g(subject)),
                None => Value::empty(),
            }
        });
        let project: ProjectFn = Arc::new(move |object: &ReflectedObject| {
            let subject = unsafe { object.deref::<C>() }?;
            let ptr = get(subject);
            if ptr.is_null() {
                return None;
            }
            Some(unsafe {
                ReflectedObject::from_raw(ptr as *mut u8, TypeMeta::of::<P>(), object.is_readonly())
            })
        });
        Self {
            meta: TypeMeta::of::<*mut P>(),
            set_meta: None,
            get: read,
            set: None,
            object: project,
        }
    }

    /// Attach a setter, possibly with a different value shape than the
    /// getter.
    pub fn with_setter<C, S, F>(mut self, set: F) -> Self
    where
        C: TypeIdent,
        S: TypeIdent + Clone,
        F: Fn(&mut C, S) + Send + Sync + 'static,
    {
        let write: WriteFn = Arc::new(move |object: &ReflectedObject, value: Value| {
            if object.is_readonly() {
                return Err(ReflectError::BadOperation {
                    op: "set_value",
                    type_name: C::type_name().to_string(),
                });
            }
            let subject = unsafe { object.deref_mut::<C>() }.ok_or(ReflectError::BadOperation {
                op: "set_value",
                type_name: C::type_name().to_string(),
            })?;
            let v = value.cast::<S>().map_err(|_| ReflectError::BadCast {
                from: value
                    .type_meta()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "<empty>".to_string()),
                to: S::type_name(),
            })?;
            set(subject, v);
            Ok(())
        });
        self.set = Some(write);
        self.set_meta = Some(TypeMeta::of::<S>());
        self
    }

    /// Identity record of the setter's expected value, when a setter is
    /// attached.
    pub fn set_meta(&self) -> Option<TypeMeta> {
        self.set_meta
    }
}

impl ValueWrapper for AccessorWrapper {
    fn value_meta(&self) -> TypeMeta {
        self.meta
    }

    fn is_readonly(&self) -> bool {
        self.set.is_none()
    }

    fn get_value(&self, object: &ReflectedObject) -> Value {
        (self.get)(object)
    }

    fn set_value(&self, object: &ReflectedObject, value: Value) -> ReflectResult<()> {
        match &self.set {
            Some(set) => set(object, value),
            None => Err(ReflectError::BadOperation {
                op: "set_value",
                type_name: self.meta.to_string(),
            }),
        }
    }

    fn value_object(&self, object: &ReflectedObject) -> Option<ReflectedObject> {
        (self.object)(object)
    }
}
