//! Process-wide reflected-type registry.
//!
//! Central storage for all [`ReflectedType`] descriptors, keyed by
//! [`TypeKey`] with a secondary permanent-name index. Descriptors are
//! created lazily on first request and live for the process lifetime, so
//! lookups hand out `&'static` references.
//!
//! # Thread Safety
//!
//! Registration (creating a descriptor, recording an inheritance edge)
//! mutates the shared maps behind a write lock with double-checked
//! insertion, so concurrent first-use of the same type from multiple
//! threads is safe and idempotent: the first caller creates the
//! descriptor, all later callers observe the same instance. Lookups after
//! the registration phase take read locks only.

use std::sync::{LazyLock, RwLock};

use rustc_hash::FxHashMap;

use reflex_core::{TypeKey, TypeMeta, inheritance};

use crate::reflected_type::{Reflect, ReflectedType};

#[derive(Default)]
struct RegistryInner {
    by_key: FxHashMap<TypeKey, &'static ReflectedType>,
    by_name: FxHashMap<String, TypeKey>,
}

static REGISTRY: LazyLock<RwLock<RegistryInner>> =
    LazyLock::new(|| RwLock::new(RegistryInner::default()));

/// Get the singleton descriptor for `T`, creating it on first call.
///
/// Construction happens outside the write lock; a losing racer's
/// descriptor is discarded in favor of the one already inserted.
pub fn get<T: Reflect>() -> &'static ReflectedType {
    let key = T::type_key();

    if let Ok(inner) = REGISTRY.read() {
        if let Some(existing) = inner.by_key.get(&key) {
            return existing;
        }
    }

    let fresh = ReflectedType::new(
        TypeMeta::of::<T>(),
        T::permanent_name().to_string(),
        T::build_structure(),
        T::build_editor(),
    );

    let mut inner = match REGISTRY.write() {
        Ok(inner) => inner,
        // A poisoned registry still holds valid descriptors.
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(existing) = inner.by_key.get(&key) {
        return existing;
    }

    let leaked: &'static ReflectedType = Box::leak(Box::new(fresh));
    inner.by_key.insert(key, leaked);
    inner
        .by_name
        .entry(leaked.permanent_name().to_string())
        .or_insert(key);
    leaked
}

/// Look up a descriptor by key. Never creates one.
pub fn get_by_key(key: TypeKey) -> Option<&'static ReflectedType> {
    REGISTRY.read().ok()?.by_key.get(&key).copied()
}

/// Look up a descriptor by permanent name. Never creates one.
pub fn get_by_name(name: &str) -> Option<&'static ReflectedType> {
    let inner = REGISTRY.read().ok()?;
    let key = inner.by_name.get(name)?;
    inner.by_key.get(key).copied()
}

/// Resolve the descriptor for one live instance.
///
/// Routes through [`Reflect::reflected_type_of`], so a polymorphic family
/// resolves to the instance's dynamic type while everything else falls
/// back to the static descriptor.
pub fn get_by_instance<T: Reflect>(subject: &T) -> &'static ReflectedType {
    subject.reflected_type_of()
}

/// Resolve the descriptor for a subject behind a raw pointer.
///
/// A null pointer falls back to the static descriptor; otherwise this is
/// [`get_by_instance`] through the pointee.
///
/// # Safety
///
/// A non-null `ptr` must address a live `T`.
pub unsafe fn get_by_pointer<T: Reflect>(ptr: *const T) -> &'static ReflectedType {
    if ptr.is_null() {
        return get::<T>();
    }
    unsafe { &*ptr }.reflected_type_of()
}

/// Record that `Base` is embedded in `Derived` at the given byte offset.
///
/// Feeds the inheritance oracle consumed by pointer casts, and ensures
/// both descriptors exist. Enumerating a derived type's fields through its
/// class wrapper lists base members when the wrapper itself declared the
/// base link (see [`TypeBuilder::base`](crate::builder::TypeBuilder::base));
/// this function only wires the cast oracle.
pub fn register_base<Derived, Base>(offset: usize)
where
    Derived: Reflect,
    Base: Reflect,
{
    inheritance::register_edge(Derived::type_key(), Base::type_key(), offset as isize);
    get::<Base>();
    get::<Derived>();
}
