//! Type-erased value container.
//!
//! This module provides [`Value`], a clonable container for single values of
//! any registered type. Small plain-old-data payloads are stored inline;
//! larger or non-trivial payloads fall back to an owned heap allocation.
//! The placement is invisible to callers.
//!
//! Three access families with distinct contracts:
//!
//! - `get` / `get_or` / `can_get` — exact type identity only, no conversion
//! - `cast` / `can_cast` — type-aware: exact match, registered value
//!   conversion, or inheritance-based pointer cast
//! - `load_value` / `store_value` — raw byte transfer for trivial types
//!
//! Equality delegates to a per-type registered compare function; types with
//! no compare function registered are reported as never-equal, and
//! [`Value::try_eq`] surfaces that limitation as `BadOperation` for strict
//! callers.

use std::sync::{LazyLock, RwLock};

use rustc_hash::FxHashMap;

use crate::convert;
use crate::error::{ReflectError, ReflectResult};
use crate::inheritance;
use crate::storage::AutoStorage;
use crate::type_key::{TypeIdent, TypeKey, TypeMeta};

/// A type-erased, clonable value with run-time type identity.
///
/// # Examples
///
/// ```
/// use reflex_core::Value;
///
/// let v = Value::new(42i32);
/// assert_eq!(*v.get::<i32>().unwrap(), 42);
/// assert!(v.get::<f32>().is_err());
/// assert_eq!(v.get_or(0f32), 0f32);
/// ```
#[derive(Clone, Default)]
pub struct Value {
    meta: Option<TypeMeta>,
    storage: AutoStorage,
}

impl Value {
    /// Create an empty value with no type and no payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a value holding `v`.
    pub fn new<T: TypeIdent + Clone>(v: T) -> Self {
        Self {
            meta: Some(TypeMeta::of::<T>()),
            storage: AutoStorage::store(v),
        }
    }

    /// Check if this value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meta.is_none() || self.storage.is_empty()
    }

    /// Get the identity record of the contained value, if any.
    #[inline]
    pub fn type_meta(&self) -> Option<TypeMeta> {
        self.meta
    }

    /// Get the type key of the contained value, if any.
    #[inline]
    pub fn type_key(&self) -> Option<TypeKey> {
        self.meta.map(|m| m.key)
    }

    /// Clear this value to its empty state.
    pub fn clear(&mut self) {
        self.meta = None;
        self.storage = AutoStorage::Empty;
    }

    /// Swap contents with another value.
    pub fn swap(&mut self, other: &mut Value) {
        std::mem::swap(self, other);
    }

    /// Replace the stored type and payload.
    pub fn set<T: TypeIdent + Clone>(&mut self, v: T) {
        self.meta = Some(TypeMeta::of::<T>());
        self.storage = AutoStorage::store(v);
    }

    /// Determine if a value of exactly type `T` can be borrowed.
    ///
    /// Pure type-identity probe; never consults conversions.
    #[inline]
    pub fn can_get<T: TypeIdent>(&self) -> bool {
        matches!(self.meta, Some(m) if m.key == T::type_key())
    }

    /// Borrow the contained value as exactly `T`.
    ///
    /// Fails with `BadGet` on emptiness or any type mismatch, including
    /// mismatches a registered conversion could have bridged.
    pub fn get<T: TypeIdent>(&self) -> ReflectResult<&T> {
        if !self.can_get::<T>() {
            return Err(ReflectError::BadGet {
                requested: T::type_name(),
                stored: self.stored_name(),
            });
        }
        self.storage.get_ref::<T>().ok_or_else(|| ReflectError::BadGet {
            requested: T::type_name(),
            stored: self.stored_name(),
        })
    }

    /// Borrow the contained value mutably as exactly `T`.
    pub fn get_mut<T: TypeIdent>(&mut self) -> ReflectResult<&mut T> {
        if !self.can_get::<T>() {
            return Err(ReflectError::BadGet {
                requested: T::type_name(),
                stored: self.stored_name(),
            });
        }
        let stored = self.stored_name();
        self.storage.get_mut::<T>().ok_or(ReflectError::BadGet {
            requested: T::type_name(),
            stored,
        })
    }

    /// Get a copy of the contained value, or `default` on type mismatch or
    /// emptiness. Never fails.
    pub fn get_or<T: TypeIdent + Clone>(&self, default: T) -> T {
        match self.get::<T>() {
            Ok(v) => v.clone(),
            Err(_) => default,
        }
    }

    /// Determine if the contained value can be cast to `T`.
    ///
    /// True iff the stored type equals `T`, a `(stored, T)` conversion is
    /// registered, or (for pointers) the inheritance oracle reports a valid
    /// up/downcast. Pure probe; never fails.
    pub fn can_cast<T: TypeIdent>(&self) -> bool {
        if self.can_get::<T>() {
            return true;
        }
        let Some(meta) = self.meta else {
            return false;
        };
        if convert::has_conversion(meta.key, T::type_key()) {
            return true;
        }
        pointer_cast_offset(&meta, &TypeMeta::of::<T>()).is_some() && self.pointer_bits().is_some()
    }

    /// Cast the contained value into a value of type `T`.
    ///
    /// Resolution order: exact type identity, then the conversion registry
    /// (single hop, no chaining), then the inheritance oracle for pointer
    /// payloads. Fails with `BadCast` when no route exists.
    pub fn cast<T: TypeIdent + Clone>(&self) -> ReflectResult<T> {
        if self.can_get::<T>() {
            if let Some(v) = self.storage.get_ref::<T>() {
                return Ok(v.clone());
            }
        }

        if let Some(meta) = self.meta {
            if let Some(converted) = convert::convert(self, T::type_key()) {
                if let Ok(v) = converted.get::<T>() {
                    return Ok(v.clone());
                }
            }

            let target = TypeMeta::of::<T>();
            if let Some(offset) = pointer_cast_offset(&meta, &target) {
                if let Some(addr) = self.pointer_bits() {
                    if std::mem::size_of::<T>() == std::mem::size_of::<usize>() {
                        let adjusted = if addr == 0 {
                            0usize
                        } else {
                            (addr as isize).wrapping_add(offset) as usize
                        };
                        // T is a thin pointer type here; sizes were checked.
                        let out: T = unsafe { std::mem::transmute_copy(&adjusted) };
                        return Ok(out);
                    }
                }
            }
        }

        Err(ReflectError::BadCast {
            from: self.stored_name(),
            to: T::type_name(),
        })
    }

    /// Load a value from raw memory with the given identity record.
    ///
    /// Loading is only defined for trivial types whose size fits the inline
    /// buffer; anything else is `BadOperation`.
    ///
    /// # Safety
    ///
    /// `src` must point to at least `meta.size` readable bytes holding a
    /// valid value of the described type.
    pub unsafe fn load_value(src: *const u8, meta: TypeMeta) -> ReflectResult<Value> {
        if !meta.is_trivial() {
            return Err(ReflectError::BadOperation {
                op: "load_value",
                type_name: meta.to_string(),
            });
        }
        let storage = unsafe { AutoStorage::store_bytes(src, meta.size) }.ok_or(
            ReflectError::BadOperation {
                op: "load_value",
                type_name: meta.to_string(),
            },
        )?;
        Ok(Value { meta: Some(meta), storage })
    }

    /// Store the contained value into raw memory of `size` bytes.
    ///
    /// Storing is only defined for trivial payloads; a byte-width mismatch
    /// is `BadSize`.
    ///
    /// # Safety
    ///
    /// `dst` must point to at least `size` writable bytes.
    pub unsafe fn store_value(&self, dst: *mut u8, size: usize) -> ReflectResult<()> {
        let meta = self.meta.ok_or(ReflectError::BadOperation {
            op: "store_value",
            type_name: "<empty>".to_string(),
        })?;
        if !meta.is_trivial() {
            return Err(ReflectError::BadOperation {
                op: "store_value",
                type_name: meta.to_string(),
            });
        }
        let (src, len) = self.storage.inline_bytes().ok_or(ReflectError::BadOperation {
            op: "store_value",
            type_name: meta.to_string(),
        })?;
        if len != size {
            return Err(ReflectError::BadSize { expected: size, actual: len });
        }
        unsafe {
            std::ptr::copy_nonoverlapping(src, dst, len);
        }
        Ok(())
    }

    /// For pointer payloads, the raw address bits. `None` otherwise.
    pub fn pointer_bits(&self) -> Option<usize> {
        let meta = self.meta?;
        if !meta.is_pointer() {
            return None;
        }
        let (ptr, len) = self.storage.inline_bytes()?;
        if len != std::mem::size_of::<usize>() {
            return None;
        }
        Some(unsafe { std::ptr::read_unaligned(ptr as *const usize) })
    }

    /// Equality with an explicit error for incomparable types.
    ///
    /// `==` reports incomparable pairs as never-equal; this variant
    /// surfaces the missing compare function as `BadOperation` instead.
    pub fn try_eq(&self, other: &Value) -> ReflectResult<bool> {
        if self.is_empty() && other.is_empty() {
            return Ok(true);
        }
        if self.is_empty() != other.is_empty() {
            return Ok(false);
        }
        if self.type_key() != other.type_key() {
            return Ok(false);
        }
        let key = self.type_key().unwrap_or(TypeKey::EMPTY);
        match lookup_compare(key) {
            Some(CompareOp::Derived(f)) => Ok(f(self, other)),
            Some(CompareOp::Incomparable) | None => Err(ReflectError::BadOperation {
                op: "compare",
                type_name: self.stored_name(),
            }),
        }
    }

    fn stored_name(&self) -> String {
        match self.meta {
            Some(m) => m.to_string(),
            None => "<empty>".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.try_eq(other).unwrap_or(false)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.meta {
            Some(m) => write!(f, "Value({})", m),
            None => write!(f, "Value(<empty>)"),
        }
    }
}

// ============================================================================
// Pointer cast resolution
// ============================================================================

/// Byte offset to apply when casting one pointer payload to another, or
/// `None` when no valid route exists.
///
/// Rules: const-ness can be added, never removed; identical pointees decay
/// mut→const with no adjustment; otherwise the inheritance oracle supplies
/// the summed embedding offset for an up or down cast.
fn pointer_cast_offset(from: &TypeMeta, to: &TypeMeta) -> Option<isize> {
    if !from.is_pointer() || !to.is_pointer() {
        return None;
    }
    if from.is_const() && !to.is_const() {
        return None;
    }
    let fp = from.pointee?;
    let tp = to.pointee?;
    if fp == tp {
        return Some(0);
    }
    inheritance::upcast_offset(fp, tp).or_else(|| inheritance::downcast_offset(fp, tp))
}

// ============================================================================
// Per-type operation table
// ============================================================================

/// One entry in the per-type operation table.
#[derive(Clone, Copy)]
enum CompareOp {
    /// Derived compare function for a type with equality.
    Derived(fn(&Value, &Value) -> bool),
    /// Permanently incomparable entry; `==` is always false and `try_eq`
    /// reports `BadOperation`.
    Incomparable,
}

fn compare_derived<T: TypeIdent + PartialEq>(a: &Value, b: &Value) -> bool {
    match (a.get::<T>(), b.get::<T>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

static VALUE_OPS: LazyLock<RwLock<FxHashMap<TypeKey, CompareOp>>> = LazyLock::new(|| {
    let mut ops = FxHashMap::default();

    macro_rules! preregister {
        ($($ty:ty),* $(,)?) => {
            $(
                ops.insert(
                    <$ty as TypeIdent>::type_key(),
                    CompareOp::Derived(compare_derived::<$ty>),
                );
            )*
        };
    }

    preregister!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, char, String);

    // Floats compare by IEEE equality, same as the primitive operator.
    preregister!(f32, f64);

    RwLock::new(ops)
});

fn lookup_compare(key: TypeKey) -> Option<CompareOp> {
    VALUE_OPS.read().ok()?.get(&key).copied()
}

/// Attach the default operation set for `T`, derived from its equality.
///
/// Idempotent: a previously registered entry is kept.
pub fn register_ops<T: TypeIdent + PartialEq>() {
    if let Ok(mut ops) = VALUE_OPS.write() {
        ops.entry(T::type_key())
            .or_insert(CompareOp::Derived(compare_derived::<T>));
    }
}

/// Mark `T` as permanently incomparable.
///
/// Values of `T` never compare equal, and `try_eq` reports `BadOperation`.
pub fn register_incomparable<T: TypeIdent>() {
    if let Ok(mut ops) = VALUE_OPS.write() {
        ops.entry(T::type_key()).or_insert(CompareOp::Incomparable);
    }
}

// ============================================================================
// Conversions into Value for ergonomic keys and arguments
// ============================================================================

macro_rules! impl_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Value {
                    Value::new(v)
                }
            }
        )*
    };
}

impl_value_from!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, String);

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::new(v.to_string())
    }
}
