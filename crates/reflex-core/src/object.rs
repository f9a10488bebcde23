//! Erased subject handles.
//!
//! A [`ReflectedObject`] is a borrowed view of a live native subject: its
//! address, its identity record, and a readonly marker. It never owns the
//! subject — the caller remains responsible for subject lifetime across
//! nested field chains.

use crate::type_key::{TypeIdent, TypeMeta};

/// A non-owning (address, type, readonly) triple for one live subject.
#[derive(Clone, Copy)]
pub struct ReflectedObject {
    ptr: *mut u8,
    meta: TypeMeta,
    readonly: bool,
}

impl ReflectedObject {
    /// Wrap a mutable subject.
    pub fn new<T: TypeIdent>(subject: &mut T) -> Self {
        Self {
            ptr: subject as *mut T as *mut u8,
            meta: TypeMeta::of::<T>(),
            readonly: false,
        }
    }

    /// Wrap a shared subject; the resulting object is readonly.
    pub fn from_ref<T: TypeIdent>(subject: &T) -> Self {
        Self {
            ptr: subject as *const T as *mut u8,
            meta: TypeMeta::of::<T>(),
            readonly: true,
        }
    }

    /// Wrap a raw subject address.
    ///
    /// # Safety
    ///
    /// `ptr` must address a live value of the described type for as long as
    /// the object (and any object derived from it) is dereferenced.
    pub unsafe fn from_raw(ptr: *mut u8, meta: TypeMeta, readonly: bool) -> Self {
        Self { ptr, meta, readonly }
    }

    /// Whether this object addresses anything at all.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.ptr.is_null()
    }

    /// Whether writes through this object are refused.
    #[inline]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Identity record of the subject.
    #[inline]
    pub fn type_meta(&self) -> TypeMeta {
        self.meta
    }

    /// Raw subject address.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Re-type this object at a byte offset from the subject address.
    ///
    /// Used by the inheritance oracle consumers to shift between a derived
    /// subject and an embedded base subject.
    pub fn with_offset(&self, offset: isize, meta: TypeMeta) -> Self {
        Self {
            ptr: self.ptr.wrapping_offset(offset),
            meta,
            readonly: self.readonly,
        }
    }

    /// Borrow the subject as `T` after a key check.
    ///
    /// # Safety
    ///
    /// The subject must still be live and unaliased for the duration of the
    /// returned borrow.
    pub unsafe fn deref<T: TypeIdent>(&self) -> Option<&T> {
        if self.ptr.is_null() || self.meta.key != T::type_key() {
            return None;
        }
        Some(unsafe { &*(self.ptr as *const T) })
    }

    /// Mutably borrow the subject as `T` after a key check.
    ///
    /// The readonly marker is not consulted here; write refusal is the
    /// wrappers' contract, enforced before they reach for this.
    ///
    /// # Safety
    ///
    /// Same liveness/aliasing requirements as [`Self::deref`].
    pub unsafe fn deref_mut<T: TypeIdent>(&self) -> Option<&mut T> {
        if self.ptr.is_null() || self.meta.key != T::type_key() {
            return None;
        }
        Some(unsafe { &mut *(self.ptr as *mut T) })
    }
}

impl std::fmt::Debug for ReflectedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectedObject")
            .field("type", &self.meta.to_string())
            .field("addr", &format_args!("{:#x}", self.ptr as usize))
            .field("readonly", &self.readonly)
            .finish()
    }
}
