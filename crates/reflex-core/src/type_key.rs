//! Deterministic hash-based type identity.
//!
//! This module provides [`TypeKey`], a 64-bit hash identifying a decayed
//! native type, and [`TypeMeta`], the `Copy` record the rest of the runtime
//! passes around in place of a compile-time type parameter. Hashes are
//! computed deterministically from names (or from `std::any::TypeId`),
//! enabling:
//!
//! - Forward references (key computed before registration)
//! - No registration order dependencies
//! - Single map lookups (no secondary name→id maps)
//!
//! Pointer keys are derived from the pointee key with a domain-specific
//! mixing constant, so `*mut T`, `*const T` and `T` always have three
//! distinct keys.
//!
//! # Examples
//!
//! ```
//! use reflex_core::{TypeKey, TypeIdent};
//!
//! let a = TypeKey::from_name("int32");
//! let b = TypeKey::from_name("int32");
//! assert_eq!(a, b); // Deterministic
//!
//! assert_eq!(i32::type_key(), TypeKey::from_name("int32"));
//! assert_ne!(<*mut i32>::type_key(), i32::type_key());
//! ```

use std::fmt;

use bitflags::bitflags;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for key computation.
///
/// These constants ensure that different identity domains (plain types,
/// pointers, const pointers, container instances) produce distinct keys
/// even when derived from the same base name.
pub mod hash_constants {
    /// Domain marker for plain type keys
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for mutable pointer keys
    pub const POINTER: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for const pointer keys
    pub const CONST_POINTER: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for sequence container instances
    pub const SEQUENCE: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for associative container instances
    pub const MAP: u64 = 0x9a7f3d5e2b8c4601;

    /// Separator constant mixed in when combining keys
    pub const SEP: u64 = 0x4bc94d6bd06053ad;
}

/// A deterministic 64-bit hash identifying a decayed native type.
///
/// The same input always produces the same key, so keys can be computed
/// before the type is ever registered anywhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeKey(pub u64);

impl TypeKey {
    /// Empty/invalid key constant.
    pub const EMPTY: TypeKey = TypeKey(0);

    /// Create a type key from a type name.
    ///
    /// The same name always produces the same key.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeKey(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a type key from a Rust type's `TypeId`.
    ///
    /// Produces a different key than `from_name()` since it is based on
    /// Rust's internal type identity, not a registered name.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        use std::any::TypeId;
        use std::hash::{Hash, Hasher};

        let type_id = TypeId::of::<T>();
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        type_id.hash(&mut hasher);
        TypeKey(hasher.finish())
    }

    /// Derive the key of `*mut T` from the key of `T`.
    #[inline]
    pub const fn pointer_to(self) -> Self {
        TypeKey(hash_constants::POINTER ^ self.0.rotate_left(17))
    }

    /// Derive the key of `*const T` from the key of `T`.
    #[inline]
    pub const fn const_pointer_to(self) -> Self {
        TypeKey(hash_constants::CONST_POINTER ^ self.0.rotate_left(17))
    }

    /// Derive a sequence container key (`Vec<T>`) from the element key.
    #[inline]
    pub const fn sequence_of(self) -> Self {
        TypeKey(hash_constants::SEQUENCE ^ self.0.wrapping_mul(hash_constants::SEP))
    }

    /// Derive an associative container key (string-keyed map of `V`) from
    /// the value key.
    #[inline]
    pub const fn map_of(self) -> Self {
        TypeKey(hash_constants::MAP ^ self.0.wrapping_mul(hash_constants::SEP))
    }

    /// Check if this is an empty/invalid key.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({:#018x})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

bitflags! {
    /// Structural traits of a type, carried alongside its key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeTraits: u8 {
        /// The type is a raw pointer.
        const POINTER = 0b0001;
        /// The type is a const-qualified pointer (`*const T`).
        const CONST = 0b0010;
        /// Plain-old-data: eligible for inline storage and raw byte
        /// load/store. Must only be claimed by types with no drop glue
        /// and no interior ownership.
        const TRIVIAL = 0b0100;
    }
}

/// Identity capability for types that participate in the value/reflection
/// runtime.
///
/// Implemented for all primitives via macro and blanket-implemented for
/// raw pointers, `Vec<T>` and `BTreeMap<String, V>`. User types implement
/// it with a `from_name` key:
///
/// ```
/// use reflex_core::{TypeIdent, TypeKey};
///
/// struct Transform {
///     x: f32,
/// }
///
/// impl TypeIdent for Transform {
///     fn type_key() -> TypeKey {
///         TypeKey::from_name("Transform")
///     }
///
///     fn type_name() -> &'static str {
///         "Transform"
///     }
/// }
/// ```
pub trait TypeIdent: 'static {
    /// Get the type key for this type.
    fn type_key() -> TypeKey;

    /// Get the display name for this type.
    fn type_name() -> &'static str;

    /// Get the structural traits of this type.
    fn type_traits() -> TypeTraits {
        TypeTraits::empty()
    }

    /// For pointer types, the key of the pointed-to type.
    fn pointee() -> Option<TypeKey> {
        None
    }
}

/// The `Copy` identity record for one decayed type.
///
/// Everything the runtime needs to know about a type at a call boundary:
/// its key, display name, byte size, structural traits and (for pointers)
/// the pointee key. Obtained once per call site via [`TypeMeta::of`] and
/// passed by value from then on.
#[derive(Clone, Copy, Debug)]
pub struct TypeMeta {
    /// Identity key of the decayed type.
    pub key: TypeKey,
    /// Display name.
    pub name: &'static str,
    /// Byte size of the type.
    pub size: usize,
    /// Structural traits.
    pub traits: TypeTraits,
    /// Key of the pointed-to type, for pointer types.
    pub pointee: Option<TypeKey>,
}

impl TypeMeta {
    /// Capture the identity record of `T`.
    #[inline]
    pub fn of<T: TypeIdent>() -> Self {
        Self {
            key: T::type_key(),
            name: T::type_name(),
            size: std::mem::size_of::<T>(),
            traits: T::type_traits(),
            pointee: T::pointee(),
        }
    }

    /// Whether this type is a raw pointer.
    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.traits.contains(TypeTraits::POINTER)
    }

    /// Whether this type is a const-qualified pointer.
    #[inline]
    pub fn is_const(&self) -> bool {
        self.traits.contains(TypeTraits::CONST)
    }

    /// Whether this type is plain-old-data.
    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.traits.contains(TypeTraits::TRIVIAL)
    }
}

// Identity is the key alone; name/size/traits are derived attributes.
impl PartialEq for TypeMeta {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeMeta {}

impl fmt::Display for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pointer() {
            if self.is_const() {
                write!(f, "*const {}", self.name)
            } else {
                write!(f, "*mut {}", self.name)
            }
        } else {
            write!(f, "{}", self.name)
        }
    }
}

// === Primitive Implementations ===

macro_rules! impl_type_ident_trivial {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl TypeIdent for $ty {
                fn type_key() -> TypeKey {
                    TypeKey::from_name($name)
                }

                fn type_name() -> &'static str {
                    $name
                }

                fn type_traits() -> TypeTraits {
                    TypeTraits::TRIVIAL
                }
            }
        )*
    };
}

impl_type_ident_trivial! {
    () => "void",
    bool => "bool",
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    usize => "usize",
    isize => "isize",
    f32 => "float32",
    f64 => "float64",
    char => "char",
}

impl TypeIdent for String {
    fn type_key() -> TypeKey {
        TypeKey::from_name("string")
    }

    fn type_name() -> &'static str {
        "string"
    }
}

// === Pointer Implementations ===

impl<T: TypeIdent> TypeIdent for *mut T {
    fn type_key() -> TypeKey {
        T::type_key().pointer_to()
    }

    fn type_name() -> &'static str {
        T::type_name()
    }

    fn type_traits() -> TypeTraits {
        TypeTraits::POINTER | TypeTraits::TRIVIAL
    }

    fn pointee() -> Option<TypeKey> {
        Some(T::type_key())
    }
}

impl<T: TypeIdent> TypeIdent for *const T {
    fn type_key() -> TypeKey {
        T::type_key().const_pointer_to()
    }

    fn type_name() -> &'static str {
        T::type_name()
    }

    fn type_traits() -> TypeTraits {
        TypeTraits::POINTER | TypeTraits::CONST | TypeTraits::TRIVIAL
    }

    fn pointee() -> Option<TypeKey> {
        Some(T::type_key())
    }
}

// === Container Implementations ===

impl<T: TypeIdent> TypeIdent for Vec<T> {
    fn type_key() -> TypeKey {
        T::type_key().sequence_of()
    }

    fn type_name() -> &'static str {
        "sequence"
    }
}

impl<V: TypeIdent> TypeIdent for std::collections::BTreeMap<String, V> {
    fn type_key() -> TypeKey {
        V::type_key().map_of()
    }

    fn type_name() -> &'static str {
        "map"
    }
}
