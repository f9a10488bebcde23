//! Integration tests for the type-erased value container.

use reflex::{ReflectError, TypeIdent, TypeKey, Value, register_incomparable, register_ops};

#[derive(Clone, PartialEq, Debug)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl TypeIdent for Color {
    fn type_key() -> TypeKey {
        TypeKey::from_name("value_tests::Color")
    }
    fn type_name() -> &'static str {
        "Color"
    }
}

#[test]
fn scalar_round_trip() {
    assert_eq!(*Value::new(42i32).get::<i32>().unwrap(), 42);
    assert_eq!(*Value::new(-7i64).get::<i64>().unwrap(), -7);
    assert_eq!(*Value::new(true).get::<bool>().unwrap(), true);
    assert_eq!(*Value::new(1.5f32).get::<f32>().unwrap(), 1.5);
    assert_eq!(Value::new("abc".to_string()).get::<String>().unwrap(), "abc");
}

#[test]
fn user_type_round_trip() {
    let c = Color { r: 1, g: 2, b: 3 };
    let v = Value::new(c.clone());
    assert_eq!(*v.get::<Color>().unwrap(), c);
}

#[test]
fn default_value_is_empty_until_set() {
    let mut v = Value::empty();
    assert!(v.is_empty());
    assert!(v.type_key().is_none());

    v.set(9i32);
    assert!(!v.is_empty());
    assert_eq!(v.type_key(), Some(i32::type_key()));
}

#[test]
fn typed_access_on_empty_fails() {
    let v = Value::empty();
    assert!(matches!(v.get::<i32>(), Err(ReflectError::BadGet { .. })));
    assert!(matches!(v.cast::<i32>(), Err(ReflectError::BadCast { .. })));
    assert!(!v.can_get::<i32>());
    assert!(!v.can_cast::<i32>());
}

#[test]
fn get_is_exact_no_conversion() {
    let v = Value::new(5i32);
    // Even with numeric defaults installed elsewhere, get never converts.
    assert!(v.get::<i64>().is_err());
    assert!(v.get::<f64>().is_err());
}

#[test]
fn get_or_returns_default_on_mismatch() {
    let v = Value::new(5i32);
    assert_eq!(v.get_or(0i32), 5);
    assert_eq!(v.get_or("fallback".to_string()), "fallback");
}

#[test]
fn clone_is_independent() {
    let mut a = Value::new("one".to_string());
    let b = a.clone();
    a.set("two".to_string());
    assert_eq!(b.get::<String>().unwrap(), "one");
}

#[test]
fn swap_and_clear() {
    let mut a = Value::new(1i32);
    let mut b = Value::new("s".to_string());

    a.swap(&mut b);
    assert!(a.can_get::<String>());
    assert!(b.can_get::<i32>());

    b.clear();
    assert!(b.is_empty());
    assert!(!a.is_empty());
}

#[test]
fn equality_for_registered_types() {
    register_ops::<Color>();

    let a = Value::new(Color { r: 1, g: 2, b: 3 });
    let b = Value::new(Color { r: 1, g: 2, b: 3 });
    let c = Value::new(Color { r: 9, g: 9, b: 9 });

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.try_eq(&b).unwrap());
}

#[test]
fn incomparable_types_surface_bad_operation() {
    #[derive(Clone)]
    struct Blob(#[allow(dead_code)] Vec<u8>);
    impl TypeIdent for Blob {
        fn type_key() -> TypeKey {
            TypeKey::from_name("value_tests::Blob")
        }
        fn type_name() -> &'static str {
            "Blob"
        }
    }

    register_incomparable::<Blob>();

    let a = Value::new(Blob(vec![1]));
    let b = Value::new(Blob(vec![1]));

    // Reported as never-equal, not silently dropped.
    assert_ne!(a, b);
    assert!(matches!(
        a.try_eq(&b),
        Err(ReflectError::BadOperation { op: "compare", .. })
    ));
}

#[test]
fn cross_type_compare_is_false_not_error() {
    let a = Value::new(1i32);
    let b = Value::new(1i64);
    assert_ne!(a, b);
    assert_eq!(a.try_eq(&b), Ok(false));
}

#[test]
fn raw_load_and_store() {
    use reflex::TypeMeta;

    let src = 0x0102_0304u32;
    let v = unsafe {
        Value::load_value(&src as *const u32 as *const u8, TypeMeta::of::<u32>()).unwrap()
    };
    assert_eq!(*v.get::<u32>().unwrap(), src);

    let mut dst = 0u32;
    unsafe { v.store_value(&mut dst as *mut u32 as *mut u8, 4).unwrap() };
    assert_eq!(dst, src);

    // Width mismatch surfaces as BadSize, not silent truncation.
    let mut wide = 0u64;
    assert_eq!(
        unsafe { v.store_value(&mut wide as *mut u64 as *mut u8, 8) },
        Err(ReflectError::BadSize { expected: 8, actual: 4 })
    );
}

#[test]
fn placement_is_invisible_to_callers() {
    // One value small enough for the inline buffer, one forced to the
    // heap; both behave identically through the public surface.
    let small = Value::new(7u8);
    let large = Value::new("x".repeat(128));

    assert_eq!(*small.get::<u8>().unwrap(), 7);
    assert_eq!(large.get::<String>().unwrap().len(), 128);

    let small2 = small.clone();
    let large2 = large.clone();
    assert_eq!(small, small2);
    assert_eq!(large, large2);
}
