//! Integration tests for the reflection runtime: descriptors, wrappers,
//! views, containers, inheritance, methods, and the dump facility.

use std::collections::BTreeMap;
use std::mem::offset_of;
use std::sync::Arc;

use reflex::{
    Reflect, ReflectError, Reflection, StructureWrapper, TypeBuilder, TypeIdent, TypeKey, Value,
    convert, register_ops, registry,
};

// ============================================================================
// Fixture types
// ============================================================================

#[derive(Clone, Default, PartialEq, Debug)]
struct SimpleStruct {
    a: i32,
    b: i32,
}

impl TypeIdent for SimpleStruct {
    fn type_key() -> TypeKey {
        TypeKey::from_name("rt::SimpleStruct")
    }
    fn type_name() -> &'static str {
        "SimpleStruct"
    }
}

impl Reflect for SimpleStruct {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        TypeBuilder::<SimpleStruct>::new()
            .field("a", |s: &mut SimpleStruct| &mut s.a)
            .field("b", |s: &mut SimpleStruct| &mut s.b)
            .build()
    }
}

#[repr(C)]
#[derive(Clone, Default)]
struct BaseBase {
    basebase: i32,
}

impl TypeIdent for BaseBase {
    fn type_key() -> TypeKey {
        TypeKey::from_name("rt::BaseBase")
    }
    fn type_name() -> &'static str {
        "BaseBase"
    }
}

impl Reflect for BaseBase {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        TypeBuilder::<BaseBase>::new()
            .field("basebase", |s: &mut BaseBase| &mut s.basebase)
            .method0("base_me", |_: &mut BaseBase| true)
            .build()
    }
}

#[repr(C)]
#[derive(Clone)]
struct TestSubject {
    base: BaseBase,
    base_int: i32,
    base_str: String,
    tag: String,
    s1: SimpleStruct,
    simple: *mut SimpleStruct,
    int_vec: Vec<i32>,
}

impl Default for TestSubject {
    fn default() -> Self {
        Self {
            base: BaseBase::default(),
            base_int: 123,
            base_str: "base".to_string(),
            tag: "fixed".to_string(),
            s1: SimpleStruct { a: -38, b: 1024 },
            simple: std::ptr::null_mut(),
            int_vec: vec![100, 93, 86],
        }
    }
}

impl TypeIdent for TestSubject {
    fn type_key() -> TypeKey {
        TypeKey::from_name("rt::TestSubject")
    }
    fn type_name() -> &'static str {
        "TestSubject"
    }
}

impl Reflect for TestSubject {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        TypeBuilder::<TestSubject>::new()
            .base::<BaseBase>(offset_of!(TestSubject, base))
            .field("base_int", |s: &mut TestSubject| &mut s.base_int)
            .field("base_str", |s: &mut TestSubject| &mut s.base_str)
            .field_ro("tag", |s: &TestSubject| &s.tag)
            .field("s1", |s: &mut TestSubject| &mut s.s1)
            .field("simple", |s: &mut TestSubject| &mut s.simple)
            .field("int_vec", |s: &mut TestSubject| &mut s.int_vec)
            .field_getter("int_fn", |s: &TestSubject| s.base_int)
            .field_accessor(
                "int_acc",
                |s: &TestSubject| s.base_int,
                |s: &mut TestSubject, v: i32| s.base_int = v,
            )
            .field_ptr("simple_ptr", |s: &TestSubject| s.simple)
            .method1("sum_method", |s: &mut TestSubject, a: i64| s.base_int as i64 + a)
            .build()
    }
}

// Polymorphic family: a tagged root resolving to its concrete subtype.

#[repr(C)]
#[derive(Clone, Default)]
struct Shape {
    kind: u8,
}

impl TypeIdent for Shape {
    fn type_key() -> TypeKey {
        TypeKey::from_name("rt::Shape")
    }
    fn type_name() -> &'static str {
        "Shape"
    }
}

impl Reflect for Shape {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        TypeBuilder::<Shape>::new()
            .field("kind", |s: &mut Shape| &mut s.kind)
            .build()
    }

    fn reflected_type_of(&self) -> &'static reflex::ReflectedType {
        match self.kind {
            1 => registry::get::<Circle>(),
            2 => registry::get::<Square>(),
            _ => registry::get::<Shape>(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Default)]
struct Circle {
    shape: Shape,
    radius: f32,
}

impl TypeIdent for Circle {
    fn type_key() -> TypeKey {
        TypeKey::from_name("rt::Circle")
    }
    fn type_name() -> &'static str {
        "Circle"
    }
}

impl Reflect for Circle {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        TypeBuilder::<Circle>::new()
            .base::<Shape>(offset_of!(Circle, shape))
            .field("radius", |c: &mut Circle| &mut c.radius)
            .build()
    }
}

#[repr(C)]
#[derive(Clone, Default)]
struct Square {
    shape: Shape,
    side: f32,
}

impl TypeIdent for Square {
    fn type_key() -> TypeKey {
        TypeKey::from_name("rt::Square")
    }
    fn type_name() -> &'static str {
        "Square"
    }
}

impl Reflect for Square {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        TypeBuilder::<Square>::new()
            .base::<Shape>(offset_of!(Square, shape))
            .field("side", |s: &mut Square| &mut s.side)
            .build()
    }
}

// Self-referential subject for the cycle guard.

#[derive(Clone)]
struct Node {
    value: i32,
    next: *mut Node,
}

impl TypeIdent for Node {
    fn type_key() -> TypeKey {
        TypeKey::from_name("rt::Node")
    }
    fn type_name() -> &'static str {
        "Node"
    }
}

impl Reflect for Node {
    fn build_structure() -> Arc<dyn StructureWrapper> {
        TypeBuilder::<Node>::new()
            .field("value", |n: &mut Node| &mut n.value)
            .field("next", |n: &mut Node| &mut n.next)
            .build()
    }
}

// ============================================================================
// Descriptors and registry
// ============================================================================

#[test]
fn descriptor_singleton_per_type() {
    let a = registry::get::<SimpleStruct>();
    let b = registry::get::<SimpleStruct>();
    assert!(std::ptr::eq(a, b));
    assert_eq!(a.permanent_name(), "SimpleStruct");
    assert_eq!(a.key(), SimpleStruct::type_key());
    assert!(registry::get_by_name("SimpleStruct").is_some());
    assert!(registry::get_by_key(SimpleStruct::type_key()).is_some());
}

#[test]
fn plain_type_has_no_children() {
    let mut x = 2.5f64;
    let view = Reflection::create(&mut x);

    assert!(view.is_valid());
    assert!(!view.has_fields());
    assert!(!view.has_methods());
    assert!(view.fields().is_empty());
    assert!(!view.field("anything").is_valid());
}

// ============================================================================
// Field access
// ============================================================================

#[test]
fn field_read_and_write() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let field = view.field("base_int");
    assert!(field.is_valid());
    assert_eq!(*field.get_value().get::<i32>().unwrap(), 123);

    field.set_value(Value::new(456i32)).unwrap();
    assert_eq!(t.base_int, 456);
}

#[test]
fn missing_field_yields_invalid_view() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let missing = view.field("no_such_field");
    assert!(!missing.is_valid());
    assert!(missing.get_value().is_empty());
    assert!(missing.fields().is_empty());
    assert!(missing.set_value(Value::new(1i32)).is_err());
}

#[test]
fn readonly_field_refuses_writes() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let tag = view.field("tag");
    assert!(tag.is_valid());
    assert!(tag.is_readonly());
    assert_eq!(tag.get_value().get::<String>().unwrap(), "fixed");
    assert!(matches!(
        tag.set_value(Value::new("changed".to_string())),
        Err(ReflectError::BadOperation { op: "set_value", .. })
    ));
    assert_eq!(t.tag, "fixed");
}

#[test]
fn const_view_is_readonly_throughout() {
    let t = TestSubject::default();
    let view = Reflection::create_const(&t);

    assert!(view.is_readonly());
    let field = view.field("base_int");
    assert!(field.is_valid());
    assert!(matches!(
        field.set_value(Value::new(0i32)),
        Err(ReflectError::BadOperation { .. })
    ));
}

#[test]
fn nested_composite_drills_without_copying() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let s1 = view.field("s1");
    assert!(s1.is_valid());
    assert!(s1.has_fields());

    // The drilled subject is the member's own address.
    let sub = s1.value_object().unwrap();
    assert_eq!(sub.as_ptr() as usize, &t.s1 as *const SimpleStruct as usize);

    let a = s1.field("a");
    assert_eq!(*a.get_value().get::<i32>().unwrap(), -38);
    a.set_value(Value::new(7i32)).unwrap();
    assert_eq!(t.s1.a, 7);
}

#[test]
fn trivial_member_width_mismatch_is_bad_size() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let err = view.field("base_int").set_value(Value::new(1i64));
    assert_eq!(err, Err(ReflectError::BadSize { expected: 4, actual: 8 }));
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn value_getter_reads_but_never_drills() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let f = view.field("int_fn");
    assert!(f.is_valid());
    assert!(f.is_readonly());
    assert_eq!(*f.get_value().get::<i32>().unwrap(), 123);

    // A by-value getter yields no object to drill into; the address of a
    // returned temporary would dangle once the call returns.
    assert!(f.value_object().is_none());
    assert!(!f.has_fields());
}

#[test]
fn accessor_with_setter_round_trips() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let f = view.field("int_acc");
    assert!(!f.is_readonly());
    f.set_value(Value::new(777i32)).unwrap();
    assert_eq!(t.base_int, 777);
    assert_eq!(*view.field("int_acc").get_value().get::<i32>().unwrap(), 777);
}

#[test]
fn pointer_getter_drills_to_target() {
    let mut s = SimpleStruct { a: 5, b: 6 };
    let mut t = TestSubject { simple: &mut s, ..TestSubject::default() };
    let view = Reflection::create(&mut t);

    let f = view.field("simple_ptr");
    assert!(f.is_valid());
    let target = f.value_object().unwrap();
    assert_eq!(target.as_ptr() as usize, &s as *const SimpleStruct as usize);

    // And the pointer field drills through its structure wrapper too.
    let a = f.field("a");
    assert!(a.is_valid());
    assert_eq!(*a.get_value().get::<i32>().unwrap(), 5);
}

#[test]
fn null_pointer_field_has_no_children() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let f = view.field("simple");
    assert!(f.is_valid());
    assert!(!f.has_fields());
    assert!(f.fields().is_empty());
    assert!(!f.field("a").is_valid());
}

// ============================================================================
// Base classes
// ============================================================================

#[test]
fn base_members_merge_into_enumeration() {
    let mut t = TestSubject::default();
    t.base.basebase = 99;
    let view = Reflection::create(&mut t);

    // Lookup falls back to the base.
    let bb = view.field("basebase");
    assert!(bb.is_valid());
    assert_eq!(*bb.get_value().get::<i32>().unwrap(), 99);

    // Enumeration lists base members first.
    let names: Vec<String> = view
        .fields()
        .iter()
        .map(|f| f.key.get_or(String::new()))
        .collect();
    assert_eq!(names[0], "basebase");
    assert!(names.contains(&"base_int".to_string()));

    // Base methods resolve too.
    assert!(view.method("base_me").is_some());
    let out = view.method("base_me").unwrap().callable.invoke(vec![]).unwrap();
    assert_eq!(*out.get::<bool>().unwrap(), true);
}

#[test]
fn base_field_write_hits_embedded_base() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    view.field("basebase").set_value(Value::new(41i32)).unwrap();
    assert_eq!(t.base.basebase, 41);
}

// ============================================================================
// Pointer casts through the inheritance oracle
// ============================================================================

#[test]
fn pointer_upcast_and_downcast() {
    registry::get::<Circle>();

    let mut c = Circle { shape: Shape { kind: 1 }, radius: 2.0 };
    let cp: *mut Circle = &mut c;
    let v = Value::new(cp);

    assert!(v.can_cast::<*mut Shape>());
    let sp = v.cast::<*mut Shape>().unwrap();
    assert_eq!(sp as usize, &mut c.shape as *mut Shape as usize);

    // And back down.
    let v2 = Value::new(sp);
    assert!(v2.can_cast::<*mut Circle>());
    let cp2 = v2.cast::<*mut Circle>().unwrap();
    assert_eq!(cp2 as usize, cp as usize);

    // Unrelated pointer target stays uncastable.
    assert!(!v.can_cast::<*mut SimpleStruct>());
    assert!(v.cast::<*mut SimpleStruct>().is_err());
}

#[test]
fn pointer_cast_decays_to_const_target() {
    registry::get::<Circle>();

    let mut c = Circle { shape: Shape { kind: 1 }, radius: 2.0 };
    let v = Value::new(&mut c as *mut Circle);

    let sp = v.cast::<*const Shape>().unwrap();
    assert_eq!(sp as usize, &c.shape as *const Shape as usize);

    // Const source never casts to a mutable target.
    let cv = Value::new(&c as *const Circle);
    assert!(!cv.can_cast::<*mut Shape>());
}

// ============================================================================
// Polymorphic resolution
// ============================================================================

#[test]
fn instance_hook_resolves_dynamic_type() {
    registry::get::<Square>();

    let c = Circle { shape: Shape { kind: 1 }, radius: 1.0 };
    let s = Square { shape: Shape { kind: 2 }, side: 1.0 };

    // Resolution through the embedded base reports the concrete subtype.
    assert_eq!(registry::get_by_instance(&c.shape).permanent_name(), "Circle");
    assert_eq!(registry::get_by_instance(&s.shape).permanent_name(), "Square");

    // A plain root stays itself.
    let plain = Shape { kind: 0 };
    assert_eq!(registry::get_by_instance(&plain).permanent_name(), "Shape");
}

#[test]
fn shared_pointer_type_reports_per_instance_fields() {
    registry::get::<Square>();

    #[derive(Clone)]
    struct Holder {
        shape: *mut Shape,
    }
    impl TypeIdent for Holder {
        fn type_key() -> TypeKey {
            TypeKey::from_name("rt::Holder")
        }
        fn type_name() -> &'static str {
            "Holder"
        }
    }
    impl Reflect for Holder {
        fn build_structure() -> Arc<dyn StructureWrapper> {
            TypeBuilder::<Holder>::new()
                .field("shape", |h: &mut Holder| &mut h.shape)
                .build()
        }
    }

    let mut circle = Circle { shape: Shape { kind: 1 }, radius: 3.0 };
    let mut square = Square { shape: Shape { kind: 2 }, side: 4.0 };

    let mut h1 = Holder { shape: &mut circle.shape };
    let view = Reflection::create(&mut h1);
    let radius = view.field("shape").field("radius");
    assert!(radius.is_valid());
    assert_eq!(*radius.get_value().get::<f32>().unwrap(), 3.0);
    assert!(!view.field("shape").field("side").is_valid());

    let mut h2 = Holder { shape: &mut square.shape };
    let view = Reflection::create(&mut h2);
    let side = view.field("shape").field("side");
    assert!(side.is_valid());
    assert_eq!(*side.get_value().get::<f32>().unwrap(), 4.0);
    assert!(!view.field("shape").field("radius").is_valid());
}

// ============================================================================
// Methods
// ============================================================================

#[test]
fn method_metadata_and_invoke() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    assert!(view.has_methods());
    let method = view.method("sum_method").unwrap();
    assert_eq!(method.key, "sum_method");
    assert_eq!(method.callable.params().len(), 1);
    assert_eq!(method.callable.params()[0].key, i64::type_key());
    assert_eq!(method.callable.return_meta().key, i64::type_key());

    let out = method.callable.invoke(vec![Value::new(7i64)]).unwrap();
    assert_eq!(*out.get::<i64>().unwrap(), 130);
}

#[test]
fn method_arguments_auto_widen() {
    convert::register_numeric_defaults();

    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);
    let method = view.method("sum_method").unwrap();

    // int32 argument widens to the declared int64 parameter.
    let out = method.callable.invoke(vec![Value::new(7i32)]).unwrap();
    assert_eq!(*out.get::<i64>().unwrap(), 130);

    // Unroutable argument types fail with BadCast.
    assert!(matches!(
        method.callable.invoke(vec![Value::new("x".to_string())]),
        Err(ReflectError::BadCast { .. })
    ));

    // Arity is validated before anything runs.
    assert!(matches!(
        method.callable.invoke(vec![]),
        Err(ReflectError::BadOperation { .. })
    ));
}

#[test]
fn missing_method_is_none() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);
    assert!(view.method("no_such_method").is_none());
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn map_fields_in_natural_order() {
    register_ops::<String>();

    let mut m: BTreeMap<String, i32> =
        [("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]
            .into_iter()
            .collect();
    let view = Reflection::create(&mut m);

    assert!(view.has_fields());
    let fields = view.fields();
    assert_eq!(fields.len(), 3);
    let keys: Vec<String> = fields.iter().map(|f| f.key.get_or(String::new())).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);

    assert!(view.field("a").is_valid());
    assert_eq!(*view.field("b").get_value().get::<i32>().unwrap(), 2);
    assert!(!view.field("z").is_valid());
}

#[test]
fn sequence_fields_by_index() {
    let mut v = vec![10i32, 20, 30];
    let view = Reflection::create(&mut v);

    assert!(view.has_fields());
    let fields = view.fields();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1].key.get_or(0usize), 1);

    assert_eq!(*view.field(0usize).get_value().get::<i32>().unwrap(), 10);
    view.field(2usize).set_value(Value::new(33i32)).unwrap();
    assert_eq!(v[2], 33);
    assert!(!view.field(9usize).is_valid());
}

#[test]
fn sequence_editor_capability() {
    let mut v = vec![1i32, 2];

    {
        let view = Reflection::create(&mut v);
        let (editor, subject) = view.editor().expect("sequences are editable");

        assert!(editor.can_add());
        assert!(editor.can_insert());
        assert!(editor.can_remove());
        assert!(editor.can_create_value());
        assert_eq!(*editor.create_value().get::<i32>().unwrap(), 0);

        editor.add_field(&subject, &Value::empty(), Value::new(3i32)).unwrap();
        editor.insert_field(&subject, &Value::new(0usize), Value::new(0i32)).unwrap();
        editor.remove_field(&subject, &Value::new(2usize)).unwrap();
    }

    assert_eq!(v, vec![0, 1, 3]);
}

#[test]
fn map_editor_capability() {
    let mut m: BTreeMap<String, i32> = BTreeMap::new();

    {
        let view = Reflection::create(&mut m);
        let (editor, subject) = view.editor().expect("maps are editable");

        assert!(editor.can_add());
        // Keyed container: positional insertion is not meaningful.
        assert!(!editor.can_insert());
        assert!(matches!(
            editor.insert_field(&subject, &Value::from("x"), Value::new(1i32)),
            Err(ReflectError::BadOperation { .. })
        ));

        editor.add_field(&subject, &Value::from("k"), Value::new(5i32)).unwrap();
        assert!(matches!(
            editor.remove_field(&subject, &Value::from("missing")),
            Err(ReflectError::BadOperation { .. })
        ));
    }

    assert_eq!(m.get("k"), Some(&5));
}

#[test]
fn read_only_composites_expose_no_editor() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);
    // A class wrapper never carries the editor capability.
    assert!(view.editor().is_none());
}

// ============================================================================
// Invalid views
// ============================================================================

#[test]
fn invalid_view_is_defined_no_op() {
    let view = Reflection::invalid();

    assert!(!view.is_valid());
    assert!(view.is_readonly());
    assert!(!view.has_fields());
    assert!(!view.has_methods());
    assert!(view.fields().is_empty());
    assert!(view.methods().is_empty());
    assert!(!view.field("x").is_valid());
    assert!(view.method("x").is_none());
    assert!(view.get_value().is_empty());
    assert!(view.value_object().is_none());
    assert!(matches!(
        view.set_value(Value::new(1i32)),
        Err(ReflectError::BadOperation { .. })
    ));
}

// ============================================================================
// Dump
// ============================================================================

#[test]
fn dump_collapses_at_max_level() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let mut out = Vec::new();
    view.dump(&mut out, 1).unwrap();
    let text = String::from_utf8(out).unwrap();

    // The root expands, the nested struct at level 1 prints collapsed,
    // and nothing below it is reached.
    assert!(text.contains("[-] TestSubject"));
    assert!(text.contains("[+] \"s1\""));
    assert!(text.contains("base_int"));
    assert!(!text.contains("1024"));
}

#[test]
fn dump_expands_below_level_limit() {
    let mut t = TestSubject::default();
    let view = Reflection::create(&mut t);

    let mut out = Vec::new();
    view.dump(&mut out, 3).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("[-] \"s1\""));
    assert!(text.contains("1024"));
}

#[test]
fn dump_terminates_on_cyclic_subjects() {
    let mut n1 = Node { value: 1, next: std::ptr::null_mut() };
    let mut n2 = Node { value: 2, next: std::ptr::null_mut() };
    n1.next = &mut n2;
    n2.next = &mut n1;

    let view = Reflection::create(&mut n1);
    let mut out = Vec::new();
    // Far deeper than the cycle; the visited-set guard must stop the walk.
    view.dump(&mut out, 64).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("[+]"));
    // Both nodes printed, neither an unbounded number of times.
    assert!(text.matches("= 1 ").count() <= 2);
    assert!(text.matches("= 2 ").count() <= 2);
}
