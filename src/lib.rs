//! Type-erased value container and reflection runtime.
//!
//! `reflex` lets unrelated native data structures be introspected,
//! converted, and mutated generically at run time — no common base type,
//! no compile-time code generation. Four pieces compose the core:
//!
//! - a type-erased [`Value`] that stores anything behind a uniform handle
//!   without losing static type identity,
//! - a global, asymmetric, pairwise [`convert`] table resolved at run time,
//! - a separate pointer-casting path driven by the [`inheritance`] oracle,
//! - wrapper strategy families that turn "enumerate the children of this
//!   composite value" into uniform calls, surfaced through the
//!   [`Reflection`] view.
//!
//! # Quick tour
//!
//! ```
//! use reflex::{Reflect, Reflection, TypeBuilder, TypeIdent, TypeKey, Value};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Default)]
//! struct Player {
//!     health: i32,
//!     name: String,
//! }
//!
//! impl TypeIdent for Player {
//!     fn type_key() -> TypeKey {
//!         TypeKey::from_name("Player")
//!     }
//!     fn type_name() -> &'static str {
//!         "Player"
//!     }
//! }
//!
//! impl Reflect for Player {
//!     fn build_structure() -> Arc<dyn reflex::StructureWrapper> {
//!         TypeBuilder::<Player>::new()
//!             .field("health", |p: &mut Player| &mut p.health)
//!             .field("name", |p: &mut Player| &mut p.name)
//!             .build()
//!     }
//! }
//!
//! let mut player = Player { health: 100, name: "hero".into() };
//! let view = Reflection::create(&mut player);
//!
//! assert!(view.has_fields());
//! let health = view.field("health");
//! assert_eq!(*health.get_value().get::<i32>().unwrap(), 100);
//! health.set_value(Value::new(75i32)).unwrap();
//! assert_eq!(player.health, 75);
//! ```

pub use reflex_core::{
    BoundCallable, Callable, INLINE_CAPACITY, ReflectError, ReflectResult, ReflectedObject,
    TypeIdent, TypeKey, TypeMeta, TypeTraits, Value, convert, inheritance,
    register_incomparable, register_ops,
};

pub use reflex_registry::{
    AccessorWrapper, DumpOptions, Field, FieldWrapper, Method, Reflect, ReflectedType,
    Reflection, SelfWrapper, StructureEditorWrapper, StructureWrapper, StructureWrapperClass,
    StructureWrapperDefault, StructureWrapperMap, StructureWrapperPtr, StructureWrapperVec,
    TypeBuilder, ValueWrapper, default_structure, dump, registry,
};
