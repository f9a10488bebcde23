//! Type-erased callable descriptors.
//!
//! A [`Callable`] wraps a native method behind a uniform invoke surface
//! while keeping enough metadata — parameter and return identity records —
//! for a caller to validate arity and types before invoking. Arguments
//! whose type does not match the declared parameter are auto-widened
//! through the conversion registry at the call site; an argument with no
//! route fails the invocation with `BadCast`.
//!
//! [`BoundCallable`] is a callable bound to one subject, as produced by
//! method lookup on a reflection view.

use std::sync::Arc;

use crate::error::{ReflectError, ReflectResult};
use crate::object::ReflectedObject;
use crate::type_key::{TypeIdent, TypeMeta};
use crate::value::Value;

type InvokeFn = dyn Fn(&ReflectedObject, Vec<Value>) -> ReflectResult<Value> + Send + Sync;

/// A type-erased native method with invoke metadata.
#[derive(Clone)]
pub struct Callable {
    params: Vec<TypeMeta>,
    ret: TypeMeta,
    inner: Arc<InvokeFn>,
}

impl Callable {
    /// Identity records of the declared parameters, in order.
    pub fn params(&self) -> &[TypeMeta] {
        &self.params
    }

    /// Identity record of the return type.
    pub fn return_meta(&self) -> TypeMeta {
        self.ret
    }

    /// Invoke against a subject.
    ///
    /// Arity mismatch is `BadOperation`; an argument that neither matches
    /// its parameter nor has a cast route to it is `BadCast`.
    pub fn invoke(&self, object: &ReflectedObject, args: Vec<Value>) -> ReflectResult<Value> {
        if args.len() != self.params.len() {
            return Err(ReflectError::BadOperation {
                op: "invoke",
                type_name: format!("expected {} arguments, got {}", self.params.len(), args.len()),
            });
        }

        let mut widened = Vec::with_capacity(args.len());
        for (arg, param) in args.into_iter().zip(self.params.iter()) {
            if arg.type_key() == Some(param.key) {
                widened.push(arg);
            } else if let Some(converted) = crate::convert::convert(&arg, param.key) {
                widened.push(converted);
            } else {
                return Err(ReflectError::BadCast {
                    from: arg
                        .type_meta()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "<empty>".to_string()),
                    to: param.name,
                });
            }
        }

        (self.inner)(object, widened)
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callable(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

macro_rules! impl_callable_ctor {
    ($name:ident $(, $arg:ident)*) => {
        /// Wrap a typed method into a callable descriptor.
        #[allow(non_snake_case, unused_variables, unused_mut)]
        pub fn $name<C, R, F $(, $arg)*>(f: F) -> Callable
        where
            C: TypeIdent,
            R: TypeIdent + Clone,
            F: Fn(&mut C $(, $arg)*) -> R + Send + Sync + 'static,
            $($arg: TypeIdent + Clone,)*
        {
            let inner = move |object: &ReflectedObject, args: Vec<Value>| -> ReflectResult<Value> {
                let mut it = args.into_iter();
                $(
                    let $arg: $arg = it
                        .next()
                        .ok_or(ReflectError::BadOperation {
                            op: "invoke",
                            type_name: C::type_name().to_string(),
                        })?
                        .cast::<$arg>()?;
                )*
                let subject = unsafe { object.deref_mut::<C>() }.ok_or(
                    ReflectError::BadOperation {
                        op: "invoke",
                        type_name: C::type_name().to_string(),
                    },
                )?;
                Ok(Value::new(f(subject $(, $arg)*)))
            };

            Callable {
                params: vec![$(TypeMeta::of::<$arg>()),*],
                ret: TypeMeta::of::<R>(),
                inner: Arc::new(inner),
            }
        }
    };
}

impl Callable {
    impl_callable_ctor!(from_method0);
    impl_callable_ctor!(from_method1, A1);
    impl_callable_ctor!(from_method2, A1, A2);
    impl_callable_ctor!(from_method3, A1, A2, A3);
    impl_callable_ctor!(from_method4, A1, A2, A3, A4);
}

/// A callable bound to one subject.
#[derive(Clone, Debug)]
pub struct BoundCallable {
    callable: Callable,
    object: ReflectedObject,
}

impl BoundCallable {
    /// Bind a callable to a subject.
    pub fn bind(callable: Callable, object: ReflectedObject) -> Self {
        Self { callable, object }
    }

    /// Identity records of the declared parameters.
    pub fn params(&self) -> &[TypeMeta] {
        self.callable.params()
    }

    /// Identity record of the return type.
    pub fn return_meta(&self) -> TypeMeta {
        self.callable.return_meta()
    }

    /// Whether the bound subject is still addressable.
    pub fn is_valid(&self) -> bool {
        self.object.is_valid()
    }

    /// Invoke against the bound subject.
    pub fn invoke(&self, args: Vec<Value>) -> ReflectResult<Value> {
        self.callable.invoke(&self.object, args)
    }
}
