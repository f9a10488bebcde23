//! Global directed value-conversion table.
//!
//! Conversions are registered per `(from, to)` key pair and resolved with a
//! single map probe — there is no transitive chaining through an
//! intermediate type. **Directionality is not implicit**: registering
//! `(A, B)` does not register `(B, A)`. Call sites that need bidirectional
//! conversion must register both pairs explicitly. That asymmetry is
//! load-bearing behavior, not an oversight.
//!
//! Registration mutates a process-wide table behind a write lock; lookups
//! after the registration phase take read locks only.
//!
//! # Examples
//!
//! ```
//! use reflex_core::{convert, Value};
//!
//! convert::register_default::<i32, i64>();
//!
//! let v = Value::new(5i32);
//! assert_eq!(v.cast::<i64>().unwrap(), 5i64);
//!
//! // No reverse entry was installed.
//! assert!(!Value::new(5i64).can_cast::<i32>());
//! ```

use std::sync::{LazyLock, RwLock};

use rustc_hash::FxHashMap;

use crate::type_key::{TypeIdent, TypeKey};
use crate::value::Value;

type ConvertFn = Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

static CONVERSIONS: LazyLock<RwLock<FxHashMap<(TypeKey, TypeKey), ConvertFn>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Register one directed conversion function.
///
/// Returns `true` when an existing `(From, To)` entry was overwritten.
/// Last registration wins, but an overwrite is usually a configuration
/// smell worth asserting against in tests.
pub fn register<F, T, C>(conv: C) -> bool
where
    F: TypeIdent + Clone,
    T: TypeIdent + Clone,
    C: Fn(&F) -> T + Send + Sync + 'static,
{
    let erased: ConvertFn = Box::new(move |v: &Value| {
        let from = v.get::<F>().ok()?;
        Some(Value::new(conv(from)))
    });

    let mut table = match CONVERSIONS.write() {
        Ok(table) => table,
        Err(_) => return false,
    };
    table
        .insert((F::type_key(), T::type_key()), erased)
        .is_some()
}

/// Install the native widening conversion for one directed pair.
///
/// Uses the target language's lossless widening rule (`From`). The reverse
/// direction is never installed implicitly.
pub fn register_default<F, T>() -> bool
where
    F: TypeIdent + Clone,
    T: TypeIdent + Clone + From<F>,
{
    register::<F, T, _>(|v: &F| T::from(v.clone()))
}

/// Install the standard numeric widening set, each pair in one direction
/// only.
///
/// Covers the integer ladders, unsigned-to-wider-signed crossings, and the
/// value-preserving integer→float and float→float widenings. Integer→float
/// pairs outside `From` coverage (`i32→f32`, `i64→f64`, `u32→f32`,
/// `u64→f64`) follow the native `as` rule.
pub fn register_numeric_defaults() {
    // Signed ladder
    register_default::<i8, i16>();
    register_default::<i8, i32>();
    register_default::<i8, i64>();
    register_default::<i16, i32>();
    register_default::<i16, i64>();
    register_default::<i32, i64>();

    // Unsigned ladder
    register_default::<u8, u16>();
    register_default::<u8, u32>();
    register_default::<u8, u64>();
    register_default::<u16, u32>();
    register_default::<u16, u64>();
    register_default::<u32, u64>();

    // Unsigned into wider signed
    register_default::<u8, i16>();
    register_default::<u8, i32>();
    register_default::<u8, i64>();
    register_default::<u16, i32>();
    register_default::<u16, i64>();
    register_default::<u32, i64>();

    // Into floats
    register_default::<i8, f32>();
    register_default::<i16, f32>();
    register_default::<i32, f64>();
    register_default::<u8, f32>();
    register_default::<u16, f32>();
    register_default::<u32, f64>();
    register_default::<f32, f64>();
    register::<i32, f32, _>(|v| *v as f32);
    register::<i64, f64, _>(|v| *v as f64);
    register::<u32, f32, _>(|v| *v as f32);
    register::<u64, f64, _>(|v| *v as f64);
}

/// Check whether a `(from, to)` conversion is registered.
pub fn has_conversion(from: TypeKey, to: TypeKey) -> bool {
    CONVERSIONS
        .read()
        .map(|table| table.contains_key(&(from, to)))
        .unwrap_or(false)
}

/// Apply the registered conversion from the value's stored type to `to`.
///
/// Single probe; `None` when no entry is registered or the conversion
/// itself declines the payload.
pub fn convert(value: &Value, to: TypeKey) -> Option<Value> {
    let from = value.type_key()?;
    let table = CONVERSIONS.read().ok()?;
    let conv = table.get(&(from, to))?;
    conv(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_pair_converts() {
        register::<u16, u64, _>(|v| u64::from(*v));

        let v = Value::new(9u16);
        let out = convert(&v, u64::type_key()).unwrap();
        assert_eq!(*out.get::<u64>().unwrap(), 9u64);
    }

    #[test]
    fn unregistered_pair_is_none() {
        // No one installs string → bool anywhere.
        let v = Value::new("true".to_string());
        assert!(convert(&v, bool::type_key()).is_none());
        assert!(!has_conversion(String::type_key(), bool::type_key()));
    }

    #[test]
    fn no_transitive_chaining() {
        // u8 → u16 and u16 → u32 do not imply u8 → u32. Register only the
        // two hops and verify the composite is absent.
        register_default::<u8, u16>();
        register_default::<u16, u32>();

        let v = Value::new(3u8);
        // Direct probe on the unregistered composite pair.
        if !has_conversion(u8::type_key(), u32::type_key()) {
            assert!(convert(&v, u32::type_key()).is_none());
        }
    }

    #[test]
    fn overwrite_reports_replacement() {
        assert!(!register::<i16, i8, _>(|v| *v as i8));
        // Second registration of the same pair: last one wins, flagged.
        assert!(register::<i16, i8, _>(|v| (*v).clamp(-128, 127) as i8));
    }

    #[test]
    fn custom_conversion_function() {
        register::<f64, String, _>(|v| format!("{v:.2}"));

        let v = Value::new(3.14159f64);
        let out = convert(&v, String::type_key()).unwrap();
        assert_eq!(out.get::<String>().unwrap(), "3.14");
    }
}
