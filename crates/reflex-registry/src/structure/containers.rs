//! Container structure wrappers: sequence-by-index and map-by-key.
//!
//! Both carry the editor capability; class wrappers never do.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use reflex_core::{ReflectError, ReflectResult, ReflectedObject, TypeIdent, Value};

use crate::registry;
use crate::reflection::{Field, Reflection};
use crate::structure::{StructureEditorWrapper, StructureWrapper};
use crate::value_wrapper::{FieldWrapper, ValueWrapper};

/// Interpret a field key as a sequence index.
fn key_index(key: &Value) -> Option<usize> {
    if let Ok(v) = key.get::<usize>() {
        return Some(*v);
    }
    if let Ok(v) = key.get::<u64>() {
        return Some(*v as usize);
    }
    if let Ok(v) = key.get::<u32>() {
        return Some(*v as usize);
    }
    if let Ok(v) = key.get::<i64>() {
        return (*v >= 0).then_some(*v as usize);
    }
    if let Ok(v) = key.get::<i32>() {
        return (*v >= 0).then_some(*v as usize);
    }
    None
}

fn editable<T: TypeIdent>(object: &ReflectedObject) -> ReflectResult<()> {
    if object.is_readonly() {
        return Err(ReflectError::BadOperation {
            op: "edit",
            type_name: T::type_name().to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// SequenceByIndex
// ============================================================================

/// Sequence wrapper: children are keyed by `usize` index in order.
pub struct StructureWrapperVec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> StructureWrapperVec<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for StructureWrapperVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StructureWrapperVec<T>
where
    T: TypeIdent + Clone,
{
    fn element(subject: ReflectedObject, index: usize) -> Reflection {
        let wrapper = Arc::new(FieldWrapper::member(move |v: &mut Vec<T>| &mut v[index]));
        Reflection::from_parts(subject, wrapper, registry::get_by_key(T::type_key()))
    }
}

impl<T> StructureWrapper for StructureWrapperVec<T>
where
    T: TypeIdent + Clone,
{
    fn has_fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> bool {
        vw.value_object(object)
            .and_then(|subject| unsafe { subject.deref::<Vec<T>>() }.map(|v| !v.is_empty()))
            .unwrap_or(false)
    }

    fn field(&self, object: &ReflectedObject, vw: &dyn ValueWrapper, key: &Value) -> Reflection {
        let Some(subject) = vw.value_object(object) else {
            return Reflection::invalid();
        };
        let Some(vec) = (unsafe { subject.deref::<Vec<T>>() }) else {
            return Reflection::invalid();
        };
        match key_index(key) {
            Some(index) if index < vec.len() => Self::element(subject, index),
            _ => Reflection::invalid(),
        }
    }

    fn fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> Vec<Field> {
        let Some(subject) = vw.value_object(object) else {
            return Vec::new();
        };
        let Some(vec) = (unsafe { subject.deref::<Vec<T>>() }) else {
            return Vec::new();
        };
        (0..vec.len())
            .map(|index| Field {
                key: Value::new(index),
                reflection: Self::element(subject, index),
            })
            .collect()
    }
}

impl<T> StructureEditorWrapper for StructureWrapperVec<T>
where
    T: TypeIdent + Clone + Default,
{
    fn can_add(&self) -> bool {
        true
    }

    fn can_insert(&self) -> bool {
        true
    }

    fn can_remove(&self) -> bool {
        true
    }

    fn can_create_value(&self) -> bool {
        true
    }

    fn create_value(&self) -> Value {
        Value::new(T::default())
    }

    fn add_field(&self, object: &ReflectedObject, _key: &Value, value: Value) -> ReflectResult<()> {
        editable::<Vec<T>>(object)?;
        let vec = unsafe { object.deref_mut::<Vec<T>>() }.ok_or(ReflectError::BadOperation {
            op: "add_field",
            type_name: <Vec<T>>::type_name().to_string(),
        })?;
        vec.push(value.cast::<T>()?);
        Ok(())
    }

    fn insert_field(
        &self,
        object: &ReflectedObject,
        before: &Value,
        value: Value,
    ) -> ReflectResult<()> {
        editable::<Vec<T>>(object)?;
        let vec = unsafe { object.deref_mut::<Vec<T>>() }.ok_or(ReflectError::BadOperation {
            op: "insert_field",
            type_name: <Vec<T>>::type_name().to_string(),
        })?;
        let index = key_index(before).ok_or(ReflectError::BadOperation {
            op: "insert_field",
            type_name: <Vec<T>>::type_name().to_string(),
        })?;
        if index > vec.len() {
            return Err(ReflectError::BadOperation {
                op: "insert_field",
                type_name: <Vec<T>>::type_name().to_string(),
            });
        }
        vec.insert(index, value.cast::<T>()?);
        Ok(())
    }

    fn remove_field(&self, object: &ReflectedObject, key: &Value) -> ReflectResult<()> {
        editable::<Vec<T>>(object)?;
        let vec = unsafe { object.deref_mut::<Vec<T>>() }.ok_or(ReflectError::BadOperation {
            op: "remove_field",
            type_name: <Vec<T>>::type_name().to_string(),
        })?;
        match key_index(key) {
            Some(index) if index < vec.len() => {
                vec.remove(index);
                Ok(())
            }
            _ => Err(ReflectError::BadOperation {
                op: "remove_field",
                type_name: <Vec<T>>::type_name().to_string(),
            }),
        }
    }
}

// ============================================================================
// MapByKey
// ============================================================================

/// Associative wrapper: children are keyed by `String` in the container's
/// natural iteration order.
pub struct StructureWrapperMap<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> StructureWrapperMap<V> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<V> Default for StructureWrapperMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> StructureWrapperMap<V>
where
    V: TypeIdent + Clone + Default,
{
    fn entry(subject: ReflectedObject, name: String) -> Reflection {
        let wrapper = Arc::new(FieldWrapper::member(move |m: &mut BTreeMap<String, V>| {
            // Presence was checked at lookup; a concurrently removed key
            // resurfaces as a default entry rather than a panic.
            m.entry(name.clone()).or_default()
        }));
        Reflection::from_parts(subject, wrapper, registry::get_by_key(V::type_key()))
    }
}

impl<V> StructureWrapper for StructureWrapperMap<V>
where
    V: TypeIdent + Clone + Default,
{
    fn has_fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> bool {
        vw.value_object(object)
            .and_then(|subject| {
                unsafe { subject.deref::<BTreeMap<String, V>>() }.map(|m| !m.is_empty())
            })
            .unwrap_or(false)
    }

    fn field(&self, object: &ReflectedObject, vw: &dyn ValueWrapper, key: &Value) -> Reflection {
        let Some(subject) = vw.value_object(object) else {
            return Reflection::invalid();
        };
        let Some(map) = (unsafe { subject.deref::<BTreeMap<String, V>>() }) else {
            return Reflection::invalid();
        };
        let Ok(name) = key.get::<String>() else {
            return Reflection::invalid();
        };
        if !map.contains_key(name) {
            return Reflection::invalid();
        }
        Self::entry(subject, name.clone())
    }

    fn fields(&self, object: &ReflectedObject, vw: &dyn ValueWrapper) -> Vec<Field> {
        let Some(subject) = vw.value_object(object) else {
            return Vec::new();
        };
        let Some(map) = (unsafe { subject.deref::<BTreeMap<String, V>>() }) else {
            return Vec::new();
        };
        map.keys()
            .map(|name| Field {
                key: Value::from(name.as_str()),
                reflection: Self::entry(subject, name.clone()),
            })
            .collect()
    }
}

impl<V> StructureEditorWrapper for StructureWrapperMap<V>
where
    V: TypeIdent + Clone + Default,
{
    fn can_add(&self) -> bool {
        true
    }

    // Keyed container: positional insertion is not meaningful.
    fn can_insert(&self) -> bool {
        false
    }

    fn can_remove(&self) -> bool {
        true
    }

    fn can_create_value(&self) -> bool {
        true
    }

    fn create_value(&self) -> Value {
        Value::new(V::default())
    }

    fn add_field(&self, object: &ReflectedObject, key: &Value, value: Value) -> ReflectResult<()> {
        editable::<BTreeMap<String, V>>(object)?;
        let map = unsafe { object.deref_mut::<BTreeMap<String, V>>() }.ok_or(
            ReflectError::BadOperation {
                op: "add_field",
                type_name: <BTreeMap<String, V>>::type_name().to_string(),
            },
        )?;
        let name = key
            .get::<String>()
            .map_err(|_| ReflectError::BadOperation {
                op: "add_field",
                type_name: <BTreeMap<String, V>>::type_name().to_string(),
            })?
            .clone();
        map.insert(name, value.cast::<V>()?);
        Ok(())
    }

    fn insert_field(
        &self,
        _object: &ReflectedObject,
        _before: &Value,
        _value: Value,
    ) -> ReflectResult<()> {
        Err(ReflectError::BadOperation {
            op: "insert_field",
            type_name: <BTreeMap<String, V>>::type_name().to_string(),
        })
    }

    fn remove_field(&self, object: &ReflectedObject, key: &Value) -> ReflectResult<()> {
        editable::<BTreeMap<String, V>>(object)?;
        let map = unsafe { object.deref_mut::<BTreeMap<String, V>>() }.ok_or(
            ReflectError::BadOperation {
                op: "remove_field",
                type_name: <BTreeMap<String, V>>::type_name().to_string(),
            },
        )?;
        let name = key.get::<String>().map_err(|_| ReflectError::BadOperation {
            op: "remove_field",
            type_name: <BTreeMap<String, V>>::type_name().to_string(),
        })?;
        if map.remove(name).is_none() {
            return Err(ReflectError::BadOperation {
                op: "remove_field",
                type_name: <BTreeMap<String, V>>::type_name().to_string(),
            });
        }
        Ok(())
    }
}
