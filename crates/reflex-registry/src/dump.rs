//! Presentation-only dump facility.
//!
//! Walks a [`Reflection`] tree to text. Rendering goes through per-type
//! printer tables — one for plain values, one for pointer values — each
//! with a catch-all entry keyed by the `void` type key. Nodes at depths
//! below the level limit recurse into children and print an expanded
//! marker (`[-]`); nodes at the limit print collapsed (`[+]`).
//!
//! Cyclic subject graphs terminate: the walk keeps a visited set of
//! subject addresses along the current path and prints a revisited
//! ancestor collapsed instead of recursing.

use std::io::{self, Write};
use std::sync::{LazyLock, RwLock};

use rustc_hash::{FxHashMap, FxHashSet};

use reflex_core::{TypeIdent, TypeKey, Value};

use crate::reflection::Reflection;

/// Renders one boxed value to text.
pub type PrinterFn = fn(&Value) -> String;

/// Formatting knobs for [`dump`].
pub struct DumpOptions {
    /// Nodes at depths below this recurse; deeper nodes print collapsed.
    pub max_level: usize,
    /// Indentation fill character.
    pub fill: char,
    /// Column width of the name cell.
    pub name_width: usize,
    /// Column width of the value cell.
    pub value_width: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            max_level: 4,
            fill: ' ',
            name_width: 24,
            value_width: 24,
        }
    }
}

// ============================================================================
// Printer tables
// ============================================================================

fn print_display<T: TypeIdent + Clone + std::fmt::Display>(v: &Value) -> String {
    match v.get::<T>() {
        Ok(x) => x.to_string(),
        Err(_) => "?".to_string(),
    }
}

fn print_quoted(v: &Value) -> String {
    match v.get::<String>() {
        Ok(s) => format!("\"{s}\""),
        Err(_) => "?".to_string(),
    }
}

fn print_unknown_value(_: &Value) -> String {
    "<...>".to_string()
}

fn print_pointer_address(v: &Value) -> String {
    match v.pointer_bits() {
        Some(0) => "null".to_string(),
        Some(addr) => format!("{addr:#x}"),
        None => "?".to_string(),
    }
}

static VALUE_PRINTERS: LazyLock<RwLock<FxHashMap<TypeKey, PrinterFn>>> = LazyLock::new(|| {
    let mut table = FxHashMap::default();

    macro_rules! preregister {
        ($($ty:ty),* $(,)?) => {
            $(
                table.insert(<$ty as TypeIdent>::type_key(), print_display::<$ty> as PrinterFn);
            )*
        };
    }

    preregister!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, char);

    table.insert(String::type_key(), print_quoted as PrinterFn);

    // Catch-all "unknown" entry, keyed by the void type.
    table.insert(<()>::type_key(), print_unknown_value as PrinterFn);

    RwLock::new(table)
});

static POINTER_PRINTERS: LazyLock<RwLock<FxHashMap<TypeKey, PrinterFn>>> = LazyLock::new(|| {
    let mut table = FxHashMap::default();
    // Catch-all prints the raw address.
    table.insert(<()>::type_key(), print_pointer_address as PrinterFn);
    RwLock::new(table)
});

/// Register a printer for plain values of `T`. Last registration wins.
pub fn register_value_printer<T: TypeIdent>(printer: PrinterFn) {
    if let Ok(mut table) = VALUE_PRINTERS.write() {
        table.insert(T::type_key(), printer);
    }
}

/// Register a printer for pointers whose pointee is `T`. Last registration
/// wins.
pub fn register_pointer_printer<T: TypeIdent>(printer: PrinterFn) {
    if let Ok(mut table) = POINTER_PRINTERS.write() {
        table.insert(T::type_key(), printer);
    }
}

/// Render one boxed value through the printer tables.
pub fn print_value(v: &Value) -> String {
    let Some(meta) = v.type_meta() else {
        return "<empty>".to_string();
    };

    let (table, key) = if meta.is_pointer() {
        (&POINTER_PRINTERS, meta.pointee.unwrap_or(TypeKey::EMPTY))
    } else {
        (&VALUE_PRINTERS, meta.key)
    };

    let Ok(table) = table.read() else {
        return "?".to_string();
    };
    let printer = table
        .get(&key)
        .or_else(|| table.get(&<()>::type_key()))
        .copied();
    match printer {
        Some(printer) => printer(v),
        None => "?".to_string(),
    }
}

// ============================================================================
// Tree walk
// ============================================================================

/// Dump a reflection tree as text.
pub fn dump(view: &Reflection, out: &mut dyn Write, options: &DumpOptions) -> io::Result<()> {
    let root_label = view
        .reflected_type()
        .map(|rtype| rtype.permanent_name().to_string())
        .unwrap_or_else(|| "<root>".to_string());
    let mut visited = FxHashSet::default();
    dump_node(out, &root_label, view, 0, options, &mut visited)
}

fn dump_node(
    out: &mut dyn Write,
    label: &str,
    view: &Reflection,
    level: usize,
    options: &DumpOptions,
    visited: &mut FxHashSet<usize>,
) -> io::Result<()> {
    let value = view.get_value();
    let has_children = view.has_fields();
    let address = view.value_object().map(|o| o.as_ptr() as usize);

    let revisited = address.map(|a| visited.contains(&a)).unwrap_or(false);
    let expand = has_children && level < options.max_level && !revisited;

    let marker = if has_children {
        if expand { "[-] " } else { "[+] " }
    } else {
        "    "
    };

    let indent: String = std::iter::repeat(options.fill).take(level * 2).collect();
    let type_name = match view.value_meta() {
        Some(meta) => meta.to_string(),
        None => "?".to_string(),
    };

    writeln!(
        out,
        "{indent}{marker}{label:<name_w$} = {value:<value_w$} ({type_name})",
        label = label,
        value = print_value(&value),
        name_w = options.name_width,
        value_w = options.value_width,
    )?;

    if expand {
        if let Some(a) = address {
            visited.insert(a);
        }
        for field in view.fields() {
            let key_label = print_value(&field.key);
            dump_node(out, &key_label, &field.reflection, level + 1, options, visited)?;
        }
        if let Some(a) = address {
            visited.remove(&a);
        }
    }

    Ok(())
}
