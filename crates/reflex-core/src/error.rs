//! Unified error type for the value and reflection layers.
//!
//! Failures surface immediately at the call that triggered them. The two
//! explicitly infallible families — probing functions (`can_get`,
//! `can_cast`, `has_fields`, `has_methods`) and default-valued accessors
//! (`get_or`) — never construct these errors; they report `false` or return
//! the default instead.

use thiserror::Error;

/// Errors produced by the value container and the wrapper strategies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReflectError {
    /// Direct `get` called with a type that does not exactly match the
    /// stored type.
    #[error("bad get: requested {requested}, value contains {stored}")]
    BadGet {
        /// Name of the requested type.
        requested: &'static str,
        /// Name of the stored type, or "<empty>".
        stored: String,
    },

    /// `cast` found no direct match, no registered conversion, and no
    /// valid inheritance-based pointer cast.
    #[error("bad cast: no route from {from} to {to}")]
    BadCast {
        /// Name of the stored type, or "<empty>".
        from: String,
        /// Name of the requested type.
        to: &'static str,
    },

    /// An operation unsupported for the stored type, e.g. equality compare
    /// on a type with no registered compare function, or a write through a
    /// read-only wrapper.
    #[error("operation '{op}' not supported for {type_name}")]
    BadOperation {
        /// The operation that was attempted.
        op: &'static str,
        /// Name of the offending type, or "<empty>".
        type_name: String,
    },

    /// Raw byte load/store size mismatch in the direct-member wrapper.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    BadSize {
        /// Byte width of the destination slot.
        expected: usize,
        /// Byte width of the incoming value.
        actual: usize,
    },
}

/// Convenience alias used throughout the runtime.
pub type ReflectResult<T> = Result<T, ReflectError>;
