//! # Fingerprint Hasher
//!
//! Derives the structural identity of a context interface.
//!
//! The canonical form of a schema is its operations, sorted by name, each
//! rendered as `"<return> <name>(<param>,<param>,);"` and concatenated.
//! The fingerprint is the upper-case hex BLAKE3 digest of that string.
//!
//! Only the shape of the interface contributes: the declaring name and the
//! capability family are left out, so two plugins compiled
//! against separate copies of the same interface agree on its fingerprint.

use crate::primitives::{
    OPERATION_TERMINATOR, PARAM_TERMINATOR, PARAMS_OPEN, RETURN_SEPARATOR, UNIT_TYPE,
};
use crate::schema::{ContextSchema, OperationSig};
use crate::types::{Fingerprint, PoolError};
use std::fmt::Write;

/// Compute the fingerprint of a schema.
///
/// Fails with `PoolError::InvalidContext` if the schema does not describe a
/// registrable context; nothing is hashed in that case.
pub fn fingerprint(schema: &ContextSchema) -> Result<Fingerprint, PoolError> {
    schema.validate()?;
    Ok(digest(&canonical_form(schema)))
}

/// Render the canonical string of a schema.
///
/// Does not validate; use `fingerprint` to get a checked identity.
#[must_use]
pub fn canonical_form(schema: &ContextSchema) -> String {
    let mut rendered: Vec<(&str, String)> = schema
        .operations
        .iter()
        .map(|op| (op.name.as_str(), render_operation(op)))
        .collect();
    // Name first keeps the order independent of declaration order; the full
    // rendering breaks ties between overloads.
    rendered.sort();
    rendered.into_iter().map(|(_, op)| op).collect()
}

/// Normalize a type name for hashing.
///
/// Whitespace is only significant between two identifier characters
/// (`&mut T` is not `&mutT`), where a run of it collapses to one space.
/// Everywhere else it is dropped, so `& [u8]` and `&[u8]` are the same type.
/// An empty name stands for the unit type.
#[must_use]
pub fn normalize_type_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last = None;
    let mut gap = false;
    for c in name.chars() {
        if c.is_whitespace() {
            gap = true;
            continue;
        }
        if gap && last.is_some_and(is_ident_char) && is_ident_char(c) {
            normalized.push(' ');
        }
        gap = false;
        last = Some(c);
        normalized.push(c);
    }

    if normalized.is_empty() {
        UNIT_TYPE.to_string()
    } else {
        normalized
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn render_operation(op: &OperationSig) -> String {
    let mut out = String::new();
    out.push_str(&normalize_type_name(&op.returns));
    out.push(RETURN_SEPARATOR);
    out.push_str(&op.name);
    out.push(PARAMS_OPEN);
    for param in &op.params {
        out.push_str(&normalize_type_name(param));
        out.push(PARAM_TERMINATOR);
    }
    out.push_str(OPERATION_TERMINATOR);
    out
}

fn digest(canonical: &str) -> Fingerprint {
    let hash = blake3::hash(canonical.as_bytes());
    let mut hex = String::with_capacity(blake3::OUT_LEN * 2);
    for byte in hash.as_bytes() {
        // Writing into a String cannot fail.
        let _ = write!(hex, "{:02X}", byte);
    }
    Fingerprint::from_hex(hex)
}

// =============================================================================
// TESTS
// =============================================================================
