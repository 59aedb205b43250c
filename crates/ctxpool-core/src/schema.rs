//! # Context Schemas
//!
//! The interface descriptor of the broker. A `ContextSchema` is the
//! author-supplied description of a capability interface: its declaring
//! name, the capability family it belongs to, the context tag, and the
//! ordered list of operations.
//!
//! Schemas come from three places:
//! - the `context_interface!` macro (built from the trait's own tokens)
//! - the runtime builder (`ContextSchema::new(..).with_operation(..)`)
//! - serde (the host CLI reads interface catalogs from TOML)
//!
//! Whatever the source, `validate()` is the single gate every schema passes
//! before the broker hashes it.

use crate::primitives::{MAX_OPERATIONS, MAX_PARAMETERS, UNIT_TYPE};
use crate::types::PoolError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CAPABILITY FAMILY
// =============================================================================

/// Capability family an interface belongs to.
///
/// Families only exist for call-site ergonomics (the typed accessors of the
/// pool). They are not part of the fingerprint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ContextFamily {
    /// Contexts published by CPU plugins.
    Cpu,
    /// Contexts published by memory plugins.
    Memory,
    /// Contexts published by device plugins.
    Device,
    /// Contexts published by compiler plugins.
    Compiler,
    /// Contexts outside the four well-known families.
    #[default]
    Generic,
}

impl fmt::Display for ContextFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Device => "device",
            Self::Compiler => "compiler",
            Self::Generic => "generic",
        };
        f.write_str(name)
    }
}

// =============================================================================
// OPERATION SIGNATURE
// =============================================================================

fn unit_type() -> String {
    UNIT_TYPE.to_string()
}

/// Signature of one operation declared by a context interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSig {
    /// Operation name.
    pub name: String,
    /// Return type name; `()` when the operation returns nothing.
    #[serde(default = "unit_type")]
    pub returns: String,
    /// Parameter type names in declaration order (receiver excluded).
    #[serde(default)]
    pub params: Vec<String>,
}

impl OperationSig {
    /// Create a new operation signature.
    #[must_use]
    pub fn new<P, S>(name: impl Into<String>, returns: impl Into<String>, params: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            returns: returns.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// CONTEXT SCHEMA
// =============================================================================

/// Descriptor of a capability interface.
///
/// `interface` is the declaring identity (a trait path, a catalog entry
/// name). It is reported in logs and errors but never hashed, which is what
/// lets two separately declared interfaces share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSchema {
    /// Declaring name of the interface.
    pub interface: String,
    /// Capability family.
    #[serde(default)]
    pub family: ContextFamily,
    /// Context tag. Untagged interfaces cannot be registered.
    #[serde(default)]
    pub context: bool,
    /// State fields. A context interface must be a pure capability and
    /// declare none.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Declared operations, in declaration order.
    #[serde(default, rename = "operation")]
    pub operations: Vec<OperationSig>,
}

impl ContextSchema {
    /// Create a tagged, stateless schema with no operations.
    #[must_use]
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            family: ContextFamily::Generic,
            context: true,
            fields: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Set the capability family.
    #[must_use]
    pub fn with_family(mut self, family: ContextFamily) -> Self {
        self.family = family;
        self
    }

    /// Append an operation.
    #[must_use]
    pub fn with_operation<P, S>(
        mut self,
        name: impl Into<String>,
        returns: impl Into<String>,
        params: P,
    ) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations.push(OperationSig::new(name, returns, params));
        self
    }

    /// Declare a state field, which disqualifies the schema as a context.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Drop the context tag.
    #[must_use]
    pub fn untagged(mut self) -> Self {
        self.context = false;
        self
    }

    /// Check that the schema describes a registrable context interface.
    ///
    /// A schema is valid if:
    /// - the declaring name is non-empty
    /// - it carries the context tag
    /// - it declares no state fields
    /// - every operation has a well-formed name and non-empty,
    ///   bracket-balanced type names
    ///
    /// Returns `PoolError::InvalidContext` naming the first violation.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.interface.trim().is_empty() {
            return Err(PoolError::invalid("interface name is empty"));
        }

        if !self.context {
            return Err(PoolError::invalid(format!(
                "{} is not tagged as a context",
                self.interface
            )));
        }

        if let Some(field) = self.fields.first() {
            return Err(PoolError::invalid(format!(
                "{} is not a pure capability interface (declares field `{}`)",
                self.interface, field
            )));
        }

        if self.operations.len() > MAX_OPERATIONS {
            return Err(PoolError::invalid(format!(
                "{} declares {} operations (limit {})",
                self.interface,
                self.operations.len(),
                MAX_OPERATIONS
            )));
        }

        for op in &self.operations {
            self.validate_operation(op)?;
        }

        Ok(())
    }

    fn validate_operation(&self, op: &OperationSig) -> Result<(), PoolError> {
        if !is_operation_name(&op.name) {
            return Err(PoolError::invalid(format!(
                "{} declares malformed operation name `{}`",
                self.interface, op.name
            )));
        }

        if !is_type_name(&op.returns) {
            return Err(PoolError::invalid(format!(
                "{}::{} has a malformed return type",
                self.interface, op.name
            )));
        }

        if op.params.len() > MAX_PARAMETERS {
            return Err(PoolError::invalid(format!(
                "{}::{} declares too many parameters",
                self.interface, op.name
            )));
        }

        if op.params.iter().any(|p| !is_type_name(p)) {
            return Err(PoolError::invalid(format!(
                "{}::{} has a malformed parameter type",
                self.interface, op.name
            )));
        }

        Ok(())
    }
}

/// Operation names are identifiers: they must not collide with the
/// delimiters of the canonical encoding.
fn is_operation_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Type names must be non-empty, free of `;` and bracket-balanced, with
/// commas only inside `<>`, `()` or `[]`. A top-level comma would read as a
/// parameter boundary in the canonical form.
fn is_type_name(name: &str) -> bool {
    if name.trim().is_empty() || name.contains(';') {
        return false;
    }

    let mut open: Vec<char> = Vec::new();
    let mut previous = None;
    for c in name.chars() {
        let balanced = match c {
            '<' | '(' | '[' => {
                open.push(c);
                true
            }
            // `->` in fn pointer types is not a closing bracket.
            '>' if previous == Some('-') => true,
            '>' => open.pop() == Some('<'),
            ')' => open.pop() == Some('('),
            ']' => open.pop() == Some('['),
            ',' => !open.is_empty(),
            _ => true,
        };
        if !balanced {
            return false;
        }
        if !c.is_whitespace() {
            previous = Some(c);
        }
    }
    open.is_empty()
}

// =============================================================================
// TESTS
// =============================================================================
