//! # Broker Primitives
//!
//! Fixed constants of the canonical interface encoding and of the
//! credential check. Changing any of the encoding constants changes every
//! fingerprint, so they are compiled in and never configurable.

/// Return type name used for operations that return nothing.
pub const UNIT_TYPE: &str = "()";

/// Separator between the return type and the operation name.
pub const RETURN_SEPARATOR: char = ' ';

/// Opens the parameter list of an operation.
pub const PARAMS_OPEN: char = '(';

/// Terminates every parameter type, including the last one.
pub const PARAM_TERMINATOR: char = ',';

/// Closes the parameter list and terminates the operation.
pub const OPERATION_TERMINATOR: &str = ");";

/// Length of a rendered fingerprint (BLAKE3 is 32 bytes, two hex digits each).
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Maximum number of operations a single context interface may declare.
///
/// Bounds the canonical string so fingerprinting stays cheap.
pub const MAX_OPERATIONS: usize = 512;

/// Maximum number of parameters per operation.
pub const MAX_PARAMETERS: usize = 64;

/// Minimum length of the host secret used to bind the topology.
pub const MIN_CREDENTIAL_LENGTH: usize = 16;
