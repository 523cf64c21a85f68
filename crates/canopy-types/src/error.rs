//! Unified error interface for Canopy.
//!
//! All Canopy error types implement [`ErrorCode`] to provide:
//!
//! - **Machine-readable codes**: for programmatic error handling
//! - **Recoverability info**: for retry logic and user feedback
//!
//! Ordinary dynamic conditions in this runtime are deliberately fail-soft
//! (boolean results, empty substitutions, inert instances); error enums
//! exist only for programmer-error boundaries, and every one of them
//! carries a stable UPPER_SNAKE_CASE code with a crate prefix.

/// Unified error code interface.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**: e.g. `"COMPONENT_UNKNOWN_METHOD"`
/// - **Namespace-prefixed**: `"COMPONENT_"`, `"EVENT_"`, `"TEMPLATE_"`
/// - **Stable**: codes do not change once defined (API contract)
///
/// # Example
///
/// ```
/// use canopy_types::ErrorCode;
///
/// #[derive(Debug)]
/// enum MyError {
///     NotFound(String),
///     Busy,
/// }
///
/// impl ErrorCode for MyError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::NotFound(_) => "MY_NOT_FOUND",
///             Self::Busy => "MY_BUSY",
///         }
///     }
///
///     fn is_recoverable(&self) -> bool {
///         matches!(self, Self::Busy)
///     }
/// }
///
/// assert_eq!(MyError::Busy.code(), "MY_BUSY");
/// assert!(MyError::Busy.is_recoverable());
/// ```
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    ///
    /// - `true`: retry may succeed, or the caller can take corrective action
    /// - `false`: retry will not help, requires a code/config change
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows Canopy conventions.
///
/// # Checks
///
/// 1. Code is UPPER_SNAKE_CASE
/// 2. Code starts with the expected prefix
/// 3. Code is not empty
///
/// # Panics
///
/// Panics with a descriptive message if validation fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");

    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );

    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates multiple error codes at once.
///
/// Use this to verify all variants of an error enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

/// Checks if a string is UPPER_SNAKE_CASE.
fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
