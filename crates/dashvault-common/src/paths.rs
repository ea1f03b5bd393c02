//! Path-component validation for request-derived names.
//!
//! Event identifiers and subfolder names arrive from URLs and end up in
//! filesystem paths, so they are restricted to a conservative character set
//! before any path is built from them.

use crate::error::{Error, Result};

/// Maximum accepted length for a single path component.
const MAX_COMPONENT_LEN: usize = 128;

/// Check whether a string is safe to use as a single path component.
///
/// Accepts ASCII alphanumerics plus `-`, `_`, and `.`, rejecting empty
/// strings, separators, and anything that could traverse (`.`, `..`, or a
/// leading dot).
pub fn is_safe_component(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_COMPONENT_LEN {
        return false;
    }
    if s.starts_with('.') {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Validate a request-supplied path component, returning it on success.
pub fn validate_component(s: &str) -> Result<&str> {
    if is_safe_component(s) {
        Ok(s)
    } else {
        Err(Error::invalid_input(format!("unsafe path component: {s:?}")))
    }
}
