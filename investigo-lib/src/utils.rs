//! Utility functions for handle processing and URL templates.

use crate::error::InvestigoError;

/// Placeholder used by the catalog's URL templates.
pub const PLACEHOLDER: &str = "{}";

/// Alternative, more explicit placeholder.
pub const NAMED_PLACEHOLDER: &str = "{handle}";

/// Substitute `handle` into a URL template.
///
/// Only the first placeholder is replaced. `{handle}` is tried before `{}`.
///
/// # Example
///
/// ```rust
/// use investigo_lib::substitute_handle;
///
/// assert_eq!(
///     substitute_handle("https://github.com/{}", "alice"),
///     "https://github.com/alice"
/// );
/// ```
pub fn substitute_handle(template: &str, handle: &str) -> String {
    if template.contains(NAMED_PLACEHOLDER) {
        template.replacen(NAMED_PLACEHOLDER, handle, 1)
    } else {
        template.replacen(PLACEHOLDER, handle, 1)
    }
}

/// Validate a handle before probing.
///
/// Handles are inserted into URL paths, so whitespace and `/` are rejected.
pub fn validate_handle(handle: &str) -> Result<(), InvestigoError> {
    if handle.trim().is_empty() {
        return Err(InvestigoError::invalid_handle(
            handle,
            "Handle cannot be empty",
        ));
    }

    if handle.chars().any(char::is_whitespace) {
        return Err(InvestigoError::invalid_handle(
            handle,
            "Handle cannot contain whitespace",
        ));
    }

    if handle.contains('/') {
        return Err(InvestigoError::invalid_handle(
            handle,
            "Handle cannot contain '/'",
        ));
    }

    Ok(())
}

/// Normalise raw handle inputs.
///
/// Each input may hold several handles separated by whitespace or commas.
/// Empty entries are dropped and duplicates removed, keeping first-seen order.
pub fn expand_handle_inputs(inputs: &[String]) -> Vec<String> {
    let mut handles: Vec<String> = Vec::new();

    for input in inputs {
        for handle in input.split(|c: char| c == ',' || c.is_whitespace()) {
            if handle.is_empty() {
                continue;
            }
            if !handles.iter().any(|h| h == handle) {
                handles.push(handle.to_string());
            }
        }
    }

    handles
}
