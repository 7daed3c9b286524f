//! GitHub login validation.

/// Longest login GitHub accepts.
const MAX_HANDLE_LEN: usize = 39;

/// Returns true if `handle` is shaped like a GitHub login.
///
/// Logins are 1-39 ASCII alphanumerics or single hyphens, and may not
/// start or end with a hyphen.
pub fn is_well_formed_handle(handle: &str) -> bool {
    if handle.is_empty() || handle.len() > MAX_HANDLE_LEN {
        return false;
    }

    if handle.starts_with('-') || handle.ends_with('-') || handle.contains("--") {
        return false;
    }

    handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
