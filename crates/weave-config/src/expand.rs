//! Environment variable and home directory expansion for configuration paths.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - a leading `~` - expands to the user's home directory

use crate::ConfigError;

/// Expand environment variable references and a leading `~` in a path string.
///
/// Returns the original string unchanged if neither `${}` nor a leading `~`
/// is present. Bare `$VAR` syntax is not expanded (only `${VAR}` with braces).
pub(crate) fn expand_path(value: &str, field: &str) -> Result<String, ConfigError> {
    let expanded = expand_env(value, field)?;
    if !expanded.starts_with('~') {
        return Ok(expanded);
    }
    Ok(shellexpand::tilde(&expanded).into_owned())
}

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WEAVE_TEST_NOTES", "/srv/notes");
        }
        let result = expand_env("${WEAVE_TEST_NOTES}/daily", "store.base_dir").unwrap();
        assert_eq!(result, "/srv/notes/daily");
        unsafe {
            std::env::remove_var("WEAVE_TEST_NOTES");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("WEAVE_TEST_UNSET");
        }
        let result = expand_env("${WEAVE_TEST_UNSET:-vault}", "store.base_dir").unwrap();
        assert_eq!(result, "vault");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("WEAVE_TEST_MISSING");
        }
        let err = expand_env("${WEAVE_TEST_MISSING}", "store.base_dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("WEAVE_TEST_MISSING"));
        assert!(err.to_string().contains("store.base_dir"));
    }

    #[test]
    fn test_literal_path_unchanged() {
        assert_eq!(expand_path("notes", "store.base_dir").unwrap(), "notes");
        assert_eq!(expand_path("$HOME/notes", "store.base_dir").unwrap(), "$HOME/notes");
    }

    #[test]
    fn test_tilde_keeps_suffix() {
        let result = expand_path("~/notes", "store.base_dir").unwrap();
        assert!(result.ends_with("/notes"));
    }
}
