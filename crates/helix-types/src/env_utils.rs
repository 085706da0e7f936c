//! Environment variable parsing utilities.
//!
//! This module provides type-safe utilities for parsing environment variables
//! with default values, eliminating repeated boilerplate patterns like:
//!
//! ```ignore
//! std::env::var("VAR_NAME")
//!     .ok()
//!     .and_then(|v| v.parse::<u64>().ok())
//!     .unwrap_or(default_value)
//! ```
//!
//! # Example
//!
//! ```
//! use helix_types::env_utils::{env_var, env_var_or};
//!
//! // Parse with default value
//! let poll_ms: u64 = env_var_or("HELIX_POLL_INTERVAL_MS", 500);
//!
//! // Parse returning Option
//! let batch: Option<u32> = env_var("HELIX_MAX_BATCH_SIZE");
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
///
/// # Example
///
/// ```
/// use helix_types::env_utils::env_var;
///
/// let value: Option<u64> = env_var("HELIX_PROBE_TIMEOUT_MS");
/// ```
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Parse an environment variable with a default value.
///
/// Returns the default if the variable is not set or cannot be parsed.
///
/// # Example
///
/// ```
/// use helix_types::env_utils::env_var_or;
///
/// let timeout: u64 = env_var_or("HELIX_PROBE_TIMEOUT_MS", 2000);
/// let batch: u32 = env_var_or("HELIX_MAX_BATCH_SIZE", 4);
/// ```
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Check if an environment variable is set to a truthy value.
///
/// Returns `true` if the variable is set to "1", "true", "yes", or "on"
/// (case-insensitive). Returns `false` otherwise.
///
/// # Example
///
/// ```
/// use helix_types::env_utils::env_bool;
///
/// let verbose = env_bool("HELIX_VERBOSE");
/// ```
pub fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Check if an environment variable is set to a truthy value, with a default.
///
/// # Example
///
/// ```
/// use helix_types::env_utils::env_bool_or;
///
/// // Default to true if not set
/// let repopulate = env_bool_or("HELIX_REPOPULATE_REMOTE_CACHE", true);
/// ```
pub fn env_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key).ok() {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

/// Get an environment variable as a string with a default value.
///
/// # Example
///
/// ```
/// use helix_types::env_utils::env_string_or;
///
/// let endpoint = env_string_or("HELIX_CACHE_ENDPOINT", "http://localhost:9090");
/// ```
pub fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parsing() {
        std::env::set_var("HELIX_TEST_U64", "42");
        let val: Option<u64> = env_var("HELIX_TEST_U64");
        assert_eq!(val, Some(42));

        let missing: Option<u64> = env_var("HELIX_NONEXISTENT_12345");
        assert_eq!(missing, None);

        std::env::remove_var("HELIX_TEST_U64");
    }

    #[test]
    fn test_env_var_or() {
        std::env::set_var("HELIX_TEST_WITH_DEFAULT", "100");
        let val: u64 = env_var_or("HELIX_TEST_WITH_DEFAULT", 50);
        assert_eq!(val, 100);

        let default_val: u64 = env_var_or("HELIX_NONEXISTENT_12346", 50);
        assert_eq!(default_val, 50);

        std::env::remove_var("HELIX_TEST_WITH_DEFAULT");
    }

    #[test]
    fn test_env_bool() {
        std::env::set_var("HELIX_TEST_BOOL_TRUE", "true");
        std::env::set_var("HELIX_TEST_BOOL_1", "1");
        std::env::set_var("HELIX_TEST_BOOL_YES", "YES");
        std::env::set_var("HELIX_TEST_BOOL_FALSE", "false");

        assert!(env_bool("HELIX_TEST_BOOL_TRUE"));
        assert!(env_bool("HELIX_TEST_BOOL_1"));
        assert!(env_bool("HELIX_TEST_BOOL_YES"));
        assert!(!env_bool("HELIX_TEST_BOOL_FALSE"));
        assert!(!env_bool("HELIX_NONEXISTENT_12347"));

        std::env::remove_var("HELIX_TEST_BOOL_TRUE");
        std::env::remove_var("HELIX_TEST_BOOL_1");
        std::env::remove_var("HELIX_TEST_BOOL_YES");
        std::env::remove_var("HELIX_TEST_BOOL_FALSE");
    }

    #[test]
    fn test_env_bool_or_default() {
        assert!(env_bool_or("HELIX_NONEXISTENT_12348", true));
        assert!(!env_bool_or("HELIX_NONEXISTENT_12348", false));
    }

    #[test]
    fn test_env_string_or() {
        std::env::set_var("HELIX_TEST_STRING", "hello");
        assert_eq!(env_string_or("HELIX_TEST_STRING", "default"), "hello");
        assert_eq!(env_string_or("HELIX_NONEXISTENT_12349", "default"), "default");
        std::env::remove_var("HELIX_TEST_STRING");
    }
}
