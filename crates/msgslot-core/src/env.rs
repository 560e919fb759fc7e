//! Environment variable utilities
//!
//! Typed lookups with defaults, used by logging and device configuration.
//!
//! ```ignore
//! use msgslot_core::env::{env_get, env_get_bool};
//!
//! let major: u32 = env_get("MSGSLOT_MAJOR", 235);
//! let dump: bool = env_get_bool("MSGSLOT_DUMP_TREES", false);
//! ```

use std::str::FromStr;

/// Parse `key` as `T`, falling back to `default` when unset or unparsable
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Boolean lookup
///
/// "1", "true", "yes", "on" (any case) are true; any other set value is
/// false. Unset returns `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// `Some(T)` if `key` is set and parses
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[inline]
pub fn env_is_set(key: &str) -> bool {
    std::env::var_os(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_defaults() {
        let val: usize = env_get("__MSGSLOT_TEST_UNSET__", 42);
        assert_eq!(val, 42);
        assert!(env_get_bool("__MSGSLOT_TEST_UNSET__", true));
        assert!(env_get_opt::<u32>("__MSGSLOT_TEST_UNSET__").is_none());
        assert_eq!(env_get_str("__MSGSLOT_TEST_UNSET__", "x"), "x");
        assert!(!env_is_set("__MSGSLOT_TEST_UNSET__"));
    }

    #[test]
    fn test_parse_set_value() {
        std::env::set_var("__MSGSLOT_TEST_NUM__", " 235 ");
        assert_eq!(env_get::<u32>("__MSGSLOT_TEST_NUM__", 0), 235);
        std::env::set_var("__MSGSLOT_TEST_NUM__", "many");
        assert_eq!(env_get::<u32>("__MSGSLOT_TEST_NUM__", 9), 9);
        std::env::remove_var("__MSGSLOT_TEST_NUM__");
    }

    #[test]
    fn test_bool_variants() {
        for (raw, want) in [("1", true), ("YES", true), ("on", true), ("0", false), ("nah", false)] {
            std::env::set_var("__MSGSLOT_TEST_BOOL__", raw);
            assert_eq!(env_get_bool("__MSGSLOT_TEST_BOOL__", !want), want, "{}", raw);
        }
        std::env::remove_var("__MSGSLOT_TEST_BOOL__");
    }
}
