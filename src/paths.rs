//! XDG-style path utilities for configuration and cache directories.
//!
//! Paths follow XDG Base Directory conventions on every platform rather
//! than the OS-specific locations `dirs` would pick.

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "subtl";

/// Returns the configuration directory for subtl.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/subtl` if `XDG_CONFIG_HOME` is set
/// 2. `~/.config/subtl` otherwise
pub fn config_dir() -> Result<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Returns the cache directory for subtl.
///
/// Resolution order:
/// 1. `$XDG_CACHE_HOME/subtl` if `XDG_CACHE_HOME` is set
/// 2. `~/.cache/subtl` otherwise
pub fn cache_dir() -> Result<PathBuf> {
    xdg_dir("XDG_CACHE_HOME", ".cache")
}

fn xdg_dir(var: &str, home_fallback: &str) -> Result<PathBuf> {
    match std::env::var_os(var) {
        Some(base) if !base.is_empty() => Ok(PathBuf::from(base).join(APP_DIR)),
        _ => {
            let home = dirs::home_dir().context("Failed to determine home directory")?;
            Ok(home.join(home_fallback).join(APP_DIR))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_var<T>(name: &str, value: Option<&str>, f: impl FnOnce() -> T) -> T {
        let original = std::env::var(name).ok();
        match value {
            Some(v) => unsafe { std::env::set_var(name, v) },
            None => unsafe { std::env::remove_var(name) },
        }

        let result = f();

        match original {
            Some(val) => unsafe { std::env::set_var(name, val) },
            None => unsafe { std::env::remove_var(name) },
        }
        result
    }

    #[test]
    #[serial]
    fn test_config_dir_default() {
        let dir = with_var("XDG_CONFIG_HOME", None, config_dir).unwrap();
        assert!(dir.ends_with(".config/subtl"));
    }

    #[test]
    #[serial]
    fn test_config_dir_xdg_override() {
        let dir = with_var("XDG_CONFIG_HOME", Some("/custom/config"), config_dir).unwrap();
        assert_eq!(dir, PathBuf::from("/custom/config/subtl"));
    }

    #[test]
    #[serial]
    fn test_empty_xdg_value_falls_back_to_home() {
        let dir = with_var("XDG_CACHE_HOME", Some(""), cache_dir).unwrap();
        assert!(dir.ends_with(".cache/subtl"));
    }

    #[test]
    #[serial]
    fn test_cache_dir_xdg_override() {
        let dir = with_var("XDG_CACHE_HOME", Some("/custom/cache"), cache_dir).unwrap();
        assert_eq!(dir, PathBuf::from("/custom/cache/subtl"));
    }
}
