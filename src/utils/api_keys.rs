//! API key loading: env var → .env in dir → secure prompt.

use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use std::path::Path;

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

/// Look up `var` in the environment, then in `dir/.env`.
pub fn key_from_env(dir: &Path, var: &str) -> Option<String> {
    if let Some(s) = std::env::var(var).ok().and_then(non_empty) {
        return Some(s);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        if let Some(s) = std::env::var(var).ok().and_then(non_empty) {
            debug!("{} loaded from {}", var, env_path.display());
            return Some(s);
        }
    }
    None
}

/// Resolve a key: env (`var`) → `.env` in `dir` → `configured` (config file) → secure prompt.
/// With `prompt: false` a missing key resolves to an empty string.
pub fn resolve_key(
    dir: &Path,
    var: &str,
    configured: Option<&str>,
    label: &str,
    prompt: bool,
) -> Result<String> {
    if let Some(s) = key_from_env(dir, var) {
        return Ok(s);
    }
    if let Some(s) = configured.map(str::to_string).and_then(non_empty) {
        return Ok(s);
    }
    if !prompt {
        return Ok(String::new());
    }
    info!("No {} found (set {} or add it to .env)", label, var);
    let tag = format!("[{}]", env!("CARGO_PKG_NAME")).cyan().bold();
    let key = rpassword::prompt_password(format!("{} Enter {}: ", tag, label))
        .with_context(|| format!("read {label}"))?;
    Ok(key.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_key_used_when_env_missing() {
        let dir = std::env::temp_dir();
        let key = resolve_key(
            &dir,
            "WEBSIFT_TEST_UNSET_KEY_1",
            Some("  from-file  "),
            "test key",
            false,
        )
        .unwrap();
        assert_eq!(key, "from-file");
    }

    #[test]
    fn test_missing_key_without_prompt_is_empty() {
        let dir = std::env::temp_dir();
        let key = resolve_key(&dir, "WEBSIFT_TEST_UNSET_KEY_2", None, "test key", false).unwrap();
        assert!(key.is_empty());
    }
}
