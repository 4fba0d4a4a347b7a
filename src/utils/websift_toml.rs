//! Load `.websift.toml` from a directory (CLI only). Lib callers pass a
//! [`ServiceConfig`] and [`RunOpts`](crate::RunOpts) directly.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::engine::cli::Settings;
use crate::utils::config::{PackagePaths, ServiceConfig};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WebsiftToml {
    #[serde(default)]
    services: ServicesSection,
    #[serde(default)]
    run: RunSection,
}

#[derive(Debug, Default, Deserialize)]
struct ServicesSection {
    search_endpoint: Option<String>,
    search_key: Option<String>,
    vision_endpoint: Option<String>,
    vision_key: Option<String>,
    /// Seconds; 0 disables the timeout.
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RunSection {
    page_size: Option<u32>,
    max_concurrency: Option<usize>,
    display_width: Option<f64>,
    display_height: Option<f64>,
    verbose: Option<bool>,
}

impl WebsiftToml {
    pub(crate) fn search_key(&self) -> Option<&str> {
        self.services.search_key.as_deref()
    }

    pub(crate) fn vision_key(&self) -> Option<&str> {
        self.services.vision_key.as_deref()
    }
}

/// Load the config file from `dir` if present. Returns None if missing or unreadable.
pub(crate) fn load_websift_toml(dir: &Path) -> Option<WebsiftToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_websift_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_websift_toml(s: &str) -> Result<WebsiftToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $target:expr, $sec_field:ident => $target_field:ident) => {
        if let Some(ref v) = $sec.$sec_field {
            $target.$target_field = v.clone();
        }
    };
}

/// Apply the `[services]` table (endpoints, timeout, agent). Keys are resolved separately so
/// the environment can take precedence.
pub(crate) fn apply_file_to_config(file: &WebsiftToml, config: &mut ServiceConfig) {
    let sec = &file.services;
    apply_file_opt!(sec, config, search_endpoint => search_endpoint);
    apply_file_opt!(sec, config, vision_endpoint => vision_endpoint);
    apply_file_opt!(sec, config, user_agent => user_agent);
    if let Some(secs) = sec.timeout_secs {
        config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
}

/// Apply the `[run]` table. Call before applying CLI flags.
pub(crate) fn apply_file_to_settings(file: &WebsiftToml, settings: &mut Settings) {
    let sec = &file.run;
    apply_file_opt!(sec, settings, page_size => page_size);
    apply_file_opt!(sec, settings, verbose => verbose);
    if let Some(n) = sec.max_concurrency {
        settings.max_concurrency = Some(n);
    }
    if let (Some(w), Some(h)) = (sec.display_width, sec.display_height) {
        settings.display = Some(crate::DisplaySize::new(w, h));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_section_overrides_defaults() {
        let file = parse_websift_toml(
            r#"
            [services]
            search_endpoint = "http://localhost:9000/search"
            timeout_secs = 0
            search_key = "abc"
            "#,
        )
        .unwrap();
        let mut config = ServiceConfig::default();
        apply_file_to_config(&file, &mut config);
        assert_eq!(config.search_endpoint, "http://localhost:9000/search");
        assert_eq!(config.request_timeout, None);
        assert_eq!(file.search_key(), Some("abc"));
        assert_eq!(file.vision_key(), None);
    }

    #[test]
    fn test_run_section_applies_to_settings() {
        let file = parse_websift_toml(
            r#"
            [run]
            page_size = 20
            max_concurrency = 4
            display_width = 800.0
            display_height = 600.0
            "#,
        )
        .unwrap();
        let mut settings = Settings::default();
        apply_file_to_settings(&file, &mut settings);
        assert_eq!(settings.page_size, 20);
        assert_eq!(settings.max_concurrency, Some(4));
        assert_eq!(settings.display, Some(crate::DisplaySize::new(800.0, 600.0)));
    }

    #[test]
    fn test_empty_file_changes_nothing() {
        let file = parse_websift_toml("").unwrap();
        let mut config = ServiceConfig::default();
        apply_file_to_config(&file, &mut config);
        assert_eq!(
            config.request_timeout,
            ServiceConfig::default().request_timeout
        );
    }
}
