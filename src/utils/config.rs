//! Application configuration constants and the explicit service configuration value.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    search_key_env: String,
    vision_key_env: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            let upper = pkg.to_uppercase();
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                search_key_env: format!("{upper}_SEARCH_KEY"),
                vision_key_env: format!("{upper}_VISION_KEY"),
            }
        })
    }

    /// Per-directory config file, e.g. `.websift.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    pub fn search_key_env(&self) -> &str {
        &self.search_key_env
    }

    pub fn vision_key_env(&self) -> &str {
        &self.vision_key_env
    }
}

// ---- Runs ----

/// Smallest accepted page size for a search run.
pub const MIN_PAGE_SIZE: u32 = 10;

/// Page size used by the CLI when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

// ---- Services ----

/// Defaults for the HTTP collaborators.
pub struct ServiceDefaults;

impl ServiceDefaults {
    pub const SEARCH_ENDPOINT: &'static str = "https://api.bing.microsoft.com/v7.0/images/search";
    pub const VISION_ENDPOINT: &'static str = "https://westus.api.cognitive.microsoft.com";
    /// Visual features requested from the analysis service.
    pub const VISUAL_FEATURES: &'static str = "Adult,Color,Categories,Faces";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Header carrying the subscription key for both services.
    pub const KEY_HEADER: &'static str = "Ocp-Apim-Subscription-Key";
}

/// Endpoints, keys, and transport settings for the HTTP collaborators. Passed explicitly to
/// [`Services::http`](crate::services::Services::http).
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub search_endpoint: String,
    pub search_key: String,
    pub vision_endpoint: String,
    /// Empty when no analysis key is configured; analysis calls then fail per item.
    pub vision_key: String,
    /// Applied to every HTTP call. `None` waits forever.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            search_endpoint: ServiceDefaults::SEARCH_ENDPOINT.to_string(),
            search_key: String::new(),
            vision_endpoint: ServiceDefaults::VISION_ENDPOINT.to_string(),
            vision_key: String::new(),
            request_timeout: Some(Duration::from_secs(ServiceDefaults::REQUEST_TIMEOUT_SECS)),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

// ---- Overlay ----

/// Overlay drawing constants.
pub struct OverlayConsts;

impl OverlayConsts {
    /// Canvas width below which the small label font is used.
    pub const SMALL_CANVAS_WIDTH: u32 = 400;
    pub const SMALL_FONT: f64 = 9.0;
    pub const LARGE_FONT: f64 = 16.0;
    /// Face outline colour.
    pub const OUTLINE_RGBA: [u8; 4] = [255, 255, 255, 255];
    /// Drop shadow colour, drawn one pixel down-right of the outline.
    pub const SHADOW_RGBA: [u8; 4] = [169, 169, 169, 255];
}
