pub mod api_keys;
pub mod config;
pub mod locks;
pub mod logger;
pub mod watchers;
pub(crate) mod websift_toml;

pub use api_keys::{key_from_env, resolve_key};
pub use config::*;
pub use logger::{
    FacadeLogger, LogLevel, LogMessage, Logger, MemoryLogger, NullLogger, error_chain,
    setup_logging,
};
pub use watchers::Watchers;
