//! Layered TOML configuration.
//!
//! User config (`~/.config/tabd/config.toml`) ← repo config (`tabd.toml`)
//! ← `TABD_*` environment overrides.

mod load;
mod merge;
mod schema;

pub use load::{ConfigError, config_path, load, load_for_repo, repo_config_path};
pub use merge::{apply_env_overrides, merge_layers};
pub use schema::{
    ClipboardConfig, ClipboardLayerConfig, Config, ConfigLayer, FileLoggingConfig, LoggingConfig,
    LoggingLayerConfig, StorageConfig, StorageLayerConfig, StorageLayout,
};
