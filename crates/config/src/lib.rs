//! Configuration schema, discovery and loading.
//!
//! Config files: `botplus.toml`, `botplus.yaml`/`botplus.yml`, or
//! `botplus.json`, searched in `./` then the user config directory.
//!
//! `${ENV_VAR}` placeholders are substituted before parsing, and a few
//! `BOTPLUS_*` variables override individual keys afterwards.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{BotConfig, BotplusConfig, BridgeConfig, ModuleConfig, PosterConfig},
};
