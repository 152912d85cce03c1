use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    env_subst::substitute_env,
    schema::BotplusConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "botplus.toml",
    "botplus.yaml",
    "botplus.yml",
    "botplus.json",
];

/// Load config from `path` (format chosen by extension).
pub fn load_config(path: &Path) -> Result<BotplusConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations, then apply env
/// overrides.
///
/// Search order:
/// 1. `./botplus.{toml,yaml,yml,json}`
/// 2. `<user config dir>/botplus/botplus.{toml,yaml,yml,json}`
///
/// Falls back to defaults when no file exists or the file is unreadable.
pub fn discover_and_load() -> (BotplusConfig, Option<PathBuf>) {
    let path = find_config_file();
    let mut config = match &path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                BotplusConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            BotplusConfig::default()
        },
    };
    if let Err(e) = apply_env_overrides(&mut config, |name| std::env::var(name).ok()) {
        warn!(error = %e, "ignoring invalid environment override");
    }
    (config, path)
}

/// First existing config file in the standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// The user-global config directory (`~/.config/botplus/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "botplus").map(|d| d.config_dir().to_path_buf())
}

/// Apply `BOTPLUS_*` overrides read through `lookup`.
///
/// | variable | key |
/// |---|---|
/// | `BOTPLUS_VOTE_SECRET` | `bridge.vote_secret` |
/// | `BOTPLUS_BRIDGE_PORT` | `bridge.port` |
/// | `BOTPLUS_POSTER_TOKEN` | `poster.token` |
pub fn apply_env_overrides(
    config: &mut BotplusConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(secret) = lookup("BOTPLUS_VOTE_SECRET").filter(|s| !s.is_empty()) {
        config.bridge.vote_secret = Some(Secret::new(secret));
    }
    if let Some(token) = lookup("BOTPLUS_POSTER_TOKEN").filter(|s| !s.is_empty()) {
        config.poster.token = Some(Secret::new(token));
    }
    if let Some(port) = lookup("BOTPLUS_BRIDGE_PORT") {
        config.bridge.port = port
            .trim()
            .parse()
            .map_err(|e| Error::invalid_value("BOTPLUS_BRIDGE_PORT", format!("{port:?}: {e}")))?;
    }
    Ok(())
}

fn parse_config(raw: &str, path: &Path) -> Result<BotplusConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat { ext: other.into() }),
    }
}
