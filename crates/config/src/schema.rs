//! Config schema types.

use std::{collections::BTreeMap, fmt};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default bot-list stats endpoint.
pub const DEFAULT_STATS_ENDPOINT: &str = "https://top.gg/api/bots/stats";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotplusConfig {
    pub bot: BotConfig,
    pub bridge: BridgeConfig,
    pub poster: PosterConfig,
    /// Per-module registration flags, keyed by module name.
    pub modules: BTreeMap<String, ModuleConfig>,
}

impl BotplusConfig {
    /// Flags for `name`, or all-off when the module is not listed.
    pub fn module(&self, name: &str) -> ModuleConfig {
        self.modules.get(name).copied().unwrap_or_default()
    }

    /// Copy with every secret replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        if out.bridge.vote_secret.is_some() {
            out.bridge.vote_secret = Some(Secret::new(REDACTED.into()));
        }
        if out.poster.token.is_some() {
            out.poster.token = Some(Secret::new(REDACTED.into()));
        }
        out
    }
}

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Command prefix, quoted back by the mention responder.
    pub prefix: String,
    /// Channel that receives `Bot::log` output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_channel: Option<u64>,
    /// Answer a bare mention of the bot with its prefix.
    pub mention_reply: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "!".into(),
            log_channel: None,
            mention_reply: false,
        }
    }
}

/// Vote webhook server.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Shared secret expected in the `Authorization` header. Without one,
    /// every vote is refused.
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub vote_secret: Option<Secret<String>>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".into(),
            port: 5000,
            vote_secret: None,
        }
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("vote_secret", &self.vote_secret.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Periodic bot-list stats poster.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    pub enabled: bool,
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    pub endpoint: String,
    pub interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_id: Option<u32>,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token: None,
            endpoint: DEFAULT_STATS_ENDPOINT.into(),
            interval_secs: 1800,
            shard_count: None,
            shard_id: None,
        }
    }
}

impl fmt::Debug for PosterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosterConfig")
            .field("enabled", &self.enabled)
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .field("endpoint", &self.endpoint)
            .field("interval_secs", &self.interval_secs)
            .finish_non_exhaustive()
    }
}

/// Registration flags for one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub disabled: bool,
    pub beta: bool,
}

fn serialize_opt_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
