use std::{fmt, sync::Arc};

use {
    async_trait::async_trait,
    botplus_channels::EventListener,
    serde::{Deserialize, Serialize},
};

/// A pluggable unit of bot functionality.
#[async_trait]
pub trait Module: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// Listeners wired into the dispatcher while the module is attached.
    fn listeners(&self) -> Vec<Arc<dyn EventListener>> {
        Vec::new()
    }

    /// Runs after the listeners are attached. An error aborts registration.
    async fn on_attach(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the listeners are detached.
    async fn on_detach(&self) {}
}

/// Registration flags. Fixed for the lifetime of the registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleOptions {
    pub disabled: bool,
    pub beta: bool,
}

impl ModuleOptions {
    pub fn enabled() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            disabled: true,
            beta: false,
        }
    }

    pub fn beta(mut self) -> Self {
        self.beta = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleStatus {
    Enabled,
    BetaEnabled,
    Disabled,
    BetaDisabled,
}

impl ModuleStatus {
    pub fn new(attached: bool, beta: bool) -> Self {
        match (attached, beta) {
            (true, false) => Self::Enabled,
            (true, true) => Self::BetaEnabled,
            (false, false) => Self::Disabled,
            (false, true) => Self::BetaDisabled,
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled | Self::BetaEnabled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::BetaEnabled => "BetaEnabled",
            Self::Disabled => "Disabled",
            Self::BetaDisabled => "BetaDisabled",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
