use std::sync::Arc;

use {async_trait::async_trait, botplus_modules::Module};

use crate::bridge::EventBridge;

/// Registry name of the bridge module.
pub const BRIDGE_MODULE: &str = "bridge";

/// Hosts the [`EventBridge`] as a module: the server runs only while the
/// module is attached.
pub struct BridgeModule {
    bridge: Arc<EventBridge>,
}

impl BridgeModule {
    pub fn new(bridge: Arc<EventBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Module for BridgeModule {
    fn name(&self) -> &str {
        BRIDGE_MODULE
    }

    async fn on_attach(&self) -> anyhow::Result<()> {
        self.bridge.start().await?;
        Ok(())
    }

    async fn on_detach(&self) {
        self.bridge.stop().await;
    }
}
