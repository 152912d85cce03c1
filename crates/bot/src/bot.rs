use std::{collections::BTreeMap, error::Error as StdError, sync::Arc};

use {
    botplus_bridge::{BridgeModule, EventBridge},
    botplus_channels::{
        ChatTransport, ConnectionStatus, DispatchLoop, EventDispatcher, ListenerId,
        delivery::try_send,
    },
    botplus_common::{ChannelId, Prompt, SentMessage},
    botplus_config::{BotConfig, BridgeConfig, PosterConfig},
    botplus_interact::InteractionWaiter,
    botplus_modules::{ModuleOptions, ModuleRegistry, ModuleStatus},
    botplus_poster::{PosterModule, StatsPoster, StatsSource},
    tokio::sync::Mutex,
    tracing::{debug, error, info},
};

use crate::{
    Result,
    error::Context,
    mention::{MentionReply, MentionResponder},
    report::{error_chain, error_prompt},
};

/// Everything a bot needs on top of its chat connection.
pub struct Bot {
    config: BotConfig,
    transport: Arc<dyn ChatTransport>,
    status: Arc<dyn ConnectionStatus>,
    dispatcher: EventDispatcher,
    waiter: InteractionWaiter,
    modules: ModuleRegistry,
    mention: Mutex<Option<ListenerId>>,
}

impl Bot {
    /// Build the bot around `transport`. The returned loop must be run for
    /// events to reach listeners and waits.
    pub fn new<T>(transport: Arc<T>, config: BotConfig) -> (Self, DispatchLoop)
    where
        T: ChatTransport + ConnectionStatus + 'static,
    {
        let (dispatcher, dispatch_loop) = EventDispatcher::new();
        let status: Arc<dyn ConnectionStatus> = transport.clone();
        let transport: Arc<dyn ChatTransport> = transport;
        let bot = Self {
            waiter: InteractionWaiter::new(Arc::clone(&transport), dispatcher.clone()),
            modules: ModuleRegistry::new(dispatcher.clone()),
            config,
            transport,
            status,
            dispatcher,
            mention: Mutex::new(None),
        };
        (bot, dispatch_loop)
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.transport
    }

    pub fn status(&self) -> &Arc<dyn ConnectionStatus> {
        &self.status
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn waiter(&self) -> &InteractionWaiter {
        &self.waiter
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn log_channel(&self) -> Result<ChannelId> {
        self.config
            .log_channel
            .map(ChannelId)
            .context("no log channel configured")
    }

    /// Post to the log channel. Best-effort.
    pub async fn log(&self, prompt: &Prompt) -> Option<SentMessage> {
        match self.log_channel() {
            Ok(channel) => try_send(&self.transport, channel, prompt).await,
            Err(e) => {
                debug!(error = %e, "log message dropped");
                None
            },
        }
    }

    /// Report an error with its source chain to the log channel.
    pub async fn log_error(
        &self,
        err: &(dyn StdError + 'static),
        details: &[&str],
    ) -> Option<SentMessage> {
        error!(error = %error_chain(err), "reporting error to log channel");
        self.log(&error_prompt(err, details)).await
    }

    /// Register the vote bridge as the `bridge` module. The server only
    /// starts when `options` leave the module enabled.
    pub async fn activate_bridge(
        &self,
        config: &BridgeConfig,
        options: ModuleOptions,
    ) -> Result<(Arc<EventBridge>, ModuleStatus)> {
        let bridge = Arc::new(EventBridge::new(
            config,
            self.dispatcher.clone(),
            Arc::clone(&self.status),
        ));
        let module_bridge = Arc::clone(&bridge);
        let status = self
            .modules
            .register(move || BridgeModule::new(module_bridge), options)
            .await?;
        Ok((bridge, status))
    }

    /// Register the stats poster as the `stats-poster` module.
    pub async fn activate_poster(
        &self,
        config: &PosterConfig,
        source: Arc<dyn StatsSource>,
        options: ModuleOptions,
    ) -> Result<ModuleStatus> {
        let poster = Arc::new(StatsPoster::new(config, source)?);
        let status = self
            .modules
            .register(move || PosterModule::new(poster), options)
            .await?;
        Ok(status)
    }

    /// Start answering bare mentions. Replaces a responder that is already
    /// active.
    pub async fn activate_mention_reply(&self, reply: MentionReply) {
        let mut slot = self.mention.lock().await;
        if let Some(previous) = slot.take() {
            self.dispatcher.remove_listener(previous).await;
        }
        let responder = MentionResponder::new(
            Arc::clone(&self.transport),
            self.config.prefix.clone(),
            reply,
        );
        *slot = Some(self.dispatcher.add_listener(Arc::new(responder)).await);
        info!("mention responder activated");
    }

    /// Returns false if no responder was active.
    pub async fn deactivate_mention_reply(&self) -> bool {
        let Some(id) = self.mention.lock().await.take() else {
            return false;
        };
        self.dispatcher.remove_listener(id).await;
        info!("mention responder deactivated");
        true
    }

    pub async fn module_status(&self) -> BTreeMap<String, ModuleStatus> {
        self.modules.status().await
    }

    /// Detach every module and the mention responder.
    pub async fn shutdown(&self) {
        self.deactivate_mention_reply().await;
        self.modules.shutdown().await;
    }
}
