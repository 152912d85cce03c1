use {anyhow::Result, async_trait::async_trait};

use crate::event::{BotEvent, EventKind};

/// Handle returned by [`EventDispatcher::add_listener`](crate::EventDispatcher::add_listener),
/// used to detach the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// A handler attached to the live dispatch channel.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// A human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Which event kinds this listener receives.
    fn kinds(&self) -> Vec<EventKind>;

    /// Handle one event. Errors are logged by the dispatcher and never stop
    /// delivery to other listeners.
    async fn handle(&self, event: &BotEvent) -> Result<()>;
}
