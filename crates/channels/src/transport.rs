use std::time::Duration;

use {
    async_trait::async_trait,
    botplus_common::{ChannelId, Prompt, SentMessage, UserId},
};

use crate::Result;

/// Outbound side of the chat runtime.
///
/// Implementations return [`Error::NotFound`](crate::Error::NotFound) when the
/// target message is already gone, so callers can treat cleanup as idempotent.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// The bot's own account.
    fn bot_user_id(&self) -> UserId;

    /// Deliver a prompt. Auto-delete is handled by
    /// [`delivery::deliver`](crate::delivery::deliver), not by the transport.
    async fn send(&self, channel_id: ChannelId, prompt: &Prompt) -> Result<SentMessage>;

    async fn delete_message(&self, message: SentMessage) -> Result<()>;

    /// React to a message as the bot.
    async fn add_reaction(&self, message: SentMessage, emote: &str) -> Result<()>;

    /// Remove one user's reaction from a message.
    async fn remove_reaction(&self, message: SentMessage, emote: &str, user_id: UserId)
    -> Result<()>;

    /// Remove every reaction from a message.
    async fn clear_reactions(&self, message: SentMessage) -> Result<()>;
}

/// Connection health of the chat runtime.
pub trait ConnectionStatus: Send + Sync {
    /// True once the gateway connection is established.
    fn is_ready(&self) -> bool;

    /// Heartbeat round-trip, if one has been measured.
    fn latency(&self) -> Option<Duration>;
}
