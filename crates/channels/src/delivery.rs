//! Best-effort delivery and cleanup helpers.
//!
//! The `try_*` functions never fail: a message that is already gone counts as
//! cleaned up, and any other transport error is logged and swallowed.

use std::{sync::Arc, time::Duration};

use {
    botplus_common::{ChannelId, Prompt, SentMessage, UserId},
    tokio::task::JoinHandle,
    tracing::{debug, warn},
};

use crate::{Result, transport::ChatTransport};

/// Send a prompt and arm its auto-delete timer, if it has one.
pub async fn deliver(
    transport: &Arc<dyn ChatTransport>,
    channel_id: ChannelId,
    prompt: &Prompt,
) -> Result<SentMessage> {
    let sent = transport.send(channel_id, prompt).await?;
    if let Some(delay) = prompt.delete_after {
        schedule_delete(Arc::clone(transport), sent, delay);
    }
    Ok(sent)
}

/// Delete `message` after `delay` in a background task.
pub fn schedule_delete(
    transport: Arc<dyn ChatTransport>,
    message: SentMessage,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        try_delete(transport.as_ref(), message).await;
    })
}

/// [`deliver`] that logs and swallows failures.
pub async fn try_send(
    transport: &Arc<dyn ChatTransport>,
    channel_id: ChannelId,
    prompt: &Prompt,
) -> Option<SentMessage> {
    match deliver(transport, channel_id, prompt).await {
        Ok(sent) => Some(sent),
        Err(e) => {
            warn!(channel_id = %channel_id, error = %e, "failed to send message");
            None
        },
    }
}

/// Delete a message. Returns true when the message is gone afterwards.
pub async fn try_delete(transport: &dyn ChatTransport, message: SentMessage) -> bool {
    match transport.delete_message(message).await {
        Ok(()) => true,
        Err(e) if e.is_not_found() => {
            debug!(message_id = %message.message_id, "message already deleted");
            true
        },
        Err(e) => {
            warn!(message_id = %message.message_id, error = %e, "failed to delete message");
            false
        },
    }
}

/// Clear every reaction from a message.
pub async fn try_clear_reactions(transport: &dyn ChatTransport, message: SentMessage) -> bool {
    match transport.clear_reactions(message).await {
        Ok(()) => true,
        Err(e) if e.is_not_found() => {
            debug!(message_id = %message.message_id, "message gone, nothing to clear");
            true
        },
        Err(e) => {
            warn!(message_id = %message.message_id, error = %e, "failed to clear reactions");
            false
        },
    }
}

/// Add each emote as a bot reaction, in order. Stops at the first emote the
/// transport rejects because the message disappeared.
pub async fn try_add_reactions(
    transport: &dyn ChatTransport,
    message: SentMessage,
    emotes: &[String],
) {
    for emote in emotes {
        match transport.add_reaction(message, emote).await {
            Ok(()) => {},
            Err(e) if e.is_not_found() => {
                debug!(message_id = %message.message_id, "message gone while adding reactions");
                return;
            },
            Err(e) => {
                warn!(
                    message_id = %message.message_id,
                    emote = %emote,
                    error = %e,
                    "failed to add reaction"
                );
            },
        }
    }
}

/// Remove one user's reaction.
pub async fn try_remove_reaction(
    transport: &dyn ChatTransport,
    message: SentMessage,
    emote: &str,
    user_id: UserId,
) -> bool {
    match transport.remove_reaction(message, emote, user_id).await {
        Ok(()) => true,
        Err(e) if e.is_not_found() => true,
        Err(e) => {
            debug!(
                message_id = %message.message_id,
                user_id = %user_id,
                error = %e,
                "failed to remove reaction"
            );
            false
        },
    }
}
