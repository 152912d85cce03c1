//! In-process transport that records every operation.
//!
//! Used by tests across the workspace and by the binary when it runs without
//! a chat connection (bridge-only mode).

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    botplus_common::{ChannelId, MessageId, Prompt, SentMessage, UserId},
};

use crate::{
    Error, Result,
    transport::{ChatTransport, ConnectionStatus},
};

/// One call the transport performed, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    Sent {
        message: SentMessage,
        prompt: Prompt,
    },
    Deleted(SentMessage),
    ReactionAdded {
        message: SentMessage,
        emote: String,
    },
    ReactionRemoved {
        message: SentMessage,
        emote: String,
        user_id: UserId,
    },
    ReactionsCleared(SentMessage),
}

/// A message currently present in the memory transport.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub channel_id: ChannelId,
    pub prompt: Prompt,
    pub reactions: Vec<(String, UserId)>,
}

#[derive(Default)]
struct MemoryState {
    messages: HashMap<MessageId, StoredMessage>,
    ops: Vec<TransportOp>,
    fail_sends: bool,
}

pub struct MemoryTransport {
    bot_user: UserId,
    next_id: AtomicU64,
    ready: AtomicBool,
    latency_us: AtomicU64,
    // std Mutex: never held across an await point.
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new(bot_user: UserId) -> Self {
        Self {
            bot_user,
            next_id: AtomicU64::new(1000),
            ready: AtomicBool::new(false),
            latency_us: AtomicU64::new(0),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark the connection as established with the given heartbeat latency.
    pub fn set_ready(&self, latency: Duration) {
        self.latency_us
            .store(latency.as_micros() as u64, Ordering::Relaxed);
        self.ready.store(true, Ordering::Relaxed);
    }

    pub fn set_disconnected(&self) {
        self.ready.store(false, Ordering::Relaxed);
    }

    /// Make every following `send` fail with `Unavailable`.
    pub fn set_fail_sends(&self, fail: bool) {
        self.state().fail_sends = fail;
    }

    pub fn ops(&self) -> Vec<TransportOp> {
        self.state().ops.clone()
    }

    pub fn exists(&self, message_id: MessageId) -> bool {
        self.state().messages.contains_key(&message_id)
    }

    pub fn message(&self, message_id: MessageId) -> Option<StoredMessage> {
        self.state().messages.get(&message_id).cloned()
    }

    pub fn reactions(&self, message_id: MessageId) -> Vec<(String, UserId)> {
        self.state()
            .messages
            .get(&message_id)
            .map(|m| m.reactions.clone())
            .unwrap_or_default()
    }

    /// Every prompt sent to `channel_id`, oldest first.
    pub fn sent_to(&self, channel_id: ChannelId) -> Vec<(SentMessage, Prompt)> {
        self.state()
            .ops
            .iter()
            .filter_map(|op| match op {
                TransportOp::Sent { message, prompt } if message.channel_id == channel_id => {
                    Some((*message, prompt.clone()))
                },
                _ => None,
            })
            .collect()
    }

    /// Record a message that was posted by someone else (so it can later be
    /// deleted through the transport).
    pub fn insert_foreign(&self, channel_id: ChannelId, message_id: MessageId, content: &str) {
        self.state().messages.insert(message_id, StoredMessage {
            channel_id,
            prompt: Prompt::text(content),
            reactions: Vec::new(),
        });
    }

    /// Allocate an id for a message that did not come through `send`.
    pub fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of recorded operations matching `pred`.
    pub fn count_ops(&self, pred: impl Fn(&TransportOp) -> bool) -> usize {
        self.state().ops.iter().filter(|op| pred(op)).count()
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    fn bot_user_id(&self) -> UserId {
        self.bot_user
    }

    async fn send(&self, channel_id: ChannelId, prompt: &Prompt) -> Result<SentMessage> {
        if prompt.is_empty() {
            return Err(Error::invalid_input("cannot send an empty message"));
        }
        let mut state = self.state();
        if state.fail_sends {
            return Err(Error::unavailable("send disabled"));
        }
        let message = SentMessage {
            channel_id,
            message_id: self.next_message_id(),
        };
        state.messages.insert(message.message_id, StoredMessage {
            channel_id,
            prompt: prompt.clone(),
            reactions: Vec::new(),
        });
        state.ops.push(TransportOp::Sent {
            message,
            prompt: prompt.clone(),
        });
        Ok(message)
    }

    async fn delete_message(&self, message: SentMessage) -> Result<()> {
        let mut state = self.state();
        if state.messages.remove(&message.message_id).is_none() {
            return Err(Error::not_found(message.message_id));
        }
        state.ops.push(TransportOp::Deleted(message));
        Ok(())
    }

    async fn add_reaction(&self, message: SentMessage, emote: &str) -> Result<()> {
        let mut state = self.state();
        let stored = state
            .messages
            .get_mut(&message.message_id)
            .ok_or_else(|| Error::not_found(message.message_id))?;
        stored.reactions.push((emote.to_string(), self.bot_user));
        state.ops.push(TransportOp::ReactionAdded {
            message,
            emote: emote.to_string(),
        });
        Ok(())
    }

    async fn remove_reaction(
        &self,
        message: SentMessage,
        emote: &str,
        user_id: UserId,
    ) -> Result<()> {
        let mut state = self.state();
        let stored = state
            .messages
            .get_mut(&message.message_id)
            .ok_or_else(|| Error::not_found(message.message_id))?;
        stored
            .reactions
            .retain(|(e, u)| !(e == emote && *u == user_id));
        state.ops.push(TransportOp::ReactionRemoved {
            message,
            emote: emote.to_string(),
            user_id,
        });
        Ok(())
    }

    async fn clear_reactions(&self, message: SentMessage) -> Result<()> {
        let mut state = self.state();
        let stored = state
            .messages
            .get_mut(&message.message_id)
            .ok_or_else(|| Error::not_found(message.message_id))?;
        stored.reactions.clear();
        state.ops.push(TransportOp::ReactionsCleared(message));
        Ok(())
    }
}

impl ConnectionStatus for MemoryTransport {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn latency(&self) -> Option<Duration> {
        self.is_ready()
            .then(|| Duration::from_micros(self.latency_us.load(Ordering::Relaxed)))
    }
}
