use {
    botplus_common::{ChannelId, MessageId, UserId},
    serde::Serialize,
    serde_json::Value,
};

/// A message posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEvent {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author_id: UserId,
    pub content: String,
}

/// A reaction added to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionEvent {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_id: UserId,
    /// Rendered emote, e.g. `"✅"` or `"<:name:id>"`.
    pub emote: String,
}

/// Everything that flows through the dispatch channel: native events from the
/// chat runtime and synthetic ones emitted by the bot itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BotEvent {
    Message(MessageEvent),
    ReactionAdd(ReactionEvent),
    Custom { name: String, payload: Value },
}

impl BotEvent {
    pub fn custom(name: impl Into<String>, payload: Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) => EventKind::Message,
            Self::ReactionAdd(_) => EventKind::ReactionAdd,
            Self::Custom { name, .. } => EventKind::Custom(name.clone()),
        }
    }

    /// Kind check without allocating for custom events.
    pub fn is(&self, kind: &EventKind) -> bool {
        match (self, kind) {
            (Self::Message(_), EventKind::Message) => true,
            (Self::ReactionAdd(_), EventKind::ReactionAdd) => true,
            (Self::Custom { name, .. }, EventKind::Custom(wanted)) => name == wanted,
            _ => false,
        }
    }

    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_reaction(&self) -> Option<&ReactionEvent> {
        match self {
            Self::ReactionAdd(r) => Some(r),
            _ => None,
        }
    }
}

/// Event kinds listeners and waiters subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    ReactionAdd,
    Custom(String),
}

impl EventKind {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message => f.write_str("message"),
            Self::ReactionAdd => f.write_str("reaction_add"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}
