use std::{fmt, sync::Arc};

use {
    async_trait::async_trait,
    botplus_channels::{
        BotEvent, ChatTransport, EventKind, EventListener, MessageEvent, delivery::try_send,
    },
    botplus_common::{Colour, Embed, Prompt, UserId},
};

/// What the bot answers when someone pings it.
#[derive(Clone)]
pub enum MentionReply {
    /// "My prefix is …" embed built from the configured prefix.
    Prefix,
    Fixed(Prompt),
    Custom(Arc<dyn Fn(&MessageEvent) -> Prompt + Send + Sync>),
}

impl fmt::Debug for MentionReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => f.write_str("Prefix"),
            Self::Fixed(prompt) => f.debug_tuple("Fixed").field(prompt).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Answers a message that consists only of the bot's mention.
pub struct MentionResponder {
    transport: Arc<dyn ChatTransport>,
    bot_user: UserId,
    prefix: String,
    reply: MentionReply,
}

impl MentionResponder {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        prefix: impl Into<String>,
        reply: MentionReply,
    ) -> Self {
        Self {
            bot_user: transport.bot_user_id(),
            transport,
            prefix: prefix.into(),
            reply,
        }
    }

    fn reply_for(&self, message: &MessageEvent) -> Prompt {
        match &self.reply {
            MentionReply::Prefix => prefix_prompt(&self.prefix),
            MentionReply::Fixed(prompt) => prompt.clone(),
            MentionReply::Custom(build) => build(message),
        }
    }
}

pub fn prefix_prompt(prefix: &str) -> Prompt {
    Prompt::embed(
        Embed::new()
            .title("Prefix")
            .description(format!("My prefix is {prefix}"))
            .colour(Colour::GREEN),
    )
}

/// `<@id>` or `<@!id>` with optional surrounding whitespace, nothing else.
pub fn is_bare_mention(content: &str, user: UserId) -> bool {
    content
        .trim()
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|id| id.strip_prefix('!').unwrap_or(id))
        .and_then(|id| id.parse::<UserId>().ok())
        .is_some_and(|id| id == user)
}

#[async_trait]
impl EventListener for MentionResponder {
    fn name(&self) -> &str {
        "mention-responder"
    }

    fn kinds(&self) -> Vec<EventKind> {
        vec![EventKind::Message]
    }

    async fn handle(&self, event: &BotEvent) -> anyhow::Result<()> {
        let Some(message) = event.as_message() else {
            return Ok(());
        };
        if message.author_id == self.bot_user
            || !is_bare_mention(&message.content, self.bot_user)
        {
            return Ok(());
        }
        let prompt = self.reply_for(message);
        try_send(&self.transport, message.channel_id, &prompt).await;
        Ok(())
    }
}
