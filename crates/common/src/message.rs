//! Outbound message descriptors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, MessageId};

/// 24-bit RGB colour used for the embed side bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(pub u32);

impl Colour {
    pub const GREEN: Self = Self(0x2E_CC71);
    pub const RED: Self = Self(0xE7_4C3C);
}

/// Rich embed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<Colour>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: Colour) -> Self {
        self.colour = Some(colour);
        self
    }
}

/// Reply threading: the message this one answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// Content handed to the transport for delivery.
///
/// A prompt is built once and never mutated after it has been handed over;
/// the builder methods consume `self`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub tts: bool,
    /// Delete the delivered message after this delay.
    pub delete_after: Option<Duration>,
    pub reference: Option<MessageReference>,
    pub mention_author: bool,
}

impl Prompt {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    pub fn with_tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }

    pub fn with_delete_after(mut self, delay: Duration) -> Self {
        self.delete_after = Some(delay);
        self
    }

    pub fn with_reference(mut self, reference: MessageReference, mention_author: bool) -> Self {
        self.reference = Some(reference);
        self.mention_author = mention_author;
        self
    }

    /// Raise the auto-delete delay to at least `floor`.
    ///
    /// A prompt without a delay gets exactly `floor`.
    #[must_use]
    pub fn with_min_delete_after(mut self, floor: Duration) -> Self {
        self.delete_after = Some(self.delete_after.map_or(floor, |d| d.max(floor)));
        self
    }

    /// True when there is nothing to deliver.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty) && self.embed.is_none()
    }
}

/// Handle returned by the transport for a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SentMessage {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}
