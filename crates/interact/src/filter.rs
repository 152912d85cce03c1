//! Targeting rules for interaction waits.
//!
//! Each filter is a plain value holding everything it needs to classify an
//! event. Classification is pure: side effects the rule calls for (removing a
//! stray reaction, rejecting a message from the wrong author) come back as a
//! [`Compensation`] for the caller to carry out.

use std::time::Duration;

use {
    botplus_channels::{MessageEvent, ReactionEvent},
    botplus_common::{ChannelId, Colour, Embed, Prompt, SentMessage, UserId},
};

use crate::emotes::EmoteSet;

/// Shortest lifetime of the "only X can send a message here" notice.
pub const MIN_NOTICE_LIFETIME: Duration = Duration::from_secs(20);

/// The one user allowed to answer, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub channel_id: ChannelId,
    pub user_id: UserId,
}

impl TargetSpec {
    pub fn new(channel_id: ChannelId, user_id: UserId) -> Self {
        Self {
            channel_id,
            user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Resolves the wait.
    Qualifies,
    /// Someone other than the target spoke in a guarded channel.
    Foreign,
    Ignore,
}

/// Side effect requested by a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Take a user's reaction off the prompt.
    RemoveReaction {
        message: SentMessage,
        emote: String,
        user_id: UserId,
    },
    /// Delete the message and post the forbid notice.
    RejectMessage { message: SentMessage },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub compensation: Option<Compensation>,
}

impl Classification {
    fn ignore() -> Self {
        Self {
            verdict: Verdict::Ignore,
            compensation: None,
        }
    }

    pub fn qualifies(&self) -> bool {
        self.verdict == Verdict::Qualifies
    }
}

/// Reaction-mode rule.
#[derive(Debug, Clone)]
pub struct ReactionFilter {
    prompt: SentMessage,
    target: UserId,
    bot_user: UserId,
    emotes: EmoteSet,
}

impl ReactionFilter {
    pub fn new(prompt: SentMessage, target: UserId, bot_user: UserId, emotes: EmoteSet) -> Self {
        Self {
            prompt,
            target,
            bot_user,
            emotes,
        }
    }

    /// A reaction qualifies when it is on the prompt, from the target, and in
    /// the emote set. Every non-bot reaction on the prompt is also scheduled
    /// for removal so the next check starts from a clean surface.
    pub fn classify(&self, reaction: &ReactionEvent) -> Classification {
        if reaction.message_id != self.prompt.message_id {
            return Classification::ignore();
        }

        let compensation = (reaction.user_id != self.bot_user).then(|| {
            Compensation::RemoveReaction {
                message: self.prompt,
                emote: reaction.emote.clone(),
                user_id: reaction.user_id,
            }
        });

        let verdict = if reaction.user_id == self.target && self.emotes.accepts(&reaction.emote) {
            Verdict::Qualifies
        } else {
            Verdict::Ignore
        };

        Classification {
            verdict,
            compensation,
        }
    }
}

/// Message-mode rule, with optional forbid enforcement.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    target: TargetSpec,
    bot_user: UserId,
    forbid: bool,
}

impl MessageFilter {
    pub fn new(target: TargetSpec, bot_user: UserId, forbid: bool) -> Self {
        Self {
            target,
            bot_user,
            forbid,
        }
    }

    pub fn classify(&self, message: &MessageEvent) -> Classification {
        if message.channel_id != self.target.channel_id {
            return Classification::ignore();
        }
        if message.author_id == self.target.user_id {
            return Classification {
                verdict: Verdict::Qualifies,
                compensation: None,
            };
        }
        if self.forbid && message.author_id != self.bot_user {
            return Classification {
                verdict: Verdict::Foreign,
                compensation: Some(Compensation::RejectMessage {
                    message: SentMessage {
                        channel_id: message.channel_id,
                        message_id: message.message_id,
                    },
                }),
            };
        }
        Classification::ignore()
    }
}

/// "Only the target may post here" enforcement for reply waits.
#[derive(Debug, Clone, Default)]
pub struct ForbidPolicy {
    /// Replaces the standard notice. Its auto-delete is raised to at least
    /// [`MIN_NOTICE_LIFETIME`].
    pub notice: Option<Prompt>,
}

impl ForbidPolicy {
    pub fn with_notice(notice: Prompt) -> Self {
        Self {
            notice: Some(notice),
        }
    }

    /// The notice posted after a foreign message is removed.
    pub fn notice_for(&self, target: UserId) -> Prompt {
        self.notice
            .clone()
            .unwrap_or_else(|| standard_notice(target))
            .with_min_delete_after(MIN_NOTICE_LIFETIME)
    }
}

fn standard_notice(target: UserId) -> Prompt {
    Prompt::embed(
        Embed::new()
            .title("**ERROR**")
            .description(format!("Only {} can send message here", target.mention()))
            .colour(Colour::RED),
    )
}

#[cfg(test)]
mod tests {
    use {botplus_common::MessageId, rstest::rstest};

    use super::*;

    const BOT: UserId = UserId(1);
    const TARGET: UserId = UserId(2);
    const OTHER: UserId = UserId(3);
    const CHANNEL: ChannelId = ChannelId(10);
    const PROMPT: SentMessage = SentMessage {
        channel_id: CHANNEL,
        message_id: MessageId(100),
    };

    fn reaction(message: u64, user: UserId, emote: &str) -> ReactionEvent {
        ReactionEvent {
            channel_id: CHANNEL,
            message_id: MessageId(message),
            user_id: user,
            emote: emote.into(),
        }
    }

    fn message(channel: ChannelId, author: UserId) -> MessageEvent {
        MessageEvent {
            channel_id: channel,
            message_id: MessageId(500),
            author_id: author,
            content: "hi".into(),
        }
    }

    #[rstest]
    #[case(100, TARGET, "✅", true)]
    #[case(100, TARGET, "❌", true)]
    #[case(100, TARGET, "🦀", false)]
    #[case(100, OTHER, "✅", false)]
    #[case(101, TARGET, "✅", false)]
    fn reaction_qualification(
        #[case] message_id: u64,
        #[case] user: UserId,
        #[case] emote: &str,
        #[case] expected: bool,
    ) {
        let filter = ReactionFilter::new(PROMPT, TARGET, BOT, EmoteSet::confirmation());
        assert_eq!(
            filter.classify(&reaction(message_id, user, emote)).qualifies(),
            expected
        );
    }

    #[test]
    fn empty_emote_set_accepts_any_symbol() {
        let filter = ReactionFilter::new(PROMPT, TARGET, BOT, EmoteSet::any());
        assert!(filter.classify(&reaction(100, TARGET, "🦀")).qualifies());
    }

    #[test]
    fn stray_reaction_on_prompt_is_removed() {
        let filter = ReactionFilter::new(PROMPT, TARGET, BOT, EmoteSet::confirmation());
        let c = filter.classify(&reaction(100, OTHER, "✅"));
        assert_eq!(c.verdict, Verdict::Ignore);
        assert_eq!(
            c.compensation,
            Some(Compensation::RemoveReaction {
                message: PROMPT,
                emote: "✅".into(),
                user_id: OTHER,
            })
        );
    }

    #[test]
    fn qualifying_reaction_is_also_removed() {
        let filter = ReactionFilter::new(PROMPT, TARGET, BOT, EmoteSet::confirmation());
        let c = filter.classify(&reaction(100, TARGET, "✅"));
        assert!(c.qualifies());
        assert!(c.compensation.is_some());
    }

    #[test]
    fn bot_reactions_are_never_removed() {
        let filter = ReactionFilter::new(PROMPT, TARGET, BOT, EmoteSet::confirmation());
        let c = filter.classify(&reaction(100, BOT, "✅"));
        assert_eq!(c.verdict, Verdict::Ignore);
        assert!(c.compensation.is_none());
    }

    #[test]
    fn reactions_elsewhere_are_left_alone() {
        let filter = ReactionFilter::new(PROMPT, TARGET, BOT, EmoteSet::confirmation());
        let c = filter.classify(&reaction(999, OTHER, "✅"));
        assert!(c.compensation.is_none());
    }

    #[rstest]
    #[case(false, CHANNEL, TARGET, Verdict::Qualifies)]
    #[case(false, CHANNEL, OTHER, Verdict::Ignore)]
    #[case(false, ChannelId(11), TARGET, Verdict::Ignore)]
    #[case(true, CHANNEL, TARGET, Verdict::Qualifies)]
    #[case(true, CHANNEL, OTHER, Verdict::Foreign)]
    #[case(true, CHANNEL, BOT, Verdict::Ignore)]
    #[case(true, ChannelId(11), OTHER, Verdict::Ignore)]
    fn message_classification(
        #[case] forbid: bool,
        #[case] channel: ChannelId,
        #[case] author: UserId,
        #[case] expected: Verdict,
    ) {
        let filter = MessageFilter::new(TargetSpec::new(CHANNEL, TARGET), BOT, forbid);
        assert_eq!(filter.classify(&message(channel, author)).verdict, expected);
    }

    #[test]
    fn foreign_message_is_rejected() {
        let filter = MessageFilter::new(TargetSpec::new(CHANNEL, TARGET), BOT, true);
        let c = filter.classify(&message(CHANNEL, OTHER));
        assert_eq!(
            c.compensation,
            Some(Compensation::RejectMessage {
                message: SentMessage {
                    channel_id: CHANNEL,
                    message_id: MessageId(500),
                },
            })
        );
    }

    #[test]
    fn standard_notice_mentions_target_and_lives_twenty_seconds() {
        let notice = ForbidPolicy::default().notice_for(TARGET);
        let embed = notice.embed.unwrap_or_default();
        assert_eq!(embed.description.as_deref(), Some("Only <@2> can send message here"));
        assert_eq!(notice.delete_after, Some(MIN_NOTICE_LIFETIME));
    }

    #[test]
    fn custom_notice_delay_is_raised() {
        let policy = ForbidPolicy::with_notice(
            Prompt::text("go away").with_delete_after(Duration::from_secs(5)),
        );
        assert_eq!(policy.notice_for(TARGET).delete_after, Some(MIN_NOTICE_LIFETIME));
    }
}
