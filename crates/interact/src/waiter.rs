use std::{sync::Arc, time::Duration};

use {
    botplus_channels::{
        ChatTransport, EventDispatcher, EventKind, EventSubscription,
        delivery::{
            deliver, try_add_reactions, try_clear_reactions, try_delete, try_remove_reaction,
            try_send,
        },
    },
    botplus_common::{Prompt, SentMessage},
    tracing::debug,
};

use crate::{
    Error, Result,
    emotes::{AFFIRM, DENY, EmoteSet},
    filter::{Compensation, ForbidPolicy, MessageFilter, ReactionFilter, TargetSpec},
};

/// Timeout and cleanup behaviour shared by every `ask_*` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AskOptions {
    /// `None` waits until an answer arrives.
    pub timeout: Option<Duration>,
    /// Delete the prompt (and, for replies, the answer) once the wait ends.
    pub delete_after: bool,
}

impl AskOptions {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            delete_after: false,
        }
    }

    pub fn delete_after(mut self, delete_after: bool) -> Self {
        self.delete_after = delete_after;
        self
    }
}

/// Sends prompts and waits for the target's answer.
#[derive(Clone)]
pub struct InteractionWaiter {
    transport: Arc<dyn ChatTransport>,
    dispatcher: EventDispatcher,
}

impl InteractionWaiter {
    pub fn new(transport: Arc<dyn ChatTransport>, dispatcher: EventDispatcher) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    /// Send `prompt`, offer `emotes` as reactions, and return the first
    /// qualifying reaction from the target, or `None` on timeout.
    ///
    /// Afterwards the prompt is deleted (`delete_after`) or stripped of all
    /// reactions, whatever the outcome.
    pub async fn ask_reaction(
        &self,
        target: TargetSpec,
        prompt: &Prompt,
        emotes: &EmoteSet,
        opts: AskOptions,
    ) -> Result<Option<String>> {
        let (mut events, sent) = self.open(target, prompt).await?;
        let cleanup = if opts.delete_after {
            Cleanup::Delete(vec![sent])
        } else {
            Cleanup::ClearReactions(sent)
        };
        let guard = CleanupGuard::arm(Arc::clone(&self.transport), Some(cleanup));

        try_add_reactions(self.transport.as_ref(), sent, emotes.as_slice()).await;

        let filter = ReactionFilter::new(
            sent,
            target.user_id,
            self.transport.bot_user_id(),
            emotes.clone(),
        );
        let outcome = events
            .next_matching(&EventKind::ReactionAdd, opts.timeout, |event| {
                let Some(reaction) = event.as_reaction() else {
                    return false;
                };
                let classification = filter.classify(reaction);
                let qualifies = classification.qualifies();
                if let Some(compensation) = classification.compensation {
                    self.compensate(compensation, None);
                }
                qualifies
            })
            .await;

        guard.run().await;

        let emote = outcome
            .map_err(Error::Stream)?
            .and_then(|event| event.as_reaction().map(|r| r.emote.clone()));
        match &emote {
            Some(emote) => {
                debug!(message_id = %sent.message_id, emote = %emote, "reaction wait resolved");
            },
            None => debug!(message_id = %sent.message_id, "reaction wait timed out"),
        }
        Ok(emote)
    }

    /// Yes/no question answered with ✅ or ❌. `None` on timeout.
    pub async fn ask_confirmation(
        &self,
        target: TargetSpec,
        prompt: &Prompt,
        opts: AskOptions,
    ) -> Result<Option<bool>> {
        let emote = self
            .ask_reaction(target, prompt, &EmoteSet::confirmation(), opts)
            .await?;
        Ok(emote.and_then(|e| match e.as_str() {
            AFFIRM => Some(true),
            DENY => Some(false),
            _ => None,
        }))
    }

    /// Send `prompt` and return the text of the target's next message in the
    /// channel, or `None` on timeout.
    ///
    /// With a forbid policy, messages from anyone else in the channel are
    /// deleted and answered with a short-lived notice; they never resolve the
    /// wait. With `delete_after`, both the prompt and the answer are deleted.
    /// Errors from the wait itself are returned after cleanup has run.
    pub async fn ask_reply(
        &self,
        target: TargetSpec,
        prompt: &Prompt,
        opts: AskOptions,
        forbid: Option<&ForbidPolicy>,
    ) -> Result<Option<String>> {
        let (mut events, sent) = self.open(target, prompt).await?;
        let mut guard = CleanupGuard::arm(
            Arc::clone(&self.transport),
            opts.delete_after.then(|| Cleanup::Delete(vec![sent])),
        );

        let notice = forbid.map(|policy| policy.notice_for(target.user_id));
        let filter = MessageFilter::new(target, self.transport.bot_user_id(), forbid.is_some());
        let outcome = events
            .next_matching(&EventKind::Message, opts.timeout, |event| {
                let Some(message) = event.as_message() else {
                    return false;
                };
                let classification = filter.classify(message);
                let qualifies = classification.qualifies();
                if let Some(compensation) = classification.compensation {
                    self.compensate(compensation, notice.clone());
                }
                qualifies
            })
            .await;

        let reply = match &outcome {
            Ok(Some(event)) => event.as_message().cloned(),
            _ => None,
        };
        if let Some(reply) = &reply {
            guard.also_delete(SentMessage {
                channel_id: reply.channel_id,
                message_id: reply.message_id,
            });
        }
        guard.run().await;

        outcome.map_err(Error::Stream)?;
        match &reply {
            Some(_) => debug!(message_id = %sent.message_id, "reply wait resolved"),
            None => debug!(message_id = %sent.message_id, "reply wait timed out"),
        }
        Ok(reply.map(|m| m.content))
    }

    /// Subscribe first, then send, so no answer can slip in between.
    async fn open(
        &self,
        target: TargetSpec,
        prompt: &Prompt,
    ) -> Result<(EventSubscription, SentMessage)> {
        let events = self.dispatcher.subscribe();
        let sent = deliver(&self.transport, target.channel_id, prompt)
            .await
            .map_err(Error::Deliver)?;
        debug!(
            channel_id = %target.channel_id,
            target = %target.user_id,
            message_id = %sent.message_id,
            "prompt sent, waiting for answer"
        );
        Ok((events, sent))
    }

    /// Carry out a filter's side effect without holding up the wait.
    fn compensate(&self, compensation: Compensation, notice: Option<Prompt>) {
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            match compensation {
                Compensation::RemoveReaction {
                    message,
                    emote,
                    user_id,
                } => {
                    try_remove_reaction(transport.as_ref(), message, &emote, user_id).await;
                },
                Compensation::RejectMessage { message } => {
                    try_delete(transport.as_ref(), message).await;
                    if let Some(notice) = notice {
                        try_send(&transport, message.channel_id, &notice).await;
                    }
                },
            }
        });
    }
}

enum Cleanup {
    Delete(Vec<SentMessage>),
    ClearReactions(SentMessage),
}

impl Cleanup {
    async fn execute(self, transport: &dyn ChatTransport) {
        match self {
            Self::Delete(messages) => {
                for message in messages {
                    try_delete(transport, message).await;
                }
            },
            Self::ClearReactions(message) => {
                try_clear_reactions(transport, message).await;
            },
        }
    }
}

/// Runs the cleanup exactly once: inline through [`CleanupGuard::run`], or
/// from a spawned task if the waiting future is dropped first.
struct CleanupGuard {
    transport: Arc<dyn ChatTransport>,
    cleanup: Option<Cleanup>,
}

impl CleanupGuard {
    fn arm(transport: Arc<dyn ChatTransport>, cleanup: Option<Cleanup>) -> Self {
        Self { transport, cleanup }
    }

    fn also_delete(&mut self, message: SentMessage) {
        if let Some(Cleanup::Delete(messages)) = &mut self.cleanup {
            messages.push(message);
        }
    }

    async fn run(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup.execute(self.transport.as_ref()).await;
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let Some(cleanup) = self.cleanup.take() else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                cleanup.execute(transport.as_ref()).await;
            });
        }
    }
}
