#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    botplus_channels::{
        BotEvent, ChatTransport, EventDispatcher, MemoryTransport, MessageEvent, ReactionEvent,
        TransportOp,
    },
    botplus_common::{ChannelId, MessageId, Prompt, SentMessage, UserId},
    botplus_interact::{AskOptions, EmoteSet, Error, ForbidPolicy, InteractionWaiter, TargetSpec},
    tokio::time::{Instant, sleep},
    tokio_util::sync::CancellationToken,
};

const BOT: UserId = UserId(1);
const TARGET: UserId = UserId(2);
const VISITOR: UserId = UserId(3);
const CHANNEL: ChannelId = ChannelId(10);

struct Harness {
    transport: Arc<MemoryTransport>,
    dispatcher: EventDispatcher,
    waiter: InteractionWaiter,
    _cancel: CancellationToken,
}

impl Harness {
    fn start() -> Self {
        let transport = Arc::new(MemoryTransport::new(BOT));
        let (dispatcher, dispatch_loop) = EventDispatcher::new();
        let cancel = CancellationToken::new();
        tokio::spawn(dispatch_loop.run(cancel.clone()));
        let shared: Arc<dyn ChatTransport> = transport.clone();
        let waiter = InteractionWaiter::new(shared, dispatcher.clone());
        Self {
            transport,
            dispatcher,
            waiter,
            _cancel: cancel,
        }
    }

    fn prompt(&self) -> SentMessage {
        self.transport.sent_to(CHANNEL)[0].0
    }

    fn react(&self, user: UserId, emote: &str) {
        self.dispatcher
            .dispatch(BotEvent::ReactionAdd(ReactionEvent {
                channel_id: CHANNEL,
                message_id: self.prompt().message_id,
                user_id: user,
                emote: emote.into(),
            }))
            .unwrap();
    }

    /// Post a message from `author`, visible to the transport so it can be deleted.
    fn say(&self, author: UserId, content: &str) -> MessageId {
        let id = self.transport.next_message_id();
        self.transport.insert_foreign(CHANNEL, id, content);
        self.dispatcher
            .dispatch(BotEvent::Message(MessageEvent {
                channel_id: CHANNEL,
                message_id: id,
                author_id: author,
                content: content.into(),
            }))
            .unwrap();
        id
    }

    fn cleared(&self) -> usize {
        self.transport
            .count_ops(|op| matches!(op, TransportOp::ReactionsCleared(_)))
    }

    fn deleted(&self, id: MessageId) -> bool {
        self.transport
            .count_ops(|op| matches!(op, TransportOp::Deleted(m) if m.message_id == id))
            == 1
    }
}

/// Delivers through a [`MemoryTransport`] but fails every delete and clear.
struct BrokenCleanup(Arc<MemoryTransport>);

#[async_trait]
impl ChatTransport for BrokenCleanup {
    fn bot_user_id(&self) -> UserId {
        self.0.bot_user_id()
    }

    async fn send(
        &self,
        channel_id: ChannelId,
        prompt: &Prompt,
    ) -> botplus_channels::Result<SentMessage> {
        self.0.send(channel_id, prompt).await
    }

    async fn delete_message(&self, _message: SentMessage) -> botplus_channels::Result<()> {
        Err(botplus_channels::Error::unavailable("missing permission"))
    }

    async fn add_reaction(&self, message: SentMessage, emote: &str) -> botplus_channels::Result<()> {
        self.0.add_reaction(message, emote).await
    }

    async fn remove_reaction(
        &self,
        message: SentMessage,
        emote: &str,
        user_id: UserId,
    ) -> botplus_channels::Result<()> {
        self.0.remove_reaction(message, emote, user_id).await
    }

    async fn clear_reactions(&self, _message: SentMessage) -> botplus_channels::Result<()> {
        Err(botplus_channels::Error::unavailable("missing permission"))
    }
}

impl Harness {
    fn broken_cleanup_waiter(&self) -> InteractionWaiter {
        let broken: Arc<dyn ChatTransport> = Arc::new(BrokenCleanup(Arc::clone(&self.transport)));
        InteractionWaiter::new(broken, self.dispatcher.clone())
    }
}

fn target() -> TargetSpec {
    TargetSpec::new(CHANNEL, TARGET)
}

fn thirty_seconds() -> AskOptions {
    AskOptions::timeout(Duration::from_secs(30))
}

#[tokio::test(start_paused = true)]
async fn confirmation_resolves_on_affirm() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_confirmation(target(), &Prompt::text("Proceed?"), thirty_seconds())
            .await
    });

    sleep(Duration::from_secs(5)).await;
    let prompt = h.prompt();
    assert_eq!(h.transport.reactions(prompt.message_id), vec![
        ("✅".to_string(), BOT),
        ("❌".to_string(), BOT),
    ]);
    h.react(TARGET, "✅");

    assert_eq!(task.await.unwrap().unwrap(), Some(true));
    assert_eq!(h.cleared(), 1);
    assert!(h.transport.reactions(prompt.message_id).is_empty());
    assert!(h.transport.exists(prompt.message_id));
}

#[tokio::test(start_paused = true)]
async fn confirmation_resolves_on_deny() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_confirmation(target(), &Prompt::text("Proceed?"), thirty_seconds())
            .await
    });

    sleep(Duration::from_secs(1)).await;
    h.react(TARGET, "❌");
    assert_eq!(task.await.unwrap().unwrap(), Some(false));
}

#[tokio::test(start_paused = true)]
async fn reaction_wait_times_out_and_cleans_up_once() {
    let h = Harness::start();
    let started = Instant::now();
    let answer = h
        .waiter
        .ask_reaction(
            target(),
            &Prompt::text("Pick one"),
            &EmoteSet::from_iter(["🅰", "🅱"]),
            thirty_seconds(),
        )
        .await
        .unwrap();

    assert_eq!(answer, None);
    assert!(started.elapsed() >= Duration::from_secs(30));
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.cleared(), 1);
}

#[tokio::test(start_paused = true)]
async fn reactions_from_others_are_removed_and_ignored() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_reaction(
                target(),
                &Prompt::text("Pick one"),
                &EmoteSet::from_iter(["🅰", "🅱"]),
                thirty_seconds(),
            )
            .await
    });

    sleep(Duration::from_secs(1)).await;
    h.react(VISITOR, "🅰");
    h.react(TARGET, "🦀");
    sleep(Duration::from_secs(1)).await;
    assert!(!task.is_finished());

    let removed = h.transport.count_ops(|op| {
        matches!(op, TransportOp::ReactionRemoved { user_id, .. } if *user_id == VISITOR)
    });
    assert_eq!(removed, 1);

    h.react(TARGET, "🅱");
    assert_eq!(task.await.unwrap().unwrap(), Some("🅱".to_string()));
}

#[tokio::test(start_paused = true)]
async fn reaction_with_delete_after_removes_prompt() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_reaction(
                target(),
                &Prompt::text("Anything"),
                &EmoteSet::any(),
                thirty_seconds().delete_after(true),
            )
            .await
    });

    sleep(Duration::from_secs(1)).await;
    let prompt = h.prompt();
    h.react(TARGET, "🦀");

    assert_eq!(task.await.unwrap().unwrap(), Some("🦀".to_string()));
    assert!(!h.transport.exists(prompt.message_id));
    assert_eq!(h.cleared(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_wait_still_cleans_up() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_confirmation(target(), &Prompt::text("Proceed?"), AskOptions::default())
            .await
    });

    sleep(Duration::from_secs(1)).await;
    task.abort();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(h.cleared(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_prompt_is_an_error() {
    let h = Harness::start();
    h.transport.set_fail_sends(true);
    let err = h
        .waiter
        .ask_reply(target(), &Prompt::text("Name?"), thirty_seconds(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Deliver(_)));
}

#[tokio::test(start_paused = true)]
async fn forbid_rejects_visitor_then_accepts_target() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_reply(
                target(),
                &Prompt::text("Your name?"),
                thirty_seconds(),
                Some(&ForbidPolicy::default()),
            )
            .await
    });

    sleep(Duration::from_secs(1)).await;
    let intruder = h.say(VISITOR, "me first");
    h.say(TARGET, "hello");

    assert_eq!(task.await.unwrap().unwrap(), Some("hello".to_string()));
    sleep(Duration::from_millis(10)).await;
    assert!(h.deleted(intruder));

    let notices: Vec<_> = h
        .transport
        .sent_to(CHANNEL)
        .into_iter()
        .skip(1)
        .collect();
    assert_eq!(notices.len(), 1);
    let (notice, prompt) = &notices[0];
    let embed = prompt.embed.clone().unwrap();
    assert_eq!(embed.title.as_deref(), Some("**ERROR**"));
    assert_eq!(
        embed.description.as_deref(),
        Some("Only <@2> can send message here")
    );

    sleep(Duration::from_secs(21)).await;
    assert!(!h.transport.exists(notice.message_id));
}

#[tokio::test(start_paused = true)]
async fn reply_without_forbid_ignores_others() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_reply(target(), &Prompt::text("Your name?"), thirty_seconds(), None)
            .await
    });

    sleep(Duration::from_secs(1)).await;
    let other = h.say(VISITOR, "not you");
    h.say(TARGET, "ferris");

    assert_eq!(task.await.unwrap().unwrap(), Some("ferris".to_string()));
    assert!(h.transport.exists(other));
    assert_eq!(h.transport.sent_to(CHANNEL).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reply_with_delete_after_removes_prompt_and_answer() {
    let h = Harness::start();
    let waiter = h.waiter.clone();
    let task = tokio::spawn(async move {
        waiter
            .ask_reply(
                target(),
                &Prompt::text("Secret word?"),
                thirty_seconds().delete_after(true),
                None,
            )
            .await
    });

    sleep(Duration::from_secs(1)).await;
    let prompt = h.prompt();
    let answer = h.say(TARGET, "swordfish");

    assert_eq!(task.await.unwrap().unwrap(), Some("swordfish".to_string()));
    assert!(h.deleted(prompt.message_id));
    assert!(h.deleted(answer));
}

#[tokio::test(start_paused = true)]
async fn reply_timeout_deletes_prompt_only_when_asked() {
    let h = Harness::start();
    let answer = h
        .waiter
        .ask_reply(
            target(),
            &Prompt::text("Still there?"),
            AskOptions::timeout(Duration::from_secs(5)).delete_after(true),
            None,
        )
        .await
        .unwrap();
    assert_eq!(answer, None);
    assert!(h.deleted(h.prompt().message_id));
}

#[tokio::test(start_paused = true)]
async fn failing_clear_does_not_fail_confirmation() {
    let h = Harness::start();
    let waiter = h.broken_cleanup_waiter();
    let task = tokio::spawn(async move {
        waiter
            .ask_confirmation(target(), &Prompt::text("Proceed?"), thirty_seconds())
            .await
    });

    sleep(Duration::from_secs(1)).await;
    h.react(TARGET, "✅");

    assert_eq!(task.await.unwrap().unwrap(), Some(true));
    assert_eq!(h.cleared(), 0);
}

#[tokio::test(start_paused = true)]
async fn failing_delete_does_not_fail_reply() {
    let h = Harness::start();
    let waiter = h.broken_cleanup_waiter();
    let task = tokio::spawn(async move {
        waiter
            .ask_reply(
                target(),
                &Prompt::text("Secret word?"),
                thirty_seconds().delete_after(true),
                Some(&ForbidPolicy::default()),
            )
            .await
    });

    sleep(Duration::from_secs(1)).await;
    let prompt = h.prompt();
    let intruder = h.say(VISITOR, "me first");
    let answer = h.say(TARGET, "swordfish");

    assert_eq!(task.await.unwrap().unwrap(), Some("swordfish".to_string()));
    assert!(h.transport.exists(prompt.message_id));
    assert!(h.transport.exists(intruder));
    assert!(h.transport.exists(answer));
}
